//! XDG-style locations for the user configuration and the translation cache.
//!
//! XDG Base Directory conventions are preferred over OS-specific locations
//! so that the same layout is used on every platform.

use std::path::PathBuf;

const APP_DIR: &str = "stringsync";

/// File name of the project configuration looked up in the working directory.
pub const PROJECT_FILE: &str = "stringsync.toml";

/// Returns the configuration directory for stringsync.
///
/// Resolution order:
/// 1. `$XDG_CONFIG_HOME/stringsync` if `XDG_CONFIG_HOME` is set
/// 2. `~/.config/stringsync` otherwise
///
/// # Panics
///
/// Panics if the home directory cannot be determined.
pub fn config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", ".config")
}

/// Returns the cache directory for stringsync.
///
/// Resolution order:
/// 1. `$XDG_CACHE_HOME/stringsync` if `XDG_CACHE_HOME` is set
/// 2. `~/.cache/stringsync` otherwise
///
/// # Panics
///
/// Panics if the home directory cannot be determined.
pub fn cache_dir() -> PathBuf {
    xdg_dir("XDG_CACHE_HOME", ".cache")
}

fn xdg_dir(variable: &str, fallback: &str) -> PathBuf {
    std::env::var_os(variable)
        .filter(|value| !value.is_empty())
        .map_or_else(
            || home_dir().join(fallback).join(APP_DIR),
            |xdg| PathBuf::from(xdg).join(APP_DIR),
        )
}

#[allow(clippy::expect_used)]
fn home_dir() -> PathBuf {
    dirs::home_dir().expect("Failed to determine home directory")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn with_var<F: FnOnce()>(name: &str, value: Option<&str>, f: F) {
        let original = std::env::var_os(name);
        // SAFETY: tests touching the environment are serialized
        unsafe {
            match value {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }

        f();

        unsafe {
            match original {
                Some(value) => std::env::set_var(name, value),
                None => std::env::remove_var(name),
            }
        }
    }

    #[test]
    #[serial]
    fn test_config_dir_default() {
        with_var("XDG_CONFIG_HOME", None, || {
            assert!(config_dir().ends_with(".config/stringsync"));
        });
    }

    #[test]
    #[serial]
    fn test_config_dir_xdg_override() {
        with_var("XDG_CONFIG_HOME", Some("/custom/config"), || {
            assert_eq!(config_dir(), PathBuf::from("/custom/config/stringsync"));
        });
    }

    #[test]
    #[serial]
    fn test_empty_xdg_value_is_ignored() {
        with_var("XDG_CACHE_HOME", Some(""), || {
            assert!(cache_dir().ends_with(".cache/stringsync"));
        });
    }

    #[test]
    #[serial]
    fn test_cache_dir_xdg_override() {
        with_var("XDG_CACHE_HOME", Some("/custom/cache"), || {
            assert_eq!(cache_dir(), PathBuf::from("/custom/cache/stringsync"));
        });
    }
}
