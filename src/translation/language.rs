//! Human-readable names for target language identifiers.

/// Language identifiers commonly used for resource directories and their names.
pub const KNOWN_LANGUAGES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("pt-BR", "Portuguese (Brazil)"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sv", "Swedish"),
    ("th", "Thai"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
    ("zh-CN", "Chinese (Simplified)"),
    ("zh-TW", "Chinese (Traditional)"),
];

/// Looks up the name of a language identifier.
///
/// Accepts moko-resources directory names (`zh-CN`) as well as Android
/// qualifiers (`values-zh-rCN`). Falls back to the base language when the
/// region is unknown.
pub fn language_name(identifier: &str) -> Option<&'static str> {
    let code = identifier.strip_prefix("values-").unwrap_or(identifier);
    let code = code.replacen("-r", "-", 1);

    lookup(&code).or_else(|| {
        let (base, _) = code.split_once('-')?;
        lookup(base)
    })
}

fn lookup(code: &str) -> Option<&'static str> {
    KNOWN_LANGUAGES
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(code))
        .map(|(_, name)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_name_moko_directory() {
        assert_eq!(language_name("zh-CN"), Some("Chinese (Simplified)"));
        assert_eq!(language_name("ja"), Some("Japanese"));
    }

    #[test]
    fn test_language_name_android_qualifier() {
        assert_eq!(language_name("values-fr"), Some("French"));
        assert_eq!(language_name("values-zh-rTW"), Some("Chinese (Traditional)"));
    }

    #[test]
    fn test_language_name_falls_back_to_base() {
        assert_eq!(language_name("de-AT"), Some("German"));
    }

    #[test]
    fn test_language_name_unknown() {
        assert_eq!(language_name("base"), None);
        assert_eq!(language_name(""), None);
    }
}
