use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::resource::Document;

/// A localized document and the language it holds.
#[derive(Debug, Clone)]
pub struct LanguageTarget {
    language: String,
    document: Document,
}

impl LanguageTarget {
    pub fn new(language: impl Into<String>, document: Document) -> Self {
        Self {
            language: language.into(),
            document,
        }
    }

    /// Loads the document at `path`, naming its language after the parent directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let language = language_from_location(path).ok_or_else(|| {
            Error::parse(
                path.display().to_string(),
                "cannot derive a language from the parent directory name",
            )
        })?;
        Ok(Self::new(language, Document::load(path)?))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub const fn document(&self) -> &Document {
        &self.document
    }

    pub const fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn location(&self) -> Option<PathBuf> {
        self.document.location().map(Path::to_path_buf)
    }
}

/// The language identifier of a target file: the name of its parent directory.
///
/// `res/values-fr/strings.xml` gives `values-fr`, and
/// `moko-resources/zh-CN/strings.xml` gives `zh-CN`.
pub fn language_from_location(path: &Path) -> Option<String> {
    path.parent()?
        .file_name()?
        .to_str()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_language_from_location() {
        assert_eq!(
            language_from_location(Path::new("src/moko-resources/zh-CN/strings.xml")),
            Some("zh-CN".to_string())
        );
        assert_eq!(
            language_from_location(Path::new("res/values-fr/strings.xml")),
            Some("values-fr".to_string())
        );
    }

    #[test]
    fn test_language_from_location_without_parent() {
        assert_eq!(language_from_location(Path::new("strings.xml")), None);
    }

    #[test]
    fn test_load_target() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("ja");
        fs::create_dir(&dir).unwrap();
        let path = dir.join("strings.xml");
        fs::write(
            &path,
            "<resources>\n    <string name=\"greeting\">こんにちは</string>\n</resources>\n",
        )
        .unwrap();

        let target = LanguageTarget::load(&path).unwrap();

        assert_eq!(target.language(), "ja");
        assert_eq!(target.document().get("greeting"), Some("こんにちは"));
        assert_eq!(target.location(), Some(path));
    }
}
