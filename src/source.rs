use std::path::PathBuf;

use log::debug;

use crate::error::{CorepError, Result};

/// Supplies the regulatory-text excerpt for a run.
pub trait TextSource {
    /// Human readable location, used in error messages.
    fn origin(&self) -> String;

    fn read_text(&self) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FileTextSource {
    path: PathBuf,
}

impl FileTextSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileTextSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    fn read_text(&self) -> Result<String> {
        let text = std::fs::read_to_string(&self.path).map_err(|source| CorepError::TextSource {
            origin: self.origin(),
            source,
        })?;
        debug!("Read {} bytes of regulatory text from {}", text.len(), self.origin());
        Ok(text)
    }
}

/// In-memory excerpt, for callers that already hold the text.
#[derive(Debug, Clone)]
pub struct StaticTextSource {
    text: String,
}

impl StaticTextSource {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl TextSource for StaticTextSource {
    fn origin(&self) -> String {
        "<static>".to_string()
    }

    fn read_text(&self) -> Result<String> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_reads_whole_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Article 26\nArticle 51\n").unwrap();

        let text = FileTextSource::new(file.path()).read_text().unwrap();
        assert_eq!(text, "Article 26\nArticle 51\n");
    }

    #[test]
    fn test_missing_file_is_text_source_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("own_funds_rules.txt");

        match FileTextSource::new(&path).read_text() {
            Err(CorepError::TextSource { origin, .. }) => {
                assert!(origin.ends_with("own_funds_rules.txt"))
            }
            other => panic!("expected TextSource error, got {:?}", other),
        }
    }

    #[test]
    fn test_static_source() {
        let source = StaticTextSource::new("Article 26");
        assert_eq!(source.read_text().unwrap(), "Article 26");
        assert_eq!(source.origin(), "<static>");
    }
}
