use std::fmt;

use crate::Pos;

/// Parser result.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A document could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct Error {
    pub message: String,
    pub line: usize,
    pub column: usize,
    /// The file the document was read from, if any.
    pub filename: Option<String>,
    /// The whole text that was being parsed.
    pub source_text: String,
}

impl Error {
    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.column)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(filename) = &self.filename {
            write!(f, "{filename}: ")?;
        }
        f.write_str(&self.message)
    }
}

/// A document could not be read from disk or could not be parsed.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("could not read {path}: {error}")]
    Io { path: String, error: std::io::Error },
    #[error(transparent)]
    Parse(#[from] Error),
}
