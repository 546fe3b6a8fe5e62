use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ExportError {
    /// File system error (create dir, write, remove).
    Io { path: PathBuf, message: String },
    /// CSV writer error.
    Csv { path: PathBuf, message: String },
    /// Workbook build or save error.
    Xlsx(String),
    /// SQLite materialization error.
    Sqlite { table: String, message: String },
    /// Manifest serialization error.
    Json(String),
}

impl ExportError {
    pub fn io(path: &Path, err: impl fmt::Display) -> Self {
        Self::Io { path: path.to_path_buf(), message: err.to_string() }
    }

    pub fn csv(path: &Path, err: impl fmt::Display) -> Self {
        Self::Csv { path: path.to_path_buf(), message: err.to_string() }
    }

    pub fn sqlite(table: &str, err: impl fmt::Display) -> Self {
        Self::Sqlite { table: table.to_string(), message: err.to_string() }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
            Self::Csv { path, message } => write!(f, "{}: CSV error: {message}", path.display()),
            Self::Xlsx(msg) => write!(f, "workbook error: {msg}"),
            Self::Sqlite { table, message } => write!(f, "sqlite table '{table}': {message}"),
            Self::Json(msg) => write!(f, "manifest error: {msg}"),
        }
    }
}

impl std::error::Error for ExportError {}
