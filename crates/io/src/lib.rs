// Report export: the files a run leaves behind

pub mod csv;
pub mod error;
pub mod manifest;
pub mod sqlite;
pub mod xlsx;

pub use error::ExportError;

/// Excel's sheet-name limit.
pub const MAX_SHEET_NAME_LEN: usize = 31;
