use thiserror::Error;

/// Main error type for Relink
#[derive(Error, Debug)]
pub enum RelinkError {
    /// Uploaded document is not well-formed XML
    #[error("Parse error: {0}")]
    Parse(String),

    /// Upload request carried no file
    #[error("No file selected for upload")]
    EmptyUpload,

    /// Upload file extension is not accepted
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),

    /// Operation needs a relation table but none has been loaded yet
    #[error("No processed data available")]
    NoData,

    /// No record carries the queried entity name
    #[error("No row found with value '{0}'")]
    NotFound(String),

    /// An identifier reference has no matching record
    #[error("Cannot resolve identifier '{0}'")]
    Resolution(String),

    /// Submitted row index is outside the current table
    #[error("Row {index} is out of bounds for a table of {len} rows")]
    Index { index: usize, len: usize },

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV mirror read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Convenient Result type using RelinkError
pub type Result<T> = std::result::Result<T, RelinkError>;
