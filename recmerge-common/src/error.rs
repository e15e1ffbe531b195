//! Common error types for recmerge

use thiserror::Error;

/// Common result type for recmerge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised by the tabular collaborators
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Delimited text could not be read or written
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON (input, output or bundle) could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Bytes are not valid in the selected encoding
    #[error("Input is not valid {encoding} text")]
    Decode { encoding: String },

    /// Text contains characters the selected encoding cannot represent
    #[error("Output contains characters that cannot be encoded as {encoding}")]
    Encode { encoding: String },

    /// Encoding label outside the supported set
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Format identifier outside the supported set
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Structurally invalid tabular data
    #[error("Parse error: {0}")]
    Parse(String),

    /// A referenced column does not exist in the source
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// Profile rows could not be interpreted
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// Comparison failed
    #[error("Matching failed: {0}")]
    Match(String),
}
