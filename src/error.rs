use std::io;

use thiserror::Error;

/// Result type returned by data file operations.
pub type DataFileResult<T> = Result<T, DataFileError>;

#[derive(Error, Debug)]
/// Data file error
pub enum DataFileError {
    /// A quoted field was still open when the input ran out.
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// A cell could not be coerced to a number, or a by-name lookup named an unknown column.
    #[error("Number format: {0}")]
    NumberFormat(String),

    /// A codec or file was configured with values it cannot work with.
    #[error("Configuration: {0}")]
    Configuration(String),

    /// The underlying source or sink failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// The data file has not been opened, or has already been closed.
    #[error("Data file is not open")]
    NotOpen,
}
