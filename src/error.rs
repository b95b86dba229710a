//! Error types for the binsize size-attribution pipeline.
//!
//! Only the fatal class of failures is represented here. Soft failures
//! (unparseable map lines, symbols that do not demangle, definitions that
//! cannot be found) never surface as errors; they leave default values in
//! the affected rows instead.

use thiserror::Error;

/// Main error type for binsize operations.
#[derive(Debug, Error)]
pub enum BinSizeError {
    /// A processing stage was invoked before any data was loaded
    #[error("There are no data. Call one of the load functions first.")]
    NotLoaded,

    /// A second load was attempted on the same pipeline
    #[error("Data already loaded")]
    AlreadyLoaded,

    /// External tool could not be started at all
    #[error("Failed to run `{program}`: {source}")]
    ToolSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// External tool exited unsuccessfully
    #[error("`{program}` failed with {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: String,
        stderr: String,
    },

    /// Required column absent from the tabular size output
    #[error("Missing column in size table: {0}")]
    MissingColumn(String),

    /// Malformed line in the tabular size output
    #[error("Invalid CSV at line {line}: {message}")]
    InvalidCsv { line: usize, message: String },

    /// Linker map without the expected structure
    #[error("Map file error: {0}")]
    MapFile(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration could not be loaded
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input data
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for BinSizeError {
    fn from(err: serde_json::Error) -> Self {
        BinSizeError::Serialization(err.to_string())
    }
}

/// Result type alias for binsize operations
pub type Result<T> = std::result::Result<T, BinSizeError>;
