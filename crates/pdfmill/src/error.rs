use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfmillError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Document error: {0}")]
    Document(#[from] DocumentError),

    #[error("Operation error: {0}")]
    Operation(#[from] OperationError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Bad configuration discovered before any work starts. Raised to the
/// caller immediately; never captured as task data.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Input pattern cannot be empty")]
    EmptyPattern,

    #[error("Invalid input pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("No files found matching pattern: {pattern}")]
    NoMatches { pattern: String },

    #[error("At least one operation must be specified")]
    NoOperations,

    #[error("Unknown operation type: {tag}")]
    UnknownOperationType { tag: String },

    #[error("Invalid configuration for operation '{tag}': {reason}")]
    InvalidOperationConfig { tag: String, reason: String },

    #[error("Worker count must be at least 1")]
    BadWorkerCount,

    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Failed to read template '{path}': {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse template '{name}': {source}")]
    ParseTemplate {
        name: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unresolved placeholder '${{{key}}}' in operation {index}")]
    UnresolvedPlaceholder { key: String, index: usize },

    #[error("Failed to parse batch request: {0}")]
    ParseRequest(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("File is not a PDF: {0}")]
    NotAPdf(PathBuf),

    #[error("Failed to read document '{path}': {source}")]
    ReadDocument {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse PDF '{path}': {source}")]
    ParsePdf {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to save document '{path}': {source}")]
    SaveDocument {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },
}

/// A single operation's internal fault. Captured into the operation's
/// pipeline slot; never escalated past the pipeline boundary.
#[derive(Error, Debug)]
pub enum OperationError {
    #[error("Missing required parameter '{name}'")]
    MissingParameter { name: &'static str },

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: u32, page_count: usize },

    #[error("PDF engine error: {0}")]
    Engine(#[from] lopdf::Error),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Worker channel closed unexpectedly")]
    ChannelClosed,

    #[error("Task deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Unsupported report format: {format}")]
    UnsupportedFormat { format: String },

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PdfmillError>;
