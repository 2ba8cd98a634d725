pub mod ops;
pub mod pipeline;
pub mod registry;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::document::PdfDocument;
use crate::error::OperationError;

pub use pipeline::{OperationPipeline, OperationRecord, PipelineReport, PipelineSummary};
pub use registry::OperationRegistry;

/// Known operation types. Dispatch is a closed enum rather than a
/// runtime string table so an unknown tag is rejected at configuration
/// time and construction stays type-safe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Noop,
    RotatePages,
    DeletePages,
    EditMetadata,
    Compress,
    ExtractText,
}

impl OperationKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "noop" => Some(Self::Noop),
            "rotate_pages" => Some(Self::RotatePages),
            "delete_pages" => Some(Self::DeletePages),
            "edit_metadata" => Some(Self::EditMetadata),
            "compress" => Some(Self::Compress),
            "extract_text" => Some(Self::ExtractText),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Noop => "noop",
            Self::RotatePages => "rotate_pages",
            Self::DeletePages => "delete_pages",
            Self::EditMetadata => "edit_metadata",
            Self::Compress => "compress",
            Self::ExtractText => "extract_text",
        }
    }

    pub fn all() -> &'static [OperationKind] {
        &[
            Self::Noop,
            Self::RotatePages,
            Self::DeletePages,
            Self::EditMetadata,
            Self::Compress,
            Self::ExtractText,
        ]
    }
}

/// One operation as it appears in configuration, templates, and batch
/// requests: a type tag plus a bag of named parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationConfig {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

impl OperationConfig {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            parameters: Map::new(),
        }
    }

    pub fn with_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Success,
    Failed,
    Partial,
    Skipped,
}

/// The result of one `execute` invocation. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Success,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn partial(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Partial,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn skipped(message: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Skipped,
            message: message.into(),
            details: Map::new(),
        }
    }

    pub fn with_detail(mut self, name: &str, value: Value) -> Self {
        self.details.insert(name.to_string(), value);
        self
    }
}

/// A single named unit of document mutation.
///
/// The two-phase protocol: `execute` is only called after `validate`
/// returned `Ok(true)` on the same document. `validate` must be free of
/// side effects. `execute` may mutate the in-memory document and
/// reports `Success` only when the effect was durably applied there —
/// persisting to disk is a separate step owned by the caller. Internal
/// faults surface as typed errors, never panics.
pub trait Operation: Send {
    fn kind(&self) -> OperationKind;

    fn validate(&self, document: &PdfDocument) -> Result<bool, OperationError>;

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError>;
}
