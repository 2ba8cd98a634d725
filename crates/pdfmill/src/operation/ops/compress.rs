use serde_json::{Map, Value};
use tracing::debug;

use crate::document::PdfDocument;
use crate::error::OperationError;
use crate::operation::{Operation, OperationKind, Outcome};

/// Runs the engine's stream compression pass over the whole document.
/// Takes no parameters.
pub struct CompressOperation;

impl CompressOperation {
    pub fn from_params(_params: &Map<String, Value>) -> Result<Self, OperationError> {
        Ok(Self)
    }
}

impl Operation for CompressOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Compress
    }

    fn validate(&self, _document: &PdfDocument) -> Result<bool, OperationError> {
        Ok(true)
    }

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        document.inner_mut().compress();
        document.mark_modified();
        debug!("Compressed document streams");
        Ok(Outcome::success("compressed document streams"))
    }
}
