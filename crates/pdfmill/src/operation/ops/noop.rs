use serde_json::{Map, Value};

use crate::document::PdfDocument;
use crate::error::OperationError;
use crate::operation::{Operation, OperationKind, Outcome};

use super::optional_string;

/// Does nothing and reports success. Useful for dry runs and for
/// exercising pipeline wiring without touching documents.
pub struct NoopOperation {
    label: Option<String>,
}

impl NoopOperation {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OperationError> {
        Ok(Self {
            label: optional_string(params, "label")?,
        })
    }
}

impl Operation for NoopOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::Noop
    }

    fn validate(&self, _document: &PdfDocument) -> Result<bool, OperationError> {
        Ok(true)
    }

    fn execute(&self, _document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        let mut outcome = Outcome::success("no effect applied");
        if let Some(label) = &self.label {
            outcome = outcome.with_detail("label", Value::String(label.clone()));
        }
        Ok(outcome)
    }
}
