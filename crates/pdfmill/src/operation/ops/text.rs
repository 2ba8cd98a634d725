use serde_json::{Map, Value};
use tracing::debug;

use crate::document::PdfDocument;
use crate::error::OperationError;
use crate::operation::{Operation, OperationKind, Outcome, OutcomeStatus};

use super::optional_pages;

/// Extracts embedded text into the outcome's detail map. Never mutates
/// the document. Pages without extractable text are tolerated page by
/// page rather than failing the whole run.
pub struct ExtractTextOperation {
    pages: Option<Vec<u32>>,
}

impl ExtractTextOperation {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OperationError> {
        Ok(Self {
            pages: optional_pages(params, "pages")?,
        })
    }
}

impl Operation for ExtractTextOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::ExtractText
    }

    fn validate(&self, document: &PdfDocument) -> Result<bool, OperationError> {
        Ok(document.page_count() > 0)
    }

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        let page_map = document.inner().get_pages();
        let targets: Vec<u32> = match &self.pages {
            Some(pages) => pages.clone(),
            None => page_map.keys().copied().collect(),
        };

        let mut text = String::new();
        let mut extracted = 0u32;
        let mut skipped = Vec::new();

        for page_number in targets {
            if !page_map.contains_key(&page_number) {
                skipped.push(page_number);
                continue;
            }
            match document.inner().extract_text(&[page_number]) {
                Ok(page_text) => {
                    text.push_str(&page_text);
                    text.push('\n');
                    extracted += 1;
                }
                Err(_) => skipped.push(page_number),
            }
        }

        debug!("Extracted text from {} pages", extracted);

        let status = if skipped.is_empty() {
            OutcomeStatus::Success
        } else {
            OutcomeStatus::Partial
        };
        let mut outcome = Outcome {
            status,
            message: format!("extracted text from {} pages", extracted),
            details: Map::new(),
        };
        outcome = outcome
            .with_detail("characters", Value::from(text.chars().count()))
            .with_detail("text", Value::String(text));
        if !skipped.is_empty() {
            outcome = outcome.with_detail("skipped_pages", Value::from(skipped));
        }

        Ok(outcome)
    }
}
