use serde_json::{Map, Value};
use tracing::debug;

use crate::document::PdfDocument;
use crate::error::OperationError;
use crate::operation::{Operation, OperationKind, Outcome};

use super::{optional_pages, require_i64};

const VALID_ROTATIONS: [i64; 3] = [90, 180, 270];

/// Rotates pages clockwise by a quarter-turn multiple. The rotation is
/// applied relative to each page's existing `/Rotate` entry.
pub struct RotatePagesOperation {
    rotation: i64,
    pages: Option<Vec<u32>>,
}

impl RotatePagesOperation {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OperationError> {
        let rotation = require_i64(params, "rotation")?;
        if !VALID_ROTATIONS.contains(&rotation) {
            return Err(OperationError::InvalidParameter {
                name: "rotation",
                reason: format!("must be one of 90, 180, 270; got {}", rotation),
            });
        }

        Ok(Self {
            rotation,
            pages: optional_pages(params, "pages")?,
        })
    }
}

impl Operation for RotatePagesOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::RotatePages
    }

    fn validate(&self, document: &PdfDocument) -> Result<bool, OperationError> {
        let page_count = document.page_count();
        if page_count == 0 {
            return Ok(false);
        }

        // With an explicit page list, at least one listed page must exist;
        // pages beyond the end are reported as a partial outcome.
        if let Some(pages) = &self.pages {
            return Ok(pages.iter().any(|&p| (p as usize) <= page_count));
        }

        Ok(true)
    }

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        let page_map = document.inner().get_pages();
        let targets: Vec<u32> = match &self.pages {
            Some(pages) => pages.clone(),
            None => page_map.keys().copied().collect(),
        };

        let mut rotated = 0u32;
        let mut missing = Vec::new();

        for page_number in targets {
            let Some(&object_id) = page_map.get(&page_number) else {
                missing.push(page_number);
                continue;
            };

            let dict = document
                .inner_mut()
                .get_object_mut(object_id)?
                .as_dict_mut()?;

            let current = dict
                .get(b"Rotate")
                .ok()
                .and_then(|o| o.as_i64().ok())
                .unwrap_or(0);
            let updated = (current + self.rotation).rem_euclid(360);
            dict.set("Rotate", updated);
            rotated += 1;
        }

        document.mark_modified();
        debug!("Rotated {} pages by {} degrees", rotated, self.rotation);

        let outcome = if missing.is_empty() {
            Outcome::success(format!("rotated {} pages by {} degrees", rotated, self.rotation))
        } else {
            Outcome::partial(format!(
                "rotated {} pages by {} degrees; {} listed pages not present",
                rotated,
                self.rotation,
                missing.len()
            ))
            .with_detail("missing_pages", Value::from(missing))
        };

        Ok(outcome.with_detail("rotated", Value::from(rotated)))
    }
}

/// Removes the listed pages from the document. Refuses to delete every
/// page: a PDF with an empty page tree is not a document any viewer
/// will accept.
pub struct DeletePagesOperation {
    pages: Vec<u32>,
}

impl DeletePagesOperation {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OperationError> {
        let pages =
            optional_pages(params, "pages")?.ok_or(OperationError::MissingParameter { name: "pages" })?;
        Ok(Self { pages })
    }
}

impl Operation for DeletePagesOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::DeletePages
    }

    fn validate(&self, document: &PdfDocument) -> Result<bool, OperationError> {
        let page_count = document.page_count();

        if self.pages.iter().any(|&p| (p as usize) > page_count) {
            return Ok(false);
        }

        let mut distinct = self.pages.clone();
        distinct.sort_unstable();
        distinct.dedup();
        Ok(distinct.len() < page_count)
    }

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        let before = document.page_count();
        document.inner_mut().delete_pages(&self.pages);
        document.mark_modified();

        let remaining = document.page_count();
        debug!("Deleted {} pages, {} remaining", before - remaining, remaining);

        Ok(
            Outcome::success(format!("deleted {} pages", before - remaining))
                .with_detail("remaining_pages", Value::from(remaining)),
        )
    }
}
