use lopdf::{Dictionary, Object};
use serde_json::{Map, Value};
use tracing::debug;

use crate::document::PdfDocument;
use crate::error::OperationError;
use crate::operation::{Operation, OperationKind, Outcome};

use super::optional_string;

/// The document-info fields this operation can write, paired with their
/// PDF dictionary keys.
const FIELDS: [(&str, &str); 5] = [
    ("title", "Title"),
    ("author", "Author"),
    ("subject", "Subject"),
    ("keywords", "Keywords"),
    ("creator", "Creator"),
];

/// Writes entries into the document's Info dictionary, creating the
/// dictionary when the document has none.
pub struct EditMetadataOperation {
    entries: Vec<(&'static str, String)>,
}

impl EditMetadataOperation {
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, OperationError> {
        let mut entries = Vec::new();
        for (param, pdf_key) in FIELDS {
            if let Some(value) = optional_string(params, param)? {
                entries.push((pdf_key, value));
            }
        }

        if entries.is_empty() {
            return Err(OperationError::InvalidParameter {
                name: "parameters",
                reason: "at least one of title, author, subject, keywords, creator is required"
                    .to_string(),
            });
        }

        Ok(Self { entries })
    }
}

impl Operation for EditMetadataOperation {
    fn kind(&self) -> OperationKind {
        OperationKind::EditMetadata
    }

    fn validate(&self, _document: &PdfDocument) -> Result<bool, OperationError> {
        Ok(!self.entries.is_empty())
    }

    fn execute(&self, document: &mut PdfDocument) -> Result<Outcome, OperationError> {
        let doc = document.inner_mut();

        let info_id = match doc.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => *id,
            _ => {
                let id = doc.add_object(Object::Dictionary(Dictionary::new()));
                doc.trailer.set("Info", Object::Reference(id));
                id
            }
        };

        let info = doc.get_object_mut(info_id)?.as_dict_mut()?;
        let mut written = Vec::with_capacity(self.entries.len());
        for (pdf_key, value) in &self.entries {
            info.set(*pdf_key, Object::string_literal(value.as_str()));
            written.push(Value::String((*pdf_key).to_string()));
        }

        document.mark_modified();
        debug!("Wrote {} Info entries", written.len());

        Ok(Outcome::success(format!("updated {} metadata fields", written.len()))
            .with_detail("fields", Value::Array(written)))
    }
}
