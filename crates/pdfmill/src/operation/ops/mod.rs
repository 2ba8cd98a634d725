pub mod compress;
pub mod metadata;
pub mod noop;
pub mod pages;
pub mod text;

pub use compress::CompressOperation;
pub use metadata::EditMetadataOperation;
pub use noop::NoopOperation;
pub use pages::{DeletePagesOperation, RotatePagesOperation};
pub use text::ExtractTextOperation;

use serde_json::{Map, Value};

use crate::error::OperationError;

pub(crate) fn require_i64(params: &Map<String, Value>, name: &'static str) -> Result<i64, OperationError> {
    match params.get(name) {
        None => Err(OperationError::MissingParameter { name }),
        Some(value) => value.as_i64().ok_or_else(|| OperationError::InvalidParameter {
            name,
            reason: format!("expected an integer, got {}", value),
        }),
    }
}

pub(crate) fn optional_string(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<String>, OperationError> {
    match params.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(OperationError::InvalidParameter {
            name,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

/// Parses an optional `pages` parameter: a non-empty array of 1-based
/// page numbers.
pub(crate) fn optional_pages(
    params: &Map<String, Value>,
    name: &'static str,
) -> Result<Option<Vec<u32>>, OperationError> {
    let value = match params.get(name) {
        None | Some(Value::Null) => return Ok(None),
        Some(value) => value,
    };

    let entries = value.as_array().ok_or_else(|| OperationError::InvalidParameter {
        name,
        reason: format!("expected an array of page numbers, got {}", value),
    })?;

    let mut pages = Vec::with_capacity(entries.len());
    for entry in entries {
        let page = entry
            .as_u64()
            .filter(|&n| n >= 1 && n <= u32::MAX as u64)
            .ok_or_else(|| OperationError::InvalidParameter {
                name,
                reason: format!("page numbers are 1-based positive integers, got {}", entry),
            })?;
        pages.push(page as u32);
    }

    if pages.is_empty() {
        return Err(OperationError::InvalidParameter {
            name,
            reason: "page list cannot be empty".to_string(),
        });
    }

    Ok(Some(pages))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_require_i64() {
        let p = params(json!({"rotation": 90}));
        assert_eq!(require_i64(&p, "rotation").unwrap(), 90);

        let p = params(json!({"rotation": "90"}));
        assert!(matches!(
            require_i64(&p, "rotation"),
            Err(OperationError::InvalidParameter { .. })
        ));

        let p = params(json!({}));
        assert!(matches!(
            require_i64(&p, "rotation"),
            Err(OperationError::MissingParameter { name: "rotation" })
        ));
    }

    #[test]
    fn test_optional_pages() {
        let p = params(json!({"pages": [1, 2, 3]}));
        assert_eq!(optional_pages(&p, "pages").unwrap(), Some(vec![1, 2, 3]));

        let p = params(json!({}));
        assert_eq!(optional_pages(&p, "pages").unwrap(), None);

        let p = params(json!({"pages": []}));
        assert!(optional_pages(&p, "pages").is_err());

        let p = params(json!({"pages": [0]}));
        assert!(optional_pages(&p, "pages").is_err());

        let p = params(json!({"pages": [1, -2]}));
        assert!(optional_pages(&p, "pages").is_err());
    }
}
