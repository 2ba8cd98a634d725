use serde_json::{Map, Value};

use crate::error::ValidationError;
use crate::operation::ops::{
    CompressOperation, DeletePagesOperation, EditMetadataOperation, ExtractTextOperation,
    NoopOperation, RotatePagesOperation,
};
use crate::operation::{Operation, OperationConfig, OperationKind};

/// Constructs concrete operations from a type tag and a parameter bag.
///
/// Every pipeline — and every batch task — gets its own instances, so
/// no operation state is ever shared across threads.
pub struct OperationRegistry;

impl OperationRegistry {
    pub fn create(config: &OperationConfig) -> Result<Box<dyn Operation>, ValidationError> {
        let kind = OperationKind::from_tag(&config.kind).ok_or_else(|| {
            ValidationError::UnknownOperationType {
                tag: config.kind.clone(),
            }
        })?;
        Self::create_kind(kind, &config.parameters)
    }

    fn create_kind(
        kind: OperationKind,
        params: &Map<String, Value>,
    ) -> Result<Box<dyn Operation>, ValidationError> {
        let invalid = |e: crate::error::OperationError| ValidationError::InvalidOperationConfig {
            tag: kind.tag().to_string(),
            reason: e.to_string(),
        };

        let operation: Box<dyn Operation> = match kind {
            OperationKind::Noop => Box::new(NoopOperation::from_params(params).map_err(invalid)?),
            OperationKind::RotatePages => {
                Box::new(RotatePagesOperation::from_params(params).map_err(invalid)?)
            }
            OperationKind::DeletePages => {
                Box::new(DeletePagesOperation::from_params(params).map_err(invalid)?)
            }
            OperationKind::EditMetadata => {
                Box::new(EditMetadataOperation::from_params(params).map_err(invalid)?)
            }
            OperationKind::Compress => {
                Box::new(CompressOperation::from_params(params).map_err(invalid)?)
            }
            OperationKind::ExtractText => {
                Box::new(ExtractTextOperation::from_params(params).map_err(invalid)?)
            }
        };

        Ok(operation)
    }

    /// Checks that every config names a known operation and carries
    /// parameters that operation accepts. Used to reject a bad batch
    /// request before any file is touched.
    pub fn check_configs(configs: &[OperationConfig]) -> Result<(), ValidationError> {
        for config in configs {
            Self::create(config)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_each_known_kind() {
        let configs = [
            json!({"type": "noop"}),
            json!({"type": "rotate_pages", "parameters": {"rotation": 180}}),
            json!({"type": "delete_pages", "parameters": {"pages": [1]}}),
            json!({"type": "edit_metadata", "parameters": {"title": "T"}}),
            json!({"type": "compress"}),
            json!({"type": "extract_text"}),
        ];

        for raw in configs {
            let config: OperationConfig = serde_json::from_value(raw).unwrap();
            let op = OperationRegistry::create(&config).unwrap();
            assert_eq!(op.kind().tag(), config.kind);
        }
    }

    #[test]
    fn test_unknown_tag_is_typed_error() {
        let config = OperationConfig::new("ocr_edit_text");
        let result = OperationRegistry::create(&config);
        assert!(matches!(
            result,
            Err(ValidationError::UnknownOperationType { tag }) if tag == "ocr_edit_text"
        ));
    }

    #[test]
    fn test_bad_parameters_are_typed_errors() {
        let config: OperationConfig =
            serde_json::from_value(json!({"type": "rotate_pages", "parameters": {"rotation": 45}}))
                .unwrap();
        assert!(matches!(
            OperationRegistry::create(&config),
            Err(ValidationError::InvalidOperationConfig { .. })
        ));
    }

    #[test]
    fn test_check_configs_reports_first_offender() {
        let configs = vec![
            OperationConfig::new("noop"),
            OperationConfig::new("set_password"),
        ];
        assert!(matches!(
            OperationRegistry::check_configs(&configs),
            Err(ValidationError::UnknownOperationType { tag }) if tag == "set_password"
        ));
    }
}
