use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info_span, warn};

use crate::document::PdfDocument;
use crate::operation::{Operation, Outcome, OutcomeStatus};

/// One slot of a pipeline run: the operation's tag, its queue position,
/// and what happened when it ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationRecord {
    pub tag: String,
    pub index: usize,
    pub status: OutcomeStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub details: Map<String, Value>,
}

/// Derived counts for one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PipelineSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
}

/// The full account of one pipeline run: exactly one record per queued
/// operation, in queue order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub records: Vec<OperationRecord>,
    pub deadline_exceeded: bool,
}

impl PipelineReport {
    pub fn summary(&self) -> PipelineSummary {
        let total = self.records.len();
        // Anything short of full success — failed, partial, skipped —
        // counts against the pipeline.
        let successful = self
            .records
            .iter()
            .filter(|r| r.status == OutcomeStatus::Success)
            .count();
        let failed = total - successful;
        let success_rate = if total == 0 {
            0.0
        } else {
            successful as f64 / total as f64 * 100.0
        };

        PipelineSummary {
            total,
            successful,
            failed,
            success_rate,
        }
    }
}

/// Runs an ordered list of operations against one open document.
///
/// One operation's failure never prevents the remaining operations from
/// attempting to run; the pipeline only reports the aggregate. The run
/// is strictly sequential within a document — concurrency lives one
/// level up, across documents.
pub struct OperationPipeline {
    operations: Vec<Box<dyn Operation>>,
    deadline: Option<Instant>,
}

impl Default for OperationPipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl OperationPipeline {
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            deadline: None,
        }
    }

    /// A pipeline that stops starting new operations once `deadline`
    /// has passed. Checked between operations only — a blocking
    /// operation is never preempted.
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            operations: Vec::new(),
            deadline: Some(deadline),
        }
    }

    pub fn add(&mut self, operation: Box<dyn Operation>) {
        self.operations.push(operation);
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn run(&self, document: &mut PdfDocument) -> PipelineReport {
        let _pipeline_span = info_span!("pipeline", operations = self.operations.len()).entered();

        let mut records = Vec::with_capacity(self.operations.len());
        let mut deadline_exceeded = false;

        for (index, operation) in self.operations.iter().enumerate() {
            let tag = operation.kind().tag();

            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    deadline_exceeded = true;
                    records.push(OperationRecord {
                        tag: tag.to_string(),
                        index,
                        status: OutcomeStatus::Skipped,
                        message: "deadline exceeded".to_string(),
                        details: Map::new(),
                    });
                    continue;
                }
            }

            let _op_span = info_span!("operation", tag, index).entered();

            let outcome = match operation.validate(document) {
                Ok(true) => match operation.execute(document) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!("Operation {} ({}) failed: {}", index, tag, e);
                        failed_outcome(e.to_string())
                    }
                },
                Ok(false) => {
                    warn!("Operation {} ({}) validation failed", index, tag);
                    failed_outcome("validation failed".to_string())
                }
                Err(e) => {
                    warn!("Operation {} ({}) validation failed: {}", index, tag, e);
                    failed_outcome(format!("validation failed: {}", e))
                }
            };

            records.push(OperationRecord {
                tag: tag.to_string(),
                index,
                status: outcome.status,
                message: outcome.message,
                details: outcome.details,
            });
        }

        PipelineReport {
            records,
            deadline_exceeded,
        }
    }
}

fn failed_outcome(message: String) -> Outcome {
    Outcome {
        status: OutcomeStatus::Failed,
        message,
        details: Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OperationError;
    use crate::operation::OperationKind;
    use crate::test_support::open_test_pdf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// Scripted operation for exercising the pipeline contract.
    struct Scripted {
        valid: bool,
        validate_error: bool,
        execute_error: bool,
        executions: Arc<AtomicUsize>,
    }

    impl Scripted {
        fn ok(executions: &Arc<AtomicUsize>) -> Box<dyn Operation> {
            Box::new(Self {
                valid: true,
                validate_error: false,
                execute_error: false,
                executions: Arc::clone(executions),
            })
        }

        fn invalid(executions: &Arc<AtomicUsize>) -> Box<dyn Operation> {
            Box::new(Self {
                valid: false,
                validate_error: false,
                execute_error: false,
                executions: Arc::clone(executions),
            })
        }

        fn validate_faults(executions: &Arc<AtomicUsize>) -> Box<dyn Operation> {
            Box::new(Self {
                valid: false,
                validate_error: true,
                execute_error: false,
                executions: Arc::clone(executions),
            })
        }

        fn execute_faults(executions: &Arc<AtomicUsize>) -> Box<dyn Operation> {
            Box::new(Self {
                valid: true,
                validate_error: false,
                execute_error: true,
                executions: Arc::clone(executions),
            })
        }
    }

    impl Operation for Scripted {
        fn kind(&self) -> OperationKind {
            OperationKind::Noop
        }

        fn validate(&self, _document: &PdfDocument) -> Result<bool, OperationError> {
            if self.validate_error {
                return Err(OperationError::InvalidParameter {
                    name: "scripted",
                    reason: "forced validate fault".to_string(),
                });
            }
            Ok(self.valid)
        }

        fn execute(&self, _document: &mut PdfDocument) -> Result<Outcome, OperationError> {
            self.executions.fetch_add(1, Ordering::SeqCst);
            if self.execute_error {
                return Err(OperationError::InvalidParameter {
                    name: "scripted",
                    reason: "forced execute fault".to_string(),
                });
            }
            Ok(Outcome::success("ok"))
        }
    }

    #[test]
    fn test_empty_pipeline() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let pipeline = OperationPipeline::new();

        let report = pipeline.run(&mut doc);
        assert!(report.records.is_empty());

        let summary = report.summary();
        assert_eq!(summary.total, 0);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_record_per_operation_even_when_all_fail() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let executions = Arc::new(AtomicUsize::new(0));

        let mut pipeline = OperationPipeline::new();
        for _ in 0..4 {
            pipeline.add(Scripted::execute_faults(&executions));
        }

        let report = pipeline.run(&mut doc);
        assert_eq!(report.records.len(), 4);
        assert!(report
            .records
            .iter()
            .all(|r| r.status == OutcomeStatus::Failed));

        let summary = report.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.failed, 4);
        assert_eq!(summary.success_rate, 0.0);
    }

    #[test]
    fn test_failed_validation_skips_execute_and_continues() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let invalid_execs = Arc::new(AtomicUsize::new(0));
        let ok_execs = Arc::new(AtomicUsize::new(0));

        let mut pipeline = OperationPipeline::new();
        pipeline.add(Scripted::invalid(&invalid_execs));
        pipeline.add(Scripted::ok(&ok_execs));

        let report = pipeline.run(&mut doc);

        // execute is never invoked for the operation whose validate failed
        assert_eq!(invalid_execs.load(Ordering::SeqCst), 0);
        // the next operation still ran
        assert_eq!(ok_execs.load(Ordering::SeqCst), 1);

        assert_eq!(report.records[0].status, OutcomeStatus::Failed);
        assert_eq!(report.records[0].message, "validation failed");
        assert_eq!(report.records[1].status, OutcomeStatus::Success);
    }

    #[test]
    fn test_validate_fault_is_captured_not_propagated() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let executions = Arc::new(AtomicUsize::new(0));

        let mut pipeline = OperationPipeline::new();
        pipeline.add(Scripted::validate_faults(&executions));
        pipeline.add(Scripted::ok(&executions));

        let report = pipeline.run(&mut doc);
        assert_eq!(report.records.len(), 2);
        assert!(report.records[0].message.contains("validation failed"));
        assert!(report.records[0].message.contains("forced validate fault"));
    }

    #[test]
    fn test_records_keep_queue_order_and_indices() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let executions = Arc::new(AtomicUsize::new(0));

        let mut pipeline = OperationPipeline::new();
        pipeline.add(Scripted::ok(&executions));
        pipeline.add(Scripted::execute_faults(&executions));
        pipeline.add(Scripted::ok(&executions));

        let report = pipeline.run(&mut doc);
        let indices: Vec<usize> = report.records.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1, 2]);

        let summary = report.summary();
        assert_eq!(summary.successful, 2);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate - 66.666).abs() < 0.1);
    }

    #[test]
    fn test_expired_deadline_skips_remaining_operations() {
        let (_tmp, mut doc) = open_test_pdf(1);
        let executions = Arc::new(AtomicUsize::new(0));

        // A deadline already in the past: nothing may start.
        let mut pipeline =
            OperationPipeline::with_deadline(Instant::now() - Duration::from_secs(1));
        pipeline.add(Scripted::ok(&executions));
        pipeline.add(Scripted::ok(&executions));

        let report = pipeline.run(&mut doc);
        assert!(report.deadline_exceeded);
        assert_eq!(report.records.len(), 2);
        assert!(report
            .records
            .iter()
            .all(|r| r.status == OutcomeStatus::Skipped));
        assert_eq!(executions.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_real_operations_through_pipeline() {
        use crate::operation::{OperationConfig, OperationRegistry};
        use serde_json::json;

        let (_tmp, mut doc) = open_test_pdf(3);

        let configs = vec![
            serde_json::from_value::<OperationConfig>(
                json!({"type": "rotate_pages", "parameters": {"rotation": 90}}),
            )
            .unwrap(),
            serde_json::from_value::<OperationConfig>(
                json!({"type": "delete_pages", "parameters": {"pages": [3]}}),
            )
            .unwrap(),
            serde_json::from_value::<OperationConfig>(json!({"type": "compress"})).unwrap(),
        ];

        let mut pipeline = OperationPipeline::new();
        for config in &configs {
            pipeline.add(OperationRegistry::create(config).unwrap());
        }

        let report = pipeline.run(&mut doc);
        assert_eq!(report.records.len(), 3);
        assert_eq!(report.summary().failed, 0);
        assert_eq!(doc.page_count(), 2);
    }
}
