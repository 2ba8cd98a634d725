pub mod batch;
pub mod document;
pub mod error;
pub mod operation;
pub mod template;

#[cfg(test)]
mod test_support;

pub use batch::{
    build_tasks, execute_request, render, BatchEvent, BatchExecutor, BatchRequest, BatchResult,
    BatchSettings, BatchSummary, BatchTask, ReportFormat,
};
pub use document::PdfDocument;
pub use error::{
    DocumentError, OperationError, PdfmillError, ReportError, Result, ValidationError, WorkerError,
};
pub use operation::{
    Operation, OperationConfig, OperationKind, OperationPipeline, OperationRegistry, Outcome,
    OutcomeStatus, PipelineReport, PipelineSummary,
};
pub use template::{expand_template, Template, TemplateStore};
