use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::info;

use crate::batch::executor::{BatchExecutor, BatchSettings, BatchSummary};
use crate::batch::task::build_tasks;
use crate::error::{PdfmillError, ValidationError};
use crate::operation::{OperationConfig, OperationRegistry};
use crate::template::TemplateStore;

fn default_max_workers() -> usize {
    num_cpus::get()
}

fn default_true() -> bool {
    true
}

/// A complete batch run description, as consumed from callers or
/// configuration files: what to match, where to write, and either a
/// literal operation list or a template reference with parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRequest {
    pub input_pattern: String,
    pub output_dir: PathBuf,
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_true")]
    pub continue_on_error: bool,
    #[serde(default)]
    pub preserve_structure: bool,
    #[serde(default)]
    pub task_deadline_secs: Option<u64>,
}

impl BatchRequest {
    pub fn from_json(content: &str) -> Result<Self, ValidationError> {
        let request: Self = serde_json::from_str(content)?;
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.input_pattern.trim().is_empty() {
            return Err(ValidationError::EmptyPattern);
        }
        if self.max_workers < 1 {
            return Err(ValidationError::BadWorkerCount);
        }
        if self.operations.is_empty() && self.template.is_none() {
            return Err(ValidationError::NoOperations);
        }
        Ok(())
    }

    pub fn settings(&self) -> BatchSettings {
        BatchSettings {
            max_workers: self.max_workers,
            continue_on_error: self.continue_on_error,
            task_deadline: self.task_deadline_secs.map(Duration::from_secs),
        }
    }
}

/// Runs one batch request end to end: resolve the operation list
/// (template or literal), reject bad configuration before touching any
/// file, build the task list, execute.
pub fn execute_request(
    request: &BatchRequest,
    templates: &TemplateStore,
) -> Result<BatchSummary, PdfmillError> {
    request.validate()?;

    let operations = match &request.template {
        Some(name) => templates.expand(name, &request.parameters)?,
        None => request.operations.clone(),
    };
    if operations.is_empty() {
        return Err(ValidationError::NoOperations.into());
    }
    OperationRegistry::check_configs(&operations)?;

    let tasks = build_tasks(
        &request.input_pattern,
        &request.output_dir,
        &operations,
        request.preserve_structure,
    )?;

    info!(
        "Executing batch request: {} tasks, {} operations each",
        tasks.len(),
        operations.len()
    );

    let executor = BatchExecutor::new(request.settings())?;
    Ok(executor.run(tasks))
}
