use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::info_span;

use crate::batch::progress::{BatchEvent, BroadcastProgress, NoopProgress, ProgressReporter};
use crate::batch::task::BatchTask;
use crate::document::PdfDocument;
use crate::error::{PdfmillError, ValidationError, WorkerError};
use crate::operation::{OperationPipeline, OperationRegistry, PipelineSummary};

/// Immutable per-run settings snapshot. Each `run` receives its own
/// copy; there is no global configuration.
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub max_workers: usize,
    pub continue_on_error: bool,
    /// Cooperative per-task deadline, checked between operations.
    pub task_deadline: Option<Duration>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            continue_on_error: true,
            task_deadline: None,
        }
    }
}

impl BatchSettings {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_workers < 1 {
            return Err(ValidationError::BadWorkerCount);
        }
        Ok(())
    }
}

/// The outcome of one task. Appended to the shared result collection
/// exactly once per started task, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub task: BatchTask,
    pub success: bool,
    pub error_message: Option<String>,
    /// Wall-clock seconds spent on this task.
    pub processing_time: f64,
    pub output_size: Option<u64>,
    /// Per-operation counts from the document pipeline, when it ran.
    pub pipeline: Option<PipelineSummary>,
}

impl BatchResult {
    fn succeeded(
        task: BatchTask,
        processing_time: f64,
        output_size: u64,
        pipeline: PipelineSummary,
    ) -> Self {
        Self {
            task,
            success: true,
            error_message: None,
            processing_time,
            output_size: Some(output_size),
            pipeline: Some(pipeline),
        }
    }

    fn failed(task: BatchTask, error_message: String, processing_time: f64) -> Self {
        Self {
            task,
            success: false,
            error_message: Some(error_message),
            processing_time,
            output_size: None,
            pipeline: None,
        }
    }
}

/// Aggregate of one batch run. Computed once after every started task
/// has reported; all statistics are commutative, so worker completion
/// order never changes them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_files: usize,
    pub successful: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Wall-clock seconds for the whole batch.
    pub total_time: f64,
    pub total_input_size: u64,
    pub total_output_size: u64,
    pub results: Vec<BatchResult>,
    pub cancelled_tasks: Vec<BatchTask>,
}

/// Exactly one message per task flows back to the collector.
enum TaskMessage {
    Completed(BatchResult),
    Cancelled(BatchTask),
}

/// Runs batch tasks concurrently under a bounded worker pool.
///
/// Every task owns its document handle, pipeline, and operation
/// instances exclusively; the only thing workers share is the result
/// channel and the cancellation flag.
pub struct BatchExecutor {
    settings: BatchSettings,
    progress_sender: Option<Arc<broadcast::Sender<BatchEvent>>>,
}

impl BatchExecutor {
    pub fn new(settings: BatchSettings) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            settings,
            progress_sender: None,
        })
    }

    /// An executor that streams task lifecycle events to `sender`.
    pub fn with_progress_sender(
        settings: BatchSettings,
        sender: Arc<broadcast::Sender<BatchEvent>>,
    ) -> Result<Self, ValidationError> {
        settings.validate()?;
        Ok(Self {
            settings,
            progress_sender: Some(sender),
        })
    }

    pub fn run(&self, tasks: Vec<BatchTask>) -> BatchSummary {
        let started = Instant::now();
        let total_files = tasks.len();
        let total_input_size: u64 = tasks.iter().map(|t| t.metadata.original_size).sum();

        if tasks.is_empty() {
            return BatchSummary {
                total_files: 0,
                successful: 0,
                failed: 0,
                cancelled: 0,
                total_time: started.elapsed().as_secs_f64(),
                total_input_size: 0,
                total_output_size: 0,
                results: Vec::new(),
                cancelled_tasks: Vec::new(),
            };
        }

        let worker_count = self.settings.max_workers.min(tasks.len());
        let (task_sender, task_receiver) = bounded::<BatchTask>(tasks.len());
        let (result_sender, result_receiver) = bounded::<TaskMessage>(tasks.len());
        let cancel = Arc::new(AtomicBool::new(false));

        let mut workers: Vec<JoinHandle<()>> = Vec::with_capacity(worker_count);
        for worker_id in 0..worker_count {
            let task_rx = task_receiver.clone();
            let result_tx = result_sender.clone();
            let cancel_flag = Arc::clone(&cancel);
            let continue_on_error = self.settings.continue_on_error;
            let deadline = self.settings.task_deadline;
            let progress_sender = self.progress_sender.clone();

            workers.push(thread::spawn(move || {
                run_worker(
                    worker_id,
                    task_rx,
                    result_tx,
                    cancel_flag,
                    continue_on_error,
                    deadline,
                    progress_sender,
                );
            }));
        }
        drop(task_receiver);
        drop(result_sender);

        info!("Started {} workers for {} tasks", worker_count, total_files);

        // The channel holds every task, so these sends never block.
        for task in tasks {
            if task_sender.send(task).is_err() {
                break;
            }
        }
        drop(task_sender);

        let mut results = Vec::with_capacity(total_files);
        let mut cancelled_tasks = Vec::new();
        for message in result_receiver.iter() {
            match message {
                TaskMessage::Completed(result) => results.push(result),
                TaskMessage::Cancelled(task) => cancelled_tasks.push(task),
            }
        }

        for (worker_id, worker) in workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", worker_id, e);
            } else {
                debug!("Worker {} finished", worker_id);
            }
        }

        let successful = results.iter().filter(|r| r.success).count();
        let failed = results.len() - successful;
        let total_output_size: u64 = results.iter().filter_map(|r| r.output_size).sum();
        let total_time = started.elapsed().as_secs_f64();

        info!(
            "Batch completed in {:.2}s: {} successful, {} failed, {} cancelled",
            total_time,
            successful,
            failed,
            cancelled_tasks.len()
        );

        BatchSummary {
            total_files,
            successful,
            failed,
            cancelled: cancelled_tasks.len(),
            total_time,
            total_input_size,
            total_output_size,
            results,
            cancelled_tasks,
        }
    }
}

fn run_worker(
    worker_id: usize,
    task_receiver: Receiver<BatchTask>,
    result_sender: Sender<TaskMessage>,
    cancel: Arc<AtomicBool>,
    continue_on_error: bool,
    deadline: Option<Duration>,
    progress_sender: Option<Arc<broadcast::Sender<BatchEvent>>>,
) {
    debug!("Worker {} started", worker_id);

    let reporter: Box<dyn ProgressReporter> = match progress_sender {
        Some(sender) => Box::new(BroadcastProgress::new(sender)),
        None => Box::new(NoopProgress),
    };

    while let Ok(task) = task_receiver.recv() {
        if cancel.load(Ordering::Relaxed) {
            debug!(
                "Worker {} draining cancelled task: {}",
                worker_id,
                task.input_file.display()
            );
            reporter.report(BatchEvent::TaskCancelled {
                task_id: task.id.clone(),
                input_file: task.input_file.display().to_string(),
            });
            if result_sender.send(TaskMessage::Cancelled(task)).is_err() {
                break;
            }
            continue;
        }

        reporter.report(BatchEvent::TaskStarted {
            task_id: task.id.clone(),
            input_file: task.input_file.display().to_string(),
        });

        let result = process_task(&task, deadline);

        if !result.success && !continue_on_error {
            info!(
                "Task {} failed with continue_on_error disabled; cancelling remaining tasks",
                task.input_file.display()
            );
            cancel.store(true, Ordering::Relaxed);
        }

        let event = if result.success {
            BatchEvent::TaskCompleted {
                task_id: task.id.clone(),
                input_file: task.input_file.display().to_string(),
                processing_time: result.processing_time,
                output_size: result.output_size,
            }
        } else {
            BatchEvent::TaskFailed {
                task_id: task.id.clone(),
                input_file: task.input_file.display().to_string(),
                error: result.error_message.clone().unwrap_or_default(),
            }
        };
        reporter.report(event);

        if result_sender.send(TaskMessage::Completed(result)).is_err() {
            error!("Worker {} failed to send result", worker_id);
            break;
        }
    }

    debug!("Worker {} stopped", worker_id);
}

fn process_task(task: &BatchTask, deadline: Option<Duration>) -> BatchResult {
    let _span = info_span!("batch_task", task_id = %task.id, input = %task.input_file.display())
        .entered();
    let started = Instant::now();

    match run_task(task, deadline.map(|d| started + d)) {
        Ok((pipeline, output_size)) => {
            debug!("Processed: {}", task.input_file.display());
            BatchResult::succeeded(
                task.clone(),
                started.elapsed().as_secs_f64(),
                output_size,
                pipeline,
            )
        }
        Err(e) => {
            error!("Failed: {}: {}", task.input_file.display(), e);
            BatchResult::failed(task.clone(), e.to_string(), started.elapsed().as_secs_f64())
        }
    }
}

/// One task, start to finish: fresh handle, fresh pipeline, fresh
/// operation instances, persist, measure.
fn run_task(
    task: &BatchTask,
    deadline: Option<Instant>,
) -> Result<(PipelineSummary, u64), PdfmillError> {
    let mut document = PdfDocument::open(&task.input_file)?;

    let mut pipeline = match deadline {
        Some(deadline) => OperationPipeline::with_deadline(deadline),
        None => OperationPipeline::new(),
    };
    for config in &task.operations {
        pipeline.add(OperationRegistry::create(config)?);
    }

    let report = pipeline.run(&mut document);
    if report.deadline_exceeded {
        return Err(PdfmillError::Worker(WorkerError::DeadlineExceeded));
    }

    let output_size = document.save_to(&task.output_file)?;
    Ok((report.summary(), output_size))
}
