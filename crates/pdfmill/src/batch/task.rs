use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::operation::OperationConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskMetadata {
    pub original_size: u64,
    pub created_at: DateTime<Utc>,
}

/// One unit of batch work: one input file mapped to one output file,
/// plus the operation list to apply. Immutable once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchTask {
    pub id: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub operations: Vec<OperationConfig>,
    pub metadata: TaskMetadata,
}

impl BatchTask {
    pub fn new(
        input_file: PathBuf,
        output_file: PathBuf,
        operations: Vec<OperationConfig>,
        original_size: u64,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            input_file,
            output_file,
            operations,
            metadata: TaskMetadata {
                original_size,
                created_at: Utc::now(),
            },
        }
    }
}

/// Expands a file-matching pattern into one task per discovered file.
///
/// Inputs are deduplicated by canonical path — two tasks over the same
/// file would race on it. With `preserve_structure`, each input's path
/// relative to the pattern's static prefix is mirrored under
/// `output_dir`; without it outputs are flattened, and leaf-name
/// collisions get a numeric suffix instead of silently overwriting.
pub fn build_tasks(
    pattern: &str,
    output_dir: &Path,
    operations: &[OperationConfig],
    preserve_structure: bool,
) -> Result<Vec<BatchTask>, ValidationError> {
    if pattern.trim().is_empty() {
        return Err(ValidationError::EmptyPattern);
    }

    let entries = glob::glob(pattern).map_err(|e| ValidationError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut inputs: Vec<PathBuf> = Vec::new();
    let mut seen = HashSet::new();
    for entry in entries {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable glob entry: {}", e);
                continue;
            }
        };
        if !path.is_file() {
            continue;
        }
        // Canonicalize for dedup so `a.pdf` and `./a.pdf` count once.
        let key = path.canonicalize().unwrap_or_else(|_| path.clone());
        if seen.insert(key) {
            inputs.push(path);
        }
    }
    inputs.sort();

    if inputs.is_empty() {
        return Err(ValidationError::NoMatches {
            pattern: pattern.to_string(),
        });
    }

    let base = pattern_base(pattern);
    let mut used_outputs = HashSet::new();
    let mut tasks = Vec::with_capacity(inputs.len());

    for input in inputs {
        let original_size = match std::fs::metadata(&input) {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!("Skipping {}: {}", input.display(), e);
                continue;
            }
        };

        let relative: PathBuf = if preserve_structure {
            input
                .strip_prefix(&base)
                .map(Path::to_path_buf)
                .unwrap_or_else(|_| leaf_name(&input))
        } else {
            leaf_name(&input)
        };

        let output_file = disambiguate(&mut used_outputs, output_dir.join(relative));
        tasks.push(BatchTask::new(
            input,
            output_file,
            operations.to_vec(),
            original_size,
        ));
    }

    if tasks.is_empty() {
        return Err(ValidationError::NoMatches {
            pattern: pattern.to_string(),
        });
    }

    info!("Built {} batch tasks for pattern {}", tasks.len(), pattern);
    Ok(tasks)
}

fn leaf_name(path: &Path) -> PathBuf {
    path.file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("document.pdf"))
}

/// The longest leading run of pattern components containing no glob
/// metacharacters. `/data/in/**/*.pdf` -> `/data/in`.
fn pattern_base(pattern: &str) -> PathBuf {
    let mut base = PathBuf::new();
    for component in Path::new(pattern).components() {
        let text = component.as_os_str().to_string_lossy();
        if text.contains(['*', '?', '[']) {
            break;
        }
        base.push(component);
    }
    base
}

/// Reserves an unused output path, appending `_2`, `_3`, … before the
/// extension when the candidate is already taken (same policy the
/// storage layer uses for on-disk conflicts).
fn disambiguate(used: &mut HashSet<PathBuf>, candidate: PathBuf) -> PathBuf {
    if used.insert(candidate.clone()) {
        return candidate;
    }

    let stem = candidate
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    let extension = candidate.extension().map(|e| e.to_string_lossy().into_owned());
    let parent = candidate.parent().map(Path::to_path_buf).unwrap_or_default();

    for counter in 2u32.. {
        let filename = match &extension {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let next = parent.join(filename);
        if used.insert(next.clone()) {
            return next;
        }
    }

    unreachable!("counter space exhausted");
}
