use std::fmt::Write;

use crate::batch::executor::{BatchResult, BatchSummary};
use crate::error::ReportError;

/// Output representations for a batch summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Json,
    Csv,
    Text,
}

impl ReportFormat {
    pub fn from_tag(tag: &str) -> Result<Self, ReportError> {
        match tag.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "text" => Ok(Self::Text),
            _ => Err(ReportError::UnsupportedFormat {
                format: tag.to_string(),
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "text",
        }
    }
}

/// Renders a batch summary. Pure: the same summary renders to the same
/// bytes every time — nothing here reads the clock or the filesystem.
/// Writing the rendered report anywhere is the caller's business.
pub fn render(summary: &BatchSummary, format: ReportFormat) -> Result<String, ReportError> {
    match format {
        ReportFormat::Json => Ok(serde_json::to_string_pretty(summary)?),
        ReportFormat::Csv => Ok(render_csv(summary)),
        ReportFormat::Text => Ok(render_text(summary)),
    }
}

fn size_reduction(result: &BatchResult) -> Option<f64> {
    let original = result.task.metadata.original_size;
    let output = result.output_size?;
    if original == 0 {
        return None;
    }
    Some((original as f64 - output as f64) / original as f64 * 100.0)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn render_csv(summary: &BatchSummary) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail; the Results are discarded.
    let _ = writeln!(
        out,
        "File,Status,Time (s),Original Size,Output Size,Reduction,Error"
    );

    for result in &summary.results {
        let status = if result.success { "Success" } else { "Failed" };
        let output_size = result
            .output_size
            .map(|s| s.to_string())
            .unwrap_or_default();
        let reduction = size_reduction(result)
            .map(|r| format!("{:.1}%", r))
            .unwrap_or_default();
        let error = result.error_message.as_deref().unwrap_or("");

        let _ = writeln!(
            out,
            "{},{},{:.2},{},{},{},{}",
            csv_field(&result.task.input_file.display().to_string()),
            status,
            result.processing_time,
            result.task.metadata.original_size,
            output_size,
            reduction,
            csv_field(error),
        );
    }

    for task in &summary.cancelled_tasks {
        let _ = writeln!(
            out,
            "{},Cancelled,,{},,,",
            csv_field(&task.input_file.display().to_string()),
            task.metadata.original_size,
        );
    }

    out
}

fn render_text(summary: &BatchSummary) -> String {
    let mut out = String::new();

    let _ = writeln!(out, "Batch Processing Report");
    let _ = writeln!(out, "=======================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Total files:  {}", summary.total_files);
    let _ = writeln!(out, "Successful:   {}", summary.successful);
    let _ = writeln!(out, "Failed:       {}", summary.failed);
    let _ = writeln!(out, "Cancelled:    {}", summary.cancelled);
    let _ = writeln!(out, "Total time:   {:.2}s", summary.total_time);
    let _ = writeln!(out, "Input size:   {} bytes", summary.total_input_size);
    let _ = writeln!(out, "Output size:  {} bytes", summary.total_output_size);
    let _ = writeln!(out);

    if !summary.results.is_empty() {
        let _ = writeln!(out, "{:<10} {:>8} {:>12}  FILE", "STATUS", "TIME", "SIZE");
        for result in &summary.results {
            let status = if result.success { "ok" } else { "FAILED" };
            let size = result
                .output_size
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(
                out,
                "{:<10} {:>7.2}s {:>12}  {}",
                status,
                result.processing_time,
                size,
                result.task.input_file.display(),
            );
            if let Some(error) = &result.error_message {
                let _ = write!(out, " ({})", error);
            }
            let _ = writeln!(out);
        }
    }

    for task in &summary.cancelled_tasks {
        let _ = writeln!(
            out,
            "{:<10} {:>8} {:>12}  {}",
            "cancelled", "-", "-", task.input_file.display()
        );
    }

    out
}
