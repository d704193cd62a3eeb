//! Output formatting for rendered templates and failures.

use crate::cli::OutputFormat;
use crate::orchestrator::{Failure, RunResult};
use camino::Utf8Path;

/// Formatter for run output. Rendered HTML goes to stdout; in human format
/// failures and the summary go to stderr.
pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a rendered template.
    pub fn print_rendered(&self, file: &Utf8Path, html: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", html),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "type": "render",
                    "file": file.as_str(),
                    "html": html,
                });
                println!("{}", json);
            }
        }
    }

    /// Report a rendered template written to disk.
    pub fn print_written(&self, file: &Utf8Path, out: &Utf8Path) {
        match self.format {
            OutputFormat::Human => eprintln!("{} -> {}", file, out),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "type": "write",
                    "file": file.as_str(),
                    "out": out.as_str(),
                });
                println!("{}", json);
            }
        }
    }

    /// Print a failure.
    pub fn print_failure(&self, failure: &Failure) {
        match self.format {
            OutputFormat::Human => eprintln!("{}", format_failure_human(failure)),
            OutputFormat::Json => println!("{}", failure_json(failure)),
        }
    }

    /// Print the summary.
    pub fn print_summary(&self, result: &RunResult) {
        match self.format {
            OutputFormat::Human => self.print_summary_human(result),
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "type": "summary",
                    "files": result.file_count,
                    "errors": result.error_count,
                    "duration_ms": result.duration_ms
                });
                println!("{}", json);
            }
        }
    }

    fn print_summary_human(&self, result: &RunResult) {
        if result.error_count == 0 {
            eprintln!(
                "\x1b[32m✓\x1b[0m {} templates OK ({}ms)",
                result.file_count, result.duration_ms
            );
        } else {
            eprintln!(
                "\x1b[31m✗\x1b[0m Found {} error{} in {} templates",
                result.error_count,
                if result.error_count == 1 { "" } else { "s" },
                result.file_count
            );
            eprintln!("Time: {}ms", result.duration_ms);
        }
    }
}

/// `file:line:col: error[code]: message`, without the position when the
/// error does not point into the file.
pub fn format_failure_human(failure: &Failure) -> String {
    let location = match failure.location {
        Some(position) => format!("{}:{}", failure.file, position),
        None => failure.file.to_string(),
    };
    format!(
        "{}: \x1b[31merror\x1b[0m[{}]: {}",
        location,
        failure.error.code(),
        failure.error
    )
}

fn failure_json(failure: &Failure) -> serde_json::Value {
    let (line, column) = failure
        .location
        .map(|position| position.to_display())
        .unzip();
    serde_json::json!({
        "type": "error",
        "file": failure.file.as_str(),
        "code": failure.error.code(),
        "message": failure.error.to_string(),
        "line": line,
        "column": column,
    })
}
