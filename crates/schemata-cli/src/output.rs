//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), with specialized
//! support for validation reports.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use schemata_core::{ValidationError, ValidationOutcome};
use serde::Serialize;
use std::io::{self, Write};
use tracing::trace;

/// The validation result for one document, as printed by `validate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentReport {
    /// Document path, or `-` for standard input
    pub document: String,
    /// Resource type the document was validated against
    pub resource_type: String,
    #[serde(flatten)]
    pub outcome: ValidationOutcome,
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format the reports of one `validate` run
    fn format_reports(&self, reports: &[DocumentReport], use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // No dedicated rendering: pretty JSON reads well enough
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_reports(&self, reports: &[DocumentReport], use_color: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_reports_human(reports, use_color)),
            _ => self.format(&reports),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write an error message
    pub fn error(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.red().to_string())
        } else {
            self.writeln(&format!("ERROR: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");

        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }

    /// Write the reports of a `validate` run
    ///
    /// Quiet mode still prints failing documents in human format.
    pub fn reports(&mut self, reports: &[DocumentReport]) -> Result<()> {
        if self.format == OutputFormat::Human && self.quiet {
            let failing: Vec<DocumentReport> = reports
                .iter()
                .filter(|r| !r.outcome.is_valid())
                .cloned()
                .collect();
            if failing.is_empty() {
                return Ok(());
            }
            let formatted = self.format.format_reports(&failing, self.use_color)?;
            return self.write(&formatted);
        }

        let formatted = self.format.format_reports(reports, self.use_color)?;
        if formatted.ends_with('\n') {
            self.write(&formatted)
        } else {
            self.writeln(&formatted)
        }
    }
}

/// Render reports for a terminal: one header line per document, one line per error
fn format_reports_human(reports: &[DocumentReport], use_color: bool) -> String {
    let mut output = String::new();

    for report in reports {
        let header = if report.outcome.is_valid() {
            let line = format!("✓ {}: valid {}", report.document, report.resource_type);
            if use_color {
                line.green().to_string()
            } else {
                line
            }
        } else {
            let line = format!(
                "✗ {}: {} error(s) against {}",
                report.document,
                report.outcome.error_count(),
                report.resource_type
            );
            if use_color {
                line.red().to_string()
            } else {
                line
            }
        };
        output.push_str(&header);
        output.push('\n');

        for error in report.outcome.errors() {
            output.push_str("    ");
            output.push_str(&format_error_line(error, use_color));
            output.push('\n');
        }
    }

    output
}

fn format_error_line(error: &ValidationError, use_color: bool) -> String {
    if use_color {
        format!(
            "{}: {} {}",
            error.path.bold(),
            error.message,
            format!("({})", error.keyword).dimmed()
        )
    } else {
        error.to_string()
    }
}
