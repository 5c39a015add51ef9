// Output formatting for CLI

use serde_json::Value;
use std::io::Write;

use super::{CliResult, OutputFormat};

/// Format and output data
pub struct OutputFormatter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Output a report
    pub fn output(&self, report: &Value, writer: &mut impl Write) -> CliResult<()> {
        match self.format {
            OutputFormat::Pretty => {
                writeln!(writer, "{}", serde_json::to_string_pretty(report)?)?;
            }
            OutputFormat::Json => {
                writeln!(writer, "{}", serde_json::to_string(report)?)?;
            }
            OutputFormat::KeyValue => {
                let mut lines = Vec::new();
                flatten("", report, &mut lines);
                for (key, value) in lines {
                    writeln!(writer, "{}: {}", key, value)?;
                }
            }
            OutputFormat::Table => {
                self.output_table(report, writer)?;
            }
        }
        Ok(())
    }

    /// Scalars as aligned key/value rows, arrays of objects as column tables
    fn output_table(&self, report: &Value, writer: &mut impl Write) -> CliResult<()> {
        let Some(obj) = report.as_object() else {
            writeln!(writer, "{}", format_value(report))?;
            return Ok(());
        };

        let max_key_len = obj.keys().map(|k| k.len()).max().unwrap_or(0);
        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;

        for (key, value) in obj {
            match value {
                Value::Array(rows) if rows.iter().any(Value::is_object) => {
                    writeln!(writer, "{}:", key)?;
                    write_rows(rows, writer)?;
                }
                _ => {
                    writeln!(
                        writer,
                        "{:<width$}: {}",
                        format!("{}:", key),
                        format_value(value),
                        width = max_key_len + 2
                    )?;
                }
            }
        }

        writeln!(writer, "{}", "=".repeat(max_key_len + 30))?;
        Ok(())
    }

    /// Print success message
    pub fn print_success(&self, message: &str) {
        if !self.quiet {
            eprintln!("✓ {}", message);
        }
    }

    /// Print error message
    pub fn print_error(&self, message: &str) {
        eprintln!("✗ {}", message);
    }

    /// Print info message
    pub fn print_info(&self, message: &str) {
        if !self.quiet {
            eprintln!("  {}", message);
        }
    }
}

/// Render an array of objects with one column per scalar field
fn write_rows(rows: &[Value], writer: &mut impl Write) -> CliResult<()> {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows.iter().filter_map(Value::as_object) {
        for (key, value) in row {
            if !value.is_object() && !value.is_array() && !columns.contains(&key.as_str()) {
                columns.push(key);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| {
            columns
                .iter()
                .map(|column| row.get(*column).map(format_value).unwrap_or_default())
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].chars().count())
                .chain(std::iter::once(column.len()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(column, width)| format!("{:<width$}", column, width = width))
        .collect();
    writeln!(writer, "  {}", header.join("  "))?;
    writeln!(writer, "  {}", "-".repeat(header.join("  ").chars().count()))?;

    for row in cells {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect();
        writeln!(writer, "  {}", line.join("  ").trim_end())?;
    }
    Ok(())
}

/// Flatten nested values into dotted keys
fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    let join = |key: &str| {
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", prefix, key)
        }
    };

    match value {
        Value::Object(obj) if !obj.is_empty() => {
            for (key, child) in obj {
                flatten(&join(key), child, out);
            }
        }
        Value::Array(items) if !items.is_empty() => {
            for (i, child) in items.iter().enumerate() {
                flatten(&join(&i.to_string()), child, out);
            }
        }
        _ => out.push((prefix.to_string(), format_value(value))),
    }
}

/// Format a JSON value for display
fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "(null)".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(arr) => {
            if arr.is_empty() {
                "[]".to_string()
            } else {
                format!("[{} items]", arr.len())
            }
        }
        Value::Object(obj) => {
            if obj.is_empty() {
                "{}".to_string()
            } else {
                format!("{{{} items}}", obj.len())
            }
        }
    }
}

/// Progress indicator for batch operations
pub struct ProgressBar {
    total: usize,
    current: usize,
    show: bool,
}

impl ProgressBar {
    pub fn new(total: usize, show: bool) -> Self {
        Self { total, current: 0, show }
    }

    pub fn increment(&mut self, label: &str) {
        self.current += 1;
        if self.show && self.total > 0 {
            let percent = (self.current * 100) / self.total;
            eprint!("\r[{}/{}] ({}%) {} ", self.current, self.total, percent, label);
            if self.current == self.total {
                eprintln!();
            }
            std::io::stderr().flush().ok();
        }
    }
}
