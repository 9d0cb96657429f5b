//! CLI console utilities

use colored::*;

/// CLI console for formatted output
pub struct CLIConsole {
    verbose: bool,
}

impl CLIConsole {
    /// Create a new CLI console
    pub const fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.verbose {
            println!("{} {}", "ℹ".blue().bold(), message);
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        println!("{} {}", "✓".green().bold(), message.green());
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        println!("{} {}", "⚠".yellow().bold(), message.yellow());
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "✗".red().bold(), message.red());
    }

    /// Print a header
    pub fn print_header(&self, title: &str) {
        println!();
        println!("{}", title.bold().underline());
        println!("{}", "=".repeat(title.len()).dimmed());
    }

    /// Print a separator
    pub fn print_separator(&self) {
        println!("{}", "-".repeat(50).dimmed());
    }

    /// Print a key/value line
    pub fn print_field(&self, key: &str, value: &str) {
        println!("{:>12}: {}", key.bold(), value);
    }

    /// Print a table header
    pub fn print_table_header(&self, headers: &[(&str, usize)]) {
        let header_line = headers
            .iter()
            .map(|(h, width)| format!("{:width$}", h, width = *width))
            .collect::<Vec<_>>()
            .join(" | ");

        println!("{}", header_line.bold());
        println!("{}", "-".repeat(header_line.len()).dimmed());
    }

    /// Print a table row
    pub fn print_table_row(&self, cells: &[(&str, usize)]) {
        let row_line = cells
            .iter()
            .map(|(c, width)| format!("{:width$}", c, width = *width))
            .collect::<Vec<_>>()
            .join(" | ");

        println!("{row_line}");
    }
}

impl Default for CLIConsole {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Utility functions for console formatting
pub mod format {
    use colored::*;
    use std::path::Path;

    /// Path relative to `root` when it lies inside it
    pub fn path(path: &Path, root: &Path) -> String {
        path.strip_prefix(root)
            .unwrap_or(path)
            .display()
            .to_string()
    }

    /// Format bytes as human readable
    pub fn bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        format!("{:.1} {}", size, UNITS[unit_index])
    }

    /// Format a timestamp in local time
    pub fn timestamp(ts: &chrono::DateTime<chrono::Utc>) -> String {
        ts.with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
    }

    /// Truncate to `max` characters with an ellipsis
    pub fn truncate(s: &str, max: usize) -> String {
        if s.chars().count() <= max {
            return s.to_string();
        }
        let kept: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{kept}…")
    }

    /// Dimmed placeholder for missing values
    pub fn none() -> String {
        "-".dimmed().to_string()
    }

}
