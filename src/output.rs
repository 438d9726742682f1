//! Output formatting and styling module.
//!
//! Terminal implementations of the message and progress sinks, plus the tables
//! the CLI prints for scans, category configuration, and job summaries.

use crate::file_category::{Category, CategoryTable};
use crate::file_organizer::{JobSummary, PlannedMove};
use crate::scanner::ClassificationTable;
use crate::sink::{MessageSink, ProgressSink};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Styles a pipeline message by what it reports.
    ///
    /// # Example
    ///
    /// ```
    /// use extsort::output::OutputFormatter;
    /// colored::control::set_override(false);
    /// assert_eq!(OutputFormatter::style_message("Moved: a.jpg to IMAGES/JPG"), "✓ Moved: a.jpg to IMAGES/JPG");
    /// ```
    pub fn style_message(text: &str) -> String {
        if text.starts_with("Moved:") {
            format!("{} {}", "✓".green(), text)
        } else if text.starts_with("Error") || text.starts_with("Could not") {
            format!("{} {}", "✗".red(), text.red())
        } else {
            text.cyan().to_string()
        }
    }

    /// Creates a percent-based progress bar (length 100).
    pub fn create_progress_bar() -> ProgressBar {
        let pb = ProgressBar::new(100);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos:>3}% {msg}")
                .expect("Invalid progress bar template")
                .progress_chars("█▓░"),
        );
        pb
    }

    /// Prints the classification table of a scan.
    pub fn classification_table(root: &Path, table: &ClassificationTable) {
        Self::header(&format!("File types in {}", root.display()));
        if table.is_empty() {
            println!("(none)");
            return;
        }

        println!(
            "{:<12} | {:<13} | {}",
            "Extension".bold(),
            "Main Category".bold(),
            "Sub Category".bold()
        );
        println!("{}", "-".repeat(44));
        for entry in table.iter() {
            println!(
                "{:<12} | {:<13} | {}",
                entry.extension,
                entry.category.dir_name().green(),
                entry.sub_category
            );
        }
    }

    /// Prints the configured category table.
    pub fn category_table(table: &CategoryTable) {
        Self::header("CATEGORIES");
        for (category, extensions) in table.iter() {
            let list: Vec<&str> = extensions.iter().map(String::as_str).collect();
            println!(
                "{:<10} | {:<17} | {}",
                category.dir_name().bold(),
                category.description(),
                list.join(", ")
            );
        }
        println!(
            "{:<10} | {:<17} | {}",
            Category::Other.dir_name().bold(),
            Category::Other.description(),
            "(everything else)".dimmed()
        );
    }

    /// Prints the directories and moves a dry run would create.
    pub fn planned_moves(root: &Path, new_dirs: &[PathBuf], moves: &[PlannedMove]) {
        for dir in new_dirs {
            let relative = dir.strip_prefix(root).unwrap_or(dir);
            println!(" + {}", relative.display().to_string().green());
        }

        if moves.is_empty() {
            Self::dry_run_notice("No files would be moved.");
            return;
        }

        for planned in moves {
            let name = planned
                .from
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let target = planned.to.strip_prefix(root).unwrap_or(&planned.to);
            println!(" - {}", name);
            println!("   → Would move to {}", target.display());
        }
        Self::dry_run_notice(&format!(
            "{} {} would be moved. No files were modified.",
            moves.len(),
            if moves.len() == 1 { "file" } else { "files" }
        ));
    }

    /// Prints a summary of a finished job.
    pub fn job_summary(summary: &JobSummary) {
        Self::header("SUMMARY");
        println!("{:<8} | {}", "Entries".bold(), summary.total_entries);
        println!("{:<8} | {}", "Moved".bold(), summary.moved.to_string().green());
        println!("{:<8} | {}", "Skipped".bold(), summary.skipped);
        let failed = summary.failed.to_string();
        println!(
            "{:<8} | {}",
            "Failed".bold(),
            if summary.failed > 0 { failed.red() } else { failed.normal() }
        );
        println!(
            "Started {} and took {:.2?}",
            summary.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.elapsed
        );
    }
}

/// Prints pipeline messages to the terminal, above the progress bar if any.
#[derive(Default)]
pub struct ConsoleMessages {
    bar: Option<ProgressBar>,
}

impl ConsoleMessages {
    pub fn new() -> Self {
        Self::default()
    }

    /// Routes messages through `bar` so they do not corrupt its line.
    pub fn with_progress_bar(bar: ProgressBar) -> Self {
        Self { bar: Some(bar) }
    }
}

impl MessageSink for ConsoleMessages {
    fn message(&mut self, text: &str) {
        let line = OutputFormatter::style_message(text);
        match &self.bar {
            Some(bar) => bar.println(line),
            None => println!("{}", line),
        }
    }
}

/// Drives an `indicatif` bar from progress values.
pub struct ProgressBarSink {
    bar: ProgressBar,
}

impl ProgressBarSink {
    pub fn new(bar: ProgressBar) -> Self {
        Self { bar }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl ProgressSink for ProgressBarSink {
    fn progress(&mut self, percent: u8) {
        self.bar.set_position(u64::from(percent));
        if percent >= 100 {
            self.bar.finish_with_message("done");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_message_prefixes() {
        colored::control::set_override(false);
        assert_eq!(
            OutputFormatter::style_message("Moved: a.jpg to IMAGES/JPG"),
            "✓ Moved: a.jpg to IMAGES/JPG"
        );
        assert_eq!(
            OutputFormatter::style_message("Error moving file a.jpg: denied"),
            "✗ Error moving file a.jpg: denied"
        );
        assert_eq!(
            OutputFormatter::style_message("Found 2 unique file types"),
            "Found 2 unique file types"
        );
    }

    #[test]
    fn test_progress_bar_sink_tracks_position() {
        let mut sink = ProgressBarSink::new(ProgressBar::hidden());
        sink.progress(40);
        assert_eq!(sink.bar().position(), 40);
        sink.progress(100);
        assert_eq!(sink.bar().position(), 100);
        assert!(sink.bar().is_finished());
    }
}
