//! Command-line interface module for extsort.
//!
//! This module handles all CLI-related functionality including:
//! - Command parsing
//! - Configuration loading
//! - Scan, organize, and dry-run orchestration
//! - Draining background job events into the terminal

use crate::config::{Config, Settings};
use crate::file_organizer::{FileMover, OrganizeJob};
use crate::job::{JobEvent, spawn_organize};
use crate::output::{ConsoleMessages, OutputFormatter, ProgressBarSink};
use crate::planner::OrganizePlanner;
use crate::scanner::{ScanReport, TypeScanner};
use crate::sink::{MessageSink, NullSink, ProgressSink};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "extsort")]
#[command(version)]
#[command(about = "Sort the files of a directory into CATEGORY/EXTENSION folders")]
pub struct Cli {
    /// Configuration file (defaults to .extsortrc.toml, then ~/.config/extsort/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: OrganizeCommand,
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Subcommand)]
pub enum OrganizeCommand {
    /// List the file types found in a directory and where they would go
    Scan {
        /// Directory to scan
        dir: PathBuf,
        /// Print a JSON report instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Move files into CATEGORY/EXTENSION folders
    Organize {
        /// Directory to organize
        dir: PathBuf,
        /// Show what would be moved without changing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Show the configured category table
    Categories,
}

impl Cli {
    pub fn setup_logging(&self) {
        let level = if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        };

        tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Runs the CLI application with the given command.
///
/// Configuration is loaded once, before the command runs.
pub fn run_cli(command: OrganizeCommand, config_path: Option<&Path>) -> anyhow::Result<()> {
    let settings = Config::load(config_path)
        .and_then(Config::compile)
        .context("Error loading configuration")?;

    match command {
        OrganizeCommand::Scan { dir, json } => scan_directory(&dir, &settings, json),
        OrganizeCommand::Organize { dir, dry_run } => {
            if dry_run {
                organize_directory_dry_run(&dir, &settings)
            } else {
                organize_directory(&dir, settings)
            }
        }
        OrganizeCommand::Categories => {
            OutputFormatter::category_table(&settings.table);
            Ok(())
        }
    }
}

/// Scans a directory and prints its classification table.
pub fn scan_directory(dir: &Path, settings: &Settings, json: bool) -> anyhow::Result<()> {
    if json {
        let table = TypeScanner::scan(dir, settings, &mut NullSink)?;
        let report = ScanReport::new(dir, &table);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let mut messages = ConsoleMessages::new();
    let table = TypeScanner::scan(dir, settings, &mut messages)?;
    OutputFormatter::classification_table(dir, &table);
    Ok(())
}

/// Organizes a directory on a background thread, showing live progress.
pub fn organize_directory(dir: &Path, settings: Settings) -> anyhow::Result<()> {
    OutputFormatter::info(&format!("Organizing contents of: {}", dir.display()));

    let handle = spawn_organize(dir.to_path_buf(), settings)?;

    let bar = OutputFormatter::create_progress_bar();
    let mut messages = ConsoleMessages::with_progress_bar(bar.clone());
    let mut progress = ProgressBarSink::new(bar);

    for event in handle.events.iter() {
        match event {
            JobEvent::Message(text) => messages.message(&text),
            JobEvent::Progress(percent) => progress.progress(percent),
            JobEvent::Finished(_) => {}
        }
    }

    let summary = handle.wait()?;
    OutputFormatter::job_summary(&summary);
    if summary.is_complete_success() {
        OutputFormatter::success(&format!("Organized {} files", summary.moved));
    } else {
        OutputFormatter::warning("Some files could not be organized. Please review errors above.");
    }
    Ok(())
}

/// Shows what organizing would do without touching the filesystem.
pub fn organize_directory_dry_run(dir: &Path, settings: &Settings) -> anyhow::Result<()> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", dir.display()));

    let mut messages = ConsoleMessages::new();
    let table = TypeScanner::scan(dir, settings, &mut messages)?;
    let job = OrganizeJob::capture(dir, table, &settings.filters)?;

    let new_dirs: Vec<PathBuf> = OrganizePlanner::destinations(dir, job.classification())
        .into_iter()
        .filter(|path| !path.is_dir())
        .collect();
    OutputFormatter::planned_moves(dir, &new_dirs, &FileMover::preview(&job));
    Ok(())
}
