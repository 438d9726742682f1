//! extsort - sort the files of a directory by extension
//!
//! This library classifies the top-level files of a directory by extension,
//! creates a `CATEGORY/EXTENSION` directory tree for them, and moves each file
//! into place while reporting messages and progress incrementally. A failed
//! move is reported and skipped; it never aborts the batch.

pub mod cli;
pub mod config;
pub mod file_category;
pub mod file_organizer;
pub mod job;
pub mod output;
pub mod planner;
pub mod progress;
pub mod scanner;
pub mod sink;

pub use config::{CompiledFilters, Config, ConfigError, Settings};
pub use file_category::{Category, CategoryTable, extension_of};
pub use file_organizer::{FileMover, JobSummary, MoveOutcome, OrganizeError, OrganizeJob};
pub use job::{JobEvent, OrganizeHandle, organize_directory, spawn_organize};
pub use planner::OrganizePlanner;
pub use progress::ProgressTracker;
pub use scanner::{ClassificationEntry, ClassificationTable, TypeScanner};
pub use sink::{MessageSink, ProgressSink};
