/// Moving files into their `CATEGORY/EXTENSION` directories.
///
/// An [`OrganizeJob`] freezes the root directory, the classification table and
/// the list of top-level entries at job start. [`FileMover`] walks that frozen
/// list, so directories created while the job runs are never processed by it.
/// Each entry yields exactly one [`MoveOutcome`]; a failed move never stops the
/// batch.
use crate::config::CompiledFilters;
use crate::file_category::extension_of;
use crate::progress::ProgressTracker;
use crate::scanner::{ClassificationEntry, ClassificationTable, EntryKind, TopLevelEntry, list_entries};
use crate::sink::{MessageSink, ProgressSink};
use chrono::{DateTime, Local};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that can occur during scanning and organization.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// The directory to organize is missing, not a directory, or unreadable.
    #[error("Invalid directory {}: {source}", .path.display())]
    InvalidDirectory { path: PathBuf, source: io::Error },
    /// Failed to create a destination directory.
    #[error("Failed to create directory {}: {source}", .path.display())]
    DirectoryCreationFailed { path: PathBuf, source: io::Error },
    /// Failed to move a file to its destination.
    #[error("Failed to move {} to {}: {source}", .from.display(), .to.display())]
    FileMoveFailed {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    /// The background worker thread could not be started.
    #[error("Failed to start organize job: {0}")]
    Spawn(#[source] io::Error),
}

/// Result type for file organization operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Why an entry was left where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Directory, dangling link, or other non-regular entry.
    NotAFile,
    /// The file name has no extension.
    NoExtension,
    /// The extension is not in the job's classification table.
    Unclassified,
    /// The configured filters exclude this file.
    Excluded,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SkipReason::NotAFile => "not a regular file",
            SkipReason::NoExtension => "no extension",
            SkipReason::Unclassified => "extension not in classification table",
            SkipReason::Excluded => "excluded by filter",
        })
    }
}

/// Result of processing one top-level entry.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The file now lives at `to`.
    Moved {
        from: PathBuf,
        to: PathBuf,
        classification: ClassificationEntry,
    },
    /// The entry was left in place.
    Skipped { path: PathBuf, reason: SkipReason },
    /// The move failed; the file stays at its original location.
    Failed { path: PathBuf, error: OrganizeError },
}

/// A move that would happen, reported by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedMove {
    pub from: PathBuf,
    pub to: PathBuf,
}

/// Snapshot of everything a single organize run works on.
#[derive(Debug, Clone)]
pub struct OrganizeJob {
    root: PathBuf,
    classification: ClassificationTable,
    entries: Vec<TopLevelEntry>,
}

impl OrganizeJob {
    /// Builds a job from an already captured entry list.
    pub fn new(
        root: impl Into<PathBuf>,
        classification: ClassificationTable,
        entries: Vec<TopLevelEntry>,
    ) -> Self {
        Self {
            root: root.into(),
            classification,
            entries,
        }
    }

    /// Lists the top-level entries of `root` now and freezes them into a job.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDirectory` if `root` cannot be listed.
    pub fn capture(
        root: &Path,
        classification: ClassificationTable,
        filters: &CompiledFilters,
    ) -> OrganizeResult<Self> {
        let entries = list_entries(root, filters)?;
        Ok(Self::new(root, classification, entries))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn classification(&self) -> &ClassificationTable {
        &self.classification
    }

    pub fn entries(&self) -> &[TopLevelEntry] {
        &self.entries
    }

    /// Number of captured entries; the progress denominator.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolves where `entry` should go, or why it stays.
    pub fn destination_for<'a>(
        &'a self,
        entry: &TopLevelEntry,
    ) -> Result<(&'a ClassificationEntry, PathBuf), SkipReason> {
        match entry.kind {
            EntryKind::NotAFile => return Err(SkipReason::NotAFile),
            EntryKind::Excluded => return Err(SkipReason::Excluded),
            EntryKind::File => {}
        }

        let extension = extension_of(&entry.path);
        if extension.is_empty() {
            return Err(SkipReason::NoExtension);
        }

        let classification = self
            .classification
            .get(&extension)
            .ok_or(SkipReason::Unclassified)?;
        let file_name = entry.path.file_name().ok_or(SkipReason::NotAFile)?;

        let destination = self
            .root
            .join(classification.relative_dir())
            .join(file_name);
        Ok((classification, destination))
    }
}

/// Totals for a finished job. Individual outcomes are not retained.
#[derive(Debug, Clone)]
pub struct JobSummary {
    /// Number of captured top-level entries.
    pub total_entries: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Wall-clock time the move loop started.
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl JobSummary {
    /// Returns true if no move failed.
    pub fn is_complete_success(&self) -> bool {
        self.failed == 0
    }
}

/// Relocates the files of an [`OrganizeJob`].
pub struct FileMover;

impl FileMover {
    /// Processes every captured entry, reporting as it goes.
    ///
    /// Emits a message per moved file and per failure, a progress value per
    /// entry (directories included), a final progress of 100, and a completion
    /// message. Destination directories must already exist; see
    /// [`crate::planner::OrganizePlanner`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::config::Settings;
    /// use extsort::file_organizer::{FileMover, OrganizeJob};
    /// use extsort::planner::OrganizePlanner;
    /// use extsort::scanner::TypeScanner;
    /// use std::path::Path;
    ///
    /// let root = Path::new("/path/to/dir");
    /// let settings = Settings::default();
    /// let mut messages: Vec<String> = Vec::new();
    /// let mut progress: Vec<u8> = Vec::new();
    ///
    /// let table = TypeScanner::scan(root, &settings, &mut messages).unwrap();
    /// let job = OrganizeJob::capture(root, table, &settings.filters).unwrap();
    /// OrganizePlanner::ensure_destinations(job.root(), job.classification(), &mut messages);
    /// let summary = FileMover::organize(&job, &mut messages, &mut progress);
    /// println!("moved {} files", summary.moved);
    /// ```
    pub fn organize(
        job: &OrganizeJob,
        messages: &mut dyn MessageSink,
        progress: &mut dyn ProgressSink,
    ) -> JobSummary {
        let started_at = Local::now();
        let timer = Instant::now();
        let mut tracker = ProgressTracker::new(job.len());
        let (mut moved, mut skipped, mut failed) = (0, 0, 0);

        info!(root = %job.root().display(), entries = job.len(), "organizing");

        if job.is_empty() {
            messages.message("No files to organize.");
        }

        for outcome in Self::moves(job) {
            match &outcome {
                MoveOutcome::Moved {
                    from,
                    classification,
                    ..
                } => {
                    moved += 1;
                    messages.message(&format!(
                        "Moved: {} to {}/{}",
                        display_name(from),
                        classification.category,
                        classification.sub_category
                    ));
                }
                MoveOutcome::Skipped { .. } => skipped += 1,
                MoveOutcome::Failed { path, error } => {
                    failed += 1;
                    let detail = match error {
                        OrganizeError::FileMoveFailed { source, .. } => source.to_string(),
                        other => other.to_string(),
                    };
                    messages.message(&format!(
                        "Error moving file {}: {}",
                        display_name(path),
                        detail
                    ));
                }
            }
            tracker.advance(progress);
        }

        tracker.finish(progress);
        messages.message("File organization completed.");

        let summary = JobSummary {
            total_entries: job.len(),
            moved,
            skipped,
            failed,
            started_at,
            elapsed: timer.elapsed(),
        };
        info!(
            moved = summary.moved,
            skipped = summary.skipped,
            failed = summary.failed,
            "organize finished"
        );
        summary
    }

    /// Lazily processes the job's entries, one outcome per entry, in capture order.
    pub fn moves(job: &OrganizeJob) -> impl Iterator<Item = MoveOutcome> + '_ {
        job.entries()
            .iter()
            .map(move |entry| Self::process_entry(job, entry))
    }

    /// Lists the moves the job would perform, without touching the filesystem.
    pub fn preview(job: &OrganizeJob) -> Vec<PlannedMove> {
        job.entries()
            .iter()
            .filter_map(|entry| {
                job.destination_for(entry)
                    .ok()
                    .map(|(_, to)| PlannedMove {
                        from: entry.path.clone(),
                        to,
                    })
            })
            .collect()
    }

    /// Moves `from` to `to`, replacing any existing file at `to`.
    ///
    /// A symbolic link is moved as a link. Falls back to copy-and-delete when
    /// the destination is on another filesystem; if the source cannot be
    /// removed afterwards the copy is deleted again, so a failed move always
    /// leaves the file only at `from`.
    pub fn move_file(from: &Path, to: &Path) -> io::Result<()> {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
                debug!(from = %from.display(), to = %to.display(), "rename crosses devices, copying");
                fs::copy(from, to)?;
                fs::remove_file(from).map_err(|e| discard_copy(to, e))
            }
            Err(e) => Err(e),
        }
    }

    fn process_entry(job: &OrganizeJob, entry: &TopLevelEntry) -> MoveOutcome {
        let (classification, destination) = match job.destination_for(entry) {
            Ok(resolved) => resolved,
            Err(reason) => {
                debug!(path = %entry.path.display(), %reason, "skipping");
                return MoveOutcome::Skipped {
                    path: entry.path.clone(),
                    reason,
                };
            }
        };

        match Self::move_file(&entry.path, &destination) {
            Ok(()) => {
                debug!(from = %entry.path.display(), to = %destination.display(), "moved");
                MoveOutcome::Moved {
                    from: entry.path.clone(),
                    to: destination,
                    classification: classification.clone(),
                }
            }
            Err(e) => {
                warn!(path = %entry.path.display(), error = %e, "move failed");
                MoveOutcome::Failed {
                    path: entry.path.clone(),
                    error: OrganizeError::FileMoveFailed {
                        from: entry.path.clone(),
                        to: destination,
                        source: e,
                    },
                }
            }
        }
    }
}

/// Deletes a copy whose source could not be removed, returning the original error.
fn discard_copy(copy: &Path, error: io::Error) -> io::Error {
    if let Err(cleanup) = fs::remove_file(copy) {
        warn!(path = %copy.display(), error = %cleanup, "could not remove copied file");
    }
    error
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
