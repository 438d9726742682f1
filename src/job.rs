/// Running a complete organize pass, inline or on a background thread.
///
/// A pass lists the directory once, classifies the listing, creates the
/// destination tree and moves the files. The background variant streams the
/// same messages and progress values over a channel so the caller stays
/// responsive while files are moved.
use crate::config::Settings;
use crate::file_organizer::{FileMover, JobSummary, OrganizeError, OrganizeJob, OrganizeResult};
use crate::planner::OrganizePlanner;
use crate::scanner::{TypeScanner, list_entries, validate_directory};
use crate::sink::{MessageSink, ProgressSink};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{info, warn};

/// Maximum number of events that may queue up before the worker blocks.
pub const EVENT_CHANNEL_CAPACITY: usize = 1_024;

/// Events sent from the worker thread to the caller.
#[derive(Debug)]
pub enum JobEvent {
    /// A human-readable line for the log.
    Message(String),
    /// Percent complete, 0–100, non-decreasing.
    Progress(u8),
    /// The job ran to completion. Always the last event of a successful job.
    Finished(JobSummary),
}

/// Scans, plans, and organizes `root` on the current thread.
///
/// The directory is listed exactly once; that listing is both classified and
/// used as the job's entry snapshot, so the category directories created here
/// are never picked up by the same pass.
///
/// # Errors
///
/// Returns `InvalidDirectory` before touching anything if `root` cannot be listed.
/// Every other failure is reported through `messages` and counted in the summary.
pub fn organize_directory(
    root: &Path,
    settings: &Settings,
    messages: &mut dyn MessageSink,
    progress: &mut dyn ProgressSink,
) -> OrganizeResult<JobSummary> {
    let entries = list_entries(root, &settings.filters)?;
    let classification = TypeScanner::classify_entries(root, &entries, &settings.table, messages);
    let job = OrganizeJob::new(root, classification, entries);

    let plan = OrganizePlanner::ensure_destinations(job.root(), job.classification(), messages);
    if !plan.is_complete_success() {
        warn!(
            created = plan.created.len(),
            failed = plan.failures.len(),
            "some destination directories are missing"
        );
    }
    Ok(FileMover::organize(&job, messages, progress))
}

/// Handle to a running organize job.
pub struct OrganizeHandle {
    /// Messages, progress values, and the final summary, in order.
    pub events: Receiver<JobEvent>,
    thread: thread::JoinHandle<OrganizeResult<JobSummary>>,
}

impl OrganizeHandle {
    /// Discards any undelivered events and waits for the job to end.
    pub fn wait(self) -> OrganizeResult<JobSummary> {
        for _ in self.events.iter() {}
        match self.thread.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

/// Starts organizing `root` on a background thread.
///
/// The directory is validated before the thread starts, so an invalid path
/// is reported immediately and no job runs. The job cannot be cancelled.
///
/// # Examples
///
/// ```no_run
/// use extsort::config::Settings;
/// use extsort::job::{JobEvent, spawn_organize};
///
/// let handle = spawn_organize("/path/to/dir".into(), Settings::default()).unwrap();
/// for event in handle.events.iter() {
///     match event {
///         JobEvent::Message(text) => println!("{}", text),
///         JobEvent::Progress(percent) => println!("{}%", percent),
///         JobEvent::Finished(summary) => println!("moved {}", summary.moved),
///     }
/// }
/// ```
pub fn spawn_organize(root: PathBuf, settings: Settings) -> OrganizeResult<OrganizeHandle> {
    validate_directory(&root)?;

    let (tx, rx) = crossbeam_channel::bounded::<JobEvent>(EVENT_CHANNEL_CAPACITY);

    let thread = thread::Builder::new()
        .name("extsort-organizer".into())
        .spawn(move || run_job(root, settings, tx))
        .map_err(OrganizeError::Spawn)?;

    Ok(OrganizeHandle { events: rx, thread })
}

fn run_job(root: PathBuf, settings: Settings, tx: Sender<JobEvent>) -> OrganizeResult<JobSummary> {
    info!(root = %root.display(), "organize job started");

    let mut messages = tx.clone();
    let mut progress = tx.clone();
    let result = organize_directory(&root, &settings, &mut messages, &mut progress);

    match &result {
        Ok(summary) => {
            let _ = tx.send(JobEvent::Finished(summary.clone()));
        }
        Err(e) => messages.message(&format!("Error: {}", e)),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_organize_directory_example() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("a.jpg"), "x").unwrap();
        fs::write(root.join("b.txt"), "x").unwrap();
        fs::write(root.join("c"), "x").unwrap();

        let mut messages: Vec<String> = Vec::new();
        let mut progress: Vec<u8> = Vec::new();
        let summary =
            organize_directory(root, &Settings::default(), &mut messages, &mut progress).unwrap();

        assert_eq!(summary.moved, 2);
        assert_eq!(
            messages,
            vec![
                "Found 2 unique file types",
                "Moved: a.jpg to IMAGES/JPG",
                "Moved: b.txt to DOCUMENTS/TXT",
                "File organization completed.",
            ]
        );
        assert_eq!(progress.last(), Some(&100));
        assert!(root.join("c").exists());
    }

    #[test]
    fn test_spawn_invalid_directory_fails_fast() {
        let result = spawn_organize(PathBuf::from("/non/existent/path"), Settings::default());
        assert!(matches!(result, Err(OrganizeError::InvalidDirectory { .. })));
    }

    #[test]
    fn test_spawn_streams_events_and_finishes() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::write(root.join("song.mp3"), "x").unwrap();
        fs::write(root.join("clip.mp4"), "x").unwrap();

        let handle = spawn_organize(root.to_path_buf(), Settings::default()).unwrap();
        let events: Vec<JobEvent> = handle.events.iter().collect();
        let summary = handle.wait().unwrap();

        assert_eq!(summary.moved, 2);
        assert!(matches!(events.last(), Some(JobEvent::Finished(s)) if s.moved == 2));

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                JobEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![50, 100]);
        assert!(root.join("AUDIO/MP3/song.mp3").exists());
        assert!(root.join("VIDEOS/MP4/clip.mp4").exists());
    }

    #[test]
    fn test_wait_without_draining_does_not_block() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        for i in 0..(EVENT_CHANNEL_CAPACITY + 10) {
            fs::write(root.join(format!("file_{}.txt", i)), "x").unwrap();
        }

        let handle = spawn_organize(root.to_path_buf(), Settings::default()).unwrap();
        let summary = handle.wait().unwrap();
        assert_eq!(summary.moved, EVENT_CHANNEL_CAPACITY + 10);
    }
}
