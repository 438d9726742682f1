/// Destination directory planning.
///
/// Derives the `CATEGORY` and `CATEGORY/EXTENSION` directories a classification
/// table needs and makes sure they exist before any file is moved.
use crate::file_organizer::OrganizeError;
use crate::scanner::ClassificationTable;
use crate::sink::MessageSink;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// What `ensure_destinations` did.
#[derive(Debug, Default)]
pub struct PlanReport {
    /// Directories that did not exist and were created.
    pub created: Vec<PathBuf>,
    /// Directories that could not be created.
    pub failures: Vec<OrganizeError>,
}

impl PlanReport {
    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Creates destination directories for a classification table.
pub struct OrganizePlanner;

impl OrganizePlanner {
    /// The directories `table` needs, parents before children.
    pub fn destinations(root: &Path, table: &ClassificationTable) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        for category in table.categories() {
            let category_dir = root.join(category.dir_name());
            let sub_dirs: Vec<PathBuf> = table
                .entries_for(category)
                .map(|entry| category_dir.join(&entry.sub_category))
                .collect();
            dirs.push(category_dir);
            dirs.extend(sub_dirs);
        }
        dirs
    }

    /// Creates `root/<CATEGORY>` and `root/<CATEGORY>/<EXT>` for every entry.
    ///
    /// Existing directories are left alone. A directory that cannot be created
    /// is reported through `messages` and recorded in the returned report; the
    /// moves that depend on it will then fail one by one. The subdirectories of
    /// a category whose own directory failed are not attempted.
    pub fn ensure_destinations(
        root: &Path,
        table: &ClassificationTable,
        messages: &mut dyn MessageSink,
    ) -> PlanReport {
        let mut report = PlanReport::default();

        for category in table.categories() {
            let category_dir = root.join(category.dir_name());
            if let Err(e) = Self::ensure_dir(&category_dir, &mut report) {
                Self::record_failure(e, messages, &mut report);
                continue;
            }

            for entry in table.entries_for(category) {
                let sub_dir = category_dir.join(&entry.sub_category);
                if let Err(e) = Self::ensure_dir(&sub_dir, &mut report) {
                    Self::record_failure(e, messages, &mut report);
                }
            }
        }

        report
    }

    fn ensure_dir(path: &Path, report: &mut PlanReport) -> Result<(), OrganizeError> {
        if path.is_dir() {
            return Ok(());
        }

        fs::create_dir_all(path).map_err(|e| OrganizeError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        debug!(path = %path.display(), "created directory");
        report.created.push(path.to_path_buf());
        Ok(())
    }

    fn record_failure(error: OrganizeError, messages: &mut dyn MessageSink, report: &mut PlanReport) {
        warn!(%error, "directory creation failed");
        if let OrganizeError::DirectoryCreationFailed { path, source } = &error {
            messages.message(&format!(
                "Could not create directory {}: {}",
                path.display(),
                source
            ));
        }
        report.failures.push(error);
    }
}
