//! Top-level directory scanning and extension classification.
//!
//! A scan lists the immediate entries of a directory (never recursing),
//! collects the distinct extensions of its regular files and classifies each
//! one into a [`ClassificationEntry`]. The resulting [`ClassificationTable`] is
//! built fresh by every scan and handed explicitly to the organize step.

use crate::config::{CompiledFilters, Settings};
use crate::file_category::{Category, CategoryTable, extension_of};
use crate::file_organizer::{OrganizeError, OrganizeResult};
use crate::sink::MessageSink;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// How a top-level entry will be treated by the organizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file eligible for organization.
    File,
    /// A regular file excluded by the configured filters.
    Excluded,
    /// A directory, a dangling link, or anything else that is not a regular file.
    NotAFile,
}

/// One immediate entry of the scanned directory.
#[derive(Debug, Clone)]
pub struct TopLevelEntry {
    /// Full path of the entry.
    pub path: PathBuf,
    /// Entry classification at listing time.
    pub kind: EntryKind,
}

impl TopLevelEntry {
    /// The entry's file name, lossily converted.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Checks that `path` exists and is a directory.
pub fn validate_directory(path: &Path) -> OrganizeResult<()> {
    let metadata = fs::metadata(path).map_err(|e| OrganizeError::InvalidDirectory {
        path: path.to_path_buf(),
        source: e,
    })?;

    if !metadata.is_dir() {
        return Err(OrganizeError::InvalidDirectory {
            path: path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
        });
    }

    Ok(())
}

/// Lists the immediate entries of `root`, sorted by file name.
///
/// # Errors
///
/// Returns `InvalidDirectory` if `root` is missing, not a directory, or unreadable.
pub fn list_entries(root: &Path, filters: &CompiledFilters) -> OrganizeResult<Vec<TopLevelEntry>> {
    validate_directory(root)?;

    let read_dir = fs::read_dir(root).map_err(|e| OrganizeError::InvalidDirectory {
        path: root.to_path_buf(),
        source: e,
    })?;

    let mut entries = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable directory entry");
                continue;
            }
        };

        let path = entry.path();
        // Follows links: a link to a file is a file, and moving it moves the link
        let kind = match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => {
                if filters.should_include(&path) {
                    EntryKind::File
                } else {
                    EntryKind::Excluded
                }
            }
            _ => EntryKind::NotAFile,
        };
        entries.push(TopLevelEntry { path, kind });
    }

    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(entries)
}

/// Classification of one extension observed during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationEntry {
    /// Lower-cased extension, never empty.
    pub extension: String,
    /// Category resolved from the category table.
    pub category: Category,
    /// Upper-cased extension, used as the subdirectory name.
    pub sub_category: String,
}

impl ClassificationEntry {
    /// Classifies `extension` against `table`.
    pub fn new(extension: &str, table: &CategoryTable) -> Self {
        let extension = extension.to_lowercase();
        Self {
            category: table.classify(&extension),
            sub_category: extension.to_uppercase(),
            extension,
        }
    }

    /// Destination directory of this entry, relative to the organized root.
    pub fn relative_dir(&self) -> PathBuf {
        Path::new(self.category.dir_name()).join(&self.sub_category)
    }
}

/// Extension to classification mapping produced by one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationTable {
    entries: BTreeMap<String, ClassificationEntry>,
}

impl ClassificationTable {
    /// Builds a table from the given extensions; duplicates collapse into one entry.
    pub fn from_extensions<I, S>(extensions: I, table: &CategoryTable) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = extensions
            .into_iter()
            .filter(|ext| !ext.as_ref().is_empty())
            .map(|ext| {
                let entry = ClassificationEntry::new(ext.as_ref(), table);
                (entry.extension.clone(), entry)
            })
            .collect();
        Self { entries }
    }

    /// Looks up an extension (case-insensitive).
    pub fn get(&self, extension: &str) -> Option<&ClassificationEntry> {
        self.entries.get(&extension.to_lowercase())
    }

    /// Iterates over entries ordered by extension.
    pub fn iter(&self) -> impl Iterator<Item = &ClassificationEntry> {
        self.entries.values()
    }

    /// The distinct categories present in the table.
    pub fn categories(&self) -> BTreeSet<Category> {
        self.entries.values().map(|e| e.category).collect()
    }

    /// Entries belonging to `category`.
    pub fn entries_for(&self, category: Category) -> impl Iterator<Item = &ClassificationEntry> {
        self.entries
            .values()
            .filter(move |entry| entry.category == category)
    }

    /// Number of distinct extensions.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the scan found no classifiable file.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Serializable snapshot of a scan, for machine-readable output.
#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    /// The scanned directory, as given.
    pub directory: PathBuf,
    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,
    /// One entry per distinct extension, ordered by extension.
    pub types: Vec<ClassificationEntry>,
}

impl ScanReport {
    /// Captures `table` for `directory`, stamped with the current time.
    pub fn new(directory: &Path, table: &ClassificationTable) -> Self {
        Self {
            directory: directory.to_path_buf(),
            scanned_at: Utc::now(),
            types: table.iter().cloned().collect(),
        }
    }
}

/// Scans directories for file types.
pub struct TypeScanner;

impl TypeScanner {
    /// Scans the immediate entries of `root` and classifies their extensions.
    ///
    /// Directories, excluded files, and extensionless files never appear in the
    /// result. Reports `Found N unique file types` through `messages`, or
    /// `No files found in directory.` when the directory has no entries.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDirectory` if `root` is missing, not a directory, or unreadable.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use extsort::config::Settings;
    /// use extsort::scanner::TypeScanner;
    /// use std::path::Path;
    ///
    /// let mut messages: Vec<String> = Vec::new();
    /// let table = TypeScanner::scan(Path::new("/path/to/dir"), &Settings::default(), &mut messages)
    ///     .expect("scan failed");
    /// for entry in table.iter() {
    ///     println!("{} -> {}/{}", entry.extension, entry.category, entry.sub_category);
    /// }
    /// ```
    pub fn scan(
        root: &Path,
        settings: &Settings,
        messages: &mut dyn MessageSink,
    ) -> OrganizeResult<ClassificationTable> {
        let entries = list_entries(root, &settings.filters)?;
        Ok(Self::classify_entries(root, &entries, &settings.table, messages))
    }

    /// Classifies an already captured listing.
    pub fn classify_entries(
        root: &Path,
        entries: &[TopLevelEntry],
        table: &CategoryTable,
        messages: &mut dyn MessageSink,
    ) -> ClassificationTable {
        if entries.is_empty() {
            info!(root = %root.display(), "directory is empty");
            messages.message("No files found in directory.");
            return ClassificationTable::default();
        }

        let extensions: BTreeSet<String> = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::File)
            .map(|entry| extension_of(&entry.path))
            .filter(|ext| !ext.is_empty())
            .collect();

        let classification = ClassificationTable::from_extensions(&extensions, table);
        info!(
            root = %root.display(),
            entries = entries.len(),
            types = classification.len(),
            "scan complete"
        );
        messages.message(&format!(
            "Found {} unique file types",
            classification.len()
        ));
        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"data").expect("Failed to write test file");
    }

    #[test]
    fn test_scan_example_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(root, "a.jpg");
        touch(root, "b.txt");
        touch(root, "c");

        let mut messages: Vec<String> = Vec::new();
        let table = TypeScanner::scan(root, &Settings::default(), &mut messages).unwrap();

        assert_eq!(table.len(), 2);
        let jpg = table.get("jpg").unwrap();
        assert_eq!(jpg.category, Category::Images);
        assert_eq!(jpg.sub_category, "JPG");
        let txt = table.get("txt").unwrap();
        assert_eq!(txt.category, Category::Documents);
        assert_eq!(txt.sub_category, "TXT");
        assert_eq!(messages, vec!["Found 2 unique file types"]);
    }

    #[test]
    fn test_scan_collapses_case_variants() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(root, "one.JPG");
        touch(root, "two.jpg");
        touch(root, "three.Jpg");

        let table = TypeScanner::scan(root, &Settings::default(), &mut Vec::<String>::new()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("JPG").unwrap().extension, "jpg");
    }

    #[test]
    fn test_scan_ignores_directories_and_extensionless_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        fs::create_dir(root.join("nested.dir")).unwrap();
        touch(&root.join("nested.dir"), "inner.png");
        touch(root, "README");

        let mut messages: Vec<String> = Vec::new();
        let table = TypeScanner::scan(root, &Settings::default(), &mut messages).unwrap();

        assert!(table.is_empty());
        assert_eq!(messages, vec!["Found 0 unique file types"]);
    }

    #[test]
    fn test_scan_empty_directory_reports() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");

        let mut messages: Vec<String> = Vec::new();
        let table =
            TypeScanner::scan(temp_dir.path(), &Settings::default(), &mut messages).unwrap();

        assert!(table.is_empty());
        assert_eq!(messages, vec!["No files found in directory."]);
    }

    #[test]
    fn test_scan_unknown_extension_is_other() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "data.xyz");

        let table = TypeScanner::scan(temp_dir.path(), &Settings::default(), &mut Vec::<String>::new())
            .unwrap();
        let entry = table.get("xyz").unwrap();
        assert_eq!(entry.category, Category::Other);
        assert_eq!(entry.relative_dir(), Path::new("OTHER").join("XYZ"));
    }

    #[test]
    fn test_scan_invalid_directory() {
        let result = TypeScanner::scan(
            Path::new("/non/existent/path"),
            &Settings::default(),
            &mut Vec::<String>::new(),
        );
        assert!(matches!(result, Err(OrganizeError::InvalidDirectory { .. })));
    }

    #[test]
    fn test_scan_file_instead_of_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        touch(temp_dir.path(), "file.txt");

        let result = TypeScanner::scan(
            &temp_dir.path().join("file.txt"),
            &Settings::default(),
            &mut Vec::<String>::new(),
        );
        assert!(matches!(result, Err(OrganizeError::InvalidDirectory { .. })));
    }

    #[test]
    fn test_list_entries_sorted_with_kinds() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        touch(root, "b.txt");
        touch(root, "a.jpg");
        fs::create_dir(root.join("c_dir")).unwrap();

        let entries = list_entries(root, &CompiledFilters::default()).unwrap();
        let names: Vec<String> = entries.iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["a.jpg", "b.txt", "c_dir"]);
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[2].kind, EntryKind::NotAFile);
    }

    #[cfg(unix)]
    #[test]
    fn test_list_entries_follows_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().expect("Failed to create temp directory");
        touch(outside.path(), "real.jpg");
        fs::create_dir(outside.path().join("folder")).unwrap();

        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path();
        symlink(outside.path().join("real.jpg"), root.join("a_link.jpg")).unwrap();
        symlink(outside.path().join("folder"), root.join("b_link_dir")).unwrap();
        symlink(outside.path().join("gone.png"), root.join("c_dangling.png")).unwrap();

        let entries = list_entries(root, &CompiledFilters::default()).unwrap();
        let kinds: Vec<EntryKind> = entries.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![EntryKind::File, EntryKind::NotAFile, EntryKind::NotAFile]
        );

        let table = TypeScanner::scan(root, &Settings::default(), &mut Vec::<String>::new()).unwrap();
        assert_eq!(table.len(), 1);
        assert!(table.get("jpg").is_some());
    }

    #[test]
    fn test_classification_table_categories() {
        let table = ClassificationTable::from_extensions(
            ["jpg", "png", "txt", ""],
            &CategoryTable::default(),
        );
        assert_eq!(table.len(), 3);
        let categories: Vec<Category> = table.categories().into_iter().collect();
        assert_eq!(categories, vec![Category::Images, Category::Documents]);
        assert_eq!(table.entries_for(Category::Images).count(), 2);
    }
}
