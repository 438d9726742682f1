/// Extension-based file categorization.
///
/// This module holds the fixed category table (category name to the set of
/// extensions that belong to it) and the classifier that resolves a single
/// extension to a category.
///
/// # Examples
///
/// ```
/// use extsort::file_category::{Category, CategoryTable};
///
/// let table = CategoryTable::default();
/// assert_eq!(table.classify("jpg"), Category::Images);
/// assert_eq!(table.classify("JPG"), Category::Images);
/// assert_eq!(table.classify("xyz"), Category::Other);
/// ```
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::config::ConfigError;

/// A broad file category.
///
/// The set is closed: every extension resolves to one of the named categories
/// or to the catch-all `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    /// Image files (JPG, PNG, GIF, etc.)
    Images,
    /// Video files (MP4, MKV, AVI, etc.)
    Videos,
    /// Audio files (MP3, WAV, FLAC, etc.)
    Audio,
    /// Document files (PDF, DOCX, TXT, etc.)
    Documents,
    /// Archive files (ZIP, RAR, 7Z, etc.)
    Archives,
    /// Source code files (Java, Python, JavaScript, etc.)
    Code,
    /// Anything not listed in the table
    Other,
}

impl Category {
    /// All categories, catch-all last.
    pub const ALL: [Category; 7] = [
        Category::Images,
        Category::Videos,
        Category::Audio,
        Category::Documents,
        Category::Archives,
        Category::Code,
        Category::Other,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use extsort::file_category::Category;
    ///
    /// assert_eq!(Category::Images.dir_name(), "IMAGES");
    /// assert_eq!(Category::Other.dir_name(), "OTHER");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Images => "IMAGES",
            Category::Videos => "VIDEOS",
            Category::Audio => "AUDIO",
            Category::Documents => "DOCUMENTS",
            Category::Archives => "ARCHIVES",
            Category::Code => "CODE",
            Category::Other => "OTHER",
        }
    }

    /// Returns a human-readable description of this category.
    pub fn description(&self) -> &'static str {
        match self {
            Category::Images => "Image files",
            Category::Videos => "Video files",
            Category::Audio => "Audio files",
            Category::Documents => "Document files",
            Category::Archives => "Archive files",
            Category::Code => "Source code files",
            Category::Other => "Other files",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for Category {
    type Err = ConfigError;

    /// Parses a category name, ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|category| category.dir_name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownCategory(s.to_string()))
    }
}

/// Extracts the normalized extension of a file name.
///
/// The extension is everything after the last `.`, lower-cased. A name with no
/// `.` (or ending in `.`) has no extension and yields an empty string.
///
/// # Examples
///
/// ```
/// use extsort::file_category::extension_of;
/// use std::path::Path;
///
/// assert_eq!(extension_of(Path::new("photo.JPG")), "jpg");
/// assert_eq!(extension_of(Path::new("archive.tar.gz")), "gz");
/// assert_eq!(extension_of(Path::new("Makefile")), "");
/// ```
pub fn extension_of(path: &Path) -> String {
    let name = match path.file_name() {
        Some(name) => name.to_string_lossy(),
        None => return String::new(),
    };

    match name.rfind('.') {
        Some(idx) => name[idx + 1..].to_lowercase(),
        None => String::new(),
    }
}

/// Immutable mapping from category to the extensions that belong to it.
///
/// Extension sets are pairwise disjoint; construction fails otherwise, so
/// classification never depends on iteration order. `Other` never carries
/// extensions.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    categories: Vec<(Category, BTreeSet<String>)>,
    index: HashMap<String, Category>,
}

impl CategoryTable {
    /// Builds a table from `(category, extensions)` pairs.
    ///
    /// Extensions are normalized (leading `.` stripped, lower-cased) before
    /// insertion. A category listed more than once has its sets merged.
    ///
    /// # Errors
    ///
    /// Returns an error if an extension is empty, appears under two different
    /// categories, or is assigned to `Other`.
    pub fn new<I, E, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (Category, E)>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories: Vec<(Category, BTreeSet<String>)> = Vec::new();
        let mut index: HashMap<String, Category> = HashMap::new();

        for (category, extensions) in entries {
            let normalized = extensions
                .into_iter()
                .map(|ext| normalize_extension(ext.as_ref()))
                .collect::<Result<BTreeSet<_>, _>>()?;

            if category == Category::Other && !normalized.is_empty() {
                return Err(ConfigError::CatchAllExtensions(
                    normalized.into_iter().collect(),
                ));
            }

            for ext in &normalized {
                if let Some(&first) = index.get(ext)
                    && first != category
                {
                    return Err(ConfigError::OverlappingExtension {
                        extension: ext.clone(),
                        first,
                        second: category,
                    });
                }
                index.insert(ext.clone(), category);
            }

            match categories.iter_mut().find(|(c, _)| *c == category) {
                Some((_, set)) => set.extend(normalized),
                None => categories.push((category, normalized)),
            }
        }

        categories.sort_by_key(|(category, _)| *category);

        Ok(Self { categories, index })
    }

    /// Resolves an extension to its category.
    ///
    /// The lookup is case-insensitive; unknown (or empty) extensions resolve
    /// to `Category::Other`.
    pub fn classify(&self, extension: &str) -> Category {
        self.index
            .get(&extension.to_lowercase())
            .copied()
            .unwrap_or(Category::Other)
    }

    /// Iterates over the categories and their extension sets in category order.
    pub fn iter(&self) -> impl Iterator<Item = (Category, &BTreeSet<String>)> {
        self.categories.iter().map(|(category, set)| (*category, set))
    }

    /// Returns the extensions assigned to `category`, if any.
    pub fn extensions(&self, category: Category) -> Option<&BTreeSet<String>> {
        self.categories
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, set)| set)
    }

    /// Number of extensions known to the table.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if no extension is mapped.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        let defaults: [(Category, &[&str]); 6] = [
            (
                Category::Images,
                &["jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "svg", "ico", "raw"],
            ),
            (
                Category::Videos,
                &["mp4", "avi", "mkv", "mov", "wmv", "flv", "webm", "m4v", "mpeg", "mpg"],
            ),
            (
                Category::Audio,
                &["mp3", "wav", "m4a", "flac", "aac", "wma", "ogg", "mid", "midi"],
            ),
            (
                Category::Documents,
                &["pdf", "doc", "docx", "txt", "rtf", "odt", "xls", "xlsx", "ppt", "pptx"],
            ),
            (
                Category::Archives,
                &["zip", "rar", "7z", "tar", "gz", "bz2", "iso"],
            ),
            (
                Category::Code,
                &["java", "py", "cpp", "c", "h", "js", "html", "css", "php", "rb"],
            ),
        ];

        // The built-in sets are disjoint; a failure here is a bug in the list above.
        Self::new(defaults.into_iter().map(|(c, exts)| (c, exts.iter().copied())))
            .unwrap_or_else(|e| panic!("built-in category table is invalid: {}", e))
    }
}

fn normalize_extension(ext: &str) -> Result<String, ConfigError> {
    let normalized = ext.trim().trim_start_matches('.').to_lowercase();
    if normalized.is_empty() {
        return Err(ConfigError::EmptyExtension);
    }
    Ok(normalized)
}
