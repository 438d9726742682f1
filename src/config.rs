//! Configuration loading: the category table and file filtering rules.
//!
//! Configuration is read once at startup from a TOML file and compiled into
//! [`Settings`]. Nothing in the organizing pipeline mutates it afterwards.
//!
//! # Configuration File Format
//!
//! ```toml
//! # Optional. When present, replaces the built-in table entirely.
//! [categories]
//! IMAGES = ["jpg", "png"]
//! CODE = ["rs", "toml"]
//!
//! [filters]
//! skip_hidden = false
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.part", "*.crdownload"]
//! regex = ["^~\\$"]
//! ```

use crate::file_category::{Category, CategoryTable};
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".extsortrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    Io(String),
    /// A category name that is not part of the fixed set.
    #[error("Unknown category '{0}'")]
    UnknownCategory(String),
    /// Extensions were assigned to the catch-all category.
    #[error("OTHER is the catch-all category and cannot list extensions: {0:?}")]
    CatchAllExtensions(Vec<String>),
    /// The same extension is listed under two categories.
    #[error("Extension '{extension}' is listed under both {first} and {second}")]
    OverlappingExtension {
        /// The extension found twice.
        extension: String,
        /// The category it was first seen under.
        first: Category,
        /// The category that listed it again.
        second: Category,
    },
    /// An extension was empty after normalization.
    #[error("Empty extension in category table")]
    EmptyExtension,
    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}'")]
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
}

/// Raw configuration as deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Category name to extensions. `None` keeps the built-in table.
    #[serde(default)]
    pub categories: Option<BTreeMap<String, Vec<String>>>,

    /// File filtering rules.
    #[serde(default)]
    pub filters: FilterRules,

    /// The file this configuration was read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Leave files whose name starts with "." in place. Defaults to false.
    #[serde(default)]
    pub skip_hidden: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.part").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Compiled configuration used by the organizing pipeline.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// The fixed category table.
    pub table: CategoryTable,
    /// Compiled exclusion rules.
    pub filters: CompiledFilters,
}

impl Config {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.extsortrc.toml` in the current directory
    /// 3. Look for `~/.config/extsort/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but cannot be read,
    /// or if any file found cannot be parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("extsort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        debug!("no configuration file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        debug!(path = %path.display(), "loading configuration");
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        let mut config = Self::from_toml(&content)?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// Compile configuration into the category table and filters.
    ///
    /// The file the configuration came from is always excluded, so organizing
    /// the directory that holds it never moves it away.
    ///
    /// # Errors
    ///
    /// Returns an error if a category name is unknown, extension sets overlap,
    /// or any glob or regex pattern is invalid.
    pub fn compile(self) -> Result<Settings, ConfigError> {
        let table = match self.categories {
            Some(categories) => {
                let parsed = categories
                    .into_iter()
                    .map(|(name, extensions)| {
                        name.parse::<Category>().map(|category| (category, extensions))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                CategoryTable::new(parsed)?
            }
            None => CategoryTable::default(),
        };

        let mut filters = CompiledFilters::new(self.filters)?;
        if let Some(source) = &self.source {
            filters = filters.protect(source);
        }

        Ok(Settings { table, filters })
    }
}

/// Compiled, validated filter rules.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    protected: Option<PathBuf>,
}

impl CompiledFilters {
    /// Create compiled filters from filter rules.
    ///
    /// # Errors
    ///
    /// Returns an error if any glob or regex patterns are invalid.
    pub fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            skip_hidden: rules.skip_hidden,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_patterns,
            exclude_regexes,
            protected: None,
        })
    }

    /// Always exclude `path`, whatever the other rules say.
    pub fn protect(mut self, path: &Path) -> Self {
        self.protected = Some(fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf()));
        self
    }

    fn is_protected(&self, file_path: &Path) -> bool {
        let Some(protected) = &self.protected else {
            return false;
        };
        // Cheap name check first; only resolve paths that could match
        protected.file_name() == file_path.file_name()
            && fs::canonicalize(file_path).is_ok_and(|resolved| &resolved == protected)
    }

    /// Check if a file is eligible for organization (not excluded).
    ///
    /// Only the file name is inspected; entries are always top-level.
    pub fn should_include(&self, file_path: &Path) -> bool {
        if self.is_protected(file_path) {
            return false;
        }

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self.skip_hidden && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(&*file_name) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_uses_builtin_table() {
        let settings = Config::default().compile().unwrap();
        assert_eq!(settings.table.classify("jpg"), Category::Images);
        assert!(settings.filters.should_include(Path::new(".hidden.txt")));
    }

    #[test]
    fn test_categories_section_replaces_table() {
        let config = Config::from_toml(
            r#"
            [categories]
            code = ["rs", ".TOML"]
            Images = ["png"]
            "#,
        )
        .unwrap();
        let settings = config.compile().unwrap();

        assert_eq!(settings.table.classify("rs"), Category::Code);
        assert_eq!(settings.table.classify("toml"), Category::Code);
        assert_eq!(settings.table.classify("png"), Category::Images);
        // Not listed any more, so it falls through to the catch-all
        assert_eq!(settings.table.classify("jpg"), Category::Other);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let config = Config::from_toml(
            r#"
            [categories]
            FONTS = ["ttf"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::UnknownCategory(name)) if name == "FONTS"
        ));
    }

    #[test]
    fn test_overlapping_categories_rejected() {
        let config = Config::from_toml(
            r#"
            [categories]
            DOCUMENTS = ["txt", "md"]
            CODE = ["md"]
            "#,
        )
        .unwrap();
        assert!(matches!(
            config.compile(),
            Err(ConfigError::OverlappingExtension { extension, .. }) if extension == "md"
        ));
    }

    #[test]
    fn test_invalid_toml_returns_error() {
        let result = Config::from_toml("[categories\nIMAGES = ");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_missing_explicit_config_returns_error() {
        let result = Config::load(Some(Path::new("/non/existent/extsort.toml")));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_loaded_config_file_is_never_included() {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp directory");
        let config_path = temp_dir.path().join(LOCAL_CONFIG_FILE);
        fs::write(&config_path, "[categories]\nCODE = [\"rs\", \"toml\"]\n").unwrap();
        fs::write(temp_dir.path().join("Cargo.toml"), "").unwrap();

        let config = Config::load(Some(config_path.as_path())).unwrap();
        assert_eq!(config.source.as_deref(), Some(config_path.as_path()));

        let settings = config.compile().unwrap();
        assert!(!settings.filters.should_include(&config_path));
        assert!(settings.filters.should_include(&temp_dir.path().join("Cargo.toml")));
    }

    #[test]
    fn test_from_toml_has_no_source() {
        let settings = Config::from_toml("").unwrap().compile().unwrap();
        assert!(settings.filters.should_include(Path::new(LOCAL_CONFIG_FILE)));
    }

    #[test]
    fn test_skip_hidden_files() {
        let filters = CompiledFilters::new(FilterRules {
            skip_hidden: true,
            ..Default::default()
        })
        .unwrap();

        assert!(!filters.should_include(Path::new(".DS_Store")));
        assert!(filters.should_include(Path::new("photo.jpg")));
    }

    #[test]
    fn test_exclude_exact_filename() {
        let filters = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                filenames: vec!["Thumbs.db".to_string()],
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();

        assert!(!filters.should_include(Path::new("/some/dir/Thumbs.db")));
        assert!(filters.should_include(Path::new("image.jpg")));
    }

    #[test]
    fn test_exclude_glob_patterns() {
        let filters = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["*.part".to_string(), "[0-9]*.tmp".to_string()],
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();

        assert!(!filters.should_include(Path::new("/downloads/movie.mkv.part")));
        assert!(!filters.should_include(Path::new("9cache.tmp")));
        assert!(filters.should_include(Path::new("cache.tmp")));
        assert!(filters.should_include(Path::new("movie.mkv")));
    }

    #[test]
    fn test_exclude_regex() {
        let filters = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                regex: vec![r"^~\$".to_string()],
                ..Default::default()
            },
            ..Default::default()
        })
        .unwrap();

        assert!(!filters.should_include(Path::new("~$report.docx")));
        assert!(filters.should_include(Path::new("report.docx")));
    }

    #[test]
    fn test_invalid_patterns_return_error() {
        let bad_glob = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                patterns: vec!["[invalid".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(bad_glob, Err(ConfigError::InvalidGlobPattern(_))));

        let bad_regex = CompiledFilters::new(FilterRules {
            exclude: ExcludeRules {
                regex: vec!["[invalid(".to_string()],
                ..Default::default()
            },
            ..Default::default()
        });
        assert!(matches!(
            bad_regex,
            Err(ConfigError::InvalidRegexPattern { .. })
        ));
    }
}
