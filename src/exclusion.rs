//! Name-based exclusion rules for directories and files.
//!
//! Patterns use shell-glob syntax (`*`, `?`, `[...]`) and are matched
//! case-sensitively against a single path component. A pattern without
//! wildcards is simply an exact name.

use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::Path;

/// Directory names skipped by default: recycle bin and volume metadata.
pub const DEFAULT_EXCLUDED_DIRS: &[&str] = &["$RECYCLE.BIN", "System Volume Information"];

/// File names skipped by default: desktop metadata and any checksum file.
pub const DEFAULT_EXCLUDED_FILES: &[&str] = &["desktop.ini", "Thumbs.db", ".DS_Store", "*.sha256"];

#[derive(Debug, thiserror::Error)]
pub enum ExclusionError {
    #[error("Invalid exclusion pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
}

/// A compiled set of name patterns.
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    globs: GlobSet,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Result<Self, ExclusionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = Glob::new(pattern).map_err(|source| ExclusionError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let globs = builder
            .build()
            .map_err(|source| ExclusionError::InvalidPattern {
                pattern: patterns.join(", "),
                source,
            })?;
        Ok(PatternSet { patterns, globs })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

/// True iff `name` matches any pattern in `set`.
pub fn is_excluded(name: &str, set: &PatternSet) -> bool {
    set.globs.is_match(name)
}

/// Immutable exclusion configuration for one run.
#[derive(Debug, Clone)]
pub struct ExclusionRules {
    pub dirs: PatternSet,
    pub files: PatternSet,
}

impl ExclusionRules {
    /// Builds the rules from the defaults plus user-supplied extra patterns.
    pub fn with_extra(extra_dirs: &[String], extra_files: &[String]) -> Result<Self, ExclusionError> {
        let dirs = DEFAULT_EXCLUDED_DIRS
            .iter()
            .map(|p| p.to_string())
            .chain(extra_dirs.iter().cloned());
        let files = DEFAULT_EXCLUDED_FILES
            .iter()
            .map(|p| p.to_string())
            .chain(extra_files.iter().cloned());

        Ok(ExclusionRules {
            dirs: PatternSet::new(dirs)?,
            files: PatternSet::new(files)?,
        })
    }

    pub fn is_file_excluded(&self, name: &str) -> bool {
        is_excluded(name, &self.files)
    }

    /// Matches the last component of `dir` only. Paths without a final name
    /// component (such as `.`) are never excluded.
    pub fn is_dir_excluded(&self, dir: &Path) -> bool {
        dir.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| is_excluded(name, &self.dirs))
    }
}
