//! Non-recursive directory listing.
//!
//! Lists the immediate children of one directory, split into the files that
//! are candidates for checksumming and the subdirectories to descend into.
//! Symbolic links are resolved: a link to a regular file counts as a file, a
//! link to a directory is neither listed nor followed, and a dangling link is
//! listed as a file (hashing it later reports it as missing). Names that
//! cannot be written to a checksum file are skipped with a warning.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum DirListError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

impl DirListError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => DirListError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => DirListError::PermissionDenied(path.to_path_buf()),
            _ => DirListError::Io(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    /// `None` if the modification time could not be read.
    pub mtime: Option<SystemTime>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirListing {
    /// Sorted by name.
    pub files: Vec<FileEntry>,
    /// Full paths, sorted.
    pub subdirs: Vec<PathBuf>,
}

impl DirListing {
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }
}

/// Checksum files are line based and trim each line, so names with line
/// breaks or surrounding whitespace would not read back as written.
fn is_representable(name: &str) -> bool {
    !name.contains(['\n', '\r']) && name.trim() == name
}

pub fn list_directory(dir: &Path) -> Result<DirListing, DirListError> {
    let read_dir = std::fs::read_dir(dir).map_err(|e| DirListError::from_io(dir, e))?;

    let mut listing = DirListing::default();

    for entry in read_dir {
        let entry = entry.map_err(|e| DirListError::from_io(dir, e))?;
        let path = entry.path();

        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            // Raced with a removal; the entry is simply not part of the listing.
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(DirListError::from_io(&path, e)),
        };

        if file_type.is_dir() {
            listing.subdirs.push(path);
            continue;
        }

        // Follows symlinks; fails for dangling ones.
        let metadata = std::fs::metadata(&path).ok();
        if metadata.as_ref().is_some_and(|m| m.is_dir()) {
            continue;
        }

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(
                "Skipping {}: file name is not valid UTF-8",
                path.display()
            );
            continue;
        };

        if !is_representable(&name) {
            warn!(
                "Skipping {:?}: file name cannot be stored in a checksum file",
                path
            );
            continue;
        }

        listing.files.push(FileEntry {
            name,
            mtime: metadata.and_then(|m| m.modified().ok()),
        });
    }

    listing.files.sort_by(|a, b| a.name.cmp(&b.name));
    listing.subdirs.sort();

    Ok(listing)
}
