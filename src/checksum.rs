use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 8192;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("File modified during checksumming: {0}")]
    ConcurrentModification(PathBuf),
}

impl ChecksumError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => ChecksumError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => ChecksumError::PermissionDenied(path.to_path_buf()),
            _ => ChecksumError::Io(e),
        }
    }
}

pub struct FileChecksum {
    /// Lowercase hex encoded.
    pub sha256: String,
    /// Number of bytes hashed.
    pub size: u64,
}

/// Result of hashing one file, as consumed by the reconciliation and
/// verification loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutcome {
    Hashed(String),
    /// The file disappeared between listing and hashing.
    Vanished,
    /// The file exists but could not be read to completion.
    Denied,
}

/// Computes the SHA-256 checksum of a file with concurrent modification detection.
///
/// # Behavior
/// - Records the file's modification time before reading
/// - Reads the file in fixed-size chunks, so memory use does not depend on file size
/// - Verifies the modification time hasn't changed after reading
///
/// # Errors
/// - `ChecksumError::NotFound`: the file does not exist (anymore)
/// - `ChecksumError::PermissionDenied`: insufficient permissions to read the file
/// - `ChecksumError::ConcurrentModification`: the file was detected as being modified
///   while checksumming. The absence of this error is *not* a guarantee that the
///   file was *not* modified.
/// - `ChecksumError::Io`: any other I/O failure
pub fn checksum_file(path: &Path) -> Result<FileChecksum, ChecksumError> {
    let metadata_before = std::fs::metadata(path).map_err(|e| ChecksumError::from_io(path, e))?;
    let mtime_before = metadata_before.modified().map_err(ChecksumError::Io)?;

    let mut file = File::open(path).map_err(|e| ChecksumError::from_io(path, e))?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; CHUNK_SIZE];
    let mut size = 0u64;

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|e| ChecksumError::from_io(path, e))?;
        if bytes_read == 0 {
            break;
        }
        size += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    let metadata_after = std::fs::metadata(path).map_err(|e| ChecksumError::from_io(path, e))?;
    let mtime_after = metadata_after.modified().map_err(ChecksumError::Io)?;

    if mtime_before != mtime_after {
        return Err(ChecksumError::ConcurrentModification(path.to_path_buf()));
    }

    let checksum = FileChecksum {
        sha256: format!("{:x}", hasher.finalize()),
        size,
    };

    debug!(
        "Checksum of {} is {} ({} bytes)",
        path.display(),
        checksum.sha256,
        checksum.size
    );

    Ok(checksum)
}

/// Hashes `path` and folds every failure into a [`HashOutcome`].
///
/// Failures other than a missing file are reported as `Denied`; the
/// underlying cause is logged at warn level since the marker alone does not
/// carry it.
pub fn hash_file(path: &Path) -> HashOutcome {
    match checksum_file(path) {
        Ok(checksum) => HashOutcome::Hashed(checksum.sha256),
        Err(ChecksumError::NotFound(_)) => HashOutcome::Vanished,
        Err(ChecksumError::PermissionDenied(_)) => HashOutcome::Denied,
        Err(e) => {
            warn!("Failed to checksum {}: {}", path.display(), e);
            HashOutcome::Denied
        }
    }
}

/// Digest equality as used throughout: hex digests compare case-insensitively.
pub fn digests_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
