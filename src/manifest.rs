mod grammar;

use crate::attributes::{AttributeError, AttributeStore};
use std::collections::HashMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use grammar::DELIMITER;

/// Name of the checksum file maintained in each directory.
pub const MANIFEST_NAME: &str = ".checksums.sha256";

/// Any file with this suffix is treated as a checksum file when verifying.
pub const MANIFEST_SUFFIX: &str = ".sha256";

/// Suffix of the temporary file a write goes through. Must not end in
/// [`MANIFEST_SUFFIX`], or a leftover from an interrupted write would be
/// verified as a checksum file.
const TEMP_SUFFIX: &str = ".sha256.tmp";

const TEMP_PREFIX: &str = ".checksums-";

/// True for a temporary file left behind by an interrupted [`write`].
pub fn is_temporary(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Permission denied changing attributes of {path}: {source}")]
    Protection {
        path: PathBuf,
        source: AttributeError,
    },
    #[error("Malformed checksum file {path} at line {line}")]
    Format { path: PathBuf, line: usize },
    #[error("Checksum file {0} is not valid UTF-8")]
    InvalidUtf8(PathBuf),
}

impl ManifestError {
    fn from_io(path: &Path, e: std::io::Error) -> Self {
        match e.kind() {
            ErrorKind::NotFound => ManifestError::NotFound(path.to_path_buf()),
            ErrorKind::PermissionDenied => ManifestError::PermissionDenied(path.to_path_buf()),
            _ => ManifestError::Io(e),
        }
    }
}

/// Ordered mapping of file name to hex digest for one directory.
///
/// Iteration follows insertion order. Overwriting an existing name keeps its
/// position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.index
            .get(name)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Inserts or overwrites `name`, returning the previous digest.
    pub fn insert(&mut self, name: impl Into<String>, digest: impl Into<String>) -> Option<String> {
        let name = name.into();
        let digest = digest.into();
        match self.index.get(&name) {
            Some(&position) => Some(std::mem::replace(&mut self.entries[position].1, digest)),
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, digest));
                None
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        let position = self.index.remove(name)?;
        let (_, digest) = self.entries.remove(position);
        for (i, (entry_name, _)) in self.entries.iter().enumerate().skip(position) {
            self.index.insert(entry_name.clone(), i);
        }
        Some(digest)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(name, digest)| (name.as_str(), digest.as_str()))
    }

    /// Parses checksum file text. Blank lines and lines starting with `#` or
    /// `;` are ignored. Any other line must match one of the accepted
    /// grammars; on failure the 1-based number of the offending line is
    /// returned and nothing else.
    ///
    /// A name listed more than once keeps its first digest.
    pub fn parse(content: &str) -> Result<Manifest, usize> {
        let mut manifest = Manifest::new();

        for (i, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            let (name, digest) = grammar::parse_line(line).ok_or(i + 1)?;
            if !manifest.contains(&name) {
                manifest.insert(name, digest);
            }
        }

        Ok(manifest)
    }

    /// Canonical text form: one `<digest>  <name>` line per entry, `\n`
    /// terminated on every platform.
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for (name, digest) in self.iter() {
            text.push_str(digest);
            text.push_str(DELIMITER);
            text.push_str(name);
            text.push('\n');
        }
        text
    }

    /// Drops entries whose file no longer exists under `dir`.
    ///
    /// Entries whose existence cannot be determined are kept; hashing them
    /// later reports the actual problem.
    fn retain_existing(&mut self, dir: &Path) {
        let stale: Vec<String> = self
            .iter()
            .filter(|(name, _)| matches!(dir.join(name).try_exists(), Ok(false)))
            .map(|(name, _)| name.to_string())
            .collect();

        for name in stale {
            debug!("Dropping entry for missing file {}", dir.join(&name).display());
            self.remove(&name);
        }
    }
}

/// Loads the checksum file at `path`, dropping entries for files that no
/// longer exist next to it.
///
/// A single unparseable line fails the whole load.
pub fn read(path: &Path) -> Result<Manifest, ManifestError> {
    let bytes = std::fs::read(path).map_err(|e| ManifestError::from_io(path, e))?;
    let content =
        String::from_utf8(bytes).map_err(|_| ManifestError::InvalidUtf8(path.to_path_buf()))?;

    let mut manifest = Manifest::parse(&content).map_err(|line| ManifestError::Format {
        path: path.to_path_buf(),
        line,
    })?;

    let dir = path.parent().unwrap_or(Path::new("."));
    manifest.retain_existing(dir);

    Ok(manifest)
}

/// Writes `manifest` to `path` in canonical form.
///
/// The protective attributes of an existing file are cleared first. The new
/// content is written to a temporary file next to `path`, flushed to disk and
/// renamed into place, after which the protective attributes are applied. If
/// applying them fails the content has still been replaced.
pub fn write(
    path: &Path,
    manifest: &Manifest,
    attributes: &dyn AttributeStore,
) -> Result<(), ManifestError> {
    let protection_error = |source| ManifestError::Protection {
        path: path.to_path_buf(),
        source,
    };

    match attributes.unprotect(path) {
        Ok(()) | Err(AttributeError::NotFound(_)) => {}
        Err(e) => return Err(protection_error(e)),
    }

    let parent = path.parent().unwrap_or(Path::new("."));

    let mut builder = tempfile::Builder::new();
    builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        // NamedTempFile defaults to owner-only access; keep the existing
        // file's mode, or the umask-filtered default for a new one.
        let permissions = std::fs::metadata(path)
            .map(|m| m.permissions())
            .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o666));
        builder.permissions(permissions);
    }

    let mut temp_file = builder
        .tempfile_in(parent)
        .map_err(|e| ManifestError::from_io(parent, e))?;

    temp_file
        .write_all(manifest.to_text().as_bytes())
        .map_err(|e| ManifestError::from_io(path, e))?;

    temp_file.as_file().sync_all().map_err(ManifestError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| ManifestError::from_io(path, e.error))?;

    attributes.protect(path).map_err(protection_error)?;

    Ok(())
}
