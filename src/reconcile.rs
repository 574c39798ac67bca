use crate::attributes::{AttributeError, AttributeStore, NoAttributes};
use crate::checksum::{HashOutcome, digests_equal, hash_file};
use crate::dir_list::{DirListing, FileEntry};
use crate::exclusion::ExclusionRules;
use crate::manifest::{self, MANIFEST_NAME, Manifest, ManifestError};
use crate::report::{Marker, Reporter};
use std::path::Path;
use std::time::SystemTime;
use tracing::{debug, info, warn};

/// Decides which files of a directory get (re)hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePolicy {
    /// Hash only files without a recorded digest.
    Create,
    /// Like `Create`, and also re-hash files modified after the checksum
    /// file was last written.
    Refresh,
    /// Ignore any existing checksum file and hash everything.
    Reset,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirOutcome {
    /// Files whose content was read and hashed.
    pub hashed: usize,
    /// Files whose digest was recorded or changed.
    pub added: usize,
    /// The checksum file was (or, in a dry run, would have been) written.
    pub written: bool,
    /// The existing checksum file could not be trusted, nothing was done.
    pub untrusted: bool,
}

pub struct Reconciler<'a> {
    pub policy: UpdatePolicy,
    pub rules: &'a ExclusionRules,
    /// Used to detect hidden files.
    pub attributes: &'a dyn AttributeStore,
    pub include_hidden: bool,
    /// Apply protective attributes to written checksum files.
    pub protect: bool,
    pub dry_run: bool,
}

impl Reconciler<'_> {
    /// Brings the checksum file of `dir` up to date with `listing`.
    ///
    /// Never fails: every problem is reported against the file or checksum
    /// file it concerns and the rest of the directory is processed.
    pub fn reconcile_directory(
        &self,
        dir: &Path,
        listing: &DirListing,
        reporter: &mut dyn Reporter,
    ) -> DirOutcome {
        let manifest_path = dir.join(MANIFEST_NAME);
        let mut outcome = DirOutcome::default();

        let (mut manifest, manifest_mtime) = if self.policy == UpdatePolicy::Reset {
            (Manifest::new(), None)
        } else {
            let mtime = std::fs::metadata(&manifest_path)
                .and_then(|m| m.modified())
                .ok();
            match manifest::read(&manifest_path) {
                Ok(manifest) => (manifest, mtime),
                Err(ManifestError::NotFound(_)) => (Manifest::new(), None),
                Err(e) => {
                    warn!("Not updating {}: {}", dir.display(), e);
                    reporter.report(Marker::Denied, &manifest_path);
                    outcome.untrusted = true;
                    return outcome;
                }
            }
        };

        let mut dirty = false;

        for file in &listing.files {
            let path = dir.join(&file.name);

            if !self.is_candidate(&file.name, &path, reporter) {
                continue;
            }

            if !self.needs_hash(file, &manifest, manifest_mtime) {
                continue;
            }

            outcome.hashed += 1;
            match hash_file(&path) {
                HashOutcome::Hashed(digest) => {
                    let unchanged = manifest
                        .get(&file.name)
                        .is_some_and(|old| digests_equal(old, &digest));
                    if unchanged {
                        debug!("Checksum of {} unchanged", path.display());
                        continue;
                    }
                    manifest.insert(file.name.as_str(), digest);
                    reporter.report(Marker::Added, &path);
                    outcome.added += 1;
                    dirty = true;
                }
                HashOutcome::Vanished => {
                    reporter.report(Marker::Missing, &path);
                    manifest.remove(&file.name);
                }
                HashOutcome::Denied => {
                    reporter.report(Marker::Denied, &path);
                }
            }
        }

        if !dirty || manifest.is_empty() {
            return outcome;
        }

        if self.dry_run {
            info!("Would write {}", manifest_path.display());
            outcome.written = true;
            return outcome;
        }

        let protection: &dyn AttributeStore = if self.protect {
            self.attributes
        } else {
            &NoAttributes
        };

        match manifest::write(&manifest_path, &manifest, protection) {
            Ok(()) => {
                info!(
                    "Wrote {} ({} entries, {} added or changed)",
                    manifest_path.display(),
                    manifest.len(),
                    outcome.added
                );
                outcome.written = true;
            }
            Err(e) => {
                warn!("Failed to write {}: {}", manifest_path.display(), e);
                reporter.report(Marker::Denied, &manifest_path);
                // Content may already be in place when only protecting it failed.
                outcome.written = matches!(e, ManifestError::Protection { .. });
            }
        }

        outcome
    }

    /// Filters out the checksum file itself, leftovers of interrupted writes,
    /// excluded names and, unless requested, hidden files.
    fn is_candidate(&self, name: &str, path: &Path, reporter: &mut dyn Reporter) -> bool {
        if name == MANIFEST_NAME
            || manifest::is_temporary(name)
            || self.rules.is_file_excluded(name)
        {
            return false;
        }

        if self.include_hidden {
            return true;
        }

        match self.attributes.is_hidden(path) {
            Ok(hidden) => !hidden,
            Err(AttributeError::NotFound(_)) => {
                reporter.report(Marker::Missing, path);
                false
            }
            Err(e) => {
                warn!("Cannot determine whether {} is hidden: {}", path.display(), e);
                reporter.report(Marker::Denied, path);
                false
            }
        }
    }

    fn needs_hash(
        &self,
        file: &FileEntry,
        manifest: &Manifest,
        manifest_mtime: Option<SystemTime>,
    ) -> bool {
        if !manifest.contains(&file.name) {
            return true;
        }

        match self.policy {
            UpdatePolicy::Reset => true,
            UpdatePolicy::Create => false,
            UpdatePolicy::Refresh => match (manifest_mtime, file.mtime) {
                (Some(manifest_mtime), Some(file_mtime)) => manifest_mtime < file_mtime,
                _ => true,
            },
        }
    }
}
