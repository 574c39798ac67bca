use crate::checksum::{HashOutcome, digests_equal, hash_file};
use crate::dir_list::DirListing;
use crate::manifest::{self, MANIFEST_SUFFIX};
use crate::report::{Marker, Reporter};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// Checksum files that were loaded successfully.
    pub manifests: usize,
    /// Files re-hashed and compared.
    pub checked: usize,
    pub mismatched: usize,
}

/// Re-hashes every file referenced by the checksum files in `dir` and
/// reports the ones that are missing, unreadable or different.
///
/// Every listed file ending in `.sha256` is treated as a checksum file. One
/// that cannot be loaded is reported and skipped. Nothing is ever written.
pub fn verify_directory(
    dir: &Path,
    listing: &DirListing,
    reporter: &mut dyn Reporter,
) -> VerifyOutcome {
    let mut outcome = VerifyOutcome::default();

    for file in &listing.files {
        if !file.name.ends_with(MANIFEST_SUFFIX) {
            continue;
        }

        let manifest_path = dir.join(&file.name);
        let manifest = match manifest::read(&manifest_path) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("Skipping {}: {}", manifest_path.display(), e);
                reporter.report(Marker::Denied, &manifest_path);
                continue;
            }
        };
        outcome.manifests += 1;

        for (name, expected) in manifest.iter() {
            let path = dir.join(name);
            outcome.checked += 1;

            match hash_file(&path) {
                HashOutcome::Hashed(actual) if digests_equal(&actual, expected) => {
                    debug!("{} OK", path.display());
                }
                HashOutcome::Hashed(actual) => {
                    debug!(
                        "{} expected {} but found {}",
                        path.display(),
                        expected,
                        actual
                    );
                    reporter.report(Marker::Mismatch, &path);
                    outcome.mismatched += 1;
                }
                HashOutcome::Vanished => reporter.report(Marker::Missing, &path),
                HashOutcome::Denied => reporter.report(Marker::Denied, &path),
            }
        }
    }

    outcome
}
