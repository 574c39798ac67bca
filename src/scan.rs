use crate::attributes::{AttributeError, AttributeStore};
use crate::dir_list::{DirListError, DirListing, list_directory};
use crate::exclusion::ExclusionRules;
use crate::manifest::MANIFEST_NAME;
use crate::reconcile::{Reconciler, UpdatePolicy};
use crate::report::{Marker, Reporter, Tally};
use crate::verify::verify_directory;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A directory containing a file with this name is never processed.
pub const SENTINEL_NAME: &str = ".nochecksums";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Update(UpdatePolicy),
    Verify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub mode: Mode,
    pub include_hidden: bool,
    /// Compute and report, but never write checksum files.
    pub dry_run: bool,
    /// Apply protective attributes to written checksum files.
    pub protect: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("Directory listing error: {0}")]
    DirList(#[from] DirListError),
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScanResult {
    pub directories_visited: usize,
    /// Directories whose files were considered (not skipped).
    pub directories_processed: usize,
    /// Directories left alone because their checksum file could not be read.
    pub directories_untrusted: usize,
    pub files_hashed: usize,
    /// Checksum files successfully read while verifying.
    pub manifests_read: usize,
    /// Checksum files written (or that would be written in a dry run).
    pub manifests_written: Vec<PathBuf>,
    pub added: usize,
    pub missing: usize,
    pub denied: usize,
    pub mismatched: usize,
}

struct Scan<'a> {
    options: ScanOptions,
    rules: &'a ExclusionRules,
    attributes: &'a dyn AttributeStore,
    result: ScanResult,
}

/// Walks the tree below `root` top-down, creating, updating or verifying the
/// checksum file of every directory according to `options.mode`.
///
/// Only a failure to list `root` itself is an error. Problems below it are
/// reported through `reporter` and the walk continues.
pub fn scan_tree(
    root: &Path,
    options: ScanOptions,
    rules: &ExclusionRules,
    attributes: &dyn AttributeStore,
    reporter: &mut dyn Reporter,
) -> Result<ScanResult, ScanError> {
    let listing = list_directory(root)?;

    let mut tally = Tally::new(reporter);
    let mut scan = Scan {
        options,
        rules,
        attributes,
        result: ScanResult::default(),
    };
    scan.visit(root, listing, &mut tally);

    let mut result = scan.result;
    result.added = tally.added;
    result.missing = tally.missing;
    result.denied = tally.denied;
    result.mismatched = tally.mismatched;
    Ok(result)
}

impl Scan<'_> {
    fn visit(&mut self, dir: &Path, listing: DirListing, reporter: &mut dyn Reporter) {
        self.result.directories_visited += 1;

        if self.should_process(dir, &listing) {
            self.process(dir, &listing, reporter);
        }

        for subdir in &listing.subdirs {
            match list_directory(subdir) {
                Ok(sub_listing) => self.visit(subdir, sub_listing, reporter),
                Err(DirListError::NotFound(_)) => {
                    debug!("{} vanished before it could be listed", subdir.display());
                }
                Err(e) => {
                    warn!("Cannot list {}: {}", subdir.display(), e);
                    reporter.report(Marker::Denied, subdir);
                }
            }
        }
    }

    fn should_process(&self, dir: &Path, listing: &DirListing) -> bool {
        if listing.files.is_empty() {
            return false;
        }

        if listing.contains_file(SENTINEL_NAME) {
            debug!("Skipping {}: contains {}", dir.display(), SENTINEL_NAME);
            return false;
        }

        if self.rules.is_dir_excluded(dir) {
            debug!("Skipping excluded directory {}", dir.display());
            return false;
        }

        if self.options.include_hidden {
            return true;
        }

        match self.attributes.is_hidden(dir) {
            Ok(true) => {
                debug!("Skipping hidden directory {}", dir.display());
                false
            }
            Ok(false) => true,
            Err(AttributeError::NotFound(_)) => false,
            Err(e) => {
                warn!("Cannot determine whether {} is hidden: {}", dir.display(), e);
                true
            }
        }
    }

    fn process(&mut self, dir: &Path, listing: &DirListing, reporter: &mut dyn Reporter) {
        self.result.directories_processed += 1;

        match self.options.mode {
            Mode::Update(policy) => {
                let reconciler = Reconciler {
                    policy,
                    rules: self.rules,
                    attributes: self.attributes,
                    include_hidden: self.options.include_hidden,
                    protect: self.options.protect,
                    dry_run: self.options.dry_run,
                };
                let outcome = reconciler.reconcile_directory(dir, listing, reporter);
                self.result.files_hashed += outcome.hashed;
                if outcome.untrusted {
                    self.result.directories_untrusted += 1;
                }
                if outcome.written {
                    self.result.manifests_written.push(dir.join(MANIFEST_NAME));
                }
            }
            Mode::Verify => {
                let outcome = verify_directory(dir, listing, reporter);
                self.result.files_hashed += outcome.checked;
                self.result.manifests_read += outcome.manifests;
            }
        }
    }
}
