use crate::checksum::{ChecksumError, checksum_file};
use crate::config::ManifestConfig;
use crate::file_set::{FileSetError, resolve_file_set};
use crate::manifest::{Manifest, ManifestError};
use crate::publish::{PublishError, PublishOutcome, StagedFile};
use crate::staleness::{Freshness, StaleReason, assess};
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),
    #[error("File listing error: {0}")]
    FileSet(#[from] FileSetError),
    #[error("Checksum error: {0}")]
    Checksum(#[from] ChecksumError),
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

#[derive(Debug, Default)]
pub struct UpdateOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No tracked file needed a new checksum; nothing was written or compared.
    NoChanges,
    /// Checksums were recomputed and the manifest was created, updated, or
    /// found to already hold identical content.
    Published(PublishOutcome),
}

#[derive(Debug)]
pub struct UpdateResult {
    pub outcome: UpdateOutcome,
    /// Files hashed during this run.
    pub files_checksummed: usize,
    /// Files whose checksum was taken from the existing manifest.
    pub files_reused: usize,
    pub manifest_path: PathBuf,
}

/// Bring the manifest in `config.directory` up to date.
///
/// # Behavior
///
/// **Incremental checksumming:**
/// - Resolves the tracked files from `config.patterns`
/// - Loads the existing manifest, if any, and its mtime as the publish time
/// - Only checksums files that are untracked, or whose mtime is not strictly
///   older than the publish time; every other entry is reused as is
/// - Entries for files that no longer exist are kept
///
/// **Selective writing:**
/// - If nothing was checksummed, returns `NoChanges` without any further I/O
/// - Otherwise the new manifest is staged next to the old one and only
///   promoted if its bytes differ, so a re-hash that reproduces the same
///   digests does not touch the published manifest or its mtime
///
/// **Dry run:**
/// - If `options.dry_run`, the manifest is staged and compared but never
///   promoted; the outcome reports what would have happened
///
/// A missing manifest always counts as a change, so a first run publishes a
/// manifest even when no tracked files exist.
///
/// Concurrent runs against the same manifest are not coordinated; callers
/// must serialize them.
pub fn update_manifest(
    config: &ManifestConfig,
    options: &UpdateOptions,
) -> Result<UpdateResult, UpdateError> {
    let files = resolve_file_set(&config.directory, config.patterns.as_slice())?;
    let prior = Manifest::load(&config.manifest_path)?;

    let mut changed = prior.is_none();
    let mut files_checksummed = 0;
    let mut files_reused = 0;
    let mut recomputed = Vec::new();

    for file in &files {
        match assess(file, prior.as_ref()) {
            Freshness::Reuse(md5) => {
                debug!("Reusing checksum {} for {}", md5, file.name);
                files_reused += 1;
            }
            Freshness::Recompute(reason) => {
                if reason == StaleReason::ModifiedSincePublish {
                    debug!("{} modified since manifest was published", file.name);
                }
                let md5 = checksum_file(&config.directory.join(&file.name))?;
                recomputed.push((file.name.clone(), md5));
                files_checksummed += 1;
                changed = true;
            }
        }
    }

    if !changed {
        return Ok(UpdateResult {
            outcome: UpdateOutcome::NoChanges,
            files_checksummed,
            files_reused,
            manifest_path: config.manifest_path.clone(),
        });
    }

    let mut manifest = prior.map(|p| p.manifest).unwrap_or_default();
    for (name, md5) in recomputed {
        manifest.insert(name, md5);
    }

    let staged = StagedFile::stage(&config.manifest_path, manifest.to_text()?.into_bytes())?;
    let publish_outcome = if options.dry_run {
        staged.pending_outcome()?
    } else {
        staged.promote()?
    };

    Ok(UpdateResult {
        outcome: UpdateOutcome::Published(publish_outcome),
        files_checksummed,
        files_reused,
        manifest_path: config.manifest_path.clone(),
    })
}
