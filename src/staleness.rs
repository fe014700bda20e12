//! Decides whether a manifest entry can be trusted without re-hashing.
//!
//! The only clock is the manifest file's own mtime. An entry is reused when
//! the manifest was published strictly after the file was last modified.
//! Equal timestamps count as stale: on filesystems with coarse timestamp
//! resolution a write in the same tick as the publish must not be trusted.
//! The opposite failure (a file modified in the same tick but reported with
//! an older mtime) is not detectable here.

use crate::file_set::TrackedFile;
use crate::manifest::PublishedManifest;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleReason {
    /// There is no manifest yet.
    NoManifest,
    /// The manifest has no entry for the file.
    Untracked,
    /// The file was modified at or after the manifest was published.
    ModifiedSincePublish,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness<'a> {
    Reuse(&'a str),
    Recompute(StaleReason),
}

pub fn assess<'a>(file: &TrackedFile, prior: Option<&'a PublishedManifest>) -> Freshness<'a> {
    let Some(prior) = prior else {
        return Freshness::Recompute(StaleReason::NoManifest);
    };

    match prior.manifest.get(&file.name) {
        None => Freshness::Recompute(StaleReason::Untracked),
        Some(md5) if prior.published > file.mtime => Freshness::Reuse(md5),
        Some(_) => Freshness::Recompute(StaleReason::ModifiedSincePublish),
    }
}
