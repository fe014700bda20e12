//! Conditional, atomic replacement of a published file.
//!
//! Content is staged in a temporary file next to the destination (same
//! filesystem, so the final rename is atomic), compared against what is
//! already published, and only promoted when it differs. The staged file is
//! removed when the [`StagedFile`] is dropped, whether or not it was promoted.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Mode bits for published files: owner read/write, group/other read.
#[cfg(unix)]
pub const PUBLISHED_MODE: u32 = 0o644;

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Nothing was published at the destination before.
    Created,
    /// The destination existed with different content.
    Updated,
    /// The destination already holds identical content; it was not touched.
    Unchanged,
}

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> PublishError + '_ {
    move |e| {
        if e.kind() == ErrorKind::PermissionDenied {
            PublishError::PermissionDenied(path.to_path_buf())
        } else {
            PublishError::Io(e)
        }
    }
}

/// Content written to a temporary file, waiting to replace `destination`.
#[derive(Debug)]
pub struct StagedFile {
    temp_file: NamedTempFile,
    content: Vec<u8>,
    destination: PathBuf,
}

impl StagedFile {
    /// Write `content` to a fresh temporary file in `destination`'s directory
    /// and sync it to disk.
    pub fn stage(destination: &Path, content: Vec<u8>) -> Result<Self, PublishError> {
        let parent = match destination.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };

        let mut temp_file = NamedTempFile::new_in(parent).map_err(map_io(parent))?;
        temp_file
            .write_all(&content)
            .map_err(map_io(temp_file.path()))?;
        temp_file.as_file().sync_all().map_err(PublishError::Io)?;

        debug!(
            "Staged {} bytes for {} in {}",
            content.len(),
            destination.display(),
            temp_file.path().display()
        );

        Ok(StagedFile {
            temp_file,
            content,
            destination: destination.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn temp_path(&self) -> &Path {
        self.temp_file.path()
    }

    /// What [`StagedFile::promote`] would do, without doing it.
    pub fn pending_outcome(&self) -> Result<PublishOutcome, PublishError> {
        match std::fs::read(&self.destination) {
            Ok(existing) if existing == self.content => Ok(PublishOutcome::Unchanged),
            Ok(_) => Ok(PublishOutcome::Updated),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(PublishOutcome::Created),
            Err(e) => Err(map_io(&self.destination)(e)),
        }
    }

    /// Replace the destination with the staged content unless it is already
    /// byte-identical, in which case the destination is left untouched.
    pub fn promote(self) -> Result<PublishOutcome, PublishError> {
        let outcome = self.pending_outcome()?;
        if outcome == PublishOutcome::Unchanged {
            return Ok(outcome);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            self.temp_file
                .as_file()
                .set_permissions(std::fs::Permissions::from_mode(PUBLISHED_MODE))
                .map_err(PublishError::Io)?;
        }

        let destination = self.destination;
        self.temp_file
            .persist(&destination)
            .map_err(|e| map_io(&destination)(e.error))?;

        Ok(outcome)
    }
}
