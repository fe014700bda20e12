//! The plain-text checksum ledger.
//!
//! One entry per line, `<md5>  <filename>\n`, no header. File names are the
//! last whitespace-separated token on a line, so names containing whitespace
//! cannot be represented; serialization rejects them instead of writing a
//! line that would read back differently.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub const MANIFEST_FILENAME: &str = "manifest-md5.txt";

const CHECKSUM_LEN: usize = 32;
const SEPARATOR: &str = "  ";

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Manifest line {line}: expected '<checksum>  <filename>', found {tokens} token(s)")]
    MalformedLine { line: usize, tokens: usize },
    #[error("Manifest line {line}: invalid checksum {checksum:?}")]
    InvalidChecksum { line: usize, checksum: String },
    #[error("Manifest line {line}: duplicate entry for {filename}")]
    DuplicateEntry { line: usize, filename: String },
    #[error("Cannot record {0:?} in the manifest: file names must not contain whitespace")]
    UnrepresentableName(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub filename: String,
    /// Hex encoded.
    pub md5: String,
}

/// Insertion-ordered mapping from file name to checksum.
///
/// Overwriting an existing name keeps its position; new names are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
}

/// A manifest read from disk together with its publish time (the file's mtime).
#[derive(Debug, Clone)]
pub struct PublishedManifest {
    pub manifest: Manifest,
    pub published: SystemTime,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.index
            .get(filename)
            .map(|&i| self.entries[i].md5.as_str())
    }

    /// Inserts or overwrites `filename`. Returns the previous checksum, if any.
    pub fn insert(&mut self, filename: String, md5: String) -> Option<String> {
        match self.index.get(&filename) {
            Some(&i) => Some(std::mem::replace(&mut self.entries[i].md5, md5)),
            None => {
                self.index.insert(filename.clone(), self.entries.len());
                self.entries.push(ManifestEntry { filename, md5 });
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    /// Parse manifest text.
    ///
    /// Every line must hold exactly two whitespace-separated tokens: a 32 digit
    /// hex checksum followed by a file name. Anything else, including blank
    /// lines, is an error. A file name may appear only once. Checksums are
    /// kept exactly as written so reused entries serialize back unchanged.
    pub fn parse(content: &str) -> Result<Self, ManifestError> {
        let mut manifest = Manifest::new();

        for (i, line) in content.lines().enumerate() {
            let line_no = i + 1;
            let tokens: Vec<&str> = line.split_whitespace().collect();
            let [checksum, filename] = tokens.as_slice() else {
                return Err(ManifestError::MalformedLine {
                    line: line_no,
                    tokens: tokens.len(),
                });
            };

            if !is_valid_checksum(checksum) {
                return Err(ManifestError::InvalidChecksum {
                    line: line_no,
                    checksum: checksum.to_string(),
                });
            }

            if manifest
                .insert(filename.to_string(), checksum.to_string())
                .is_some()
            {
                return Err(ManifestError::DuplicateEntry {
                    line: line_no,
                    filename: filename.to_string(),
                });
            }
        }

        Ok(manifest)
    }

    /// Serialize to the on-disk format, in insertion order.
    pub fn to_text(&self) -> Result<String, ManifestError> {
        let mut out = String::with_capacity(self.entries.len() * 64);
        for entry in self.iter() {
            if entry.filename.is_empty() || entry.filename.chars().any(char::is_whitespace) {
                return Err(ManifestError::UnrepresentableName(entry.filename.clone()));
            }
            out.push_str(&entry.md5);
            out.push_str(SEPARATOR);
            out.push_str(&entry.filename);
            out.push('\n');
        }
        Ok(out)
    }

    /// Load the manifest at `path`, or `None` if there is no manifest yet.
    ///
    /// The publish time is sampled before reading the content.
    pub fn load(path: &Path) -> Result<Option<PublishedManifest>, ManifestError> {
        let map_err = |e: std::io::Error| {
            if e.kind() == ErrorKind::PermissionDenied {
                ManifestError::PermissionDenied(path.to_path_buf())
            } else {
                ManifestError::Io(e)
            }
        };

        let metadata = match std::fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(map_err(e)),
        };
        let published = metadata.modified().map_err(ManifestError::Io)?;

        let content = std::fs::read_to_string(path).map_err(map_err)?;
        let manifest = Self::parse(&content)?;

        Ok(Some(PublishedManifest {
            manifest,
            published,
        }))
    }
}

fn is_valid_checksum(token: &str) -> bool {
    token.len() == CHECKSUM_LEN && token.bytes().all(|b| b.is_ascii_hexdigit())
}
