//! Contents index for the Walters collections.
//!
//! One CSV row per item directory under the configured collection
//! directories, published through the same staging step as the manifest.

use crate::config::ContentsConfig;
use crate::publish::{PublishError, PublishOutcome, StagedFile};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const METADATA_FILE: &str = "data/metadata.xml";
/// Only this much of each metadata file is searched for the title.
const TITLE_SCAN_BYTES: u64 = 8192;
const TITLE_OPEN: &str = "<dc:title>";
const TITLE_CLOSE: &str = "</dc:title>";

const OTHER_COLLECTIONS: &str = "OtherCollections";
/// Directory names ending in one of these words are not items.
const SKIPPED_WORDS: &[&str] = &["html", "wam-kiosks", "ManuscriptDescriptions"];
/// Names ending in `WDL` plus a run of word characters or hyphens are not items.
const SKIPPED_WDL: &str = "WDL";

#[derive(Debug, thiserror::Error)]
pub enum ContentsError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
    #[error("Path {0} is not valid UTF-8")]
    NonUtf8Path(PathBuf),
}

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> ContentsError + '_ {
    move |e| {
        if e.kind() == ErrorKind::PermissionDenied {
            ContentsError::PermissionDenied(path.to_path_buf())
        } else {
            ContentsError::Io(e)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContentsRow {
    pub document_id: String,
    pub path: String,
    pub title: String,
    pub metadata_type: String,
    pub created: String,
    pub updated: String,
}

#[derive(Debug)]
pub struct ContentsResult {
    pub outcome: PublishOutcome,
    pub rows: usize,
    pub destination: PathBuf,
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// True if `head` is empty or ends in a non-word character.
fn at_word_boundary(head: &str) -> bool {
    !head.chars().next_back().is_some_and(is_word_char)
}

fn is_skipped(name: &str) -> bool {
    let ends_in_word = SKIPPED_WORDS.iter().any(|word| {
        name.strip_suffix(word).is_some_and(at_word_boundary)
    });
    let ends_in_wdl = name.match_indices(SKIPPED_WDL).any(|(i, _)| {
        at_word_boundary(&name[..i])
            && name[i + SKIPPED_WDL.len()..]
                .chars()
                .all(|c| is_word_char(c) || c == '-')
    });
    ends_in_word || ends_in_wdl
}

fn metadata_type(collection_dir: &Path) -> &'static str {
    if collection_dir.file_name() == Some(std::ffi::OsStr::new(OTHER_COLLECTIONS)) {
        "Walters NO-TEI"
    } else {
        "Walters TEI"
    }
}

fn format_timestamp(time: std::time::SystemTime) -> String {
    let datetime: DateTime<Utc> = time.into();
    datetime.to_rfc3339_opts(SecondsFormat::Secs, false)
}

/// Text between the first `<dc:title>` and the last `</dc:title>`, trimmed.
pub fn extract_title(fragment: &str) -> Option<&str> {
    let start = fragment.find(TITLE_OPEN)? + TITLE_OPEN.len();
    let end = fragment.rfind(TITLE_CLOSE)?;
    (end > start).then(|| fragment[start..end].trim())
}

fn read_title(item_dir: &Path) -> Result<String, ContentsError> {
    let path = item_dir.join(METADATA_FILE);
    let mut fragment = Vec::new();
    File::open(&path)
        .and_then(|f| f.take(TITLE_SCAN_BYTES).read_to_end(&mut fragment))
        .map_err(map_io(&path))?;

    let fragment = String::from_utf8_lossy(&fragment);
    match extract_title(&fragment) {
        Some(title) => Ok(title.to_string()),
        None => {
            warn!("No title found in {}", path.display());
            Ok(String::new())
        }
    }
}

/// Collect one row per item directory, collection by collection, items
/// sorted by name.
pub fn collect_rows(config: &ContentsConfig) -> Result<Vec<ContentsRow>, ContentsError> {
    let mut rows = Vec::new();

    for collection_dir in &config.collection_dirs {
        let read_dir = match std::fs::read_dir(collection_dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Collection directory {} not found", collection_dir.display());
                continue;
            }
            Err(e) => return Err(map_io(collection_dir)(e)),
        };

        let mut items = Vec::new();
        for entry in read_dir {
            let entry = entry.map_err(ContentsError::Io)?;
            let path = entry.path();
            let name = entry.file_name();
            let name = name
                .to_str()
                .ok_or_else(|| ContentsError::NonUtf8Path(path.clone()))?;
            if is_skipped(name) || !path.is_dir() {
                debug!("Skipping {}", path.display());
                continue;
            }
            items.push(path);
        }
        items.sort();

        for item_dir in items {
            let relative = item_dir
                .strip_prefix(&config.base_dir)
                .unwrap_or(&item_dir)
                .to_str()
                .ok_or_else(|| ContentsError::NonUtf8Path(item_dir.clone()))?
                .to_string();
            let mtime = std::fs::metadata(&item_dir)
                .and_then(|m| m.modified())
                .map_err(map_io(&item_dir))?;
            let timestamp = format_timestamp(mtime);

            rows.push(ContentsRow {
                document_id: String::new(),
                path: relative,
                title: read_title(&item_dir)?,
                metadata_type: metadata_type(collection_dir).to_string(),
                created: timestamp.clone(),
                updated: timestamp,
            });
        }
    }

    Ok(rows)
}

pub fn rows_to_csv(rows: &[ContentsRow]) -> Result<Vec<u8>, ContentsError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for row in rows {
        writer.serialize(row)?;
    }
    if rows.is_empty() {
        writer.write_record([
            "document_id",
            "path",
            "title",
            "metadata_type",
            "created",
            "updated",
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| ContentsError::Io(e.into_error()))
}

/// Regenerate the contents CSV, replacing the published copy only when the
/// generated bytes differ.
pub fn update_contents(
    config: &ContentsConfig,
    dry_run: bool,
) -> Result<ContentsResult, ContentsError> {
    info!("Generating contents index {}", config.destination.display());

    let rows = collect_rows(config)?;
    let staged = StagedFile::stage(&config.destination, rows_to_csv(&rows)?)?;
    let outcome = if dry_run {
        staged.pending_outcome()?
    } else {
        staged.promote()?
    };

    Ok(ContentsResult {
        outcome,
        rows: rows.len(),
        destination: config.destination.clone(),
    })
}
