//! Non-recursive glob expansion over a single directory.
//!
//! Patterns are matched against the immediate children of the directory by
//! file name only. Directories and other non-regular entries never match.

use globset::{Glob, GlobMatcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{debug, warn};

#[derive(Debug, thiserror::Error)]
pub enum FileSetError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("Invalid glob pattern: {0}")]
    Pattern(#[from] globset::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    /// File name relative to the resolved directory.
    pub name: String,
    pub mtime: SystemTime,
}

fn map_io(path: &Path) -> impl Fn(std::io::Error) -> FileSetError + '_ {
    move |e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            FileSetError::PermissionDenied(path.to_path_buf())
        } else {
            FileSetError::Io(e)
        }
    }
}

/// Returns the regular files in `dir` matching any of `patterns`.
///
/// Files come out pattern by pattern, sorted by name within each pattern. A
/// file matched by an earlier pattern is not repeated. Hidden files (names
/// starting with `.`) never match. Names that are not valid UTF-8 are skipped
/// with a warning since the manifest is text.
pub fn resolve_file_set<S: AsRef<str>>(
    dir: &Path,
    patterns: &[S],
) -> Result<Vec<TrackedFile>, FileSetError> {
    let matchers = patterns
        .iter()
        .map(|p| Ok(Glob::new(p.as_ref())?.compile_matcher()))
        .collect::<Result<Vec<GlobMatcher>, FileSetError>>()?;

    let mut candidates = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(map_io(dir))? {
        let entry = entry.map_err(FileSetError::Io)?;
        let path = entry.path();

        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!("Skipping non-UTF-8 file name {}", path.display());
            continue;
        };
        if name.starts_with('.') {
            debug!("Skipping hidden file {}", name);
            continue;
        }

        let metadata = std::fs::metadata(&path).map_err(map_io(&path))?;
        if !metadata.is_file() {
            continue;
        }

        let mtime = metadata.modified().map_err(FileSetError::Io)?;
        candidates.push(TrackedFile { name, mtime });
    }

    candidates.sort_by(|a, b| a.name.cmp(&b.name));

    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for (pattern, matcher) in patterns.iter().zip(&matchers) {
        for candidate in &candidates {
            if matcher.is_match(&candidate.name) && seen.insert(candidate.name.as_str()) {
                debug!("{} matched {}", candidate.name, pattern.as_ref());
                files.push(candidate.clone());
            }
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TRACKED_PATTERNS;
    use std::fs;
    use tempfile::TempDir;

    fn names(files: &[TrackedFile]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_resolve_tracked_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        for name in [
            "W102_tei.xml",
            "W101_tei.xml",
            "tei.rng",
            "tei.rnc",
            "walters.xsd",
            "tei.dtd",
            "walters.odd",
            "notes.txt",
            "W103_tei.xml.bak",
            "manifest-md5.txt",
        ] {
            fs::write(root.join(name), name).unwrap();
        }

        let files = resolve_file_set(root, TRACKED_PATTERNS).unwrap();

        assert_eq!(
            names(&files),
            vec![
                "W101_tei.xml",
                "W102_tei.xml",
                "tei.dtd",
                "tei.rnc",
                "tei.rng",
                "walters.odd",
                "walters.xsd",
            ]
        );
    }

    #[test]
    fn test_resolve_is_not_recursive() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub/nested_tei.xml"), "x").unwrap();
        fs::create_dir(root.join("dir_tei.xml")).unwrap();
        fs::write(root.join("top_tei.xml"), "x").unwrap();

        let files = resolve_file_set(root, TRACKED_PATTERNS).unwrap();

        assert_eq!(names(&files), vec!["top_tei.xml"]);
    }

    #[test]
    fn test_resolve_skips_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("W1_tei.xml"), "x").unwrap();
        fs::write(root.join(".W1_tei.xml"), "editor copy").unwrap();
        fs::write(root.join(".tei.rng"), "x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(
            "user@host.1234:1600000000",
            root.join(".#W1_tei.xml"),
        )
        .unwrap();

        let files = resolve_file_set(root, TRACKED_PATTERNS).unwrap();

        assert_eq!(names(&files), vec!["W1_tei.xml"]);
    }

    #[test]
    fn test_resolve_deduplicates_overlapping_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a_tei.xml"), "a").unwrap();
        fs::write(root.join("b.xml"), "b").unwrap();

        let files = resolve_file_set(root, &["*_tei.xml", "*.xml"]).unwrap();

        assert_eq!(names(&files), vec!["a_tei.xml", "b.xml"]);
    }

    #[test]
    fn test_resolve_records_mtime() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a_tei.xml"), "a").unwrap();

        let files = resolve_file_set(root, TRACKED_PATTERNS).unwrap();

        assert_eq!(
            files[0].mtime,
            fs::metadata(root.join("a_tei.xml"))
                .unwrap()
                .modified()
                .unwrap()
        );
    }

    #[test]
    fn test_resolve_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let files = resolve_file_set(temp_dir.path(), TRACKED_PATTERNS).unwrap();

        assert!(files.is_empty());
    }

    #[test]
    fn test_resolve_invalid_pattern() {
        let temp_dir = TempDir::new().unwrap();

        let result = resolve_file_set(temp_dir.path(), &["*.{rng"]);

        assert!(matches!(result, Err(FileSetError::Pattern(_))));
    }

    #[test]
    fn test_resolve_missing_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = resolve_file_set(&temp_dir.path().join("missing"), TRACKED_PATTERNS);

        assert!(matches!(result, Err(FileSetError::Io(_))));
    }
}
