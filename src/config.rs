//! Run configuration derived from the archive root.
//!
//! Built once at startup and passed by reference; nothing here is mutated
//! after validation.

use crate::manifest::MANIFEST_FILENAME;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const ROOT_ENV_VAR: &str = "OPENN_ROOT";

/// Glob patterns selecting the files recorded in the manifest.
pub const TRACKED_PATTERNS: &[&str] = &["*_tei.xml", "*.{rng,rnc,xsd,dtd,odd}"];

const DATA_DIR: &str = "Data";
const WALTERS_DIR: &str = "Data/0020/Data";
const TEI_DIR: &str = "WaltersManuscripts/ManuscriptDescriptions";
const CONTENTS_FILENAME: &str = "0020_contents.csv";
const COLLECTION_DIRS: &[&str] = &["WaltersManuscripts", "OtherCollections"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("OPENN_ROOT environment variable must be set (or pass --root)")]
    RootUnset,
    #[error("OPENN_ROOT is empty")]
    RootEmpty,
    #[error("OPENN_ROOT is not a directory: {0}")]
    RootNotDirectory(PathBuf),
    #[error("OPENN_ROOT is missing expected directory: {0}")]
    MissingDirectory(PathBuf),
}

/// Validated archive root.
#[derive(Debug, Clone)]
pub struct ArchiveRoot {
    root: PathBuf,
}

impl ArchiveRoot {
    /// Resolve the root from an explicit override or the environment value.
    pub fn resolve(
        explicit: Option<PathBuf>,
        env_value: Option<OsString>,
    ) -> Result<Self, ConfigError> {
        let root = match explicit {
            Some(path) => path,
            None => PathBuf::from(env_value.ok_or(ConfigError::RootUnset)?),
        };

        if root.as_os_str().to_string_lossy().trim().is_empty() {
            return Err(ConfigError::RootEmpty);
        }
        if !root.is_dir() {
            return Err(ConfigError::RootNotDirectory(root));
        }
        let data = root.join(DATA_DIR);
        if !data.is_dir() {
            return Err(ConfigError::MissingDirectory(data));
        }

        Ok(ArchiveRoot { root })
    }

    pub fn from_env(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::resolve(explicit, std::env::var_os(ROOT_ENV_VAR))
    }

    pub fn path(&self) -> &Path {
        &self.root
    }
}

/// Everything the manifest update needs to know.
#[derive(Debug, Clone)]
pub struct ManifestConfig {
    /// Directory holding the tracked files and the manifest.
    pub directory: PathBuf,
    pub manifest_path: PathBuf,
    pub patterns: Vec<String>,
}

impl ManifestConfig {
    pub fn for_directory(directory: PathBuf) -> Self {
        ManifestConfig {
            manifest_path: directory.join(MANIFEST_FILENAME),
            directory,
            patterns: TRACKED_PATTERNS.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn from_root(root: &ArchiveRoot) -> Result<Self, ConfigError> {
        let directory = root.path().join(WALTERS_DIR).join(TEI_DIR);
        if !directory.is_dir() {
            return Err(ConfigError::MissingDirectory(directory));
        }
        Ok(Self::for_directory(directory))
    }
}

/// Locations for the contents index.
#[derive(Debug, Clone)]
pub struct ContentsConfig {
    /// Row paths are reported relative to this directory.
    pub base_dir: PathBuf,
    pub destination: PathBuf,
    pub collection_dirs: Vec<PathBuf>,
}

impl ContentsConfig {
    pub fn from_root(root: &ArchiveRoot) -> Self {
        let base_dir = root.path().join(DATA_DIR);
        let walters = root.path().join(WALTERS_DIR);
        ContentsConfig {
            destination: base_dir.join(CONTENTS_FILENAME),
            base_dir,
            collection_dirs: COLLECTION_DIRS.iter().map(|d| walters.join(d)).collect(),
        }
    }
}
