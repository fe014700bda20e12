use assert_cmd::{Command, cargo::cargo_bin_cmd};
use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const TEI_DIR: &str = "Data/0020/Data/WaltersManuscripts/ManuscriptDescriptions";

/// A point in the past used to pin modification times, so that tests never
/// depend on filesystem timestamp resolution.
pub const T: i64 = 1_600_000_000;

pub struct Archive {
    pub root: TempDir,
}

// Each integration test file is compiled as its own crate and only uses part
// of this helper.
#[allow(dead_code)]
impl Archive {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        fs::create_dir_all(root.path().join(TEI_DIR)).unwrap();
        Archive { root }
    }

    pub fn tei_dir(&self) -> PathBuf {
        self.root.path().join(TEI_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.tei_dir().join("manifest-md5.txt")
    }

    pub fn write_tei(&self, name: &str, content: &str, mtime: i64) {
        let path = self.tei_dir().join(name);
        fs::write(&path, content).unwrap();
        pin(&path, mtime);
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("openn-manifest");
        cmd.env("OPENN_ROOT", self.root.path()).env_remove("RUST_LOG");
        cmd
    }
}

pub fn pin(path: &Path, secs: i64) {
    set_file_mtime(path, FileTime::from_unix_time(secs, 0)).unwrap();
}

#[allow(dead_code)]
pub fn mtime(path: &Path) -> FileTime {
    FileTime::from_last_modification_time(&fs::metadata(path).unwrap())
}
