use md5::{Digest, Md5};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Read size used when hashing file content.
pub const DEFAULT_BLOCK_SIZE: usize = 1 << 16;

#[derive(Debug, thiserror::Error)]
pub enum ChecksumError {
    #[error("IO error: {0}")]
    Io(std::io::Error),
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
}

/// Computes the MD5 checksum of a file, reading it in `DEFAULT_BLOCK_SIZE` chunks.
///
/// Returns the digest as 32 lowercase hex characters.
///
/// # Errors
/// - `ChecksumError::PermissionDenied`: Insufficient permissions to read the file
/// - `ChecksumError::Io`: File doesn't exist or other I/O errors
pub fn checksum_file(path: &Path) -> Result<String, ChecksumError> {
    checksum_file_with_block_size(path, DEFAULT_BLOCK_SIZE)
}

pub fn checksum_file_with_block_size(
    path: &Path,
    block_size: usize,
) -> Result<String, ChecksumError> {
    info!("Checksumming {}", path.display());

    let file = File::open(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::PermissionDenied {
            ChecksumError::PermissionDenied(path.to_path_buf())
        } else {
            ChecksumError::Io(e)
        }
    })?;

    let md5 = checksum_reader(file, block_size).map_err(ChecksumError::Io)?;

    debug!("Checksum of {} is {}", path.display(), md5);

    Ok(md5)
}

/// Hashes everything `reader` yields. Memory use is bounded by `block_size`.
pub fn checksum_reader<R: Read>(mut reader: R, block_size: usize) -> std::io::Result<String> {
    let mut hasher = Md5::new();
    let mut buffer = vec![0u8; block_size.max(1)];

    loop {
        let bytes_read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_checksum_simple_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"Hello, world!").unwrap();
        temp_file.flush().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result, "6cd3556deb0da54bca060b4c39479839");
    }

    #[test]
    fn test_checksum_empty_file() {
        let temp_file = NamedTempFile::new().unwrap();

        let result = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_checksum_independent_of_block_size() {
        let mut temp_file = NamedTempFile::new().unwrap();
        // Spans several default-sized blocks plus a partial one.
        let content: Vec<u8> = (0..(3 * DEFAULT_BLOCK_SIZE + 17))
            .map(|i| (i % 251) as u8)
            .collect();
        temp_file.write_all(&content).unwrap();
        temp_file.flush().unwrap();

        let whole = checksum_file(temp_file.path()).unwrap();
        let tiny = checksum_file_with_block_size(temp_file.path(), 7).unwrap();
        let in_memory = checksum_reader(content.as_slice(), content.len()).unwrap();

        assert_eq!(whole.len(), 32);
        assert_eq!(whole, tiny);
        assert_eq!(whole, in_memory);
    }

    #[test]
    fn test_checksum_nonexistent_file() {
        let result = checksum_file(Path::new("/nonexistent/file.txt"));

        match result {
            Err(ChecksumError::Io(_)) => {}
            _ => panic!("Expected IO error for nonexistent file"),
        }
    }

    #[test]
    fn test_checksum_deterministic() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let result1 = checksum_file(temp_file.path()).unwrap();
        let result2 = checksum_file(temp_file.path()).unwrap();

        assert_eq!(result1, result2);
    }

    #[test]
    #[cfg(unix)]
    fn test_checksum_permission_denied() {
        use std::fs;
        use std::os::unix::fs::PermissionsExt;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"test content").unwrap();
        temp_file.flush().unwrap();

        let mut perms = fs::metadata(temp_file.path()).unwrap().permissions();
        perms.set_mode(0o000);
        fs::set_permissions(temp_file.path(), perms).unwrap();

        // Root ignores mode bits, nothing to observe then.
        if File::open(temp_file.path()).is_ok() {
            return;
        }

        match checksum_file(temp_file.path()) {
            Err(ChecksumError::PermissionDenied(_)) => {}
            _ => panic!("Expected PermissionDenied error for permission denied"),
        }
    }
}
