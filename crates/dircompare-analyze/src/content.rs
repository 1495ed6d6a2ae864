//! File content inspection: byte-for-byte comparison and BLAKE3 hashing.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;

use dircompare_core::{ContentHash, DeepMethod};

const CHUNK_SIZE: usize = 64 * 1024;

/// Outcome of comparing the content of two files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentOutcome {
    /// Whether the contents are identical.
    pub equal: bool,
    /// Bytes read from both files together.
    pub bytes_read: u64,
}

/// Compare two files with the given method.
pub fn compare_files(left: &Path, right: &Path, method: DeepMethod) -> io::Result<ContentOutcome> {
    match method {
        DeepMethod::Bytes => compare_bytes(left, right),
        DeepMethod::Hash => {
            let (left_hash, left_bytes) = hash_file_counted(left)?;
            let (right_hash, right_bytes) = hash_file_counted(right)?;
            Ok(ContentOutcome {
                equal: left_hash == right_hash,
                bytes_read: left_bytes + right_bytes,
            })
        }
    }
}

/// Stream both files in lockstep, stopping at the first differing chunk.
pub fn compare_bytes(left: &Path, right: &Path) -> io::Result<ContentOutcome> {
    let mut left_file = File::open(left)?;
    let mut right_file = File::open(right)?;

    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];
    let mut bytes_read = 0u64;

    loop {
        let left_len = read_full(&mut left_file, &mut left_buf)?;
        let right_len = read_full(&mut right_file, &mut right_buf)?;
        bytes_read += (left_len + right_len) as u64;

        if left_len != right_len || left_buf[..left_len] != right_buf[..right_len] {
            return Ok(ContentOutcome {
                equal: false,
                bytes_read,
            });
        }
        if left_len == 0 {
            return Ok(ContentOutcome {
                equal: true,
                bytes_read,
            });
        }
    }
}

/// Compute the full BLAKE3 hash of a file.
pub fn hash_file(path: &Path) -> io::Result<ContentHash> {
    hash_file_counted(path).map(|(hash, _)| hash)
}

/// Hash a file, also returning the number of bytes read.
pub(crate) fn hash_file_counted(path: &Path) -> io::Result<(ContentHash, u64)> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        total += bytes_read as u64;
        hasher.update(&buffer[..bytes_read]);
    }

    Ok((ContentHash::new(*hasher.finalize().as_bytes()), total))
}

/// Fill `buf` as far as the reader allows; short only at end of file.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_files() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::write(root.join("file1.txt"), "same content here").unwrap();
        fs::write(root.join("file2.txt"), "same content here").unwrap();
        fs::write(root.join("file3.txt"), "same content HERE").unwrap();

        temp
    }

    #[test]
    fn test_compare_bytes() {
        let temp = create_test_files();
        let root = temp.path();

        let same = compare_bytes(&root.join("file1.txt"), &root.join("file2.txt")).unwrap();
        assert!(same.equal);
        assert_eq!(same.bytes_read, 34);

        let differ = compare_bytes(&root.join("file1.txt"), &root.join("file3.txt")).unwrap();
        assert!(!differ.equal);
    }

    #[test]
    fn test_compare_bytes_multi_chunk() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        let mut data = vec![7u8; CHUNK_SIZE * 2 + 10];
        fs::write(root.join("a"), &data).unwrap();
        fs::write(root.join("b"), &data).unwrap();
        assert!(compare_bytes(&root.join("a"), &root.join("b")).unwrap().equal);

        *data.last_mut().unwrap() = 8;
        fs::write(root.join("b"), &data).unwrap();
        assert!(!compare_bytes(&root.join("a"), &root.join("b")).unwrap().equal);
    }

    #[test]
    fn test_hash_file() {
        let temp = create_test_files();
        let root = temp.path();

        let hash1 = hash_file(&root.join("file1.txt")).unwrap();
        let hash2 = hash_file(&root.join("file2.txt")).unwrap();
        let hash3 = hash_file(&root.join("file3.txt")).unwrap();

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(
            hash1,
            ContentHash::new(*blake3::hash(b"same content here").as_bytes())
        );
    }

    #[test]
    fn test_compare_files_by_hash() {
        let temp = create_test_files();
        let root = temp.path();

        let outcome =
            compare_files(&root.join("file1.txt"), &root.join("file3.txt"), DeepMethod::Hash)
                .unwrap();
        assert!(!outcome.equal);
        assert_eq!(outcome.bytes_read, 34);
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp = create_test_files();
        let root = temp.path();
        assert!(compare_bytes(&root.join("file1.txt"), &root.join("nope")).is_err());
    }
}
