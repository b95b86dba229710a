//! Content digests used to detect stale cached definitions.

use std::path::Path;

/// Computes the BLAKE3 digest of the given data and returns it as a hex string.
pub fn blake3_digest(data: &[u8]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    hasher.finalize().to_hex().to_string()
}

/// Digest of a file's contents, `None` when the file cannot be read.
pub fn file_digest(path: &Path) -> Option<String> {
    std::fs::read(path).ok().map(|data| blake3_digest(&data))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_input() {
        assert_eq!(
            blake3_digest(b""),
            "af1349b9f5f9a1a6a0404dea36dcc9499bcb25c9adc112b7cc9a93cae41f3262"
        );
    }

    #[test]
    fn test_file_digest_tracks_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"fn main() {}\n").unwrap();
        let first = file_digest(file.path()).unwrap();
        assert_eq!(first, blake3_digest(b"fn main() {}\n"));

        file.write_all(b"// changed\n").unwrap();
        let second = file_digest(file.path()).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_missing_file_has_no_digest() {
        assert!(file_digest(Path::new("/definitely/not/here.rs")).is_none());
    }
}
