//! Content hashing used as the deduplication identity.
//!
//! SHA-256 over the full file content, streamed in 64 KiB chunks, rendered
//! with the URL-safe base64 alphabet without padding (43 characters). The
//! URL-safe alphabet never yields `/`, so the hash can be used verbatim as
//! part of a file name.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::errors::{KatalError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

/// Text rendering of a file's SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentHash(String);

impl ContentHash {
    /// Wrap an already encoded hash (e.g. read back from the catalog).
    pub fn from_encoded(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash everything readable from `reader`.
    pub fn from_reader<R: Read>(mut reader: R) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; CHUNK_SIZE];
        loop {
            let n = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            hasher.update(&buf[..n]);
        }
        Ok(Self(URL_SAFE_NO_PAD.encode(hasher.finalize())))
    }

    pub fn of_bytes(data: &[u8]) -> Self {
        Self(URL_SAFE_NO_PAD.encode(Sha256::digest(data)))
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stream a file through SHA-256.
pub fn hash_file(path: &Path) -> Result<ContentHash> {
    let file = File::open(path).map_err(|e| KatalError::file_io(path, e))?;
    ContentHash::from_reader(file).map_err(|e| KatalError::file_io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digest_of_empty_input() {
        // sha256("") = e3b0c442...b855
        let h = ContentHash::of_bytes(b"");
        assert_eq!(h.as_str(), "47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU");
        assert_eq!(h.as_str().len(), 43);
    }

    #[test]
    fn streaming_matches_one_shot_across_chunks() {
        let data: Vec<u8> = (0..(CHUNK_SIZE * 2 + 17)).map(|i| (i % 251) as u8).collect();
        let streamed = ContentHash::from_reader(&data[..]).unwrap();
        assert_eq!(streamed, ContentHash::of_bytes(&data));
    }

    #[test]
    fn independent_hashes_per_file() {
        let td = tempfile::tempdir().unwrap();
        let a = td.path().join("a");
        let b = td.path().join("b");
        std::fs::write(&a, b"same").unwrap();
        std::fs::write(&b, b"same").unwrap();
        // Hashing one file must not influence the next one.
        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn never_contains_path_separator() {
        for i in 0..64u8 {
            let h = ContentHash::of_bytes(&[i, i.wrapping_mul(7), 255 - i]);
            assert!(!h.as_str().contains('/'));
            assert!(!h.as_str().contains('+'));
        }
    }
}
