//! File content hashing
//!
//! MD5 and SHA-256 digests attached to uploads as informational headers.
//! The remote is not assumed to verify them.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Read buffer size
const CHUNK_SIZE: usize = 8192;

/// Hex-encoded digests of a file's content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentHashes {
    pub md5: String,
    pub sha256: String,
}

/// Compute MD5 and SHA-256 of the file at `path` in a single pass
pub fn calculate_hashes(path: &Path) -> io::Result<ContentHashes> {
    let mut file = File::open(path)?;
    let mut md5 = Md5::new();
    let mut sha256 = Sha256::new();
    let mut buf = [0u8; CHUNK_SIZE];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        md5.update(&buf[..n]);
        sha256.update(&buf[..n]);
    }

    debug!(path = %path.display(), "Computed content hashes");
    Ok(ContentHashes {
        md5: hex::encode(md5.finalize()),
        sha256: hex::encode(sha256.finalize()),
    })
}
