use std::io::Read;
use std::path::Path;

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

type Blake2b256 = Blake2b<U32>;

/// BLAKE2b-256 of `data`, lowercase hex.
pub fn checksum_hex(data: &[u8]) -> String {
    hex::encode(Blake2b256::digest(data))
}

/// BLAKE2b-256 of a file's contents, streamed.
pub fn checksum_file(path: &Path) -> std::io::Result<String> {
    let mut file = std::fs::File::open(path)?;
    let mut hasher = Blake2b256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}
