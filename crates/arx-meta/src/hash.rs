use std::fs::File;
use std::io;
use std::path::Path;

use crate::error::{MetaError, MetaResult};

/// BLAKE3 of a file's bytes, as lowercase hex. The file is streamed.
pub fn hash_file(path: &Path) -> MetaResult<String> {
    let mut file = File::open(path).map_err(|e| MetaError::file(path, e))?;
    let mut hasher = blake3::Hasher::new();
    io::copy(&mut file, &mut hasher).map_err(|e| MetaError::file(path, e))?;
    Ok(hex::encode(hasher.finalize().as_bytes()))
}

/// BLAKE3 of a byte slice, as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(blake3::hash(data).as_bytes())
}
