use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use memmap2::Mmap;

use crate::model::ModelError;
use crate::model::forest::RandomForest;

const BLOB_MAGIC: &[u8; 8] = b"VSRFBLB\0";
const BLOB_VERSION: u32 = 1;
const HEADER_BYTES: usize = 8 + 4 + 8 + 8;

/// Layout: magic, u32 version, u64 payload length, u64 FNV-1a of the
/// payload, then the JSON-encoded forest. Integers are little-endian.
pub fn write_model_blob(path: &Path, model: &RandomForest) -> Result<(), ModelError> {
    let payload = serde_json::to_vec(model)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let tmp = staging_path(path);
    {
        let mut file = BufWriter::new(File::create(&tmp)?);
        file.write_all(BLOB_MAGIC)?;
        file.write_all(&BLOB_VERSION.to_le_bytes())?;
        file.write_all(&(payload.len() as u64).to_le_bytes())?;
        file.write_all(&hash_bytes(&payload).to_le_bytes())?;
        file.write_all(&payload)?;
        file.flush()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn read_model_blob(path: &Path) -> Result<RandomForest, ModelError> {
    if !path.exists() {
        return Err(ModelError::MissingBlob(path.display().to_string()));
    }
    let file = File::open(path)?;
    let file_len = file.metadata()?.len();
    if file_len < HEADER_BYTES as u64 {
        return Err(ModelError::InvalidBlob(format!(
            "{} is too small ({} bytes)",
            path.display(),
            file_len
        )));
    }
    let mmap = unsafe { Mmap::map(&file)? };
    let bytes = &mmap[..];

    if &bytes[0..8] != BLOB_MAGIC {
        return Err(ModelError::InvalidBlob("bad magic".to_string()));
    }
    let version = read_u32_le(bytes, 8);
    if version != BLOB_VERSION {
        return Err(ModelError::InvalidBlob(format!(
            "unsupported version {}",
            version
        )));
    }
    let payload_len = read_u64_le(bytes, 12);
    let expected_hash = read_u64_le(bytes, 20);
    let payload = &bytes[HEADER_BYTES..];
    if payload.len() as u64 != payload_len {
        return Err(ModelError::InvalidBlob(format!(
            "payload length {} does not match header {}",
            payload.len(),
            payload_len
        )));
    }
    if hash_bytes(payload) != expected_hash {
        return Err(ModelError::InvalidBlob("checksum mismatch".to_string()));
    }

    let model: RandomForest = serde_json::from_slice(payload)
        .map_err(|e| ModelError::InvalidBlob(format!("payload decode failed: {e}")))?;
    model.validate()?;
    Ok(model)
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn read_u32_le(bytes: &[u8], offset: usize) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_le_bytes(buf)
}

fn read_u64_le(bytes: &[u8], offset: usize) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&bytes[offset..offset + 8]);
    u64::from_le_bytes(buf)
}

pub fn hash_bytes(data: &[u8]) -> u64 {
    let mut hasher = Fnv64::new();
    hasher.update(data);
    hasher.finish()
}

struct Fnv64 {
    hash: u64,
}

impl Fnv64 {
    fn new() -> Self {
        Self {
            hash: 0xcbf29ce484222325,
        }
    }

    fn update(&mut self, data: &[u8]) {
        let mut h = self.hash;
        for &b in data {
            h ^= b as u64;
            h = h.wrapping_mul(0x100000001b3);
        }
        self.hash = h;
    }

    fn finish(&self) -> u64 {
        self.hash
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/blob.rs"]
mod tests;
