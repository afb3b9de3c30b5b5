//! Binary persistence of fitted objects and dense arrays
//!
//! Every payload is wrapped in a small envelope (magic bytes, format version,
//! payload kind, FNV-1a checksum) and encoded with bincode. Writes overwrite in
//! place: concurrent runs against the same paths are last-writer-wins.

use crate::error::{Result, ResultExt, TabprepError};
use ndarray::Array2;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::debug;

/// What an envelope holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadKind {
    /// A serialized object (fitted transformer, label encoder, ...)
    Object,
    /// A dense 2-D `f64` array
    Array,
}

#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    magic: [u8; 4],
    format_version: u32,
    kind: PayloadKind,
    payload: Vec<u8>,
    checksum: u64,
}

impl Envelope {
    const MAGIC: [u8; 4] = [b'T', b'P', b'R', b'P'];
    const VERSION: u32 = 1;

    fn new(kind: PayloadKind, payload: Vec<u8>) -> Self {
        let checksum = fnv1a(&payload);
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            kind,
            payload,
            checksum,
        }
    }

    fn into_payload(self, expected: PayloadKind) -> Result<Vec<u8>> {
        if self.magic != Self::MAGIC {
            return Err(TabprepError::SerializationError("not a tabprep artifact".into()));
        }
        if self.format_version != Self::VERSION {
            return Err(TabprepError::SerializationError(format!(
                "unsupported format version {}",
                self.format_version
            )));
        }
        if self.kind != expected {
            return Err(TabprepError::SerializationError(format!(
                "expected {:?} payload, found {:?}",
                expected, self.kind
            )));
        }
        if fnv1a(&self.payload) != self.checksum {
            return Err(TabprepError::SerializationError("checksum mismatch".into()));
        }
        Ok(self.payload)
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    let mut hash = FNV_OFFSET;
    for byte in data {
        hash ^= *byte as u64;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

fn write_envelope(path: &Path, envelope: &Envelope) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, envelope)?;
    writer.flush()?;
    Ok(())
}

fn read_envelope(path: &Path) -> Result<Envelope> {
    let reader = BufReader::new(File::open(path)?);
    Ok(bincode::deserialize_from(reader)?)
}

/// Serialize `obj` to `path`, creating parent directories
pub fn save_object<T: Serialize>(path: impl AsRef<Path>, obj: &T) -> Result<()> {
    let path = path.as_ref();
    let payload = bincode::serialize(obj)
        .map_err(TabprepError::from)
        .persist_context(path)?;
    write_envelope(path, &Envelope::new(PayloadKind::Object, payload)).persist_context(path)?;
    debug!(path = %path.display(), "Saved object");
    Ok(())
}

/// Deserialize an object written by [`save_object`]
pub fn load_object<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let payload = read_envelope(path)
        .and_then(|e| e.into_payload(PayloadKind::Object))
        .persist_context(path)?;
    bincode::deserialize(&payload)
        .map_err(TabprepError::from)
        .persist_context(path)
}

/// Serialize a dense 2-D array to `path`, creating parent directories
pub fn save_array(path: impl AsRef<Path>, array: &Array2<f64>) -> Result<()> {
    let path = path.as_ref();
    let payload = bincode::serialize(array)
        .map_err(TabprepError::from)
        .persist_context(path)?;
    write_envelope(path, &Envelope::new(PayloadKind::Array, payload)).persist_context(path)?;
    debug!(path = %path.display(), rows = array.nrows(), cols = array.ncols(), "Saved array");
    Ok(())
}

/// Deserialize an array written by [`save_array`]
pub fn load_array(path: impl AsRef<Path>) -> Result<Array2<f64>> {
    let path = path.as_ref();
    let payload = read_envelope(path)
        .and_then(|e| e.into_payload(PayloadKind::Array))
        .persist_context(path)?;
    bincode::deserialize(&payload)
        .map_err(TabprepError::from)
        .persist_context(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Dummy {
        name: String,
        values: Vec<f64>,
    }

    #[test]
    fn test_array_roundtrip_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/transformed/train.bin");
        let arr = array![[1.0, -0.5, 0.0], [2.25, f64::MAX, 1.0]];

        save_array(&path, &arr).unwrap();
        assert_eq!(load_array(&path).unwrap(), arr);
    }

    #[test]
    fn test_object_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("obj.bin");
        let obj = Dummy { name: "x".into(), values: vec![0.1, 0.2] };

        save_object(&path, &obj).unwrap();
        let loaded: Dummy = load_object(&path).unwrap();
        assert_eq!(loaded, obj);
    }

    #[test]
    fn test_kind_mismatch_is_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arr.bin");
        save_array(&path, &array![[1.0]]).unwrap();

        let err = load_object::<Dummy>(&path).unwrap_err();
        assert!(matches!(err, TabprepError::Persistence { .. }));
    }

    #[test]
    fn test_corrupted_payload_detected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arr.bin");
        save_array(&path, &array![[1.0, 2.0]]).unwrap();

        let mut bytes = fs::read(&path).unwrap();
        let last = bytes.len() - 9; // inside the payload, before the checksum
        bytes[last] ^= 0xFF;
        fs::write(&path, bytes).unwrap();

        assert!(matches!(load_array(&path), Err(TabprepError::Persistence { .. })));
    }

    #[test]
    fn test_missing_file_is_persistence_error() {
        let err = load_array("does/not/exist.bin").unwrap_err();
        assert!(err.to_string().contains("does/not/exist.bin"));
    }
}
