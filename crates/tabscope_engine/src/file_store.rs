use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use tabscope_logging::{ts_info, ts_warn};

use crate::persist::{ensure_session_dir, AtomicFileWriter};
use crate::store::{SessionStore, StoreError};

const RECORD_EXTENSION: &str = ".json";

/// Session store backed by one JSON file per key.
///
/// Reopening the same directory with [`FileSessionStore::open`] keeps its
/// records (background restart); [`FileSessionStore::open_fresh`] wipes them
/// (browser restart).
pub struct FileSessionStore {
    writer: AtomicFileWriter,
}

impl FileSessionStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        ensure_session_dir(&dir)?;
        Ok(Self {
            writer: AtomicFileWriter::new(dir),
        })
    }

    pub fn open_fresh(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::open(dir)?;
        let mut cleared = 0usize;
        for path in record_files(store.dir())? {
            fs::remove_file(&path)?;
            cleared += 1;
        }
        ts_info!(
            "[store] new session in {:?}, cleared {} stale records",
            store.dir(),
            cleared
        );
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        self.writer.dir()
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir().join(file_name(key))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
        let content = match fs::read(self.path_for(key)) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&content)?))
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        let content = serde_json::to_vec(&value)?;
        self.writer.write(&file_name(key), &content)?;
        Ok(())
    }

    async fn remove(&self, keys: &[String]) -> Result<(), StoreError> {
        for key in keys {
            self.writer.remove(&file_name(key))?;
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        for path in record_files(self.dir())? {
            let decoded = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| name.strip_suffix(RECORD_EXTENSION))
                .and_then(decode_key);
            match decoded {
                Some(key) => keys.push(key),
                None => ts_warn!("[store] ignoring unrecognised file {:?}", path),
            }
        }
        Ok(keys)
    }
}

fn record_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_record = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(RECORD_EXTENSION));
        if is_record && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn file_name(key: &str) -> String {
    format!("{}{RECORD_EXTENSION}", encode_key(key))
}

/// Filesystem-safe, reversible key encoding: ASCII alphanumerics and `-` pass
/// through, every other byte becomes `_XX` (hex).
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            encoded.push(byte as char);
        } else {
            let _ = write!(&mut encoded, "_{byte:02x}");
        }
    }
    encoded
}

fn decode_key(encoded: &str) -> Option<String> {
    let mut bytes = Vec::with_capacity(encoded.len());
    let mut rest = encoded.as_bytes();
    while let Some((&first, tail)) = rest.split_first() {
        if first == b'_' {
            let hex = tail.get(..2)?;
            let hex = std::str::from_utf8(hex).ok()?;
            bytes.push(u8::from_str_radix(hex, 16).ok()?);
            rest = &tail[2..];
        } else {
            bytes.push(first);
            rest = tail;
        }
    }
    String::from_utf8(bytes).ok()
}
