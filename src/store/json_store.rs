use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::store::schema::AttemptHistoryData;

/// One in-flight session per device.
pub const SNAPSHOT_KEY: &str = "active_session";

/// Key/value store with one pretty-printed JSON file per key.
pub struct JsonStore {
    base_dir: PathBuf,
}

impl JsonStore {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizdr");
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn file_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            bail!("invalid store key: {key:?}");
        }
        Ok(self.base_dir.join(format!("{key}.json")))
    }

    /// `None` when the key is absent or its file cannot be parsed as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.file_path(key).ok()?;
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "store read failed");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "store document unreadable, ignoring");
                None
            }
        }
    }

    pub fn set<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let path = self.file_path(key)?;
        let tmp_path = path.with_extension("tmp");

        let json = serde_json::to_string_pretty(data)?;
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;

        fs::rename(&tmp_path, &path)?;
        Ok(())
    }

    /// Removing an absent key succeeds.
    pub fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.file_path(key)?) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.file_path(key).is_ok_and(|p| p.exists())
    }

    /// Attempt history for one user. A document from another schema version
    /// starts over empty.
    pub fn load_history(&self, user_id: &str) -> AttemptHistoryData {
        match self.get::<AttemptHistoryData>(&history_key(user_id)) {
            Some(data) if !data.needs_reset() => data,
            Some(_) => {
                warn!(user_id, "attempt history has an old schema, starting fresh");
                AttemptHistoryData::default()
            }
            None => AttemptHistoryData::default(),
        }
    }

    pub fn save_history(&self, user_id: &str, data: &AttemptHistoryData) -> Result<()> {
        self.set(&history_key(user_id), data)
    }
}

/// File-safe per-user history key. Bytes outside `[A-Za-z0-9-]` are written
/// as `_xx` hex escapes, so distinct ids never share a key.
pub fn history_key(user_id: &str) -> String {
    let mut key = String::from("history_");
    for byte in user_id.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' {
            key.push(byte as char);
        } else {
            key.push_str(&format!("_{byte:02x}"));
        }
    }
    key
}
