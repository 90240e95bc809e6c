//! Local preference cache: one JSON document per user on disk.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chapel_core::preferences::NotificationPreferences;

use super::PreferenceBackend;
use crate::error::NotifyError;

/// Stores `{dir}/{user}.json`, written atomically via a temp file rename.
#[derive(Debug, Clone)]
pub struct FilePreferenceCache {
    dir: PathBuf,
}

impl FilePreferenceCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, user: &str) -> PathBuf {
        self.dir.join(format!("{}.json", file_stem(user)))
    }
}

/// Map a user key onto a file name stem, one stem per key.
///
/// Bytes outside `[a-z0-9-]` are written as `%XX` (uppercase hex), so the
/// mapping is reversible and stays distinct on case-insensitive filesystems.
/// The empty key maps to `%`, which no other key can produce.
fn file_stem(user: &str) -> String {
    if user.is_empty() {
        return "%".to_string();
    }
    let mut stem = String::with_capacity(user.len());
    for byte in user.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' => stem.push(char::from(byte)),
            _ => stem.push_str(&format!("%{byte:02X}")),
        }
    }
    stem
}

#[async_trait]
impl PreferenceBackend for FilePreferenceCache {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn load(&self, user: &str) -> Result<Option<NotificationPreferences>, NotifyError> {
        let raw = match tokio::fs::read(self.path_for(user)).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let value: serde_json::Value = serde_json::from_slice(&raw)?;
        Ok(Some(NotificationPreferences::from_json(&value)?))
    }

    async fn save(&self, user: &str, prefs: &NotificationPreferences) -> Result<(), NotifyError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(user);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, serde_json::to_vec_pretty(prefs)?).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}
