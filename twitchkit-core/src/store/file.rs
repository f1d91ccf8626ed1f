//! JSON file secret storage.
//!
//! The whole store is one JSON object mapping keys to values. Writes go to a
//! temporary file in the same directory which is then renamed over the
//! target, so a crash mid-write leaves the previous contents intact.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Secret, SecretStore, StoreError};

/// File-backed secret store.
pub struct FileStore {
    path: PathBuf,
    state: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Default location of the token cache file.
    ///
    /// `~/.cache/twitchkit/tokens.json` on Linux, the platform cache directory
    /// elsewhere.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "raibid-labs", "twitchkit")
            .map(|dirs| dirs.cache_dir().join("tokens.json"))
    }

    /// Open the store at `path`, creating parent directories as needed.
    ///
    /// A file that is not a JSON object of strings is ignored (and replaced
    /// on the next write) rather than reported, since everything in it can
    /// be re-acquired.
    pub async fn open(path: PathBuf) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(entries) => {
                    debug!(path = %path.display(), entries = entries.len(), "loaded token cache");
                    entries
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "token cache file is corrupt, ignoring it");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl std::fmt::Debug for FileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileStore").field("path", &self.path).finish()
    }
}

#[async_trait]
impl SecretStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Secret>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.get(key).map(Secret::new))
    }

    async fn set(&self, key: &str, secret: &Secret) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let mut next = state.clone();
        next.insert(key.to_string(), secret.expose().to_string());
        write_atomic(&self.path, &next).await?;
        *state = next;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.contains_key(key) {
            return Ok(());
        }
        let mut next = state.clone();
        next.remove(key);
        write_atomic(&self.path, &next).await?;
        *state = next;
        Ok(())
    }
}

/// Write the store contents to `path` via temp file + rename. On unix the
/// temp file is created with mode 0600.
async fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(data)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let tmp_path = dir.join(format!(".tokens.tmp.{}", std::process::id()));

    // Leftover from an interrupted write.
    match tokio::fs::remove_file(&tmp_path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    if let Err(e) = write_tmp(&tmp_path, json.as_bytes()).await {
        discard(&tmp_path).await;
        return Err(e);
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        discard(&tmp_path).await;
        return Err(e.into());
    }

    debug!(path = %path.display(), "persisted token cache");
    Ok(())
}

async fn write_tmp(tmp_path: &Path, contents: &[u8]) -> Result<(), StoreError> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(tmp_path).await?;
    file.write_all(contents).await?;
    file.sync_all().await?;
    Ok(())
}

async fn discard(tmp_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp_path).await {
        warn!(path = %tmp_path.display(), error = %e, "failed to remove temporary token cache file");
    }
}
