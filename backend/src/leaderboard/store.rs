use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::{debug, error, info};
use shared::{PlayerRecord, Result, SharedError};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, MutexGuard};

/// The players file plus the process-wide guard that serializes every
/// read-modify-write of it. Mutations only happen through a [`StoreSession`].
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    guard: Mutex<()>,
}

/// Exclusive access to the store for one logical operation. Dropping the session
/// releases the guard, whichever way the operation exits.
pub struct StoreSession<'a> {
    store: &'a RecordStore,
    _guard: MutexGuard<'a, ()>,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Waits for exclusive access.
    pub async fn exclusive(&self) -> StoreSession<'_> {
        StoreSession {
            store: self,
            _guard: self.guard.lock().await,
        }
    }

    /// Exclusive access only if nobody holds it right now.
    pub fn try_exclusive(&self) -> Option<StoreSession<'_>> {
        self.guard
            .try_lock()
            .ok()
            .map(|guard| StoreSession { store: self, _guard: guard })
    }

    pub fn is_locked(&self) -> bool {
        self.guard.try_lock().is_err()
    }

    /// Unguarded read for display purposes. Saves are atomic renames, so this always sees
    /// a complete snapshot. A store that has never been written reads as empty.
    pub async fn snapshot(&self) -> Result<Vec<PlayerRecord>> {
        read_records_or_empty(&self.path).await
    }
}

impl StoreSession<'_> {
    pub fn path(&self) -> &Path {
        &self.store.path
    }

    /// Fails with `StoreUnreadable` when the file is missing or malformed.
    pub async fn load(&self) -> Result<Vec<PlayerRecord>> {
        let records = read_records(&self.store.path).await?;
        debug!("Loaded {} players from {}", records.len(), self.store.path.display());
        Ok(records)
    }

    /// Like [`load`](Self::load), except that a store that has never been written reads
    /// as empty. A malformed or unreadable file is still `StoreUnreadable`.
    pub async fn load_or_empty(&self) -> Result<Vec<PlayerRecord>> {
        read_records_or_empty(&self.store.path).await
    }

    /// Replaces the store with `records` in one atomic step.
    pub async fn save(&self, records: &[PlayerRecord]) -> Result<()> {
        let payload = serde_json::to_vec_pretty(records)
            .map_err(|e| SharedError::StoreUnwritable(format!("serialization failed: {}", e)))?;

        atomic_write(&self.store.path, &payload).await.map_err(|e| {
            error!("Failed to save {}: {}", self.store.path.display(), e);
            SharedError::StoreUnwritable(format!("{}: {}", self.store.path.display(), e))
        })?;

        info!("Saved {} players to {}", records.len(), self.store.path.display());
        Ok(())
    }
}

async fn read_records(path: &Path) -> Result<Vec<PlayerRecord>> {
    let raw = fs::read(path).await.map_err(|e| {
        let detail = match e.kind() {
            ErrorKind::NotFound => "file does not exist".to_string(),
            _ => e.to_string(),
        };
        SharedError::StoreUnreadable(format!("{}: {}", path.display(), detail))
    })?;

    parse_records(path, &raw)
}

async fn read_records_or_empty(path: &Path) -> Result<Vec<PlayerRecord>> {
    match fs::read(path).await {
        Ok(raw) => parse_records(path, &raw),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("{} does not exist yet, reading as empty", path.display());
            Ok(Vec::new())
        }
        Err(e) => Err(SharedError::StoreUnreadable(format!("{}: {}", path.display(), e))),
    }
}

fn parse_records(path: &Path, raw: &[u8]) -> Result<Vec<PlayerRecord>> {
    serde_json::from_slice(raw)
        .map_err(|e| SharedError::StoreUnreadable(format!("{}: malformed JSON: {}", path.display(), e)))
}

/// Temporary sibling of `path`; same directory so the rename never crosses filesystems.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "store".to_string());
    path.with_file_name(format!(".{}.{}.tmp", file_name, std::process::id()))
}

/// Write to a temp file, flush it to disk, then rename over the target.
async fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await?;
    }

    let tmp_path = temp_path_for(path);
    let written = async {
        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        Ok::<_, std::io::Error>(())
    }
    .await;

    if let Err(e) = written {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }

    if let Err(e) = fs::rename(&tmp_path, path).await {
        let _ = fs::remove_file(&tmp_path).await;
        return Err(e);
    }
    Ok(())
}
