use std::{
    collections::{BTreeMap, BTreeSet},
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use runwatch_model::RunId;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, trace};

use super::RunRegistry;
use crate::error::RegistryError;

/// Registry backed by a single JSON document.
///
/// Every mutation rewrites the document through a sibling `*.tmp` file that is
/// fsynced and renamed over the target before the call returns. The in-memory
/// view is only updated after the write succeeded.
pub struct FileRegistry {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, RunId>>,
}

impl FileRegistry {
    /// Open the document at `path`, starting empty if it does not exist.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let entries = match fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => BTreeMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "run registry opened");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory holding the document; `.` for a bare file name.
    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    async fn persist(&self, entries: &BTreeMap<String, RunId>) -> Result<(), RegistryError> {
        let dir = self.dir();
        fs::create_dir_all(dir).await?;

        let tmp = tmp_path(&self.path);
        let bytes = serde_json::to_vec_pretty(entries)?;

        let mut file = fs::File::create(&tmp).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp, &self.path).await?;
        sync_dir(dir).await?;
        trace!(path = %self.path.display(), entries = entries.len(), "run registry persisted");
        Ok(())
    }
}

/// Makes the rename itself durable.
#[cfg(unix)]
async fn sync_dir(dir: &Path) -> Result<(), RegistryError> {
    fs::File::open(dir).await?.sync_all().await?;
    Ok(())
}

#[cfg(not(unix))]
async fn sync_dir(_dir: &Path) -> Result<(), RegistryError> {
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "registry".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[async_trait]
impl RunRegistry for FileRegistry {
    async fn put(&self, key: &str, run_id: &RunId) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        if entries.get(key) == Some(run_id) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.insert(key.to_string(), run_id.clone());
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<RunId>, RegistryError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), RegistryError> {
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(key) {
            return Ok(());
        }

        let mut next = entries.clone();
        next.remove(key);
        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<BTreeSet<String>, RegistryError> {
        let entries = self.entries.lock().await;
        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
