use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, PoisonError, RwLock},
};

use async_trait::async_trait;
use runwatch_model::RunId;

use super::RunRegistry;
use crate::error::RegistryError;

/// Process-local registry.
///
/// Nothing survives a restart; use [`FileRegistry`](super::FileRegistry) when resuming matters.
#[derive(Clone, Default)]
pub struct MemoryRegistry {
    inner: Arc<RwLock<HashMap<String, RunId>>>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RunRegistry for MemoryRegistry {
    async fn put(&self, key: &str, run_id: &RunId) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.insert(key.to_string(), run_id.clone());
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<RunId>, RegistryError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), RegistryError> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        inner.remove(key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<BTreeSet<String>, RegistryError> {
        let inner = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        Ok(inner
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
