//! Durable key -> run id storage.
//!
//! The tracker writes an entry before polling starts and deletes it once the
//! loop is retired, so whatever is left after a crash is exactly the set of
//! runs that still need watching.

use std::collections::BTreeSet;

use async_trait::async_trait;
use runwatch_model::RunId;

use crate::error::RegistryError;

mod file;
pub use file::FileRegistry;

mod memory;
pub use memory::MemoryRegistry;

/// Key-value persistence used by the tracker.
///
/// A write that returns `Ok` must be durable. Different keys are independent:
/// implementations need safe concurrent access but no cross-key transactions.
#[async_trait]
pub trait RunRegistry: Send + Sync {
    async fn put(&self, key: &str, run_id: &RunId) -> Result<(), RegistryError>;

    async fn get(&self, key: &str) -> Result<Option<RunId>, RegistryError>;

    /// Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), RegistryError>;

    async fn list_keys(&self, prefix: &str) -> Result<BTreeSet<String>, RegistryError>;
}
