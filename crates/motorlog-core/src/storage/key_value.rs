//! Persisted string key/value capability.

use crate::error::Result;

/// Process-wide persisted key/value entries.
///
/// Implementations must make each `set` durable before returning and must
/// never expose a partially written value to readers.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}
