// Shared key-value store used to publish routes between nodes

#[cfg(test)]
pub mod memory;
pub mod redis_store;

use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

use crate::error::StoreError;

/// One hash to (re)write in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashWrite {
    pub key: String,
    pub fields: Vec<(&'static str, String)>,
}

/// What the publisher and lookup service need from the store:
/// hash writes with a per-key TTL, glob key enumeration and hash reads.
/// Expired keys must read as absent.
#[async_trait]
pub trait RouteStore: Send + Sync {
    /// Replace each hash with the given fields and reset its TTL.
    /// Writes are batched but not atomic across keys.
    async fn write_hashes(&self, writes: &[HashWrite], ttl: Duration) -> Result<(), StoreError>;

    /// Keys matching a Redis glob pattern
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;

    /// All fields of a hash; empty when the key does not exist
    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;
}
