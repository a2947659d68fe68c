// Publishes parsed routes into the shared store under this node's namespace
//
// Key layout: `<namespace>:<node_id>:<network>`. Each node is the only writer
// of its own namespace; every write replaces the whole hash and resets its TTL,
// so a route that stops being published disappears once the TTL runs out.
// Network values containing `:` are not escaped.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::routes::RouteRecord;
use crate::store::{HashWrite, RouteStore};

pub const DEFAULT_NAMESPACE: &str = "route";
pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

pub fn store_key(namespace: &str, node_id: &str, network: &str) -> String {
    format!("{}:{}:{}", namespace, node_id, network)
}

#[derive(Clone)]
pub struct RecordPublisher {
    store: Arc<dyn RouteStore>,
    namespace: String,
    node_id: String,
    ttl: Duration,
}

impl RecordPublisher {
    pub fn new(
        store: Arc<dyn RouteStore>,
        namespace: impl Into<String>,
        node_id: impl Into<String>,
        ttl: Duration,
    ) -> Self {
        RecordPublisher {
            store,
            namespace: namespace.into(),
            node_id: node_id.into(),
            ttl,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn key_for(&self, network: &str) -> String {
        store_key(&self.namespace, &self.node_id, network)
    }

    /// Write all records in one pipelined batch; returns how many were written
    pub async fn publish(&self, records: &[RouteRecord]) -> Result<usize, StoreError> {
        if records.is_empty() {
            return Ok(0);
        }

        let writes: Vec<HashWrite> = records.iter().map(|r| self.hash_write(r)).collect();
        for write in &writes {
            tracing::debug!("Preparing key {} with {:?}", write.key, write.fields);
        }

        self.store.write_hashes(&writes, self.ttl).await?;
        tracing::info!(
            "Sent {} routes to the store from node {}",
            writes.len(),
            self.node_id
        );
        Ok(writes.len())
    }

    /// Write a single record, used by the manual add path
    pub async fn publish_one(&self, record: &RouteRecord) -> Result<(), StoreError> {
        let write = self.hash_write(record);
        tracing::debug!("Setting key {} with {:?}", write.key, write.fields);
        self.store
            .write_hashes(std::slice::from_ref(&write), self.ttl)
            .await?;
        tracing::info!("Updated store with route {}", write.key);
        Ok(())
    }

    fn hash_write(&self, record: &RouteRecord) -> HashWrite {
        HashWrite {
            key: self.key_for(&record.network),
            fields: record.to_fields(),
        }
    }
}
