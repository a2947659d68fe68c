// Route lookup against the shared store

use std::collections::BTreeMap;
use std::sync::Arc;

use super::PublishedEntry;
use crate::error::StoreError;
use crate::publisher::store_key;
use crate::store::RouteStore;

pub struct LookupService {
    store: Arc<dyn RouteStore>,
    namespace: String,
}

impl LookupService {
    pub fn new(store: Arc<dyn RouteStore>, namespace: impl Into<String>) -> Self {
        LookupService {
            store,
            namespace: namespace.into(),
        }
    }

    /// Find published routes of `node_id` whose network matches `network`.
    ///
    /// `network` goes into the key pattern as is, so glob fragments such as
    /// `10.0.*` work. Expired entries are already gone from the store; a key
    /// that expires between listing and reading is skipped.
    pub async fn lookup(
        &self,
        node_id: &str,
        network: &str,
    ) -> Result<Vec<PublishedEntry>, StoreError> {
        let pattern = store_key(&self.namespace, node_id, network);
        let mut keys = self.store.keys(&pattern).await?;
        keys.sort();

        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            let fields = self.store.read_hash(&key).await?;
            if fields.is_empty() {
                tracing::debug!("No data found for key: {}", key);
                continue;
            }

            tracing::debug!("Found route in store: {}", key);
            entries.push(PublishedEntry {
                key,
                fields: fields.into_iter().collect::<BTreeMap<_, _>>(),
            });
        }

        Ok(entries)
    }
}
