// Redis implementation of the route store

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

use super::{HashWrite, RouteStore};
use crate::config::RedisSettings;
use crate::error::StoreError;

pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(settings: &RedisSettings) -> Result<Self, StoreError> {
        let url = settings.url();
        let client = Client::open(url.as_str())
            .map_err(|e| StoreError::Connection(format!("{}: {}", url, e)))?;
        let connection = ConnectionManager::new(client)
            .await
            .map_err(|e| StoreError::Connection(format!("{}: {}", url, e)))?;

        tracing::info!(
            "Connected to Redis at {}:{} (db={})",
            settings.host,
            settings.port,
            settings.db
        );
        Ok(RedisStore { connection })
    }
}

#[async_trait]
impl RouteStore for RedisStore {
    async fn write_hashes(&self, writes: &[HashWrite], ttl: Duration) -> Result<(), StoreError> {
        if writes.is_empty() {
            return Ok(());
        }

        let ttl_seconds = i64::try_from(ttl.as_secs())
            .map_err(|_| StoreError::Command(format!("TTL {:?} is out of range", ttl)))?;

        // DEL first so fields from an older write never survive
        let mut pipe = redis::pipe();
        for write in writes {
            pipe.del(&write.key).ignore();
            pipe.hset_multiple(&write.key, &write.fields).ignore();
            pipe.expire(&write.key, ttl_seconds).ignore();
        }

        let mut conn = self.connection.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        debug!(count = writes.len(), ttl = ttl.as_secs(), "Wrote route hashes");
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.connection.clone();
        let keys: Vec<String> = conn.keys(pattern).await?;
        debug!(pattern, count = keys.len(), "KEYS");
        Ok(keys)
    }

    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.connection.clone();
        let values: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(values)
    }
}
