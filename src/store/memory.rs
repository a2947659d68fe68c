// In-process route store with Redis TTL and KEYS semantics, for tests

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::{HashWrite, RouteStore};
use crate::error::StoreError;

#[derive(Debug, Clone)]
struct StoredHash {
    fields: HashMap<String, String>,
    expires_at: Option<Instant>,
}

impl StoredHash {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.is_none_or(|deadline| deadline > now)
    }
}

/// Uses tokio's clock so paused-time tests can fast-forward expiry
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: Arc<Mutex<HashMap<String, StoredHash>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add fields to a hash without touching its TTL, like a bare HSET
    pub async fn hset(&self, key: &str, field: &str, value: &str) {
        let mut data = self.data.lock().await;
        let entry = data.entry(key.to_string()).or_insert_with(|| StoredHash {
            fields: HashMap::new(),
            expires_at: None,
        });
        entry.fields.insert(field.to_string(), value.to_string());
    }

    /// Remaining time to live of a key, `None` if absent or persistent
    pub async fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let data = self.data.lock().await;
        data.get(key)
            .filter(|h| h.is_live(now))
            .and_then(|h| h.expires_at)
            .map(|deadline| deadline - now)
    }
}

#[async_trait]
impl RouteStore for MemoryStore {
    async fn write_hashes(&self, writes: &[HashWrite], ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Instant::now() + ttl;
        let mut data = self.data.lock().await;
        for write in writes {
            let fields = write
                .fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect();
            data.insert(
                write.key.clone(),
                StoredHash {
                    fields,
                    expires_at: Some(expires_at),
                },
            );
        }
        Ok(())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let mut data = self.data.lock().await;
        data.retain(|_, h| h.is_live(now));
        Ok(data
            .keys()
            .filter(|k| glob_match(pattern.as_bytes(), k.as_bytes()))
            .cloned()
            .collect())
    }

    async fn read_hash(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let now = Instant::now();
        let data = self.data.lock().await;
        Ok(data
            .get(key)
            .filter(|h| h.is_live(now))
            .map(|h| h.fields.clone())
            .unwrap_or_default())
    }
}

/// Redis-style glob: `*`, `?`, `[abc]`, `[^a]`, `[a-z]` and `\` escapes
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    match pattern.split_first() {
        None => text.is_empty(),
        Some((b'*', rest)) => (0..=text.len()).any(|skip| glob_match(rest, &text[skip..])),
        Some((b'?', rest)) => !text.is_empty() && glob_match(rest, &text[1..]),
        Some((b'[', rest)) => {
            let Some((&c, text_rest)) = text.split_first() else {
                return false;
            };
            match match_class(rest, c) {
                Some((true, after)) => glob_match(after, text_rest),
                Some((false, _)) => false,
                // Unterminated class, treat `[` literally
                None => c == b'[' && glob_match(rest, text_rest),
            }
        }
        Some((b'\\', rest)) if !rest.is_empty() => {
            text.first() == Some(&rest[0]) && glob_match(&rest[1..], &text[1..])
        }
        Some((&p, rest)) => text.first() == Some(&p) && glob_match(rest, &text[1..]),
    }
}

/// Match `c` against a class body (after `[`); returns the verdict and the
/// pattern after the closing `]`
fn match_class(class: &[u8], c: u8) -> Option<(bool, &[u8])> {
    let (negated, mut i) = match class.first() {
        Some(b'^') => (true, 1),
        _ => (false, 0),
    };
    let mut matched = false;

    while i < class.len() {
        match class[i] {
            b']' => return Some((matched != negated, &class[i + 1..])),
            b'\\' if i + 1 < class.len() => {
                matched |= class[i + 1] == c;
                i += 2;
            }
            lo if i + 2 < class.len() && class[i + 1] == b'-' && class[i + 2] != b']' => {
                let hi = class[i + 2];
                let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                matched |= (lo..=hi).contains(&c);
                i += 3;
            }
            other => {
                matched |= other == c;
                i += 1;
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(key: &str, fields: &[(&'static str, &str)]) -> HashWrite {
        HashWrite {
            key: key.to_string(),
            fields: fields.iter().map(|(k, v)| (*k, v.to_string())).collect(),
        }
    }

    #[test]
    fn test_glob_match() {
        let cases = [
            ("route:*", "route:a:10.0.0.0/24", true),
            ("route:a:*", "route:b:10.0.0.0/24", false),
            ("route:a:10.0.0.0/24", "route:a:10.0.0.0/24", true),
            ("route:a:10.0.0.0/2?", "route:a:10.0.0.0/24", true),
            ("route:a:10.0.[0-1].0/24", "route:a:10.0.1.0/24", true),
            ("route:a:10.0.[^0-1].0/24", "route:a:10.0.1.0/24", false),
            ("route:a:10.0.[2].0/24", "route:a:10.0.1.0/24", false),
            ("route:\\*", "route:*", true),
            ("route:\\*", "route:x", false),
            ("*", "", true),
            ("?", "", false),
            ("a[", "a[", true),
        ];

        for (pattern, text, expected) in cases {
            assert_eq!(
                glob_match(pattern.as_bytes(), text.as_bytes()),
                expected,
                "{} vs {}",
                pattern,
                text
            );
        }
    }

    #[tokio::test]
    async fn test_write_replaces_previous_fields() {
        let store = MemoryStore::new();
        store.hset("route:a:x", "stale", "1").await;

        store
            .write_hashes(&[write("route:a:x", &[("network", "x")])], Duration::from_secs(60))
            .await
            .unwrap();

        let fields = store.read_hash("route:a:x").await.unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields["network"], "x");
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_keys_read_as_absent() {
        let store = MemoryStore::new();
        store
            .write_hashes(&[write("route:a:x", &[("network", "x")])], Duration::from_secs(60))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.ttl("route:a:x").await, Some(Duration::from_secs(30)));
        assert_eq!(store.keys("route:*").await.unwrap().len(), 1);

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(store.keys("route:*").await.unwrap().is_empty());
        assert!(store.read_hash("route:a:x").await.unwrap().is_empty());
        assert_eq!(store.ttl("route:a:x").await, None);
    }
}
