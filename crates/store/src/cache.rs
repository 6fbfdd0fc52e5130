//! Expiring key-value cache for derived per-user blobs such as avatars.

use std::{collections::HashMap, sync::Mutex, time::Duration};

use {async_trait::async_trait, tokio::time::Instant};

use crate::Result;

pub const AVATAR_KEY_PREFIX: &str = "avatar_";
pub const DEFAULT_AVATAR_TTL: Duration = Duration::from_secs(300);

pub fn avatar_key(local_user_id: &str) -> String {
    format!("{AVATAR_KEY_PREFIX}{local_user_id}")
}

/// Host key-value store with per-key expiry.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `value` under `key`. A zero `ttl` never expires.
    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

struct Entry {
    value: Vec<u8>,
    expires_at: Option<Instant>,
}

/// In-process [`KvStore`]. Entries expire lazily on read.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let expired = match entries.get(key) {
            None => return Ok(None),
            Some(entry) => entry
                .expires_at
                .is_some_and(|deadline| Instant::now() >= deadline),
        };
        if expired {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set_with_expiry(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        let expires_at = (!ttl.is_zero()).then(|| Instant::now() + ttl);
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), Entry {
            value: value.to_vec(),
            expires_at,
        });
        Ok(())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn avatar_keys_are_prefixed() {
        assert_eq!(avatar_key("u1"), "avatar_u1");
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let kv = MemoryKvStore::new();
        kv.set_with_expiry("k", b"v", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_secs(9)).await;
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some(&b"v"[..]));

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(kv.get("k").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn zero_ttl_never_expires() {
        let kv = MemoryKvStore::new();
        kv.set_with_expiry("k", b"v", Duration::ZERO).await.unwrap();
        tokio::time::advance(Duration::from_secs(86_400)).await;
        assert!(kv.get("k").await.unwrap().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn rewrite_resets_expiry() {
        let kv = MemoryKvStore::new();
        kv.set_with_expiry("k", b"old", Duration::from_secs(5))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        kv.set_with_expiry("k", b"new", Duration::from_secs(5))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(4)).await;
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some(&b"new"[..]));
    }
}
