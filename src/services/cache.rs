use dashmap::DashMap;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Clone)]
enum Backend {
    Redis(ConnectionManager),
    /// Process-local entries with their expiry, used when Redis is absent.
    Local(Arc<DashMap<String, (String, Instant)>>),
}

/// Best-effort JSON cache. Redis failures are logged and treated as misses
/// so the dashboard keeps working without Redis.
#[derive(Clone)]
pub struct CacheService {
    backend: Backend,
    namespace: String,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self::with_backend(Backend::Redis(redis))
    }

    pub fn local() -> Self {
        Self::with_backend(Backend::Local(Arc::new(DashMap::new())))
    }

    fn with_backend(backend: Backend) -> Self {
        Self {
            backend,
            namespace: "runlog".to_string(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                let result: Result<Option<String>, _> = conn.get(self.key(key)).await;
                match result {
                    Ok(raw) => raw,
                    Err(e) => {
                        tracing::debug!("Cache read failed for {}: {}", key, e);
                        return None;
                    }
                }
            }
            Backend::Local(entries) => {
                let full_key = self.key(key);
                entries.remove_if(&full_key, |_, (_, expires)| *expires <= Instant::now());
                entries.get(&full_key).map(|entry| entry.0.clone())
            }
        };
        raw.and_then(|s| serde_json::from_str(&s).ok())
    }

    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        if ttl_secs == 0 {
            return;
        }
        let Ok(json) = serde_json::to_string(value) else {
            return;
        };
        match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                let result: Result<(), _> = conn.set_ex(self.key(key), json, ttl_secs).await;
                if let Err(e) = result {
                    tracing::debug!("Cache write failed for {}: {}", key, e);
                }
            }
            Backend::Local(entries) => {
                let expires = Instant::now() + Duration::from_secs(ttl_secs);
                entries.insert(self.key(key), (json, expires));
            }
        }
    }

    /// Drops every key matching `pattern`. Only a trailing `*` wildcard is
    /// understood by the local backend.
    pub async fn invalidate_pattern(&self, pattern: &str) {
        let full_pattern = self.key(pattern);
        match &self.backend {
            Backend::Redis(redis) => {
                let mut conn = redis.clone();
                let keys: Vec<String> = match redis::cmd("KEYS")
                    .arg(&full_pattern)
                    .query_async(&mut conn)
                    .await
                {
                    Ok(keys) => keys,
                    Err(e) => {
                        tracing::warn!("Cache invalidation failed for {}: {}", pattern, e);
                        return;
                    }
                };
                if !keys.is_empty() {
                    let result: Result<(), _> = conn.del(keys).await;
                    if let Err(e) = result {
                        tracing::warn!("Cache invalidation failed for {}: {}", pattern, e);
                    }
                }
            }
            Backend::Local(entries) => match full_pattern.strip_suffix('*') {
                Some(prefix) => entries.retain(|key, _| !key.starts_with(prefix)),
                None => {
                    entries.remove(&full_pattern);
                }
            },
        }
    }
}
