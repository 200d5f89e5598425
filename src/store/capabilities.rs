use super::{DocumentStore, StoreResult};
use futures_util::future::join_all;
use serde::Serialize;
use std::collections::BTreeMap;

/// Which collections are available, determined once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    present: BTreeMap<String, bool>,
}

impl Capabilities {
    /// Registers every collection in `names` and records whether it is
    /// usable afterwards. Registration failures are logged and mark the
    /// collection as absent instead of aborting startup.
    pub async fn register(store: &dyn DocumentStore, names: &[&str]) -> Self {
        let results = join_all(names.iter().map(|name| store.ensure_collection(name))).await;

        let mut present = BTreeMap::new();
        for (name, result) in names.iter().zip(results) {
            if let Err(e) = &result {
                tracing::warn!("Collection '{}' unavailable: {}", name, e);
            }
            present.insert(name.to_string(), result.is_ok());
        }
        Self { present }
    }

    /// Reads the current registry without registering anything.
    pub async fn probe(store: &dyn DocumentStore, names: &[&str]) -> StoreResult<Self> {
        let existing = store.collections().await?;
        let present = names
            .iter()
            .map(|name| (name.to_string(), existing.iter().any(|e| e == name)))
            .collect();
        Ok(Self { present })
    }

    /// Every collection counts as present.
    pub fn all(names: &[&str]) -> Self {
        Self {
            present: names.iter().map(|n| (n.to_string(), true)).collect(),
        }
    }

    pub fn has(&self, collection: &str) -> bool {
        self.present.get(collection).copied().unwrap_or(false)
    }

    pub fn missing(&self) -> Vec<&str> {
        self.present
            .iter()
            .filter(|(_, present)| !**present)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    pub fn as_map(&self) -> &BTreeMap<String, bool> {
        &self.present
    }
}
