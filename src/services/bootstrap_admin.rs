use crate::config::parse_bool_env;
use crate::error::AppResult;
use crate::models::{self, timestamp, user::ROLE_ADMIN};
use crate::store::{fields_of, DocumentStore, Filter, Query, StoreResultExt};
use serde_json::json;
use std::env;

#[derive(Debug, Clone)]
pub struct BootstrapAdminConfig {
    pub user_id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl BootstrapAdminConfig {
    pub fn from_env() -> Option<Self> {
        if !parse_bool_env("BOOTSTRAP_ADMIN_ENABLED", false) {
            return None;
        }

        Some(Self {
            user_id: env::var("BOOTSTRAP_ADMIN_USER_ID").ok()?,
            email: env::var("BOOTSTRAP_ADMIN_EMAIL").ok(),
            display_name: env::var("BOOTSTRAP_ADMIN_NAME").ok(),
        })
    }
}

/// Makes sure at least one admin exists:
/// - any admin already present: nothing to do
/// - the configured user exists: promote it
/// - otherwise: create the user document as admin
pub async fn ensure_bootstrap_admin(
    store: &dyn DocumentStore,
    cfg: &BootstrapAdminConfig,
) -> AppResult<()> {
    let admins = store
        .count(
            models::USERS,
            &Query::new().filter(Filter::eq("role", ROLE_ADMIN)).limit(1),
        )
        .await
        .or_empty()?;
    if admins > 0 {
        return Ok(());
    }

    let existing = store
        .get_by_id(models::USERS, &cfg.user_id)
        .await
        .or_empty()?;

    if existing.is_some() {
        store
            .update(
                models::USERS,
                &cfg.user_id,
                fields_of(json!({ "role": ROLE_ADMIN, "updatedAt": timestamp::now() })),
            )
            .await?;
        tracing::info!("Promoted user {} to admin", cfg.user_id);
        return Ok(());
    }

    store
        .insert(
            models::USERS,
            Some(&cfg.user_id),
            fields_of(json!({
                "role": ROLE_ADMIN,
                "email": cfg.email,
                "displayName": cfg.display_name,
                "createdAt": timestamp::now(),
            })),
        )
        .await?;
    tracing::info!("Created bootstrap admin {}", cfg.user_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn cfg() -> BootstrapAdminConfig {
        BootstrapAdminConfig {
            user_id: "root".to_string(),
            email: Some("root@example.com".to_string()),
            display_name: None,
        }
    }

    #[tokio::test]
    async fn creates_admin_when_none_exists() {
        let store = MemoryStore::new();
        ensure_bootstrap_admin(&store, &cfg()).await.unwrap();
        let doc = store.get_by_id(models::USERS, "root").await.unwrap().unwrap();
        assert_eq!(doc.get_str("role"), Some(ROLE_ADMIN));
    }

    #[tokio::test]
    async fn promotes_existing_user() {
        let store = MemoryStore::with_collections(&[models::USERS]);
        store
            .insert(models::USERS, Some("root"), fields_of(json!({ "role": "user", "email": "x@y.z" })))
            .await
            .unwrap();
        ensure_bootstrap_admin(&store, &cfg()).await.unwrap();
        let doc = store.get_by_id(models::USERS, "root").await.unwrap().unwrap();
        assert_eq!(doc.get_str("role"), Some(ROLE_ADMIN));
        assert_eq!(doc.get_str("email"), Some("x@y.z"));
    }

    #[tokio::test]
    async fn leaves_store_alone_when_admin_exists() {
        let store = MemoryStore::with_collections(&[models::USERS]);
        store
            .insert(models::USERS, Some("boss"), fields_of(json!({ "role": "admin" })))
            .await
            .unwrap();
        ensure_bootstrap_admin(&store, &cfg()).await.unwrap();
        assert!(store.get_by_id(models::USERS, "root").await.unwrap().is_none());
    }
}
