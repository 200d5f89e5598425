use crate::{
    error::{AppError, AppResult},
    models::{self, user::VALID_ROLES, timestamp, User},
    response::page_offset,
    store::{decode_all, fields_of, Query, SharedStore, StoreResultExt},
};
use serde_json::json;

pub struct AdminService {
    store: SharedStore,
}

impl AdminService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, user_id: &str) -> AppResult<User> {
        let doc = self
            .store
            .get_by_id(models::USERS, user_id)
            .await
            .or_empty()?
            .ok_or(AppError::NotFound)?;
        Ok(doc.decode()?)
    }

    pub async fn list_users(&self, page: u64, per_page: u64) -> AppResult<(Vec<User>, u64)> {
        let total = self
            .store
            .count(models::USERS, &Query::new())
            .await
            .or_empty()?;

        let query = Query::new()
            .order_by_desc("createdAt")
            .offset(page_offset(page, per_page))
            .limit(per_page as usize);
        let docs = self.store.query(models::USERS, &query).await.or_empty()?;
        let users: Vec<User> = decode_all(models::USERS, docs);
        Ok((users, total))
    }

    pub async fn update_user_role(&self, user_id: &str, role: &str) -> AppResult<User> {
        if !VALID_ROLES.contains(&role) {
            return Err(AppError::Validation(format!(
                "Invalid role. Must be one of: {}",
                VALID_ROLES.join(", ")
            )));
        }

        self.store
            .update(
                models::USERS,
                user_id,
                fields_of(json!({ "role": role, "updatedAt": timestamp::now() })),
            )
            .await?;
        tracing::info!("User {} role set to {}", user_id, role);
        self.get_user(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn list_users_pages_newest_first() {
        let store = Arc::new(MemoryStore::with_collections(&[models::USERS]));
        for (id, created) in [
            ("u1", "2026-01-01T00:00:00.000Z"),
            ("u2", "2026-03-01T00:00:00.000Z"),
            ("u3", "2026-02-01T00:00:00.000Z"),
        ] {
            store
                .insert(models::USERS, Some(id), fields_of(json!({ "createdAt": created })))
                .await
                .unwrap();
        }
        let service = AdminService::new(store);

        let (users, total) = service.list_users(1, 2).await.unwrap();
        assert_eq!(total, 3);
        let ids: Vec<_> = users.iter().map(|u| u.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3"]);
    }

    #[tokio::test]
    async fn update_role_validates_and_applies() {
        let store = Arc::new(MemoryStore::with_collections(&[models::USERS]));
        store
            .insert(models::USERS, Some("u1"), fields_of(json!({ "role": "user" })))
            .await
            .unwrap();
        let service = AdminService::new(store);

        let user = service.update_user_role("u1", "banned").await.unwrap();
        assert!(user.is_banned());

        let err = service.update_user_role("u1", "owner").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = service.update_user_role("ghost", "admin").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }
}
