use crate::{
    error::{AppError, AppResult},
    models::{self, timestamp, Notice},
    store::{decode_all, to_fields, Fields, Query, SharedStore, StoreResultExt},
};
use serde_json::Value;

pub struct NoticeService {
    store: SharedStore,
}

#[derive(Debug, Default)]
pub struct NoticePatch<'a> {
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub pinned: Option<bool>,
}

impl NoticeService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Pinned notices first, newest first within each group.
    pub async fn list_notices(&self) -> AppResult<Vec<Notice>> {
        let docs = self
            .store
            .query(models::NOTICES, &Query::new().order_by_desc("createdAt"))
            .await
            .or_empty()?;
        let mut notices: Vec<Notice> = decode_all(models::NOTICES, docs);
        notices.sort_by_key(|n| !n.pinned);
        Ok(notices)
    }

    pub async fn get_notice(&self, notice_id: &str) -> AppResult<Notice> {
        let doc = self
            .store
            .get_by_id(models::NOTICES, notice_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(doc.decode()?)
    }

    pub async fn create_notice(
        &self,
        author_id: &str,
        title: &str,
        content: &str,
        pinned: bool,
    ) -> AppResult<Notice> {
        let now = chrono::Utc::now();
        let notice = Notice {
            id: String::new(),
            title: title.trim().to_string(),
            content: content.to_string(),
            pinned,
            author_id: Some(author_id.to_string()),
            created_at: Some(now),
            updated_at: Some(now),
        };
        let id = self
            .store
            .insert(models::NOTICES, None, to_fields(&notice)?)
            .await?;
        tracing::info!("Notice {} created by {}", id, author_id);
        self.get_notice(&id).await
    }

    pub async fn update_notice(&self, notice_id: &str, patch: NoticePatch<'_>) -> AppResult<Notice> {
        let mut fields = Fields::new();
        if let Some(title) = patch.title {
            fields.insert("title".to_string(), Value::from(title.trim()));
        }
        if let Some(content) = patch.content {
            fields.insert("content".to_string(), Value::from(content));
        }
        if let Some(pinned) = patch.pinned {
            fields.insert("pinned".to_string(), Value::from(pinned));
        }
        fields.insert("updatedAt".to_string(), Value::from(timestamp::now()));

        self.store.update(models::NOTICES, notice_id, fields).await?;
        self.get_notice(notice_id).await
    }

    pub async fn delete_notice(&self, notice_id: &str) -> AppResult<()> {
        self.store.delete(models::NOTICES, notice_id).await?;
        tracing::info!("Notice {} deleted", notice_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn service() -> NoticeService {
        NoticeService::new(Arc::new(MemoryStore::with_collections(&[models::NOTICES])))
    }

    #[tokio::test]
    async fn pinned_notices_list_first() {
        let service = service();
        service
            .create_notice("admin1", "Spring race", "See you there", false)
            .await
            .unwrap();
        let pinned = service
            .create_notice("admin1", "Community rules", "Be kind", true)
            .await
            .unwrap();
        service
            .create_notice("admin1", "Maintenance", "Downtime tonight", false)
            .await
            .unwrap();

        let notices = service.list_notices().await.unwrap();
        assert_eq!(notices.len(), 3);
        assert_eq!(notices[0].id, pinned.id);
    }

    #[tokio::test]
    async fn update_patches_only_given_fields() {
        let service = service();
        let notice = service
            .create_notice("admin1", " Title ", "Body", false)
            .await
            .unwrap();
        assert_eq!(notice.title, "Title");

        let updated = service
            .update_notice(
                &notice.id,
                NoticePatch {
                    pinned: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.pinned);
        assert_eq!(updated.content, "Body");

        let err = service
            .update_notice("missing", NoticePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let service = service();
        let notice = service
            .create_notice("admin1", "Title", "Body", false)
            .await
            .unwrap();
        service.delete_notice(&notice.id).await.unwrap();
        service.delete_notice(&notice.id).await.unwrap();
        assert!(service.list_notices().await.unwrap().is_empty());
    }
}
