use crate::{
    error::{AppError, AppResult},
    models::{self, timestamp, Crew, CrewMember, CrewStatus},
    store::{decode_all, fields_of, Filter, Query, SharedStore, StoreResultExt, WriteBatch},
};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// False when the crew was already gone and only memberships were swept.
    pub crew_deleted: bool,
    pub members_removed: usize,
}

pub struct CrewService {
    store: SharedStore,
}

impl CrewService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list_crews(&self, status: Option<CrewStatus>) -> AppResult<Vec<Crew>> {
        let mut query = Query::new().order_by_desc("createdAt");
        if let Some(status) = status {
            query = query.filter(Filter::eq("status", status.as_str()));
        }
        let docs = self.store.query(models::CREWS, &query).await.or_empty()?;
        let crews: Vec<Crew> = decode_all(models::CREWS, docs);
        Ok(crews)
    }

    pub async fn get_crew(&self, crew_id: &str) -> AppResult<Crew> {
        let doc = self
            .store
            .get_by_id(models::CREWS, crew_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(doc.decode()?)
    }

    /// Memberships of a crew, oldest first. A crew without members yet has
    /// no sub-collection, which lists as empty.
    pub async fn members(&self, crew_id: &str) -> AppResult<Vec<CrewMember>> {
        let docs = self
            .store
            .query(
                &models::crew_members(crew_id),
                &Query::new().order_by_asc("joinedAt"),
            )
            .await
            .or_empty()?;
        let members: Vec<CrewMember> = decode_all(&models::crew_members(crew_id), docs);
        Ok(members)
    }

    pub async fn approve(&self, crew_id: &str, admin_id: &str) -> AppResult<Crew> {
        let crew = self.get_crew(crew_id).await?;
        if crew.status != CrewStatus::Pending {
            return Err(AppError::invalid_transition(
                crew.status.as_str(),
                CrewStatus::Approved.as_str(),
            ));
        }

        let patch = fields_of(json!({
            "status": CrewStatus::Approved,
            "approvedAt": timestamp::now(),
            "approvedBy": admin_id,
        }));
        self.store.update(models::CREWS, crew_id, patch).await?;

        tracing::info!("Crew {} ({}) approved by {}", crew_id, crew.name, admin_id);
        self.get_crew(crew_id).await
    }

    /// Deletes a pending crew together with its memberships in one batch.
    /// Retrying after the crew is gone sweeps any memberships left behind.
    pub async fn reject(&self, crew_id: &str) -> AppResult<Rejection> {
        let crew = match self.store.get_by_id(models::CREWS, crew_id).await.or_empty()? {
            Some(doc) => Some(doc.decode::<Crew>()?),
            None => None,
        };
        if let Some(crew) = &crew {
            if crew.status != CrewStatus::Pending {
                return Err(AppError::invalid_transition(crew.status.as_str(), "rejected"));
            }
        }

        let members_collection = models::crew_members(crew_id);
        let members = self
            .store
            .query(&members_collection, &Query::new())
            .await
            .or_empty()?;

        if crew.is_none() && members.is_empty() {
            return Err(AppError::NotFound);
        }

        let mut batch = WriteBatch::new();
        if crew.is_some() {
            batch = batch.delete(models::CREWS, crew_id);
        }
        for member in &members {
            batch = batch.delete(&members_collection, &member.id);
        }
        self.store.commit(batch).await?;

        let rejection = Rejection {
            crew_deleted: crew.is_some(),
            members_removed: members.len(),
        };
        tracing::info!(
            "Crew {} rejected: crew_deleted={}, members_removed={}",
            crew_id,
            rejection.crew_deleted,
            rejection.members_removed
        );
        Ok(rejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, MemoryStore};
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, CrewService) {
        let store = Arc::new(MemoryStore::with_collections(&[models::CREWS]));
        (store.clone(), CrewService::new(store))
    }

    async fn seed_crew(store: &MemoryStore, id: &str, status: &str, members: &[&str]) {
        store
            .insert(
                models::CREWS,
                Some(id),
                fields_of(json!({ "name": "Han River Runners", "status": status })),
            )
            .await
            .unwrap();
        for member in members {
            store
                .insert(
                    &models::crew_members(id),
                    Some(member),
                    fields_of(json!({ "userId": member, "role": "member" })),
                )
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn list_crews_skips_legacy_statuses() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &[]).await;
        seed_crew(&store, "c2", "active", &[]).await;

        let crews = service.list_crews(None).await.unwrap();
        assert_eq!(crews.len(), 1);
        assert_eq!(crews[0].id, "c1");
    }

    #[tokio::test]
    async fn approve_sets_approval_metadata() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &[]).await;

        let crew = service.approve("c1", "admin1").await.unwrap();
        assert_eq!(crew.status, CrewStatus::Approved);
        assert!(crew.approved_at.is_some());
        assert_eq!(crew.approved_by.as_deref(), Some("admin1"));

        let err = service.approve("c1", "admin1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn reject_removes_crew_and_memberships() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &["u1", "u2", "u3"]).await;

        let rejection = service.reject("c1").await.unwrap();
        assert!(rejection.crew_deleted);
        assert_eq!(rejection.members_removed, 3);
        assert!(store.get_by_id(models::CREWS, "c1").await.unwrap().is_none());
        let left = store
            .query(&models::crew_members("c1"), &Query::new())
            .await
            .unwrap();
        assert!(left.is_empty());
    }

    #[tokio::test]
    async fn members_lists_sub_collection() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &["u1", "u2"]).await;

        let members = service.members("c1").await.unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].role.as_deref(), Some("member"));
        assert!(service.members("nobody").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reject_without_members_collection_still_deletes_crew() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &[]).await;

        let rejection = service.reject("c1").await.unwrap();
        assert!(rejection.crew_deleted);
        assert_eq!(rejection.members_removed, 0);
    }

    #[tokio::test]
    async fn reject_retry_sweeps_orphaned_memberships() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &["u1", "u2"]).await;
        store.delete(models::CREWS, "c1").await.unwrap();

        let rejection = service.reject("c1").await.unwrap();
        assert!(!rejection.crew_deleted);
        assert_eq!(rejection.members_removed, 2);

        let err = service.reject("c1").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound));
    }

    #[tokio::test]
    async fn reject_refuses_approved_crews() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "approved", &["u1"]).await;

        let err = service.reject("c1").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
        assert!(store.get_by_id(models::CREWS, "c1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn list_crews_filters_by_status() {
        let (store, service) = setup().await;
        seed_crew(&store, "c1", "pending", &[]).await;
        seed_crew(&store, "c2", "approved", &[]).await;

        let pending = service.list_crews(Some(CrewStatus::Pending)).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "c1");
        assert_eq!(service.list_crews(None).await.unwrap().len(), 2);
    }
}
