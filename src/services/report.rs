use crate::{
    error::{AppError, AppResult},
    models::{self, timestamp, Report, ReportCategory, ReportKind, ReportStatus},
    response::page_offset,
    store::{decode_all, fields_of, Fields, Filter, Query, SharedStore, StoreResultExt, WriteBatch},
};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

pub const CONTENT_REMOVED_NOTE: &str = "Content removed by moderator";

/// What happened to the reported content during a delete-and-resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ContentRemoval {
    Deleted,
    AlreadyAbsent,
    /// The report type has no deletable content (users, unknown types).
    NotApplicable,
}

#[derive(Debug, Clone)]
pub struct Resolution {
    pub report: Report,
    pub content: ContentRemoval,
}

pub struct NewReport<'a> {
    pub report_type: &'a str,
    pub target_id: &'a str,
    pub target_user_id: Option<&'a str>,
    pub category: &'a str,
    pub reason: Option<&'a str>,
}

pub struct ReportService {
    store: SharedStore,
}

impl ReportService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_report(&self, reporter_id: &str, new: NewReport<'_>) -> AppResult<Report> {
        if ReportKind::parse(new.report_type).is_none() {
            return Err(AppError::Validation(
                "type must be one of: run, comment, post, user".to_string(),
            ));
        }
        if ReportCategory::parse(new.category).is_none() {
            return Err(AppError::Validation(
                "category must be one of: spam, inappropriate, harassment, other".to_string(),
            ));
        }
        if new.target_id.trim().is_empty() {
            return Err(AppError::Validation("targetId must not be empty".to_string()));
        }

        let fields = fields_of(json!({
            "type": new.report_type,
            "targetId": new.target_id,
            "targetUserId": new.target_user_id,
            "reporterId": reporter_id,
            "category": new.category,
            "reason": new.reason.filter(|r| !r.trim().is_empty()),
            "status": ReportStatus::Pending,
            "createdAt": timestamp::now(),
        }));

        let id = self.store.insert(models::REPORTS, None, fields).await?;
        tracing::info!(
            "Report {} filed by {} against {} {}",
            id,
            reporter_id,
            new.report_type,
            new.target_id
        );
        self.get_report(&id).await
    }

    /// Newest first. A missing reports collection lists as empty.
    pub async fn list_reports(
        &self,
        status: Option<ReportStatus>,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<Report>, u64)> {
        let mut query = Query::new();
        if let Some(status) = status {
            query = query.filter(Filter::eq("status", status.as_str()));
        }

        let total = self
            .store
            .count(models::REPORTS, &query.unpaged())
            .await
            .or_empty()?;

        let page_query = query
            .order_by_desc("createdAt")
            .offset(page_offset(page, per_page))
            .limit(per_page as usize);
        let docs = self
            .store
            .query(models::REPORTS, &page_query)
            .await
            .or_empty()?;

        let reports: Vec<Report> = decode_all(models::REPORTS, docs);
        Ok((reports, total))
    }

    pub async fn get_report(&self, report_id: &str) -> AppResult<Report> {
        let doc = self
            .store
            .get_by_id(models::REPORTS, report_id)
            .await?
            .ok_or(AppError::NotFound)?;
        Ok(doc.decode()?)
    }

    /// Moves a report to `new_status`. Terminal targets also record who
    /// closed it and when.
    pub async fn set_status(
        &self,
        report_id: &str,
        new_status: ReportStatus,
        resolver_id: &str,
        admin_note: Option<&str>,
    ) -> AppResult<Report> {
        let report = self.get_report(report_id).await?;
        check_transition(&report, new_status)?;

        let patch = status_patch(new_status, resolver_id, admin_note);
        // vanished since the read: NotFound
        self.store.update(models::REPORTS, report_id, patch).await?;

        tracing::info!(
            "Report {} moved {} -> {} by {}",
            report_id,
            report.status,
            new_status,
            resolver_id
        );
        self.get_report(report_id).await
    }

    /// Deletes the reported content and resolves the report in one batch.
    /// Content that is already gone is not an error, so a retry after a
    /// partial failure still resolves the report.
    pub async fn resolve_by_deleting_content(
        &self,
        report_id: &str,
        resolver_id: &str,
    ) -> AppResult<Resolution> {
        let report = self.get_report(report_id).await?;
        check_transition(&report, ReportStatus::Resolved)?;

        let collection = report.kind().and_then(ReportKind::content_collection);
        let content = match collection {
            None => ContentRemoval::NotApplicable,
            Some(collection) => {
                let existing = self
                    .store
                    .get_by_id(collection, &report.target_id)
                    .await
                    .or_empty()?;
                match existing {
                    Some(_) => ContentRemoval::Deleted,
                    None => ContentRemoval::AlreadyAbsent,
                }
            }
        };

        let mut batch = WriteBatch::new();
        if let (ContentRemoval::Deleted, Some(collection)) = (content, collection) {
            batch = batch.delete(collection, &report.target_id);
        }
        batch = batch.update(
            models::REPORTS,
            report_id,
            status_patch(ReportStatus::Resolved, resolver_id, Some(CONTENT_REMOVED_NOTE)),
        );
        self.store.commit(batch).await?;

        tracing::info!(
            "Report {} resolved by {}, {} {}: {:?}",
            report_id,
            resolver_id,
            report.report_type,
            report.target_id,
            content
        );

        let report = self.get_report(report_id).await?;
        Ok(Resolution { report, content })
    }
}

fn check_transition(report: &Report, next: ReportStatus) -> AppResult<()> {
    if report.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(AppError::invalid_transition(report.status, next))
    }
}

fn status_patch(status: ReportStatus, resolver_id: &str, admin_note: Option<&str>) -> Fields {
    let now = timestamp::now();
    let mut patch = fields_of(json!({
        "status": status,
        "updatedAt": now,
    }));
    if status.is_terminal() {
        patch.insert("resolvedAt".to_string(), Value::String(now));
        patch.insert(
            "resolvedBy".to_string(),
            Value::String(resolver_id.to_string()),
        );
        if let Some(note) = admin_note {
            patch.insert("adminNote".to_string(), Value::String(note.to_string()));
        }
    }
    patch
}
