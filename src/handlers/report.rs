use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::report::{category_label, type_label};
use crate::models::{Report, ReportStatus};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::cache::CacheService;
use crate::services::report::{ContentRemoval, NewReport, ReportService};
use crate::services::stats::StatsService;
use crate::store::SharedStore;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReportRequest {
    /// run, comment, post or user
    #[serde(rename = "type")]
    #[validate(length(min = 1, max = 20))]
    pub report_type: String,
    #[validate(length(min = 1, max = 128))]
    pub target_id: String,
    pub target_user_id: Option<String>,
    /// spam, inappropriate, harassment or other
    #[validate(length(min = 1, max = 20))]
    pub category: String,
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListReportsQuery {
    /// pending, processing, resolved or dismissed
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: ReportStatus,
    #[validate(length(max = 1000))]
    pub admin_note: Option<String>,
}

/// A report plus display labels for its type and category.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReportResponse {
    #[serde(flatten)]
    pub report: Report,
    pub type_label: String,
    pub category_label: String,
}

impl From<Report> for ReportResponse {
    fn from(report: Report) -> Self {
        Self {
            type_label: type_label(&report.report_type).to_string(),
            category_label: category_label(&report.category).to_string(),
            report,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ResolutionResponse {
    pub report: ReportResponse,
    pub content: ContentRemoval,
}

#[utoipa::path(
    post,
    path = "/api/v1/reports",
    security(("jwt_token" = [])),
    request_body = CreateReportRequest,
    responses(
        (status = 200, description = "Report filed", body = ReportResponse),
        (status = 400, description = "Validation error", body = AppError),
        (status = 401, description = "Unauthorized", body = AppError),
    ),
    tag = "reports"
)]
pub async fn create_report(
    Extension(store): Extension<SharedStore>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Json(payload): Json<CreateReportRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = ReportService::new(store);
    let report = service
        .create_report(
            &auth_user.user_id,
            NewReport {
                report_type: &payload.report_type,
                target_id: &payload.target_id,
                target_user_id: payload.target_user_id.as_deref(),
                category: &payload.category,
                reason: payload.reason.as_deref(),
            },
        )
        .await?;
    StatsService::invalidate(cache.as_ref().map(|Extension(c)| c)).await;

    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports",
    security(("jwt_token" = [])),
    params(ListReportsQuery),
    responses(
        (status = 200, description = "Reports, newest first", body = PaginatedResponse<ReportResponse>),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "reports"
)]
pub async fn list_reports(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Query(params): Query<ListReportsQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all")
        .map(str::parse::<ReportStatus>)
        .transpose()
        .map_err(AppError::Validation)?;
    let (page, per_page) = PaginationQuery {
        page: params.page,
        per_page: params.per_page,
    }
    .resolve();

    let service = ReportService::new(store);
    let (reports, total) = service.list_reports(status, page, per_page).await?;
    let items = reports.into_iter().map(ReportResponse::from).collect();

    Ok(ApiResponse::ok(PaginatedResponse::new(
        items, total, page, per_page,
    )))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/reports/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Report", body = ReportResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
    ),
    tag = "reports"
)]
pub async fn get_report(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let report = ReportService::new(store).get_report(&id).await?;
    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/reports/{id}/status",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Report ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ReportResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Transition not allowed", body = AppError),
    ),
    tag = "reports"
)]
pub async fn update_report_status(
    Extension(store): Extension<SharedStore>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let admin_id = require_admin(&store, &auth_user).await?;

    let service = ReportService::new(store);
    let report = service
        .set_status(&id, payload.status, &admin_id, payload.admin_note.as_deref())
        .await?;
    StatsService::invalidate(cache.as_ref().map(|Extension(c)| c)).await;

    Ok(ApiResponse::ok(ReportResponse::from(report)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/reports/{id}/delete-content",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Report ID")),
    responses(
        (status = 200, description = "Content deleted and report resolved", body = ResolutionResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Report not found", body = AppError),
        (status = 409, description = "Report already closed", body = AppError),
    ),
    tag = "reports"
)]
pub async fn delete_reported_content(
    Extension(store): Extension<SharedStore>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&store, &auth_user).await?;

    let service = ReportService::new(store);
    let resolution = service.resolve_by_deleting_content(&id, &admin_id).await?;

    // the report is no longer pending and a deleted run changes the totals
    StatsService::invalidate(cache.as_ref().map(|Extension(c)| c)).await;

    Ok(ApiResponse::ok(ResolutionResponse {
        report: ReportResponse::from(resolution.report),
        content: resolution.content,
    }))
}
