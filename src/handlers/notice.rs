use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::Notice;
use crate::response::ApiResponse;
use crate::services::notice::{NoticePatch, NoticeService};
use crate::store::SharedStore;
use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateNoticeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 20000))]
    pub content: String,
    #[serde(default)]
    pub pinned: bool,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateNoticeRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 20000))]
    pub content: Option<String>,
    pub pinned: Option<bool>,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/notices",
    security(("jwt_token" = [])),
    responses(
        (status = 200, description = "Notices, pinned first", body = Vec<Notice>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "notices"
)]
pub async fn list_notices(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let notices = NoticeService::new(store).list_notices().await?;
    Ok(ApiResponse::ok(notices))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/notices",
    security(("jwt_token" = [])),
    request_body = CreateNoticeRequest,
    responses(
        (status = 200, description = "Notice created", body = Notice),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "notices"
)]
pub async fn create_notice(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Json(payload): Json<CreateNoticeRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let admin_id = require_admin(&store, &auth_user).await?;

    let notice = NoticeService::new(store)
        .create_notice(&admin_id, &payload.title, &payload.content, payload.pinned)
        .await?;
    Ok(ApiResponse::ok(notice))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/notices/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Notice ID")),
    request_body = UpdateNoticeRequest,
    responses(
        (status = 200, description = "Notice updated", body = Notice),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Notice not found", body = AppError),
    ),
    tag = "notices"
)]
pub async fn update_notice(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateNoticeRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    require_admin(&store, &auth_user).await?;

    let patch = NoticePatch {
        title: payload.title.as_deref(),
        content: payload.content.as_deref(),
        pinned: payload.pinned,
    };
    let notice = NoticeService::new(store).update_notice(&id, patch).await?;
    Ok(ApiResponse::ok(notice))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/notices/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Notice ID")),
    responses(
        (status = 200, description = "Notice deleted", body = String),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "notices"
)]
pub async fn delete_notice(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    NoticeService::new(store).delete_notice(&id).await?;
    Ok(ApiResponse::ok("Notice deleted"))
}
