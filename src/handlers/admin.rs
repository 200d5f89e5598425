use crate::config::stats::StatsConfig;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::{user::ROLE_ADMIN, User};
use crate::response::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::services::admin::AdminService;
use crate::services::cache::CacheService;
use crate::services::stats::{Dashboard, StatsService, StatsWindow, DEFAULT_HISTOGRAM_DAYS};
use crate::store::{Capabilities, SharedStore};
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

#[derive(Debug, Deserialize, IntoParams)]
pub struct StatsQuery {
    /// `7`, `30`, `90` or `all` (default `30`)
    pub window: Option<String>,
    /// Days in the daily run histogram, 1..=366 (default 30)
    pub days: Option<u32>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateRoleRequest {
    #[validate(length(min = 1, max = 20))]
    pub role: String,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/stats",
    security(("jwt_token" = [])),
    params(StatsQuery),
    responses(
        (status = 200, description = "Dashboard statistics", body = Dashboard),
        (status = 400, description = "Invalid window or days", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn get_stats(
    Extension(store): Extension<SharedStore>,
    Extension(capabilities): Extension<Capabilities>,
    Extension(stats_config): Extension<StatsConfig>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Query(params): Query<StatsQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let window = match params.window.as_deref() {
        Some(raw) => raw.parse::<StatsWindow>()?,
        None => StatsWindow::default(),
    };
    let days = params.days.unwrap_or(DEFAULT_HISTOGRAM_DAYS);

    let service = StatsService::new(store, capabilities)
        .with_cache(cache.map(|Extension(c)| c), stats_config.cache_ttl_secs);
    let dashboard = service.dashboard(window, days).await?;

    Ok(ApiResponse::ok(dashboard))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/users",
    security(("jwt_token" = [])),
    params(PaginationQuery),
    responses(
        (status = 200, description = "List of users", body = PaginatedResponse<User>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "admin"
)]
pub async fn list_users(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Query(params): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let (page, per_page) = params.resolve();
    let service = AdminService::new(store);
    let (users, total) = service.list_users(page, per_page).await?;

    Ok(ApiResponse::ok(PaginatedResponse::new(
        users, total, page, per_page,
    )))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/users/{id}/role",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "User role updated", body = User),
        (status = 400, description = "Validation error", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "User not found", body = AppError),
    ),
    tag = "admin"
)]
pub async fn update_user_role(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateRoleRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let admin_id = require_admin(&store, &auth_user).await?;
    if admin_id == id && payload.role != ROLE_ADMIN {
        return Err(AppError::Validation(
            "Admins cannot demote themselves".to_string(),
        ));
    }

    let service = AdminService::new(store);
    let user = service.update_user_role(&id, &payload.role).await?;

    Ok(ApiResponse::ok(user))
}
