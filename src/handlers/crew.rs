use crate::error::{AppError, AppResult};
use crate::middleware::auth::{require_admin, AuthUser};
use crate::models::{Crew, CrewMember, CrewStatus};
use crate::response::ApiResponse;
use crate::services::cache::CacheService;
use crate::services::crew::CrewService;
use crate::services::stats::StatsService;
use crate::store::SharedStore;
use axum::{extract::Path, extract::Query, response::IntoResponse, Extension};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListCrewsQuery {
    /// pending or approved; omit for all
    pub status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RejectCrewResponse {
    pub crew_deleted: bool,
    pub members_removed: usize,
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/crews",
    security(("jwt_token" = [])),
    params(ListCrewsQuery),
    responses(
        (status = 200, description = "Crews, newest first", body = Vec<Crew>),
        (status = 400, description = "Unknown status", body = AppError),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "crews"
)]
pub async fn list_crews(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Query(params): Query<ListCrewsQuery>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty() && *s != "all")
        .map(str::parse::<CrewStatus>)
        .transpose()
        .map_err(AppError::Validation)?;

    let crews = CrewService::new(store).list_crews(status).await?;
    Ok(ApiResponse::ok(crews))
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/crews/{id}/members",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Crew ID")),
    responses(
        (status = 200, description = "Crew memberships", body = Vec<CrewMember>),
        (status = 403, description = "Admin only", body = AppError),
    ),
    tag = "crews"
)]
pub async fn list_crew_members(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let members = CrewService::new(store).members(&id).await?;
    Ok(ApiResponse::ok(members))
}

#[utoipa::path(
    put,
    path = "/api/v1/admin/crews/{id}/approve",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Crew ID")),
    responses(
        (status = 200, description = "Crew approved", body = Crew),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Crew not found", body = AppError),
        (status = 409, description = "Crew is not pending", body = AppError),
    ),
    tag = "crews"
)]
pub async fn approve_crew(
    Extension(store): Extension<SharedStore>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let admin_id = require_admin(&store, &auth_user).await?;

    let crew = CrewService::new(store).approve(&id, &admin_id).await?;
    Ok(ApiResponse::ok(crew))
}

#[utoipa::path(
    delete,
    path = "/api/v1/admin/crews/{id}",
    security(("jwt_token" = [])),
    params(("id" = String, Path, description = "Crew ID")),
    responses(
        (status = 200, description = "Crew and memberships removed", body = RejectCrewResponse),
        (status = 403, description = "Admin only", body = AppError),
        (status = 404, description = "Nothing to remove", body = AppError),
        (status = 409, description = "Crew is already approved", body = AppError),
    ),
    tag = "crews"
)]
pub async fn reject_crew(
    Extension(store): Extension<SharedStore>,
    cache: Option<Extension<CacheService>>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    require_admin(&store, &auth_user).await?;

    let rejection = CrewService::new(store).reject(&id).await?;
    StatsService::invalidate(cache.as_ref().map(|Extension(c)| c)).await;
    Ok(ApiResponse::with_message(
        RejectCrewResponse {
            crew_deleted: rejection.crew_deleted,
            members_removed: rejection.members_removed,
        },
        "Crew rejected",
    ))
}
