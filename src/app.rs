use crate::config::stats::StatsConfig;
use crate::middleware::security::security_headers_middleware;
use crate::routes;
use crate::services::cache::CacheService;
use crate::services::email::EmailService;
use crate::store::{Capabilities, SharedStore};
use axum::{extract::Extension, middleware, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;
use std::env;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        // Functions
        crate::handlers::functions::send_verification_code,
        // Reports
        crate::handlers::report::create_report,
        crate::handlers::report::list_reports,
        crate::handlers::report::get_report,
        crate::handlers::report::update_report_status,
        crate::handlers::report::delete_reported_content,
        // Crews
        crate::handlers::crew::list_crews,
        crate::handlers::crew::list_crew_members,
        crate::handlers::crew::approve_crew,
        crate::handlers::crew::reject_crew,
        // Notices
        crate::handlers::notice::list_notices,
        crate::handlers::notice::create_notice,
        crate::handlers::notice::update_notice,
        crate::handlers::notice::delete_notice,
        // Admin
        crate::handlers::admin::get_stats,
        crate::handlers::admin::list_users,
        crate::handlers::admin::update_user_role,
    ),
    components(
        schemas(
            crate::response::PaginationQuery,
            crate::error::AppError,
            crate::models::Report,
            crate::models::ReportStatus,
            crate::models::Crew,
            crate::models::CrewMember,
            crate::models::CrewStatus,
            crate::models::Notice,
            crate::models::User,
            crate::services::report::ContentRemoval,
            crate::services::stats::Dashboard,
            crate::services::stats::Summary,
            crate::services::stats::RaceCount,
            crate::services::stats::DailyBucket,
            crate::services::stats::StatsWindow,
            crate::handlers::functions::SendVerificationCodeRequest,
            crate::handlers::functions::FunctionResult,
            crate::handlers::report::CreateReportRequest,
            crate::handlers::report::UpdateStatusRequest,
            crate::handlers::report::ReportResponse,
            crate::handlers::report::ResolutionResponse,
            crate::handlers::crew::RejectCrewResponse,
            crate::handlers::notice::CreateNoticeRequest,
            crate::handlers::notice::UpdateNoticeRequest,
            crate::handlers::admin::UpdateRoleRequest,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "functions", description = "Callable functions"),
        (name = "reports", description = "Report intake and moderation"),
        (name = "crews", description = "Crew approval"),
        (name = "notices", description = "Notice board management"),
        (name = "admin", description = "Statistics and user administration"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt_token",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Everything handlers pull out of request extensions.
#[derive(Clone)]
pub struct AppContext {
    pub store: SharedStore,
    pub capabilities: Capabilities,
    pub email: EmailService,
    pub cache: Option<CacheService>,
    pub stats: StatsConfig,
}

pub fn create_app(ctx: AppContext) -> Router {
    let mut app = Router::new()
        .route("/", get(health_check))
        .merge(routes::create_routes())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(build_cors_layer())
        .layer(Extension(ctx.store))
        .layer(Extension(ctx.capabilities))
        .layer(Extension(ctx.email))
        .layer(Extension(ctx.stats));

    if let Some(cache) = ctx.cache {
        app = app.layer(Extension(cache));
    }
    app
}

fn build_cors_layer() -> CorsLayer {
    use axum::http::{header, HeaderValue, Method};

    let origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins_str == "*" {
        cors.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = origins_str
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service health and collection availability", body = serde_json::Value)
    )
)]
async fn health_check(
    Extension(store): Extension<SharedStore>,
    Extension(capabilities): Extension<Capabilities>,
    cache: Option<Extension<CacheService>>,
) -> impl IntoResponse {
    let store_ok = store.collections().await.is_ok();
    let status = if store_ok && capabilities.missing().is_empty() {
        "ok"
    } else {
        "degraded"
    };

    Json(json!({
        "status": status,
        "service": "runlog admin API",
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_ok,
        "cache": cache.is_some(),
        "collections": capabilities.as_map(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::KNOWN_COLLECTIONS;
    use crate::store::MemoryStore;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn app(collections: &[&str]) -> Router {
        let store = Arc::new(MemoryStore::new());
        let capabilities = Capabilities::register(store.as_ref(), collections).await;
        create_app(AppContext {
            store,
            capabilities,
            email: EmailService::unconfigured(),
            cache: None,
            stats: StatsConfig { cache_ttl_secs: 0 },
        })
    }

    #[tokio::test]
    async fn health_reports_registered_collections() {
        let response = app(KNOWN_COLLECTIONS)
            .await
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("content-security-policy"));
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["cache"], false);
        assert_eq!(json["collections"]["reports"], true);
    }

    #[tokio::test]
    async fn admin_routes_require_a_token() {
        let response = app(KNOWN_COLLECTIONS)
            .await
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
