use crate::config::rate_limit::{RateLimitConfig, RateLimitGroup};
use crate::handlers;
use crate::middleware::auth::auth_middleware;
use axum::{middleware, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    Router::new().nest("/api/v1", api_routes(&RateLimitConfig::from_env()))
}

fn api_routes(config: &RateLimitConfig) -> Router {
    let functions = with_rate_limit(function_routes(), config, RateLimitGroup::Functions);
    let protected = with_rate_limit(protected_routes(), config, RateLimitGroup::Protected)
        .layer(middleware::from_fn(auth_middleware));

    functions.merge(protected)
}

/// Unauthenticated callable functions.
fn function_routes() -> Router {
    Router::new().route(
        "/functions/send-verification-code",
        routing::post(handlers::functions::send_verification_code),
    )
}

/// Authenticated routes. Admin checks happen in the handlers.
fn protected_routes() -> Router {
    Router::new()
        // Report intake
        .route("/reports", routing::post(handlers::report::create_report))
        // Statistics
        .route("/admin/stats", routing::get(handlers::admin::get_stats))
        // Moderation
        .route(
            "/admin/reports",
            routing::get(handlers::report::list_reports),
        )
        .route(
            "/admin/reports/{id}",
            routing::get(handlers::report::get_report),
        )
        .route(
            "/admin/reports/{id}/status",
            routing::put(handlers::report::update_report_status),
        )
        .route(
            "/admin/reports/{id}/delete-content",
            routing::post(handlers::report::delete_reported_content),
        )
        // Crews
        .route("/admin/crews", routing::get(handlers::crew::list_crews))
        .route(
            "/admin/crews/{id}",
            routing::delete(handlers::crew::reject_crew),
        )
        .route(
            "/admin/crews/{id}/members",
            routing::get(handlers::crew::list_crew_members),
        )
        .route(
            "/admin/crews/{id}/approve",
            routing::put(handlers::crew::approve_crew),
        )
        // Notices
        .route(
            "/admin/notices",
            routing::get(handlers::notice::list_notices).post(handlers::notice::create_notice),
        )
        .route(
            "/admin/notices/{id}",
            routing::put(handlers::notice::update_notice).delete(handlers::notice::delete_notice),
        )
        // Users
        .route("/admin/users", routing::get(handlers::admin::list_users))
        .route(
            "/admin/users/{id}/role",
            routing::put(handlers::admin::update_user_role),
        )
}

fn with_rate_limit(router: Router, config: &RateLimitConfig, group: RateLimitGroup) -> Router {
    if !config.enabled {
        return router;
    }

    let rule = config.rule(group);
    // per_second/burst_size are validated non-zero when parsed
    let Some(governor_conf) = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
    else {
        tracing::warn!("Invalid rate limit for {:?}, leaving group unlimited", group);
        return router;
    };

    router.layer(GovernorLayer::new(governor_conf))
}
