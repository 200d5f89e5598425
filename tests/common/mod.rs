#![allow(dead_code)]

use reqwest::Client;
use runlog::config::stats::StatsConfig;
use runlog::models::{self, KNOWN_COLLECTIONS};
use runlog::services::cache::CacheService;
use runlog::services::email::EmailService;
use runlog::store::{fields_of, Capabilities, DocumentStore, MemoryStore};
use runlog::{create_app, AppContext};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Once,
};

static INIT: Once = Once::new();
static USER_COUNTER: AtomicUsize = AtomicUsize::new(0);

fn init_env() {
    INIT.call_once(|| {
        std::env::set_var(
            "JWT_SECRET",
            "integration_test_secret_that_is_at_least_32_characters_long",
        );
        std::env::set_var("RATE_LIMIT_ENABLED", "false");
        let config = runlog::config::jwt::JwtConfig::from_env().unwrap();
        let _ = runlog::utils::jwt::init_jwt_config(config);
    });
}

pub struct TestApp {
    pub addr: String,
    pub store: Arc<MemoryStore>,
    pub client: Client,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.addr, path)
    }

    /// Inserts a raw document, bypassing the API.
    pub async fn seed(&self, collection: &str, id: &str, fields: Value) {
        self.store
            .insert(collection, Some(id), fields_of(fields))
            .await
            .expect("Failed to seed document");
    }

    pub async fn doc(&self, collection: &str, id: &str) -> Option<Value> {
        self.store
            .get_by_id(collection, id)
            .await
            .expect("Failed to read document")
            .map(|doc| Value::Object(doc.fields))
    }
}

/// App over a fresh in-memory store with every known collection registered.
pub async fn spawn_app() -> TestApp {
    spawn_app_with_collections(KNOWN_COLLECTIONS).await
}

/// App whose store only has `collections`; the rest read as missing.
pub async fn spawn_app_with_collections(collections: &[&str]) -> TestApp {
    spawn(collections, None, 0).await
}

/// App with an in-process dashboard cache that keeps entries for a minute.
pub async fn spawn_app_with_cache() -> TestApp {
    spawn(KNOWN_COLLECTIONS, Some(CacheService::local()), 60).await
}

async fn spawn(collections: &[&str], cache: Option<CacheService>, cache_ttl_secs: u64) -> TestApp {
    init_env();

    let store = Arc::new(MemoryStore::new());
    let capabilities = Capabilities::register(store.as_ref(), collections).await;

    let app = create_app(AppContext {
        store: store.clone(),
        capabilities,
        email: EmailService::unconfigured(),
        cache,
        stats: StatsConfig { cache_ttl_secs },
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
    });

    TestApp {
        addr: format!("http://{}", addr),
        store,
        client: Client::new(),
    }
}

/// Inserts a user document with `role` and returns (user_id, token).
pub async fn create_test_user(app: &TestApp, prefix: &str, role: &str) -> (String, String) {
    let counter = USER_COUNTER.fetch_add(1, Ordering::SeqCst);
    let user_id = format!("{}_{}", prefix, counter);

    app.seed(
        models::USERS,
        &user_id,
        json!({
            "displayName": prefix,
            "email": format!("{}@test.com", user_id),
            "role": role,
            "createdAt": "2026-01-01T00:00:00.000Z",
        }),
    )
    .await;

    let token = runlog::utils::jwt::encode_access_token(&user_id).expect("Failed to mint token");
    (user_id, token)
}

pub async fn create_admin(app: &TestApp) -> (String, String) {
    create_test_user(app, "admin", "admin").await
}

/// Files a report through the API and returns its id.
pub async fn file_report(app: &TestApp, token: &str, report_type: &str, target_id: &str) -> String {
    let resp = app
        .client
        .post(app.url("/reports"))
        .bearer_auth(token)
        .json(&json!({
            "type": report_type,
            "targetId": target_id,
            "category": "spam",
            "reason": "Looks automated",
        }))
        .send()
        .await
        .expect("Failed to file report");

    let status = resp.status();
    let body: Value = resp.json().await.expect("Failed to parse response");
    if !body["success"].as_bool().unwrap_or(false) {
        panic!("Failed to file report: status={}, body={}", status, body);
    }

    body["data"]["id"]
        .as_str()
        .expect("Response missing report id")
        .to_string()
}
