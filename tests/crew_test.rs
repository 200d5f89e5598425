mod common;

use runlog::models;
use serde_json::{json, Value};

async fn seed_crew(app: &common::TestApp, id: &str, status: &str, members: &[&str]) {
    app.seed(
        models::CREWS,
        id,
        json!({
            "name": "Dawn Pacers",
            "leaderId": "leader1",
            "status": status,
            "createdAt": "2026-02-01T06:00:00.000Z",
        }),
    )
    .await;
    for member in members {
        app.seed(
            &models::crew_members(id),
            member,
            json!({ "userId": member, "role": "member" }),
        )
        .await;
    }
}

#[tokio::test]
async fn list_pending_crews() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;
    seed_crew(&app, "c1", "pending", &[]).await;
    seed_crew(&app, "c2", "approved", &[]).await;

    let resp = app
        .client
        .get(app.url("/admin/crews?status=pending"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let crews = body["data"].as_array().unwrap();
    assert_eq!(crews.len(), 1);
    assert_eq!(crews[0]["id"], "c1");
    assert_eq!(crews[0]["leaderId"], "leader1");
}

#[tokio::test]
async fn list_crews_skips_records_with_unknown_status() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;
    seed_crew(&app, "c1", "pending", &[]).await;
    seed_crew(&app, "c2", "active", &[]).await;

    let resp = app
        .client
        .get(app.url("/admin/crews"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    let crews = body["data"].as_array().unwrap();
    assert_eq!(crews.len(), 1);
    assert_eq!(crews[0]["id"], "c1");
}

#[tokio::test]
async fn approve_crew_records_admin() {
    let app = common::spawn_app().await;
    let (admin_id, admin_token) = common::create_admin(&app).await;
    seed_crew(&app, "c1", "pending", &["u1"]).await;

    let resp = app
        .client
        .put(app.url("/admin/crews/c1/approve"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["approvedBy"], admin_id.as_str());
    assert!(body["data"]["approvedAt"].is_string());

    let resp = app
        .client
        .put(app.url("/admin/crews/c1/approve"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);
}

#[tokio::test]
async fn approve_missing_crew_is_not_found() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;

    let resp = app
        .client
        .put(app.url("/admin/crews/ghost/approve"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn reject_crew_cascades_to_members() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;
    seed_crew(&app, "c1", "pending", &["u1", "u2", "u3"]).await;

    let resp = app
        .client
        .get(app.url("/admin/crews/c1/members"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"].as_array().unwrap().len(), 3);

    let resp = app
        .client
        .delete(app.url("/admin/crews/c1"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["data"]["crew_deleted"], true);
    assert_eq!(body["data"]["members_removed"], 3);
    assert!(app.doc(models::CREWS, "c1").await.is_none());
    for member in ["u1", "u2", "u3"] {
        assert!(app.doc(&models::crew_members("c1"), member).await.is_none());
    }

    let resp = app
        .client
        .delete(app.url("/admin/crews/c1"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn reject_approved_crew_is_refused() {
    let app = common::spawn_app().await;
    let (_, admin_token) = common::create_admin(&app).await;
    seed_crew(&app, "c1", "approved", &["u1"]).await;

    let resp = app
        .client
        .delete(app.url("/admin/crews/c1"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 409);
    assert!(app.doc(models::CREWS, "c1").await.is_some());
    assert!(app.doc(&models::crew_members("c1"), "u1").await.is_some());
}

#[tokio::test]
async fn crews_are_admin_only() {
    let app = common::spawn_app().await;
    let (_, token) = common::create_test_user(&app, "runner", "user").await;

    let resp = app
        .client
        .get(app.url("/admin/crews"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 403);
}
