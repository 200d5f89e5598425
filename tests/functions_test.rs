mod common;

use serde_json::{json, Value};

#[tokio::test]
async fn send_verification_code_requires_email_and_code() {
    let app = common::spawn_app().await;

    for payload in [
        json!({ "email": "", "code": "123456" }),
        json!({ "email": "runner@example.com", "code": "" }),
        json!({ "code": "123456" }),
        json!({ "email": "not-an-address", "code": "123456" }),
    ] {
        let resp = app
            .client
            .post(app.url("/functions/send-verification-code"))
            .json(&payload)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400, "payload {}", payload);
        let body: Value = resp.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn send_verification_code_without_smtp_fails_generically() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/functions/send-verification-code"))
        .json(&json!({ "email": "runner@example.com", "code": "123456" }))
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 500);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "Internal server error");
}

#[tokio::test]
async fn send_verification_code_needs_no_token() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/functions/send-verification-code"))
        .json(&json!({ "email": "runner@example.com", "code": "123456" }))
        .send()
        .await
        .unwrap();

    assert_ne!(resp.status(), 401);
}
