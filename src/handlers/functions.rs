use crate::error::{AppError, AppResult};
use crate::services::email::EmailService;
use axum::{response::IntoResponse, Extension, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SendVerificationCodeRequest {
    #[serde(default)]
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 32))]
    pub code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FunctionResult {
    pub success: bool,
}

#[utoipa::path(
    post,
    path = "/api/v1/functions/send-verification-code",
    request_body = SendVerificationCodeRequest,
    responses(
        (status = 200, description = "Email dispatched", body = FunctionResult),
        (status = 400, description = "Missing email or code", body = AppError),
        (status = 500, description = "Mail transport unavailable", body = AppError),
    ),
    tag = "functions"
)]
pub async fn send_verification_code(
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<SendVerificationCodeRequest>,
) -> AppResult<impl IntoResponse> {
    if payload.email.trim().is_empty() || payload.code.trim().is_empty() {
        return Err(AppError::Validation(
            "email and code are required".to_string(),
        ));
    }
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    email_service
        .send_verification_code(payload.email.trim(), payload.code.trim())
        .await
        .map_err(|e| {
            AppError::Internal(e.context(format!("verification email to {}", payload.email)))
        })?;

    Ok(Json(FunctionResult { success: true }))
}
