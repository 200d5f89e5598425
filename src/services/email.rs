use crate::config::email::EmailConfig;
use anyhow::{anyhow, Result};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Minutes a verification code stays valid; stated in the email body.
pub const CODE_VALIDITY_MINUTES: u32 = 10;

const VERIFICATION_SUBJECT: &str = "Your verification code";

#[derive(Clone)]
pub struct EmailService {
    transport: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: Option<String>,
}

impl EmailService {
    /// Build from environment variables. Without SMTP settings the service
    /// still constructs, but every send fails.
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(cfg) => Self::from_config(&cfg),
            None => Self::unconfigured(),
        }
    }

    pub fn from_config(cfg: &EmailConfig) -> Self {
        let creds = Credentials::new(cfg.smtp_username.clone(), cfg.smtp_password.clone());
        match AsyncSmtpTransport::<Tokio1Executor>::relay(&cfg.smtp_host) {
            Ok(builder) => Self {
                transport: Some(builder.port(cfg.smtp_port).credentials(creds).build()),
                from_address: Some(cfg.from_address.clone()),
            },
            Err(e) => {
                tracing::warn!("Failed to build SMTP transport: {e}");
                Self::unconfigured()
            }
        }
    }

    pub fn unconfigured() -> Self {
        Self {
            transport: None,
            from_address: None,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.transport.is_some() && self.from_address.is_some()
    }

    pub async fn send_verification_code(&self, to: &str, code: &str) -> Result<()> {
        let (transport, from_address) = match (&self.transport, &self.from_address) {
            (Some(t), Some(f)) => (t, f),
            _ => return Err(anyhow!("SMTP credentials are not configured")),
        };

        let from_mailbox: Mailbox = from_address
            .parse()
            .map_err(|e| anyhow!("Invalid from address '{}': {}", from_address, e))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| anyhow!("Invalid to address '{}': {}", to, e))?;

        let email = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(VERIFICATION_SUBJECT)
            .header(ContentType::TEXT_HTML)
            .body(verification_html(code))?;

        transport.send(email).await?;
        tracing::info!("Verification code sent to {to}");
        Ok(())
    }
}

pub fn verification_html(code: &str) -> String {
    format!(
        concat!(
            "<div style=\"font-family: sans-serif; max-width: 480px; margin: 0 auto;\">",
            "<h2>Email verification</h2>",
            "<p>Enter the following code to verify your email address:</p>",
            "<p style=\"font-size: 28px; font-weight: bold; letter-spacing: 4px;\">{}</p>",
            "<p>This code is valid for {} minutes.</p>",
            "<p style=\"color: #888;\">If you did not request this, you can ignore this email.</p>",
            "</div>"
        ),
        ammonia::clean_text(code),
        CODE_VALIDITY_MINUTES
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_contains_code_and_validity() {
        let html = verification_html("483920");
        assert!(html.contains("483920"));
        assert!(html.contains("10 minutes"));
    }

    #[test]
    fn html_escapes_the_code() {
        let html = verification_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[tokio::test]
    async fn unconfigured_service_refuses_to_send() {
        let service = EmailService::unconfigured();
        assert!(!service.is_configured());
        let result = service
            .send_verification_code("runner@example.com", "123456")
            .await;
        assert!(result.is_err());
    }
}
