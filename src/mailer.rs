//! Outbound email via delivery webhook
//!
//! Email is delegated to an external automation webhook; this module only
//! shapes the payload and reports failures to the caller, which logs and
//! moves on.

use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailerError {
    #[error("email webhook not configured")]
    NotConfigured,

    #[error("webhook request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("webhook returned status {0}")]
    Status(reqwest::StatusCode),
}

pub struct Mailer {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl Mailer {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Send one email. Never retried; callers treat failure as best-effort.
    pub async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), MailerError> {
        let url = self.webhook_url.as_deref().ok_or(MailerError::NotConfigured)?;

        let response = self
            .client
            .post(url)
            .json(&payload(to, subject, body))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailerError::Status(status));
        }
        Ok(())
    }
}

/// Webhook payload shape expected by the delivery automation.
fn payload(to: &str, subject: &str, body: &str) -> serde_json::Value {
    json!({
        "mail": to,
        "title": subject,
        "body": body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_shape() {
        let p = payload("parent@example.com", "High Anomaly Detected", "details");
        assert_eq!(p["mail"], "parent@example.com");
        assert_eq!(p["title"], "High Anomaly Detected");
        assert_eq!(p["body"], "details");
    }

    #[tokio::test]
    async fn unconfigured_mailer_fails_without_io() {
        let mailer = Mailer::new(None);
        assert!(!mailer.is_configured());

        let result = mailer.send("parent@example.com", "subject", "body").await;
        assert!(matches!(result, Err(MailerError::NotConfigured)));
    }
}
