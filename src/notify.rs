//! Anomaly notification fan-out
//!
//! Runs when the streak detector fires: persist the notification row, push
//! it to the owner's realtime channel, and send the email. Every step is
//! best-effort — a failure is logged and never propagated to the ingestion
//! request. The notification row is the source of the pushed/mailed content,
//! so when its insert fails the remaining channels are skipped.

use crate::AppState;
use crate::models::{Cradle, Notification};
use crate::push::PushEvent;

pub const ANOMALY_TITLE: &str = "High Anomaly Detected";

/// Message summarizing which sub-flags were raised on the firing sample.
pub fn anomaly_message(cradle_name: &str, issues: &[&str]) -> String {
    format!(
        "Cradle \"{}\" has reported continuous anomalies ({}).",
        cradle_name,
        issues.join(", ")
    )
}

/// Fan out one fired streak alert. Infallible by contract; all errors are
/// consumed here.
pub async fn dispatch_anomaly_alert(state: &AppState, cradle: &Cradle, issues: &[&'static str]) {
    let message = anomaly_message(&cradle.cradle_name, issues);

    let notification = match Notification::create_anomaly(
        &state.pool,
        cradle.user_id,
        cradle.id,
        ANOMALY_TITLE,
        &message,
    )
    .await
    {
        Ok(n) => n,
        Err(e) => {
            tracing::warn!("Failed to persist anomaly notification for cradle {}: {}", cradle.id, e);
            return;
        }
    };

    tracing::info!(
        "Anomaly notification {} created for cradle {} ({})",
        notification.id,
        cradle.id,
        issues.join(", ")
    );

    let delivered = state.hub.publish(
        cradle.user_id,
        PushEvent {
            notification: notification.clone(),
        },
    );
    tracing::debug!("Pushed notification {} to {} subscriber(s)", notification.id, delivered);

    send_email(state, cradle, message);
}

/// Spawn the email send so ingestion latency never waits on the webhook.
fn send_email(state: &AppState, cradle: &Cradle, message: String) {
    let Some(to) = cradle.alert_email.clone() else {
        tracing::debug!("Cradle {} has no alert email configured", cradle.id);
        return;
    };

    let mailer = state.mailer.clone();
    let cradle_id = cradle.id;
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&to, ANOMALY_TITLE, &message).await {
            tracing::warn!("Failed to send anomaly email for cradle {}: {}", cradle_id, e);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_embeds_cradle_name_and_issues() {
        let msg = anomaly_message("Nursery", &["Temperature", "Noise"]);
        assert_eq!(
            msg,
            "Cradle \"Nursery\" has reported continuous anomalies (Temperature, Noise)."
        );
    }

    #[test]
    fn message_with_general_anomaly() {
        let msg = anomaly_message("Nursery", &["General Anomaly"]);
        assert!(msg.contains("(General Anomaly)"));
    }
}
