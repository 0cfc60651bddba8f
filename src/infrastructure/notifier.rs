//! Outbound webhook for high-priority alerts

use crate::core::alerts::{Alert, AlertPriority};
use crate::core::sentiment::SentimentLabel;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::entities::FeedbackCategory;
use crate::infrastructure::traits::AlertNotifier;
use chrono::{DateTime, Utc};
use di::{Ref, inject, injectable};
use log::{debug, error, info, warn};
use serde::Serialize;
use std::time::Duration;
use tokio::runtime::Handle;

const WEBHOOK_TIMEOUT: Duration = Duration::from_secs(5);

/// Body posted to the webhook. Carries no comment text.
#[derive(Debug, Clone, Serialize)]
pub struct AlertSummary {
    pub alert_id: String,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub feedback_id: String,
    pub guest_id: String,
    pub rating: u8,
    pub sentiment: SentimentLabel,
    pub category: FeedbackCategory,
    pub created_at: DateTime<Utc>,
}

impl From<&Alert> for AlertSummary {
    fn from(alert: &Alert) -> Self {
        AlertSummary {
            alert_id: alert.alert_id.clone(),
            priority: alert.priority,
            title: alert.title.clone(),
            message: alert.message.clone(),
            feedback_id: alert.feedback_id.clone(),
            guest_id: alert.guest_id.clone(),
            rating: alert.rating,
            sentiment: alert.sentiment,
            category: alert.category,
            created_at: alert.created_at,
        }
    }
}

pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
}

#[injectable(AlertNotifier)]
impl WebhookNotifier {
    #[inject]
    pub fn create(config: Ref<AppConfig>) -> WebhookNotifier {
        let client = reqwest::Client::builder()
            .timeout(WEBHOOK_TIMEOUT)
            .build()
            .unwrap_or_else(|e| {
                warn!("webhook client falls back to defaults: {e}");
                reqwest::Client::default()
            });

        if let Some(url) = &config.alert_webhook_url {
            info!("high-priority alerts will be posted to {url}");
        }

        WebhookNotifier {
            client,
            url: config.alert_webhook_url.clone(),
        }
    }
}

impl AlertNotifier for WebhookNotifier {
    fn notify(&self, alert: &Alert) {
        if alert.priority != AlertPriority::High {
            return;
        }
        let Some(url) = self.url.clone() else {
            debug!("no webhook configured, alert {} stays local", alert.alert_id);
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!("no runtime to deliver alert {}", alert.alert_id);
            return;
        };

        let client = self.client.clone();
        let summary = AlertSummary::from(alert);
        handle.spawn(async move {
            let result = client
                .post(&url)
                .json(&summary)
                .send()
                .await
                .and_then(|response| response.error_for_status());

            match result {
                Ok(_) => debug!("alert {} delivered to webhook", summary.alert_id),
                Err(e) => error!("alert {} webhook delivery failed: {e}", summary.alert_id),
            }
        });
    }
}
