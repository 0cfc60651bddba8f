//! Operational alerts raised for every accepted feedback submission.
//!
//! Alerts live only in memory. The queue keeps the [`ALERT_CAPACITY`] most
//! recent alerts, newest first, and evicts the oldest on overflow.

use crate::core::sentiment::{SentimentLabel, SentimentResult};
use crate::core::traits::AlertService;
use crate::infrastructure::entities::{FeedbackCategory, FeedbackRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use di::{inject, injectable};
use log::{debug, info};
use serde::Serialize;
use std::collections::VecDeque;
use strum::Display;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const ALERT_CAPACITY: usize = 50;
pub const MESSAGE_MAX_CHARS: usize = 150;
const ELLIPSIS: &str = "...";
pub const ANONYMOUS_NAME: &str = "Anonymous guest";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AlertPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
    Unread,
    Read,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertKind {
    Feedback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub alert_id: String,
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub priority: AlertPriority,
    pub title: String,
    pub message: String,
    pub feedback_id: String,
    pub guest_id: String,
    pub guest_name: String,
    pub sentiment: SentimentLabel,
    pub rating: u8,
    pub category: FeedbackCategory,
    pub created_at: DateTime<Utc>,
    pub status: AlertStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub read_by: Option<String>,
}

impl Alert {
    pub fn from_feedback(feedback: &FeedbackRecord, sentiment: &SentimentResult) -> Alert {
        let created_at = Utc::now();
        let guest_name = if feedback.anonymous {
            ANONYMOUS_NAME
        } else {
            feedback.guest_name.as_str()
        };

        Alert {
            alert_id: generate_id("ALERT", created_at),
            kind: AlertKind::Feedback,
            priority: priority_for(feedback.rating, sentiment.sentiment),
            title: format!("New Feedback: {}", feedback.subject),
            message: truncate_message(&format!(
                "Guest {guest_name} rated {}/5 stars",
                feedback.rating
            )),
            feedback_id: feedback.feedback_id.clone(),
            guest_id: feedback.guest_id.clone(),
            guest_name: guest_name.to_owned(),
            sentiment: sentiment.sentiment,
            rating: feedback.rating,
            category: feedback.category,
            created_at,
            status: AlertStatus::Unread,
            read_at: None,
            read_by: None,
        }
    }
}

/// First matching rule wins: low rating or negative sentiment is high,
/// a middling rating or neutral sentiment is medium, everything else low.
pub fn priority_for(rating: u8, sentiment: SentimentLabel) -> AlertPriority {
    if rating <= 2 || sentiment == SentimentLabel::Negative {
        AlertPriority::High
    } else if rating == 3 || sentiment == SentimentLabel::Neutral {
        AlertPriority::Medium
    } else {
        AlertPriority::Low
    }
}

pub fn truncate_message(message: &str) -> String {
    match message.char_indices().nth(MESSAGE_MAX_CHARS) {
        Some((cut, _)) => format!("{}{ELLIPSIS}", &message[..cut]),
        None => message.to_owned(),
    }
}

/// Time-ordered, human-legible id: `PREFIX_yyyymmdd_hhmmss_mmm_xxxxxx`.
pub fn generate_id(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{prefix}_{}_{}",
        at.format("%Y%m%d_%H%M%S_%3f"),
        &suffix[..6]
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AlertCounts {
    pub unread: usize,
    pub total: usize,
}

pub struct InMemoryAlertQueue {
    alerts: Mutex<VecDeque<Alert>>,
}

#[injectable(AlertService)]
impl InMemoryAlertQueue {
    #[inject]
    pub fn create() -> InMemoryAlertQueue {
        InMemoryAlertQueue {
            alerts: Mutex::new(VecDeque::with_capacity(ALERT_CAPACITY + 1)),
        }
    }
}

#[async_trait]
impl AlertService for InMemoryAlertQueue {
    async fn create_alert(&self, feedback: &FeedbackRecord, sentiment: &SentimentResult) -> Alert {
        let alert = Alert::from_feedback(feedback, sentiment);

        let mut alerts = self.alerts.lock().await;
        alerts.push_front(alert.clone());
        if alerts.len() > ALERT_CAPACITY {
            if let Some(evicted) = alerts.pop_back() {
                debug!("alert queue full, evicted {}", evicted.alert_id);
            }
        }
        drop(alerts);

        info!(
            "Alert created: {} (priority: {})",
            alert.alert_id, alert.priority
        );
        alert
    }

    async fn mark_read(&self, alert_id: &str, reader: &str) -> Option<bool> {
        let mut alerts = self.alerts.lock().await;
        let alert = alerts.iter_mut().find(|a| a.alert_id == alert_id)?;

        if alert.status == AlertStatus::Read {
            return Some(false);
        }

        alert.status = AlertStatus::Read;
        alert.read_at = Some(Utc::now());
        alert.read_by = Some(reader.to_owned());
        Some(true)
    }

    async fn list_alerts(&self, limit: usize, unread_only: bool) -> Vec<Alert> {
        self.alerts
            .lock()
            .await
            .iter()
            .filter(|a| !unread_only || a.status == AlertStatus::Unread)
            .take(limit)
            .cloned()
            .collect()
    }

    async fn counts(&self) -> AlertCounts {
        let alerts = self.alerts.lock().await;
        AlertCounts {
            unread: alerts
                .iter()
                .filter(|a| a.status == AlertStatus::Unread)
                .count(),
            total: alerts.len(),
        }
    }
}
