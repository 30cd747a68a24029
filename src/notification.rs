//! Outcome notifications
//!
//! Each [`ExtractionOutcome`] is rendered as a small markdown table and POSTed to the
//! product line's webhook as a DingTalk-style robot message:
//!
//! ```json
//! {"msgtype": "markdown", "markdown": {"title": "Extraction notice", "text": "..."}}
//! ```
//!
//! Delivery is best effort: failures are logged by the caller and never retried.

use crate::error::NotificationError;
use crate::types::ExtractionOutcome;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

/// Title used for the message and the table heading
pub const NOTICE_TITLE: &str = "Extraction notice";

/// Receives outcomes and delivers them somewhere
///
/// # Examples
///
/// ```no_run
/// use auto_unpack::notification::{NotificationSink, WebhookNotifier};
/// use std::time::Duration;
///
/// # async fn example(outcome: auto_unpack::types::ExtractionOutcome) {
/// let sink = WebhookNotifier::new(Duration::from_secs(10));
/// if let Err(e) = sink.deliver(&outcome, "https://example.com/hook").await {
///     eprintln!("notification failed: {e}");
/// }
/// # }
/// ```
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one outcome to the given destination
    ///
    /// # Errors
    ///
    /// Returns an error if the destination cannot be reached or rejects the message.
    async fn deliver(
        &self,
        outcome: &ExtractionOutcome,
        target: &str,
    ) -> Result<(), NotificationError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Markdown robot message envelope
#[derive(Debug, Serialize)]
pub struct MarkdownMessage {
    /// Always "markdown"
    pub msgtype: &'static str,
    /// Message content
    pub markdown: MarkdownContent,
}

/// Markdown message body
#[derive(Debug, Serialize)]
pub struct MarkdownContent {
    /// Message title
    pub title: String,
    /// Markdown text
    pub text: String,
}

impl MarkdownMessage {
    /// Build the message for an outcome
    pub fn for_outcome(outcome: &ExtractionOutcome) -> Self {
        Self {
            msgtype: "markdown",
            markdown: MarkdownContent {
                title: NOTICE_TITLE.to_string(),
                text: render_table(outcome),
            },
        }
    }
}

/// Render an outcome as a one-row markdown table
pub fn render_table(outcome: &ExtractionOutcome) -> String {
    let status = outcome.status.to_string();
    let row = [
        outcome.product_line.as_str(),
        outcome.file_name.as_str(),
        outcome.mode.description(),
        status.as_str(),
    ]
    .map(escape_cell)
    .join(" | ");

    format!(
        "# {}\n\n| **Product Line** | **File Name** | **Mode** | **Status** |\n| --- | --- | --- | --- |\n| {} |\n",
        NOTICE_TITLE, row
    )
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}

/// Posts outcomes to a webhook URL
pub struct WebhookNotifier {
    client: reqwest::Client,
    timeout: Duration,
}

impl WebhookNotifier {
    /// Create a notifier with the given per-request timeout
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

#[async_trait]
impl NotificationSink for WebhookNotifier {
    async fn deliver(
        &self,
        outcome: &ExtractionOutcome,
        target: &str,
    ) -> Result<(), NotificationError> {
        let message = MarkdownMessage::for_outcome(outcome);
        let request = self
            .client
            .post(target)
            .json(&message)
            .timeout(self.timeout)
            .send();

        let response = tokio::time::timeout(self.timeout, request)
            .await
            .map_err(|_| NotificationError::Timeout(self.timeout))??;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(
            url = %target,
            status = status.as_u16(),
            response = %body,
            "notification sent"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
