//! Delivery of rendered reports to the configured webhook.

use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

use crate::observability::metrics;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("webhook request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("webhook returned HTTP status {0}")]
    Status(reqwest::StatusCode),

    #[error("webhook rejected message: {0}")]
    Rejected(String),
}

/// Transport for a rendered report. The pipeline renders text; sinks decide
/// how it travels.
#[async_trait::async_trait]
pub trait DeliverySink: Send + Sync {
    async fn send(&self, report: &str) -> Result<(), DeliveryError>;
}

/// Feishu group-bot webhook. Accepts a rich-text "post" message and answers
/// with a JSON body whose `code` (or legacy `StatusCode`) is 0 on success.
pub struct FeishuWebhook {
    url: String,
    client: reqwest::Client,
}

impl FeishuWebhook {
    pub fn new(url: impl Into<String>, timeout_seconds: u64) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

/// Wrap a report into Feishu's rich-text message shape. The report's first
/// line becomes the message title; the rest travels as one text block.
fn build_message(report: &str) -> Value {
    let (title, body) = match report.split_once('\n') {
        Some((first, rest)) => (first, rest.trim_start_matches('\n')),
        None => (report, ""),
    };

    json!({
        "msg_type": "post",
        "content": {
            "post": {
                "zh_cn": {
                    "title": title,
                    "content": [
                        [
                            {
                                "tag": "text",
                                "text": body
                            }
                        ]
                    ]
                }
            }
        }
    })
}

#[async_trait::async_trait]
impl DeliverySink for FeishuWebhook {
    #[instrument(skip(self, report))]
    async fn send(&self, report: &str) -> Result<(), DeliveryError> {
        info!("Sending report to Feishu webhook");
        let message = build_message(report);

        let response = match self.client.post(&self.url).json(&message).send().await {
            Ok(response) => response,
            Err(e) => {
                metrics::notify::send_error();
                return Err(e.into());
            }
        };

        let status = response.status();
        if !status.is_success() {
            metrics::notify::send_error();
            return Err(DeliveryError::Status(status));
        }

        let reply: Value = match response.json().await {
            Ok(reply) => reply,
            Err(e) => {
                metrics::notify::send_error();
                return Err(e.into());
            }
        };

        let accepted = reply.get("code").and_then(Value::as_i64) == Some(0)
            || reply.get("StatusCode").and_then(Value::as_i64) == Some(0);
        if accepted {
            metrics::notify::send_success();
            info!("Report delivered");
            Ok(())
        } else {
            metrics::notify::send_error();
            Err(DeliveryError::Rejected(reply.to_string()))
        }
    }
}
