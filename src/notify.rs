use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};

const INNGEST_EVENT_URL: &str = "https://inn.gs/e";

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Event {
    pub name: String,
    pub data: Value,
}

impl Event {
    pub fn show_added(movie_title: &str) -> Self {
        Event {
            name: "app/show.added".to_string(),
            data: json!({ "movieTitle": movie_title }),
        }
    }
}

/// Hands events to the background job runner.
#[async_trait]
pub trait EventNotifier: Send + Sync {
    async fn send(&self, event: Event) -> anyhow::Result<()>;
}

/// Posts events to the Inngest event API.
pub struct InngestNotifier {
    http: reqwest::Client,
    url: String,
}

impl InngestNotifier {
    pub fn new(event_key: &str) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .build()?;
        Ok(InngestNotifier {
            http,
            url: format!("{INNGEST_EVENT_URL}/{event_key}"),
        })
    }
}

#[async_trait]
impl EventNotifier for InngestNotifier {
    async fn send(&self, event: Event) -> anyhow::Result<()> {
        self.http
            .post(&self.url)
            .json(&event)
            .send()
            .await?
            .error_for_status()?;
        tracing::debug!(event = %event.name, "event delivered");
        Ok(())
    }
}

/// Used when no event key is configured: the event is only logged.
pub struct LogNotifier;

#[async_trait]
impl EventNotifier for LogNotifier {
    async fn send(&self, event: Event) -> anyhow::Result<()> {
        tracing::info!(event = %event.name, data = %event.data, "event not forwarded, no event key configured");
        Ok(())
    }
}
