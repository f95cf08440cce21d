use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;

pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(client: Client, base_url: String) -> Self {
        Self { client, base_url }
    }

    pub async fn broadcast(&self, user_id: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/relay/broadcast?userId={}", self.base_url, user_id);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .context("Failed to broadcast event")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            anyhow::bail!("Broadcast failed: {} - Response: {}", status, body);
        }

        response.json().await.context("Failed to parse response")
    }

    pub async fn recent_events(&self, user_id: &str, since: Option<i64>) -> Result<Vec<Value>> {
        let mut url = format!("{}/relay/recent?userId={}", self.base_url, user_id);
        if let Some(since) = since {
            url.push_str(&format!("&since={}", since));
        }

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("Failed to fetch recent events")?;

        if !response.status().is_success() {
            anyhow::bail!("Recent events request failed: {}", response.status());
        }

        let body: Value = response.json().await.context("Failed to parse response")?;

        body["events"]
            .as_array()
            .context("No events array in response")
            .cloned()
    }
}
