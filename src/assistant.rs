use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::app::Message;

/// Body of the POST to the chatbot endpoint. `history` is the transcript as
/// it existed before the message being sent.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<Message>,
}

#[derive(Deserialize)]
struct ChatResponse {
    response: String,
}

#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    endpoint: String,
}

impl AssistantClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Send one turn to the assistant service and return its reply text.
    /// Connect errors, timeouts, non-2xx statuses, and unparseable bodies
    /// all come back as errors; the caller does not distinguish them.
    pub async fn send(&self, request: &ChatRequest) -> Result<String> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "assistant request failed with status: {}",
                response.status()
            ));
        }

        let reply: ChatResponse = response.json().await?;
        Ok(reply.response)
    }
}
