use reqwest::Client;
use serde::{Deserialize, Serialize};
use anyhow::{Result, anyhow};

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "You are a helpful assistant.";

pub const DEFAULT_ENDPOINT: &str = "http://localhost:8000";
pub const DEFAULT_MODEL: &str = "mistralai/Mixtral-8x7B-Instruct-v0.1";

#[derive(Serialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Clone)]
pub struct CompletionClient {
    client: Client,
    base_url: String,
    model: String,
    system_prompt: String,
}

impl CompletionClient {
    pub fn new(base_url: &str, model: &str, system_prompt: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            system_prompt: system_prompt.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.base_url
    }

    /// Send one user message and return the assistant's reply.
    ///
    /// The request always carries exactly two messages: the system
    /// instruction and `user_message`. Prior turns are never resent.
    pub async fn complete(&self, user_message: &str) -> Result<String> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let request = self.build_request(user_message);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("completion endpoint error {}: {}", status, text));
        }

        let body = response.text().await?;
        parse_reply(&body)
    }

    fn build_request(&self, user_message: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                WireMessage {
                    role: "system".to_string(),
                    content: self.system_prompt.clone(),
                },
                WireMessage {
                    role: "user".to_string(),
                    content: user_message.to_string(),
                },
            ],
        }
    }
}

/// Extract `choices[0].message.content` from a response body.
fn parse_reply(body: &str) -> Result<String> {
    let response: CompletionResponse =
        serde_json::from_str(body).map_err(|e| anyhow!("malformed completion response: {}", e))?;

    response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message.content)
        .ok_or_else(|| anyhow!("completion response contained no choices"))
}
