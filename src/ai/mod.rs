//! Completion API client and the idea/summary generation pipelines.
//!
//! Request and response bodies follow the OpenAI chat completions format. Each generation is a
//! single round trip: no retries, no streaming.

pub mod prompts;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use crate::config::CompletionConfig;
use crate::db::Store;
use crate::errors::AppError;
use crate::models::TaskFilter;

/// A single message in the conversation sent to the completion API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// `system`, `user` or `assistant`
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

/// What a piece of generated text is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GenerationKind {
    Idea,
    Summary,
}

/// Response body of the generation endpoints: `{ "text": ..., "type": ... }`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Generated {
    pub text: String,
    #[serde(rename = "type")]
    pub kind: GenerationKind,
}

/// Client for the hosted completion API.
#[derive(Debug, Clone)]
pub struct CompletionClient {
    endpoint: String,
    model: String,
    max_tokens: u32,
    client: reqwest::Client,
}

impl CompletionClient {
    pub fn new(config: &CompletionConfig) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &config.api_key {
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", key))
                    .map_err(|e| AppError::Config(format!("Invalid OPENAI_API_KEY: {}", e)))?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            client,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send one system instruction and one user message, return the generated text verbatim.
    pub async fn complete(&self, system: &str, user: &str) -> Result<String, AppError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::new("system", system),
                ChatMessage::new("user", user),
            ],
            max_tokens: self.max_tokens,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::Generation("Completion API timed out".to_string())
                } else {
                    AppError::Generation(format!("Completion API request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Completion API returned {}: {}", status, body);
            return Err(AppError::Generation(format!(
                "Completion API returned {}",
                status
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|e| {
            AppError::Generation(format!("Unreadable completion response: {}", e))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("Completion API returned no text".to_string()))
    }
}

/// Forward a free-text prompt for event ideas. The prompt is not validated.
pub async fn generate_idea(client: &CompletionClient, prompt: &str) -> Result<Generated, AppError> {
    let text = client.complete(prompts::IDEA_SYSTEM_PROMPT, prompt).await?;
    Ok(Generated {
        text,
        kind: GenerationKind::Idea,
    })
}

/// Fetch an event with its tasks and impact, render the summary template and forward it.
///
/// A missing event stops the pipeline before the completion API is contacted.
pub async fn generate_summary<S: Store>(
    store: &S,
    client: &CompletionClient,
    event_id: &str,
) -> Result<Generated, AppError> {
    let event = store
        .get_event(event_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let tasks = store
        .list_tasks(&TaskFilter {
            event_id: Some(event.id.clone()),
            status: None,
        })
        .await?;
    let impact = store.get_event_impact(&event.id).await?;

    let prompt = prompts::render_summary_prompt(&event, &tasks, impact.as_ref());
    tracing::debug!("Requesting summary for event {}", event.id);

    let text = client.complete(prompts::SUMMARY_SYSTEM_PROMPT, &prompt).await?;
    Ok(Generated {
        text,
        kind: GenerationKind::Summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(base_url: &str) -> CompletionConfig {
        CompletionConfig {
            base_url: base_url.to_string(),
            api_key: Some("sk-test".to_string()),
            model: "gpt-4".to_string(),
            max_tokens: 500,
            timeout: Duration::from_millis(200),
        }
    }

    #[test]
    fn test_generated_wire_shape() {
        let body = serde_json::to_value(Generated {
            text: "Plant 500 trees".to_string(),
            kind: GenerationKind::Idea,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"text": "Plant 500 trees", "type": "idea"}));
    }

    #[test]
    fn test_endpoint_join() {
        let client = CompletionClient::new(&config("http://localhost:1234/v1/")).unwrap();
        assert_eq!(client.endpoint, "http://localhost:1234/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_unreachable_api_is_generation_error() {
        let client = CompletionClient::new(&config("http://127.0.0.1:9")).unwrap();
        let err = generate_idea(&client, "anything").await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }
}
