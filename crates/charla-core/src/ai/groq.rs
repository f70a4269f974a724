use std::time::Duration;

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

/// Model the original client shipped with; overridable via config.
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";

const DEFAULT_BASE_URL: &str = "https://api.groq.com";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<WireMessage>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

/// Client for the Groq OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GroqClient {
    pub fn new(api_key: &str) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Send the full ordered conversation and return the reply text.
    ///
    /// Network errors, timeouts, non-success statuses, and payloads with no
    /// choices all come back as errors; the caller turns them into an
    /// error-role message.
    pub async fn complete(&self, model: &str, history: &[Message]) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: wire_messages(history),
        };

        let url = format!("{}/openai/v1/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(anyhow!("Groq API error {}: {}", status, text));
        }

        let reply: ChatResponse = response.json().await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| anyhow!("Groq API returned no choices"))
    }

    pub fn list_models() -> Vec<String> {
        vec![
            "llama3-8b-8192".to_string(),
            "llama-3.1-8b-instant".to_string(),
            "llama-3.3-70b-versatile".to_string(),
            "gemma2-9b-it".to_string(),
        ]
    }
}

/// Map conversation roles onto the wire schema. Error messages travel as
/// assistant turns so a prior failure never breaks the request format.
fn wire_messages(history: &[Message]) -> Vec<WireMessage> {
    history
        .iter()
        .map(|msg| WireMessage {
            role: match msg.role {
                Role::User => "user",
                Role::Assistant | Role::Error => "assistant",
            },
            content: msg.text.clone(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Conversation;

    #[test]
    fn history_maps_roles_and_preserves_order() {
        let mut conv = Conversation::new();
        conv.push(Role::User, "hi");
        conv.push(Role::Assistant, "hello");
        conv.push(Role::Error, "Request failed: boom");
        conv.push(Role::User, "try again");

        let wire = wire_messages(conv.messages());
        let roles: Vec<&str> = wire.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec!["user", "assistant", "assistant", "user"]);
        assert_eq!(wire[3].content, "try again");
    }

    #[test]
    fn request_serializes_to_expected_shape() {
        let request = ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![WireMessage {
                role: "user",
                content: "Hello".to_string(),
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], DEFAULT_MODEL);
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "Hello");
    }

    #[test]
    fn response_with_choices_parses() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"Hi there"}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.choices[0].message.content, "Hi there");
    }
}
