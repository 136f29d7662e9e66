use secrecy::{ExposeSecret, SecretBox};
use serde_json::{json, Value};

use super::ParseError;
use crate::config::LlmConfig;

#[derive(Debug, Clone)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Blocking client for an OpenAI-compatible chat endpoint (LM Studio)
pub struct ChatClient {
    agent: ureq::Agent,
    base_url: String,
    model: String,
    api_key: Option<SecretBox<String>>,
    temperature: f32,
    max_tokens: u32,
}

impl ChatClient {
    pub fn new(config: &LlmConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();

        Self {
            agent,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key: config
                .api_key()
                .map(|key| SecretBox::new(Box::new(key.to_string()))),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send the conversation and return the first choice's text
    pub fn complete(&self, messages: &[Message]) -> Result<String, ParseError> {
        let url = format!("{}/chat/completions", self.base_url);

        let messages_json: Vec<Value> = messages
            .iter()
            .map(|msg| {
                json!({
                    "role": msg.role,
                    "content": msg.content
                })
            })
            .collect();

        let payload = json!({
            "model": self.model,
            "messages": messages_json,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "stream": false
        });

        let mut request = self
            .agent
            .post(&url)
            .set("Content-Type", "application/json");
        if let Some(key) = &self.api_key {
            request = request.set("Authorization", &format!("Bearer {}", key.expose_secret()));
        }

        let response = match request.send_json(payload) {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "Unknown error".to_string());
                return Err(ParseError::Api { status, message });
            }
            Err(ureq::Error::Transport(transport)) => {
                return Err(ParseError::Request(transport.to_string()))
            }
        };

        let body: Value = response
            .into_json()
            .map_err(|e| ParseError::InvalidResponse(e.to_string()))?;
        parse_completion(&body)
    }
}

/// Pull `choices[0].message.content` out of a completion response
pub fn parse_completion(body: &Value) -> Result<String, ParseError> {
    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ParseError::InvalidResponse(format!("no message content in {}", body)))
}
