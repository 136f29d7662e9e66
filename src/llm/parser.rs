use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use super::client::{ChatClient, Message};
use super::{ParseError, Params};

/// A structured navigation command
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub action: String,
    pub entity: String,
    pub parameters: Params,
}

impl Command {
    pub fn new(action: &str, entity: &str) -> Self {
        Self {
            action: action.to_string(),
            entity: entity.to_string(),
            parameters: Params::new(),
        }
    }

    pub fn with_parameters(mut self, parameters: Params) -> Self {
        self.parameters = parameters;
        self
    }

    /// Build from a model-produced object. `entity` and `parameters` are optional.
    pub fn from_value(value: &Value) -> Result<Self, ParseError> {
        let action = value
            .get("action")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .ok_or(ParseError::MissingAction)?;

        let entity = value
            .get("entity")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim();

        let parameters = value
            .get("parameters")
            .and_then(Value::as_object)
            .cloned()
            .map(Params::from_map)
            .unwrap_or_default();

        Ok(Self::new(action, entity).with_parameters(parameters))
    }
}

/// Anything that can turn free text into a [`Command`]
pub trait CommandParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Command, ParseError>;
}

pub struct LlmCommandParser {
    client: ChatClient,
    system_prompt: String,
}

impl LlmCommandParser {
    pub fn new(client: ChatClient, system_prompt: String) -> Self {
        Self {
            client,
            system_prompt,
        }
    }
}

impl CommandParser for LlmCommandParser {
    fn parse(&self, text: &str) -> Result<Command, ParseError> {
        log::info!("🧠 Parsing '{}' with {}", text, self.client.model());

        let messages = [Message::system(&self.system_prompt), Message::user(text)];
        let content = self.client.complete(&messages)?;
        log::debug!("🧠 Model replied: {}", content);

        let value = extract_json(&content).ok_or_else(|| ParseError::NoJson(content.clone()))?;
        let command = Command::from_value(&value)?;

        log::info!(
            "🧠 Parsed command: {} '{}' {:?}",
            command.action,
            command.entity,
            command.parameters
        );
        Ok(command)
    }
}

static CODE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)```(?:json)?\s*(\{[\s\S]*?\})\s*```").expect("valid regex")
});

/// One level of nesting is enough for `parameters`
static OBJECT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{(?:[^{}]|\{[^{}]*\})*\}").expect("valid regex")
});

static BARE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([{,]\s*)([A-Za-z_]\w*)\s*:").expect("valid regex")
});

/// Find the command object in a model reply.
///
/// Tries a fenced code block, then any object carrying an `action` key, then
/// a repaired version of the first object (bare keys quoted, single quotes
/// swapped for double).
pub fn extract_json(content: &str) -> Option<Value> {
    if let Some(block) = CODE_BLOCK.captures(content).and_then(|c| c.get(1)) {
        if let Ok(value) = serde_json::from_str::<Value>(block.as_str()) {
            return Some(value);
        }
    }

    for candidate in OBJECT.find_iter(content) {
        if let Ok(value) = serde_json::from_str::<Value>(candidate.as_str()) {
            if value.get("action").is_some() {
                return Some(value);
            }
        }
    }

    let candidate = OBJECT.find(content)?.as_str().replace('\'', "\"");
    let repaired = BARE_KEY.replace_all(&candidate, "${1}\"${2}\":");
    serde_json::from_str::<Value>(&repaired)
        .ok()
        .filter(|value| value.get("action").is_some())
}
