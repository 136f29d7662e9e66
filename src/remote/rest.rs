//! Blocking client for the renderer's HTTP bridge.
//!
//! Operations are exposed as `GET {base}/{operation}?arg0=..&argN=..` and
//! answer with `{"success": bool, "value": any, "text": string}`. The list of
//! available operations is served by `GET {base}/help`.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::connection::Connector;
use super::{next_session_id, RemoteEndpoint, RemoteError};

/// Operation whose presence proves the bridge is a usable Gaia Sky interface
const CONNECTION_TEST_OPERATION: &str = "setCameraFocus";

pub struct RestEndpoint {
    base_url: String,
    agent: ureq::Agent,
    session_id: u64,
    help_text: OnceCell<String>,
}

impl RestEndpoint {
    /// Create an endpoint without contacting the server
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            agent,
            session_id: next_session_id(),
            help_text: OnceCell::new(),
        }
    }

    /// Create an endpoint and verify the bridge answers like Gaia Sky
    pub fn connect(base_url: &str, timeout: Duration) -> Result<Self, RemoteError> {
        let endpoint = Self::new(base_url, timeout);

        if !endpoint.probe(CONNECTION_TEST_OPERATION)? {
            return Err(RemoteError::Connection(format!(
                "{} does not expose {}",
                endpoint.base_url, CONNECTION_TEST_OPERATION
            )));
        }

        log::info!("🔌 Connected to Gaia Sky bridge at {}", endpoint.base_url);
        Ok(endpoint)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn fetch_help(&self) -> Result<&String, RemoteError> {
        self.help_text.get_or_try_init(|| {
            let url = format!("{}/help", self.base_url);
            log::debug!("📖 Fetching operation list from {}", url);
            let response = self.agent.get(&url).call().map_err(|e| map_ureq_error("help", e))?;
            response
                .into_string()
                .map_err(|e| RemoteError::Connection(e.to_string()))
        })
    }
}

impl RemoteEndpoint for RestEndpoint {
    fn session_id(&self) -> u64 {
        self.session_id
    }

    fn probe(&self, operation: &str) -> Result<bool, RemoteError> {
        let help = self.fetch_help()?;
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(operation))).map_err(|e| {
            RemoteError::InvalidResponse {
                name: operation.to_string(),
                message: e.to_string(),
            }
        })?;
        Ok(pattern.is_match(help))
    }

    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, RemoteError> {
        let url = format!("{}/{}", self.base_url, operation);
        let mut request = self.agent.get(&url);
        for (i, arg) in args.iter().enumerate() {
            request = request.query(&format!("arg{}", i), &query_value(arg));
        }

        let response = request.call().map_err(|e| map_ureq_error(operation, e))?;
        let body = response
            .into_string()
            .map_err(|e| RemoteError::Connection(e.to_string()))?;

        parse_response(operation, &body)
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn map_ureq_error(operation: &str, error: ureq::Error) -> RemoteError {
    match error {
        ureq::Error::Status(code, response) => {
            let body = response.into_string().unwrap_or_default();
            RemoteError::Call {
                name: operation.to_string(),
                message: format!("HTTP {}: {}", code, body.trim()),
            }
        }
        ureq::Error::Transport(transport) => RemoteError::Connection(transport.to_string()),
    }
}

/// Interpret a bridge response body
pub fn parse_response(operation: &str, body: &str) -> Result<Value, RemoteError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(Value::Null);
    }

    let Ok(value) = serde_json::from_str::<Value>(body) else {
        // Plain-text answers are passed through
        return Ok(Value::String(body.to_string()));
    };

    match value {
        Value::Object(mut map) if map.contains_key("success") => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let message = map
                    .get("text")
                    .or_else(|| map.get("error"))
                    .and_then(Value::as_str)
                    .unwrap_or("operation reported failure")
                    .to_string();
                return Err(RemoteError::Call {
                    name: operation.to_string(),
                    message,
                });
            }
            Ok(map.remove("value").unwrap_or(Value::Null))
        }
        other => Ok(other),
    }
}

/// Opens [`RestEndpoint`] connections for the connection manager
pub struct RestConnector {
    base_url: String,
    timeout: Duration,
}

impl RestConnector {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl Connector for RestConnector {
    fn connect(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        let endpoint = RestEndpoint::connect(&self.base_url, self.timeout)?;
        Ok(Arc::new(endpoint))
    }

    fn describe(&self) -> String {
        self.base_url.clone()
    }
}
