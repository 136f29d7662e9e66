use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use super::rest::RestConnector;
use super::{RemoteEndpoint, RemoteError};
use crate::config::RendererConfig;

/// Opens new renderer connections
pub trait Connector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError>;

    /// Human-readable target for log lines
    fn describe(&self) -> String;
}

/// Lazily connects to the renderer and keeps the live endpoint around.
pub struct ConnectionManager {
    connector: Box<dyn Connector>,
    attempts: u32,
    retry_delay: Duration,
    current: Mutex<Option<Arc<dyn RemoteEndpoint>>>,
}

impl ConnectionManager {
    pub fn new(connector: Box<dyn Connector>, attempts: u32, retry_delay: Duration) -> Self {
        Self {
            connector,
            attempts: attempts.max(1),
            retry_delay,
            current: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RendererConfig) -> Self {
        Self::new(
            Box::new(RestConnector::new(config.base_url.clone(), config.timeout)),
            config.connect_attempts,
            config.retry_delay,
        )
    }

    /// Return the live endpoint, connecting first if necessary
    pub fn endpoint(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(endpoint) = current.as_ref() {
            return Ok(Arc::clone(endpoint));
        }

        let endpoint = self.connect_with_retries()?;
        *current = Some(Arc::clone(&endpoint));
        Ok(endpoint)
    }

    fn connect_with_retries(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        let target = self.connector.describe();
        let mut last_error = RemoteError::Connection(format!("could not reach {}", target));

        for attempt in 1..=self.attempts {
            log::info!(
                "🔌 Connecting to Gaia Sky at {} (attempt {}/{})",
                target,
                attempt,
                self.attempts
            );
            match self.connector.connect() {
                Ok(endpoint) => {
                    log::info!("✅ Gaia Sky connection established (session {})", endpoint.session_id());
                    return Ok(endpoint);
                }
                Err(e) => {
                    log::warn!("⚠️ Connection attempt {} failed: {}", attempt, e);
                    last_error = match e {
                        RemoteError::Connection(_) => e,
                        other => RemoteError::Connection(other.to_string()),
                    };
                    if attempt < self.attempts {
                        thread::sleep(self.retry_delay);
                    }
                }
            }
        }

        log::error!("❌ Could not connect to Gaia Sky after {} attempts", self.attempts);
        Err(last_error)
    }

    pub fn is_connected(&self) -> bool {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Drop the live endpoint; the next call reconnects
    pub fn disconnect(&self) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if current.take().is_some() {
            log::info!("🔌 Gaia Sky connection closed");
        }
    }

    pub fn reconnect(&self) -> Result<Arc<dyn RemoteEndpoint>, RemoteError> {
        self.disconnect();
        self.endpoint()
    }
}
