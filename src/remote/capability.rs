use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::catalogue;
use super::RemoteEndpoint;

/// Per-connection cache of operation availability
#[derive(Debug, Default)]
struct CapabilityCache {
    session_id: Option<u64>,
    entries: HashMap<&'static str, bool>,
}

/// Answers whether the connected renderer exposes a catalogued operation.
///
/// The first answer for an operation wins for the lifetime of the connection;
/// a new `session_id` on the endpoint drops every cached entry.
#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    cache: Mutex<CapabilityCache>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether `operation` is available on `endpoint`. Never fails:
    /// probe errors are logged and cached as unavailable.
    pub fn has_capability(&self, endpoint: &dyn RemoteEndpoint, operation: &str) -> bool {
        let Some(descriptor) = catalogue::descriptor(operation) else {
            log::warn!("⚠️ '{}' is not a catalogued Gaia Sky operation", operation);
            return false;
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let session_id = endpoint.session_id();
        if cache.session_id != Some(session_id) {
            if cache.session_id.is_some() {
                log::debug!("🔄 New connection {}, clearing capability cache", session_id);
            }
            cache.entries.clear();
            cache.session_id = Some(session_id);
        }

        if let Some(&available) = cache.entries.get(descriptor.name) {
            return available;
        }

        // Probe under the lock so one connection is asked at most once per name
        let available = match endpoint.probe(descriptor.name) {
            Ok(true) => true,
            Ok(false) => {
                log::warn!(
                    "⚠️ Operation '{}' not available on Gaia Sky interface",
                    descriptor.name
                );
                false
            }
            Err(e) => {
                log::warn!("⚠️ Failed to check operation '{}': {}", descriptor.name, e);
                false
            }
        };

        cache.entries.insert(descriptor.name, available);
        available
    }

    /// Forget every cached answer
    pub fn invalidate(&self) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.entries.clear();
        cache.session_id = None;
    }

    /// Number of operations answered for the current connection
    pub fn cached_len(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }
}
