//! Access to the renderer's remote-procedure interface.
//!
//! Operations are identified by name and invoked with positional JSON
//! arguments. Everything above this module talks to the renderer through
//! the [`Renderer`] façade, which checks the [`CapabilityRegistry`] before
//! every call.

pub mod capability;
pub mod catalogue;
pub mod connection;
pub mod facade;
pub mod rest;

use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

pub use capability::CapabilityRegistry;
pub use catalogue::{OperationCategory, RemoteOperationDescriptor};
pub use connection::{ConnectionManager, Connector};
pub use facade::Renderer;
pub use rest::RestEndpoint;

/// Camera and object positions in renderer units
pub type Vector3 = [f64; 3];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("No connection to Gaia Sky: {0}")]
    Connection(String),

    #[error("Operation '{0}' is not available in the current Gaia Sky version")]
    Unsupported(String),

    #[error("Operation '{name}' failed: {message}")]
    Call { name: String, message: String },

    #[error("Invalid response from '{name}': {message}")]
    InvalidResponse { name: String, message: String },
}

/// A live connection to a renderer instance.
///
/// Implementations are blocking. `session_id` must change whenever the
/// underlying connection is re-established so cached capability answers
/// are not carried across connections.
pub trait RemoteEndpoint: Send + Sync {
    /// Identifier of the connection this handle belongs to
    fn session_id(&self) -> u64;

    /// Ask the endpoint whether it exposes `operation`
    fn probe(&self, operation: &str) -> Result<bool, RemoteError>;

    /// Invoke `operation` with positional arguments
    fn invoke(&self, operation: &str, args: &[Value]) -> Result<Value, RemoteError>;
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

/// Allocate a process-unique session identifier for a new connection
pub fn next_session_id() -> u64 {
    NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed)
}
