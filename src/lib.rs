//! The main library for the `astro-remote` space navigation controller.
//!
//! This library provides the components that turn spoken or typed commands
//! into calls against a running Gaia Sky instance: capability-checked remote
//! access, completion detection, audio turn-taking and the sequential voice
//! session.

// Public modules, accessible to the binary and integration tests
pub mod audio;
pub mod completion;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod llm;
pub mod remote;
pub mod services;
pub mod session;

// Re-export common types
pub use error::{AstroError, Result};
