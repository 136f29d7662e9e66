//! Natural-language command parsing through a local language model.

pub mod client;
mod params;
pub mod parser;
pub mod prompts;

use thiserror::Error;

pub use client::{ChatClient, Message};
pub use params::Params;
pub use parser::{extract_json, Command, CommandParser, LlmCommandParser};
pub use prompts::command_parser_prompt;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("HTTP request failed: {0}")]
    Request(String),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Response parsing error: {0}")]
    InvalidResponse(String),
    #[error("No JSON command found in reply: {0}")]
    NoJson(String),
    #[error("Command has no action")]
    MissingAction,
}
