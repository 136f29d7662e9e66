use thiserror::Error;

use crate::config::ConfigError;
use crate::llm::ParseError;
use crate::remote::RemoteError;
use crate::services::SpeechError;

#[derive(Error, Debug)]
pub enum AstroError {
    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AstroError>;

impl From<anyhow::Error> for AstroError {
    fn from(err: anyhow::Error) -> Self {
        AstroError::General(err.to_string())
    }
}

impl From<std::io::Error> for AstroError {
    fn from(err: std::io::Error) -> Self {
        AstroError::General(err.to_string())
    }
}
