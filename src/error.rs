use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("script path '{0}' escapes the scripts directory")]
    ScriptPath(String),
}

pub type Result<T> = std::result::Result<T, AgentError>;
