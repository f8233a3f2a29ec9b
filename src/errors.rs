/// Error types for the dashboard service.
/// The transformation engine itself never fails; these cover payload parsing,
/// configuration and the upstream analytics service.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("analytics API error: {status} {body}")]
    AnalyticsApi { status: u16, body: String },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl EngineError {
    /// HTTP status the service answers with when this error reaches a handler.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::Parse(_) | EngineError::InvalidRequest(_) => 400,
            EngineError::Network(_) | EngineError::AnalyticsApi { .. } | EngineError::Artifact(_) => 502,
            EngineError::Config(_) => 500,
        }
    }
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Parse(e.to_string())
    }
}

impl From<std::io::Error> for EngineError {
    fn from(e: std::io::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
