use thiserror::Error;

use crate::prompt::CONNECTION_ERROR;

/// Failure of a call to the model API.
///
/// Network, authentication, quota and malformed-request failures all land in
/// the same variant. The detail is kept for logging only; the display text is
/// the fixed message shown to the student.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{}", CONNECTION_ERROR)]
    Connection { detail: String },
}

impl GatewayError {
    pub(crate) fn connection(detail: impl Into<String>) -> Self {
        Self::Connection {
            detail: detail.into(),
        }
    }

    /// Underlying cause, for logs.
    pub fn detail(&self) -> &str {
        match self {
            Self::Connection { detail } => detail,
        }
    }
}

/// Result type for gateway operations
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Math typesetting errors. Never leave the renderer.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Typesetting Error: {0}")]
    Typesetting(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Could not determine home directory")]
    NoHomeDir,

    #[error("API key is required (set GEMINI_API_KEY or api_key in the config file)")]
    MissingApiKey,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_error_hides_detail() {
        let err = GatewayError::connection("HTTP 403: API key not valid");

        assert_eq!(err.to_string(), CONNECTION_ERROR);
        assert_eq!(err.detail(), "HTTP 403: API key not valid");
    }
}
