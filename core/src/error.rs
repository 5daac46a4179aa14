use thiserror::Error;

/// Raised by an [`AgentState`](crate::AgentState) that cannot decide.
///
/// The server never turns these into a default answer.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The state backing the decision could not be reached.
    #[error("intercept state unavailable: {0}")]
    Unavailable(String),
    #[error("internal error: {0}")]
    Internal(String),
}

/// Invalid policy, header or registry configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid header name `{0}`")]
    InvalidHeaderName(String),
    #[error("expected NAME=VALUE, got `{0}`")]
    MalformedPair(String),
    #[error("unknown role `{0}` (expected `client` or `cluster`)")]
    UnknownRole(String),
    #[error("unknown policy `{0}`")]
    UnknownPolicy(String),
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
}

/// Split `NAME=VALUE` on the first `=`. The name must be non-empty.
pub fn parse_pair(raw: &str) -> Result<(String, String), ConfigError> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(ConfigError::MalformedPair(raw.to_string())),
    }
}

/// Parse a comma separated list of `NAME=VALUE` pairs. Empty input yields
/// an empty list.
pub fn parse_pairs(raw: &str) -> Result<Vec<(String, String)>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_pair)
        .collect()
}
