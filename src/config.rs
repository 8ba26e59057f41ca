//! Resolved configuration passed by value into the source adapters.
//!
//! The core never reads the process environment: the CLI layer resolves
//! flags and env vars once at startup into [`McpEndpointConfig`] and hands
//! the struct to the adapter constructor. Adapters treat it as read-only.

use crate::error::SourceError;
use std::time::Duration;

/// Default bound on the structured-endpoint call.
pub const DEFAULT_MCP_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Env var holding the structured endpoint URL (read by the CLI layer only).
pub const MCP_ENDPOINT_URL_ENV: &str = "JAMFLOW_MCP_ENDPOINT_URL";
/// Env var holding the structured endpoint bearer token.
pub const MCP_AUTH_TOKEN_ENV: &str = "JAMFLOW_MCP_AUTH_TOKEN";
/// Env var holding the structured endpoint timeout in milliseconds.
pub const MCP_TIMEOUT_MS_ENV: &str = "JAMFLOW_MCP_TIMEOUT_MS";

/// Connection settings for the structured MCP-style endpoint.
#[derive(Debug, Clone, Default)]
pub struct McpEndpointConfig {
  /// Endpoint URL; the adapter fails with its "not configured" sentinel
  /// when this is absent or blank.
  pub endpoint_url: Option<String>,
  /// Optional bearer token sent with the request.
  pub auth_token: Option<String>,
  /// Request timeout; [`DEFAULT_MCP_TIMEOUT`] when unset.
  pub timeout: Option<Duration>,
}

impl McpEndpointConfig {
  /// Sets the endpoint URL.
  #[must_use]
  pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
    self.endpoint_url = Some(url.into());
    self
  }

  /// Sets the bearer token.
  #[must_use]
  pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
    self.auth_token = Some(token.into());
    self
  }

  /// Sets the request timeout.
  #[must_use]
  pub fn with_timeout(mut self, timeout: Duration) -> Self {
    self.timeout = Some(timeout);
    self
  }

  /// The timeout to apply, falling back to the default.
  pub fn effective_timeout(&self) -> Duration {
    self.timeout.unwrap_or(DEFAULT_MCP_TIMEOUT)
  }

  /// Parses a millisecond timeout from flag or env text. Zero, negative,
  /// and non-integer values are configuration errors.
  pub fn parse_timeout_ms(raw: &str) -> Result<Duration, SourceError> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
      Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
      _ => Err(SourceError::Config(format!(
        "invalid timeout \"{trimmed}\". Expected a positive integer of milliseconds."
      ))),
    }
  }
}
