//! Error taxonomy for ingestion and output, plus the fallback classifier.
//!
//! Ingestion failures all live in [`SourceError`] so the orchestrator can
//! classify them with a single pure function, [`is_fallback_eligible`].
//! Rasterizer and file-writing failures live in [`OutputError`] so they stay
//! distinguishable from ingestion errors at the CLI boundary.

use thiserror::Error;

/// Which wire shape a payload was being validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadShape {
  /// The recursive tree-document shape.
  Tree,
  /// The flat page-list shape.
  Pages,
}

impl std::fmt::Display for PayloadShape {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      PayloadShape::Tree => write!(f, "tree"),
      PayloadShape::Pages => write!(f, "page-list"),
    }
  }
}

/// Error raised while ingesting a diagram from any source.
#[derive(Debug, Error)]
pub enum SourceError {
  /// The caller-provided input (URL, key, path, or piped text) is unusable.
  #[error("{0}")]
  InvalidInput(String),

  /// Required external configuration is missing or malformed.
  #[error("invalid configuration: {0}")]
  Config(String),

  /// The structured endpoint URL was never configured. Sentinel consumed by
  /// the auto-mode fallback.
  #[error("MCP endpoint is not configured. Set JAMFLOW_MCP_ENDPOINT_URL or pass --mcp-endpoint.")]
  EndpointNotConfigured,

  /// Non-success response from the Figma REST API. For rate-limit responses
  /// the detail carries any present rate-limit headers.
  #[error("Figma API request failed ({status}): {detail}")]
  Api {
    /// HTTP status code of the response.
    status: u16,
    /// Response body, plus rate-limit headers for 429s.
    detail: String,
  },

  /// Non-success response from the structured endpoint.
  #[error("MCP endpoint request failed ({status}): {detail}")]
  Endpoint {
    /// HTTP status code of the response.
    status: u16,
    /// Trimmed response body, or a placeholder when empty.
    detail: String,
  },

  /// The request never reached the remote side (DNS or connect failure).
  #[error("network error: {0}")]
  Network(String),

  /// The structured endpoint call exceeded its configured timeout and was
  /// cancelled.
  #[error("MCP endpoint request timed out after {millis}ms. Raise JAMFLOW_MCP_TIMEOUT_MS if needed.")]
  Timeout {
    /// The timeout that was exceeded, in milliseconds.
    millis: u64,
  },

  /// Structural payload violation, qualified with the offending path.
  #[error("invalid {shape} payload at {path}: {message}")]
  Payload {
    /// Which wire shape was being validated.
    shape: PayloadShape,
    /// Dotted/indexed path to the offending value.
    path: String,
    /// What was expected there.
    message: String,
  },

  /// Unparseable JSON or XML body.
  #[error("invalid {format} from {origin}: {detail}")]
  Malformed {
    /// `"JSON"` or `"XML"`.
    format: &'static str,
    /// Where the body came from (endpoint, file path, stdin).
    origin: String,
    /// Parser failure detail.
    detail: String,
  },

  /// Reading a local file or stdin failed.
  #[error("failed to read {origin}: {detail}")]
  Read {
    /// What was being read.
    origin: String,
    /// Underlying I/O failure.
    detail: String,
  },

  /// Every candidate source was exhausted without observing an error.
  #[error("no source is available for ingestion")]
  NoSourceAvailable,
}

impl SourceError {
  /// Builds a path-qualified validation error.
  pub fn payload(shape: PayloadShape, path: impl Into<String>, message: impl Into<String>) -> Self {
    SourceError::Payload {
      shape,
      path: path.into(),
      message: message.into(),
    }
  }
}

/// True when an auto-mode failure of the structured source may fall back to
/// the next candidate.
///
/// Eligible errors are exactly: the "endpoint not configured" sentinel,
/// network-connectivity failures, the structured source's own timeout, and
/// 5xx responses from the structured endpoint. Everything else (4xx
/// application errors, malformed payloads, validation failures) is final.
pub fn is_fallback_eligible(error: &SourceError) -> bool {
  match error {
    SourceError::EndpointNotConfigured | SourceError::Network(_) | SourceError::Timeout { .. } => {
      true
    }
    SourceError::Endpoint { status, .. } => (500..=599).contains(status),
    _ => false,
  }
}

/// Error raised while writing output or invoking the external rasterizer.
#[derive(Debug, Error)]
pub enum OutputError {
  /// The `mmdc` binary is not installed.
  #[error("mmdc (mermaid-cli) not found. Install it with: npm i -g @mermaid-js/mermaid-cli")]
  RasterizerMissing,

  /// The `mmdc` invocation failed.
  #[error("{format} rendering failed: {detail}")]
  RasterizerFailed {
    /// `"PNG"` or `"SVG"`.
    format: &'static str,
    /// Stderr or spawn failure detail.
    detail: String,
  },

  /// Writing an output or temp file failed.
  #[error("io: {0}")]
  Io(#[from] std::io::Error),
}
