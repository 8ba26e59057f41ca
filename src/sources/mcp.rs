//! Source adapter for the structured MCP-style endpoint.
//!
//! POSTs the file key to a configured endpoint and accepts either a JSON
//! page-list body or a canvas-XML fragment. The whole exchange is bounded
//! by the configured timeout with active cancellation; an unconfigured
//! endpoint fails with the sentinel the auto-mode fallback consumes.

use crate::config::McpEndpointConfig;
use crate::error::SourceError;
use crate::figjam::extract_file_key;
use crate::payload::{canvas_xml, page_doc};
use crate::sources::{DiagramSource, RawDocument, SourceKind, SourceRequest};
use async_trait::async_trait;
use serde_json::json;

/// Fetches a page-list document from a structured endpoint.
pub struct McpEndpointSource {
  config: McpEndpointConfig,
  http: reqwest::Client,
}

impl McpEndpointSource {
  /// Creates an adapter over resolved endpoint settings.
  pub fn new(config: McpEndpointConfig) -> Self {
    Self {
      config,
      http: reqwest::Client::new(),
    }
  }

  async fn exchange(&self, url: &str, file_key: &str, token: Option<&str>) -> Result<String, SourceError> {
    let mut body = json!({ "fileKey": file_key });
    if let Some(token) = token {
      body["figmaToken"] = json!(token);
    }

    let mut request = self.http.post(url).json(&body);
    if let Some(auth) = self.config.auth_token.as_deref() {
      request = request.bearer_auth(auth);
    }

    let response = request
      .send()
      .await
      .map_err(|error| SourceError::Network(error.to_string()))?;

    let status = response.status().as_u16();
    let text = response
      .text()
      .await
      .map_err(|error| SourceError::Network(error.to_string()))?;

    if !(200..300).contains(&status) {
      let trimmed = text.trim();
      let detail = if trimmed.is_empty() {
        "Empty response body".to_string()
      } else {
        trimmed.to_string()
      };
      return Err(SourceError::Endpoint { status, detail });
    }

    Ok(text)
  }
}

#[async_trait]
impl DiagramSource for McpEndpointSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Structured
  }

  async fn ingest(&self, request: &SourceRequest) -> Result<RawDocument, SourceError> {
    let url = self
      .config
      .endpoint_url
      .as_deref()
      .map(str::trim)
      .filter(|url| !url.is_empty())
      .ok_or(SourceError::EndpointNotConfigured)?;

    let file_key = extract_file_key(&request.input)?;
    let timeout = self.config.effective_timeout();

    tracing::debug!(%file_key, endpoint = %url, timeout_ms = timeout.as_millis() as u64,
      "requesting page-list document from the structured endpoint");

    let body = tokio::time::timeout(timeout, self.exchange(url, &file_key, request.token.as_deref()))
      .await
      .map_err(|_| SourceError::Timeout {
        millis: timeout.as_millis() as u64,
      })??;

    let trimmed = body.trim();
    let document = if trimmed.starts_with('<') {
      canvas_xml::transcode(trimmed).map_err(|detail| SourceError::Malformed {
        format: "XML",
        origin: "MCP endpoint".to_string(),
        detail,
      })?
    } else {
      let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|error| SourceError::Malformed {
          format: "JSON",
          origin: "MCP endpoint".to_string(),
          detail: error.to_string(),
        })?;
      page_doc::validate_pages(&value)?
    };

    Ok(RawDocument::Pages { file_key, document })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::payload::FormatHint;

  fn request() -> SourceRequest {
    SourceRequest {
      input: "AbC123xyz".into(),
      token: None,
      format: FormatHint::Auto,
    }
  }

  #[tokio::test]
  async fn missing_endpoint_url_is_the_sentinel() {
    let source = McpEndpointSource::new(McpEndpointConfig::default());
    let error = source.ingest(&request()).await.unwrap_err();
    assert!(matches!(error, SourceError::EndpointNotConfigured));
  }

  #[tokio::test]
  async fn blank_endpoint_url_is_the_sentinel() {
    let source = McpEndpointSource::new(McpEndpointConfig::default().with_endpoint_url("   "));
    let error = source.ingest(&request()).await.unwrap_err();
    assert!(matches!(error, SourceError::EndpointNotConfigured));
  }

  #[tokio::test]
  async fn unreachable_endpoint_is_a_network_error() {
    let config = McpEndpointConfig::default()
      .with_endpoint_url("http://127.0.0.1:1/diagram")
      .with_timeout(std::time::Duration::from_secs(5));
    let source = McpEndpointSource::new(config);
    let error = source.ingest(&request()).await.unwrap_err();
    assert!(matches!(error, SourceError::Network(_)));
  }
}
