//! Source adapter for the Figma REST file tree.

use crate::error::SourceError;
use crate::figjam::{FigmaClient, extract_file_key};
use crate::payload::tree_doc;
use crate::sources::{DiagramSource, RawDocument, SourceKind, SourceRequest};
use async_trait::async_trait;

/// Fetches a document as a file tree from the Figma REST API.
pub struct FigmaTreeSource {
  client: FigmaClient,
}

impl Default for FigmaTreeSource {
  fn default() -> Self {
    Self::new()
  }
}

impl FigmaTreeSource {
  /// Creates an adapter against the production API.
  pub fn new() -> Self {
    Self {
      client: FigmaClient::new(),
    }
  }

  /// Creates an adapter with a preconfigured client (tests, proxies).
  pub fn with_client(client: FigmaClient) -> Self {
    Self { client }
  }
}

#[async_trait]
impl DiagramSource for FigmaTreeSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Tree
  }

  async fn ingest(&self, request: &SourceRequest) -> Result<RawDocument, SourceError> {
    let file_key = extract_file_key(&request.input)?;
    let token = request.token.as_deref().ok_or_else(|| {
      SourceError::Config("a Figma API token is required for the tree source".to_string())
    })?;

    tracing::debug!(%file_key, "fetching file tree from the Figma API");
    let body = self.client.fetch_file(&file_key, token).await?;
    let file = tree_doc::validate_tree(&body)?;
    Ok(RawDocument::Tree { file_key, file })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::payload::FormatHint;

  #[tokio::test]
  async fn rejects_unusable_input_before_any_request() {
    let source = FigmaTreeSource::with_client(FigmaClient::with_base_url("http://127.0.0.1:1"));
    let request = SourceRequest {
      input: "not a key!".into(),
      token: Some("tok".into()),
      format: FormatHint::Auto,
    };
    let error = source.ingest(&request).await.unwrap_err();
    assert_eq!(error.to_string(), "Invalid Figma file key format.");
  }

  #[tokio::test]
  async fn requires_a_token() {
    let source = FigmaTreeSource::with_client(FigmaClient::with_base_url("http://127.0.0.1:1"));
    let request = SourceRequest {
      input: "AbC123xyz".into(),
      token: None,
      format: FormatHint::Auto,
    };
    let error = source.ingest(&request).await.unwrap_err();
    assert!(matches!(error, SourceError::Config(_)));
  }
}
