//! Source adapter for piped stdin.

use crate::error::SourceError;
use crate::payload::{SniffedPayload, ingest_payload};
use crate::sources::{DiagramSource, RawDocument, SourceKind, SourceRequest};
use async_trait::async_trait;
use std::io::IsTerminal;
use tokio::io::AsyncReadExt;

/// Reads a diagram payload from stdin to EOF. There is deliberately no
/// timeout here: a slow pipe is the caller's business.
#[derive(Debug, Default)]
pub struct StdinSource;

impl StdinSource {
  /// Creates the adapter.
  pub fn new() -> Self {
    Self
  }
}

#[async_trait]
impl DiagramSource for StdinSource {
  fn kind(&self) -> SourceKind {
    SourceKind::Stdin
  }

  async fn ingest(&self, request: &SourceRequest) -> Result<RawDocument, SourceError> {
    if std::io::stdin().is_terminal() {
      return Err(SourceError::InvalidInput(
        "No stdin input detected. Pipe a diagram payload in, or pick another --source."
          .to_string(),
      ));
    }

    let mut raw = String::new();
    tokio::io::stdin()
      .read_to_string(&mut raw)
      .await
      .map_err(|error| SourceError::Read {
        origin: "stdin".to_string(),
        detail: error.to_string(),
      })?;

    match ingest_payload(&raw, "stdin", request.format)? {
      SniffedPayload::Tree(file) => Ok(RawDocument::Tree {
        file_key: "stdin".to_string(),
        file,
      }),
      SniffedPayload::Pages(document) => Ok(RawDocument::Pages {
        file_key: "stdin".to_string(),
        document,
      }),
    }
  }
}
