//! Source adapter for local files.

use crate::error::SourceError;
use crate::payload::{SniffedPayload, ingest_payload};
use crate::sources::{DiagramSource, RawDocument, SourceKind, SourceRequest};
use async_trait::async_trait;
use std::path::Path;

/// Reads a diagram payload from a local file path.
#[derive(Debug, Default)]
pub struct FileSource;

impl FileSource {
  /// Creates the adapter.
  pub fn new() -> Self {
    Self
  }
}

/// Synthetic file key for local input: the file stem when usable, else a
/// fixed marker.
fn infer_file_key(path: &Path) -> String {
  path
    .file_stem()
    .and_then(|stem| stem.to_str())
    .map(str::trim)
    .filter(|stem| !stem.is_empty())
    .map(str::to_string)
    .unwrap_or_else(|| "file-input".to_string())
}

#[async_trait]
impl DiagramSource for FileSource {
  fn kind(&self) -> SourceKind {
    SourceKind::File
  }

  async fn ingest(&self, request: &SourceRequest) -> Result<RawDocument, SourceError> {
    let path_text = request.input.trim();
    if path_text.is_empty() {
      return Err(SourceError::InvalidInput(
        "Missing input file path. Provide <input> when using --source file.".to_string(),
      ));
    }

    let path = Path::new(path_text);
    let origin = format!("file \"{path_text}\"");
    let raw = tokio::fs::read_to_string(path)
      .await
      .map_err(|error| SourceError::Read {
        origin: origin.clone(),
        detail: error.to_string(),
      })?;

    let file_key = infer_file_key(path);
    match ingest_payload(&raw, &origin, request.format)? {
      SniffedPayload::Tree(file) => Ok(RawDocument::Tree { file_key, file }),
      SniffedPayload::Pages(document) => Ok(RawDocument::Pages { file_key, document }),
    }
  }
}
