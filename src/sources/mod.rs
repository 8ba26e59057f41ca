//! Pluggable diagram sources unified behind one ingest contract.
//!
//! Each adapter turns caller input into a [`RawDocument`] or a
//! [`SourceError`]; the orchestrator in [`crate::pipeline`] tries them in
//! mode order and applies the auto-mode fallback rule.

pub mod file;
pub mod mcp;
pub mod rest;
pub mod stdin;

pub use file::FileSource;
pub use mcp::McpEndpointSource;
pub use rest::FigmaTreeSource;
pub use stdin::StdinSource;

use crate::config::McpEndpointConfig;
use crate::error::SourceError;
use crate::figjam::TreeFile;
use crate::payload::{FormatHint, PagePayload};
use async_trait::async_trait;

/// Identity of a concrete adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
  /// Figma REST file tree.
  Tree,
  /// Structured MCP-style endpoint.
  Structured,
  /// Local file.
  File,
  /// Piped stdin.
  Stdin,
}

impl std::fmt::Display for SourceKind {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceKind::Tree => write!(f, "tree"),
      SourceKind::Structured => write!(f, "structured"),
      SourceKind::File => write!(f, "file"),
      SourceKind::Stdin => write!(f, "stdin"),
    }
  }
}

/// Caller-requested ingestion mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
  /// Figma REST file tree only.
  #[default]
  Tree,
  /// Structured endpoint only.
  Structured,
  /// Local file only.
  File,
  /// Stdin only.
  Stdin,
  /// Structured endpoint first, tree on eligible failures.
  Auto,
}

impl std::fmt::Display for SourceMode {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SourceMode::Tree => write!(f, "tree"),
      SourceMode::Structured => write!(f, "structured"),
      SourceMode::File => write!(f, "file"),
      SourceMode::Stdin => write!(f, "stdin"),
      SourceMode::Auto => write!(f, "auto"),
    }
  }
}

impl std::str::FromStr for SourceMode {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "tree" => Ok(SourceMode::Tree),
      "structured" => Ok(SourceMode::Structured),
      "file" => Ok(SourceMode::File),
      "stdin" => Ok(SourceMode::Stdin),
      "auto" => Ok(SourceMode::Auto),
      other => Err(format!(
        "unknown source \"{other}\". Source must be one of: tree, structured, file, stdin, auto."
      )),
    }
  }
}

/// Fixed attempt order for a mode.
pub fn mode_order(mode: SourceMode) -> &'static [SourceKind] {
  match mode {
    SourceMode::Tree => &[SourceKind::Tree],
    SourceMode::Structured => &[SourceKind::Structured],
    SourceMode::File => &[SourceKind::File],
    SourceMode::Stdin => &[SourceKind::Stdin],
    SourceMode::Auto => &[SourceKind::Structured, SourceKind::Tree],
  }
}

/// A successfully ingested, validated raw document, tagged with its wire
/// shape so downstream matching is exhaustive.
#[derive(Debug, Clone, PartialEq)]
pub enum RawDocument {
  /// A tree document, still to be walked.
  Tree {
    /// File key the ingestion resolved.
    file_key: String,
    /// The validated tree.
    file: TreeFile,
  },
  /// A page-list document already in canonical record shapes.
  Pages {
    /// File key the ingestion resolved.
    file_key: String,
    /// The validated page list.
    document: PagePayload,
  },
}

impl RawDocument {
  /// The file key this document was ingested under.
  pub fn file_key(&self) -> &str {
    match self {
      RawDocument::Tree { file_key, .. } | RawDocument::Pages { file_key, .. } => file_key,
    }
  }
}

/// Caller input handed unchanged to every attempted adapter.
#[derive(Debug, Clone, Default)]
pub struct SourceRequest {
  /// FigJam URL, file key, or local path, depending on the adapter.
  pub input: String,
  /// Figma API token, when the caller has one.
  pub token: Option<String>,
  /// Shape hint for textual payloads.
  pub format: FormatHint,
}

/// One way of obtaining a raw diagram document.
#[async_trait]
pub trait DiagramSource: Send + Sync {
  /// Which adapter this is; drives fallback eligibility and reporting.
  fn kind(&self) -> SourceKind;

  /// Attempts to ingest a validated raw document.
  async fn ingest(&self, request: &SourceRequest) -> Result<RawDocument, SourceError>;
}

/// Builds the adapter instances for a mode, in attempt order.
pub fn sources_for_mode(
  mode: SourceMode,
  mcp_config: &McpEndpointConfig,
) -> Vec<Box<dyn DiagramSource>> {
  mode_order(mode)
    .iter()
    .map(|kind| -> Box<dyn DiagramSource> {
      match kind {
        SourceKind::Tree => Box::new(FigmaTreeSource::new()),
        SourceKind::Structured => Box::new(McpEndpointSource::new(mcp_config.clone())),
        SourceKind::File => Box::new(FileSource::new()),
        SourceKind::Stdin => Box::new(StdinSource::new()),
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn auto_mode_tries_structured_then_tree() {
    assert_eq!(
      mode_order(SourceMode::Auto),
      &[SourceKind::Structured, SourceKind::Tree]
    );
  }

  #[test]
  fn single_modes_map_to_themselves() {
    assert_eq!(mode_order(SourceMode::Tree), &[SourceKind::Tree]);
    assert_eq!(mode_order(SourceMode::Stdin), &[SourceKind::Stdin]);
  }

  #[test]
  fn mode_parsing_accepts_known_names_only() {
    assert_eq!("AUTO".parse::<SourceMode>().unwrap(), SourceMode::Auto);
    assert_eq!("file".parse::<SourceMode>().unwrap(), SourceMode::File);
    let error = "carrier-pigeon".parse::<SourceMode>().unwrap_err();
    assert!(error.contains("tree, structured, file, stdin, auto"));
  }
}
