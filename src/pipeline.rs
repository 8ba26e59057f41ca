//! Ingestion orchestration and the end-to-end pipeline.
//!
//! The orchestrator tries the adapters for a mode in order and applies the
//! auto-mode fallback rule; [`run_pipeline`] chains ingestion, normalization,
//! layout resolution, and rendering into one call.

use crate::config::McpEndpointConfig;
use crate::error::{SourceError, is_fallback_eligible};
use crate::layout::{LayoutPreset, layout_config, resolve_layout};
use crate::model::{DiagramDocument, FlowDiagram};
use crate::normalize::normalize;
use crate::payload::FormatHint;
use crate::render::{Direction, RenderOptions, render_mermaid};
use crate::sources::{
  DiagramSource, RawDocument, SourceKind, SourceMode, SourceRequest, sources_for_mode,
};

/// Result of a successful ingestion attempt.
#[derive(Debug)]
pub struct IngestOutcome {
  /// The adapter that produced the document.
  pub selected_source: SourceKind,
  /// True when a later candidate succeeded after an earlier one failed.
  pub fallback_used: bool,
  /// The validated raw document.
  pub raw: RawDocument,
}

/// Tries `sources` in order against `request`.
///
/// A failure aborts unless the mode is auto, the failing adapter is the
/// structured one, and the error classifies as fallback-eligible; in that
/// case the next candidate is tried and the error kept as the last resort.
pub async fn ingest_from(
  sources: &[Box<dyn DiagramSource>],
  request: &SourceRequest,
  mode: SourceMode,
) -> Result<IngestOutcome, SourceError> {
  let mut last_error: Option<SourceError> = None;

  for (index, source) in sources.iter().enumerate() {
    match source.ingest(request).await {
      Ok(raw) => {
        return Ok(IngestOutcome {
          selected_source: source.kind(),
          fallback_used: mode == SourceMode::Auto && index > 0,
          raw,
        });
      }
      Err(error) => {
        let can_fall_back = mode == SourceMode::Auto
          && source.kind() == SourceKind::Structured
          && index + 1 < sources.len()
          && is_fallback_eligible(&error);
        if !can_fall_back {
          return Err(error);
        }
        tracing::warn!(source = %source.kind(), error = %error,
          "structured source failed; falling back to the next candidate");
        last_error = Some(error);
      }
    }
  }

  Err(last_error.unwrap_or(SourceError::NoSourceAvailable))
}

/// Ingests a raw document using the adapters for `mode`.
pub async fn ingest_diagram(
  mode: SourceMode,
  request: &SourceRequest,
  mcp_config: &McpEndpointConfig,
) -> Result<IngestOutcome, SourceError> {
  let sources = sources_for_mode(mode, mcp_config);
  ingest_from(&sources, request, mode).await
}

/// One fully rendered page.
#[derive(Debug, Clone)]
pub struct RenderedPage {
  /// Page identifier from the source.
  pub page_id: String,
  /// Page display name.
  pub page_name: String,
  /// The canonical graph the page rendered from.
  pub diagram: FlowDiagram,
  /// Mermaid flowchart text.
  pub mermaid: String,
  /// Renderer configuration for the resolved layout preset, when any.
  pub mermaid_config: Option<serde_json::Value>,
}

/// Everything needed for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
  /// FigJam URL, file key, or local path.
  pub input: String,
  /// Figma API token, when available.
  pub token: Option<String>,
  /// Requested source mode.
  pub mode: SourceMode,
  /// Shape hint for textual payloads.
  pub format: FormatHint,
  /// Resolved structured-endpoint settings.
  pub mcp: McpEndpointConfig,
  /// Explicit direction override.
  pub direction: Option<Direction>,
  /// Requested layout preset (`auto` resolves per page).
  pub layout: LayoutPreset,
}

/// Result of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
  /// The mode the caller asked for.
  pub requested_mode: SourceMode,
  /// The adapter that actually produced the document.
  pub selected_source: SourceKind,
  /// True when auto mode fell back past a failed candidate.
  pub fallback_used: bool,
  /// File key the ingestion resolved.
  pub file_key: String,
  /// Source file name, when the payload carried one.
  pub file_name: Option<String>,
  /// Rendered pages in document order.
  pub pages: Vec<RenderedPage>,
}

/// Renders every page of a normalized document.
fn render_document(
  document: DiagramDocument,
  direction: Option<Direction>,
  layout: LayoutPreset,
) -> (String, Option<String>, Vec<RenderedPage>) {
  let render_options = RenderOptions { direction };
  let DiagramDocument {
    file_key,
    file_name,
    pages,
    ..
  } = document;
  let pages = pages
    .into_iter()
    .map(|page| {
      let preset = resolve_layout(layout, &page.diagram);
      let mermaid = render_mermaid(&page.diagram, &render_options);
      tracing::debug!(page = %page.page_name, layout = %preset, "rendered page");
      RenderedPage {
        page_id: page.page_id,
        page_name: page.page_name,
        diagram: page.diagram,
        mermaid,
        mermaid_config: layout_config(preset),
      }
    })
    .collect();
  (file_key, file_name, pages)
}

/// Runs the whole pipeline: ingest, normalize, resolve layout, render.
pub async fn run_pipeline(options: RunOptions) -> Result<RunOutcome, SourceError> {
  let request = SourceRequest {
    input: options.input.clone(),
    token: options.token.clone(),
    format: options.format,
  };

  let outcome = ingest_diagram(options.mode, &request, &options.mcp).await?;
  let document = normalize(outcome.raw);
  tracing::info!(source = %outcome.selected_source, file_key = %document.file_key,
    pages = document.pages.len(), "ingested diagram document");

  let (file_key, file_name, pages) =
    render_document(document, options.direction, options.layout);

  Ok(RunOutcome {
    requested_mode: options.mode,
    selected_source: outcome.selected_source,
    fallback_used: outcome.fallback_used,
    file_key,
    file_name,
    pages,
  })
}
