//! Canonical graph model shared by every pipeline stage.
//!
//! Every source adapter ultimately normalizes into these types, and the
//! renderer consumes nothing else. Entities are built once per ingestion
//! and never mutated afterwards; there is no persistent store.

use serde::{Deserialize, Serialize};

/// Direction/kind of a canonical edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
  /// A single-headed, directed connector.
  Arrow,
  /// An undirected connector with no arrowheads.
  Line,
  /// A connector with arrowheads on both ends.
  Bidirectional,
}

/// A shape extracted from a source document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
  /// Opaque source identifier, unique within a page.
  pub source_id: String,
  /// Display label; never empty (a placeholder is synthesized upstream).
  pub label: String,
  /// Free-form shape tag from the source, when present.
  pub shape_type: Option<String>,
  /// Horizontal position, when derivable from the source.
  pub x: Option<f64>,
  /// Vertical position, when derivable from the source.
  pub y: Option<f64>,
  /// Back-reference to the containing section. Not an ownership edge;
  /// section membership is derived from traversal containment.
  pub section_id: Option<String>,
}

/// A connector between two nodes of the same page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphEdge {
  /// Visual origin node id.
  pub source_id: String,
  /// Visual destination node id.
  pub target_id: String,
  /// Optional edge label.
  pub label: Option<String>,
  /// Resolved direction/kind.
  pub kind: EdgeKind,
}

/// A visual grouping container discovered during traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
  /// Opaque source identifier.
  pub source_id: String,
  /// Display label; defaulted to `Section N` when the source name is blank.
  pub label: String,
  /// Member node ids in discovery order. Sections with zero resolved
  /// members are dropped before rendering.
  pub node_ids: Vec<String>,
}

/// A free-floating annotation. Never participates in edges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StickyNote {
  /// Opaque source identifier.
  pub source_id: String,
  /// Annotation text; always non-empty (empty notes are dropped).
  pub text: String,
}

/// The node/edge/section/sticky bundle of one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDiagram {
  /// Nodes in discovery order.
  pub nodes: Vec<GraphNode>,
  /// Edges whose endpoints both exist in `nodes` (dangling edges dropped).
  pub edges: Vec<GraphEdge>,
  /// Non-empty sections in discovery order.
  pub sections: Vec<Section>,
  /// Sticky-note annotations.
  pub sticky_notes: Vec<StickyNote>,
}

/// One page of a source document; the unit of independent rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageGraph {
  /// Page identifier from the source.
  pub page_id: String,
  /// Page display name; defaulted when the source name is blank.
  pub page_name: String,
  /// The page's graph content.
  pub diagram: FlowDiagram,
}

/// Which wire shape a document was normalized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceShape {
  /// The recursive tree-document shape (Figma REST file tree).
  Tree,
  /// The flat page-list shape (structured endpoint or canvas XML).
  Pages,
}

/// A fully normalized, source-agnostic diagram document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramDocument {
  /// Which wire shape this document came from.
  pub shape: SourceShape,
  /// File key the ingestion resolved (or a synthetic key for local input).
  pub file_key: String,
  /// Source file name, when the wire shape carried one.
  pub file_name: Option<String>,
  /// Pages in document order.
  pub pages: Vec<PageGraph>,
}
