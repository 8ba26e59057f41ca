//! # Jamflow
//!
//! Convert FigJam flow diagrams into Mermaid flowchart text.
//!
//! Jamflow ingests a diagram from one of several sources (the Figma REST
//! file tree, a structured MCP-style endpoint, a local file, or stdin),
//! validates the raw payload, normalizes it into a canonical page/graph
//! model, and renders each page as a Mermaid flowchart. A topology-driven
//! heuristic can pick a Mermaid layout preset for the external rasterizer.
//!
//! ## Pipeline
//!
//! ```text
//! source adapter -> payload validator -> normalizer -> layout -> renderer
//! ```
//!
//! The high-level entry point is [`pipeline::run_pipeline`]; the `jamflow`
//! binary wraps it with CLI parsing and output fan-out.

// Documentation enforcement - treat missing docs as errors
#![deny(missing_docs)]

/// Command-line interface: argument parsing, env resolution, output fan-out.
pub mod cli;
/// Resolved configuration passed by value into the source adapters.
pub mod config;
/// Error taxonomy for ingestion and output, plus the fallback classifier.
pub mod error;
/// FigJam file-tree access: wire types, file-key extraction, REST client,
/// and the recursive tree extractor.
pub mod figjam;
/// Topology-driven layout preset selection.
pub mod layout;
/// Canonical graph model shared by every pipeline stage.
pub mod model;
/// Normalization of raw ingested documents into the canonical model.
pub mod normalize;
/// Output writing and the external rasterizer boundary.
pub mod output;
/// Structural payload validators and format sniffing.
pub mod payload;
/// Ingestion orchestration and the end-to-end pipeline.
pub mod pipeline;
/// Deterministic Mermaid flowchart rendering.
pub mod render;
/// Pluggable diagram sources unified behind one ingest contract.
pub mod sources;

pub use error::{OutputError, SourceError, is_fallback_eligible};
pub use model::{
  DiagramDocument, EdgeKind, FlowDiagram, GraphEdge, GraphNode, PageGraph, Section, SourceShape,
  StickyNote,
};
pub use pipeline::{IngestOutcome, RenderedPage, RunOptions, RunOutcome, run_pipeline};
pub use sources::{DiagramSource, RawDocument, SourceKind, SourceMode, SourceRequest};
