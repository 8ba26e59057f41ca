//! FigJam file-tree access.
//!
//! Wire types for the tree-document shape, FigJam URL/file-key extraction,
//! and the one-request REST client used by the tree source adapter. The
//! recursive extraction of canonical entities lives in [`tree_walk`].

pub mod tree_walk;

use crate::error::SourceError;
use regex::Regex;
use std::sync::LazyLock;

/// Production base URL of the Figma REST API.
pub const FIGMA_API_BASE: &str = "https://api.figma.com/v1";

/// Rate-limit response headers appended to 429 error details when present.
const RATE_LIMIT_HEADERS: [&str; 3] = [
  "retry-after",
  "x-figma-rate-limit-type",
  "x-figma-plan-tier",
];

static URL_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"/(?:board|file|design|proto)/([A-Za-z0-9]+)(?:/|$)").expect("valid pattern")
});

static BARE_KEY_PATTERN: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{6,}$").expect("valid pattern"));

/// A connector endpoint reference inside the tree document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoint {
  /// Id of the node this endpoint attaches to, when resolved.
  pub endpoint_node_id: Option<String>,
}

/// Absolute bounding box of a tree node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
  /// Left edge.
  pub x: f64,
  /// Top edge.
  pub y: f64,
  /// Width in canvas units.
  pub width: f64,
  /// Height in canvas units.
  pub height: f64,
}

/// One node of the tree-document shape.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeNode {
  /// Node id, unique within the document.
  pub id: String,
  /// Discriminating type tag (`CANVAS`, `SECTION`, `SHAPE_WITH_TEXT`, ...).
  pub node_type: String,
  /// Display name, when present.
  pub name: Option<String>,
  /// Child nodes; empty for leaves.
  pub children: Vec<TreeNode>,
  /// Text content for text-bearing nodes.
  pub characters: Option<String>,
  /// Shape tag for `SHAPE_WITH_TEXT` nodes.
  pub shape_type: Option<String>,
  /// Connector start endpoint.
  pub connector_start: Option<Endpoint>,
  /// Connector end endpoint.
  pub connector_end: Option<Endpoint>,
  /// Stroke cap drawn at the connector start.
  pub connector_start_stroke_cap: Option<String>,
  /// Stroke cap drawn at the connector end.
  pub connector_end_stroke_cap: Option<String>,
  /// Bounding box, when the source carries geometry.
  pub bounding_box: Option<BoundingBox>,
}

/// A validated tree-document file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TreeFile {
  /// File display name.
  pub name: Option<String>,
  /// Root of the node tree.
  pub document: TreeNode,
}

/// Resolves a FigJam URL or bare file key to the file key.
///
/// Accepts `figma.com/{board|file|design|proto}/<key>/...` URLs and bare
/// keys of six or more alphanumerics.
pub fn extract_file_key(input: &str) -> Result<String, SourceError> {
  let trimmed = input.trim();
  if trimmed.is_empty() {
    return Err(SourceError::InvalidInput(
      "Missing FigJam URL or file key.".into(),
    ));
  }

  if trimmed.contains("figma.com") {
    return URL_KEY_PATTERN
      .captures(trimmed)
      .and_then(|captures| captures.get(1))
      .map(|key| key.as_str().to_string())
      .ok_or_else(|| {
        SourceError::InvalidInput("Could not extract file key from FigJam URL.".into())
      });
  }

  if !BARE_KEY_PATTERN.is_match(trimmed) {
    return Err(SourceError::InvalidInput(
      "Invalid Figma file key format.".into(),
    ));
  }

  Ok(trimmed.to_string())
}

/// Minimal client for the Figma file-tree endpoint. One authenticated GET
/// per ingest; configuration is read once at construction.
#[derive(Debug, Clone)]
pub struct FigmaClient {
  http: reqwest::Client,
  base_url: String,
}

impl Default for FigmaClient {
  fn default() -> Self {
    Self::new()
  }
}

impl FigmaClient {
  /// Creates a client against the production API.
  pub fn new() -> Self {
    Self::with_base_url(FIGMA_API_BASE)
  }

  /// Creates a client against a custom base URL (tests, proxies).
  pub fn with_base_url(base_url: impl Into<String>) -> Self {
    Self {
      http: reqwest::Client::new(),
      base_url: base_url.into(),
    }
  }

  /// Fetches the raw file tree for `file_key` as JSON.
  ///
  /// Non-success responses become [`SourceError::Api`] carrying the status
  /// and body; rate-limited responses additionally carry any present
  /// rate-limit headers.
  pub async fn fetch_file(
    &self,
    file_key: &str,
    token: &str,
  ) -> Result<serde_json::Value, SourceError> {
    let url = format!("{}/files/{}", self.base_url, file_key);
    let response = self
      .http
      .get(&url)
      .header("X-Figma-Token", token)
      .send()
      .await
      .map_err(|error| SourceError::Network(error.to_string()))?;

    let status = response.status().as_u16();
    if !(200..300).contains(&status) {
      let headers = response.headers().clone();
      let body = response.text().await.unwrap_or_default();
      return Err(SourceError::Api {
        status,
        detail: api_failure_detail(status, &headers, body),
      });
    }

    response.json().await.map_err(|error| SourceError::Malformed {
      format: "JSON",
      origin: "Figma API".into(),
      detail: error.to_string(),
    })
  }
}

/// Builds the error detail for a failed REST response. Rate-limited (429)
/// responses append the rate-limit headers that are actually present.
fn api_failure_detail(status: u16, headers: &reqwest::header::HeaderMap, body: String) -> String {
  let mut detail = body;
  if status == 429 {
    let present: Vec<String> = RATE_LIMIT_HEADERS
      .iter()
      .filter_map(|name| {
        headers
          .get(*name)
          .and_then(|value| value.to_str().ok())
          .map(|value| format!("{name}: {value}"))
      })
      .collect();
    if !present.is_empty() {
      detail.push_str("\nRate-limit headers: ");
      detail.push_str(&present.join(", "));
    }
  }
  detail
}
