//! Validator for the page-list wire shape.
//!
//! The structured endpoint (and the XML transcoder) hand over documents that
//! already use the canonical record shapes; this validator checks structure
//! and vocabulary with path-qualified errors rooted at `document`.

use crate::error::{PayloadShape, SourceError};
use crate::model::{EdgeKind, FlowDiagram, GraphEdge, GraphNode, PageGraph, Section, StickyNote};
use crate::payload::{expect_array, expect_object, expect_str, optional_f64, optional_str, required_str};
use serde_json::Value;

const SHAPE: PayloadShape = PayloadShape::Pages;

/// A validated page-list document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PagePayload {
  /// Source file name, when the payload carried one.
  pub file_name: Option<String>,
  /// Pages in payload order.
  pub pages: Vec<PageGraph>,
}

/// Validates a parsed JSON value as a page-list document.
pub fn validate_pages(value: &Value) -> Result<PagePayload, SourceError> {
  let root = expect_object(SHAPE, value, "document")?;
  let file_name = optional_str(SHAPE, root, "fileName", "document")?;
  let pages_raw = root
    .get("pages")
    .ok_or_else(|| SourceError::payload(SHAPE, "document.pages", "expected an array."))?;
  let pages = expect_array(SHAPE, pages_raw, "document.pages")?
    .iter()
    .enumerate()
    .map(|(index, page)| validate_page(page, &format!("document.pages[{index}]")))
    .collect::<Result<Vec<_>, _>>()?;
  Ok(PagePayload { file_name, pages })
}

fn validate_page(value: &Value, path: &str) -> Result<PageGraph, SourceError> {
  let object = expect_object(SHAPE, value, path)?;
  let page_id = required_str(SHAPE, object, "pageId", path)?;
  let page_name = required_str(SHAPE, object, "pageName", path)?;
  let diagram_raw = object
    .get("diagram")
    .ok_or_else(|| SourceError::payload(SHAPE, format!("{path}.diagram"), "expected an object."))?;
  Ok(PageGraph {
    page_id,
    page_name,
    diagram: validate_diagram(diagram_raw, &format!("{path}.diagram"))?,
  })
}

fn validate_diagram(value: &Value, path: &str) -> Result<FlowDiagram, SourceError> {
  let object = expect_object(SHAPE, value, path)?;

  let nodes = list(object, "nodes", path)?
    .iter()
    .enumerate()
    .map(|(index, node)| validate_node(node, &format!("{path}.nodes[{index}]")))
    .collect::<Result<Vec<_>, _>>()?;
  let edges = list(object, "edges", path)?
    .iter()
    .enumerate()
    .map(|(index, edge)| validate_edge(edge, &format!("{path}.edges[{index}]")))
    .collect::<Result<Vec<_>, _>>()?;
  let sections = list(object, "sections", path)?
    .iter()
    .enumerate()
    .map(|(index, section)| validate_section(section, &format!("{path}.sections[{index}]")))
    .collect::<Result<Vec<_>, _>>()?;
  let sticky_notes = list(object, "stickyNotes", path)?
    .iter()
    .enumerate()
    .map(|(index, sticky)| validate_sticky(sticky, &format!("{path}.stickyNotes[{index}]")))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(FlowDiagram {
    nodes,
    edges,
    sections,
    sticky_notes,
  })
}

/// An absent list is an empty list; a present one must be an array.
fn list<'a>(
  object: &'a serde_json::Map<String, Value>,
  key: &str,
  path: &str,
) -> Result<std::borrow::Cow<'a, Vec<Value>>, SourceError> {
  match object.get(key) {
    None | Some(Value::Null) => Ok(std::borrow::Cow::Owned(Vec::new())),
    Some(raw) => Ok(std::borrow::Cow::Borrowed(expect_array(
      SHAPE,
      raw,
      &format!("{path}.{key}"),
    )?)),
  }
}

fn validate_node(value: &Value, path: &str) -> Result<GraphNode, SourceError> {
  let object = expect_object(SHAPE, value, path)?;
  Ok(GraphNode {
    source_id: required_str(SHAPE, object, "sourceId", path)?,
    label: required_str(SHAPE, object, "label", path)?,
    shape_type: optional_str(SHAPE, object, "shapeType", path)?,
    x: optional_f64(SHAPE, object, "x", path)?,
    y: optional_f64(SHAPE, object, "y", path)?,
    section_id: optional_str(SHAPE, object, "sectionId", path)?,
  })
}

fn validate_edge(value: &Value, path: &str) -> Result<GraphEdge, SourceError> {
  let object = expect_object(SHAPE, value, path)?;
  let kind_raw = object
    .get("kind")
    .ok_or_else(|| edge_kind_error(path))
    .and_then(|raw| expect_str(SHAPE, raw, &format!("{path}.kind")))?;
  let kind = match kind_raw {
    "arrow" => EdgeKind::Arrow,
    "line" => EdgeKind::Line,
    "bidirectional" => EdgeKind::Bidirectional,
    _ => return Err(edge_kind_error(path)),
  };
  Ok(GraphEdge {
    source_id: required_str(SHAPE, object, "sourceId", path)?,
    target_id: required_str(SHAPE, object, "targetId", path)?,
    label: optional_str(SHAPE, object, "label", path)?,
    kind,
  })
}

fn edge_kind_error(path: &str) -> SourceError {
  SourceError::payload(
    SHAPE,
    format!("{path}.kind"),
    "expected one of: arrow, line, bidirectional.",
  )
}

fn validate_section(value: &Value, path: &str) -> Result<Section, SourceError> {
  let object = expect_object(SHAPE, value, path)?;
  let node_ids = list(object, "nodeIds", path)?
    .iter()
    .enumerate()
    .map(|(index, id)| {
      Ok(expect_str(SHAPE, id, &format!("{path}.nodeIds[{index}]"))?.to_string())
    })
    .collect::<Result<Vec<_>, SourceError>>()?;
  Ok(Section {
    source_id: required_str(SHAPE, object, "sourceId", path)?,
    label: required_str(SHAPE, object, "label", path)?,
    node_ids,
  })
}

fn validate_sticky(value: &Value, path: &str) -> Result<StickyNote, SourceError> {
  let object = expect_object(SHAPE, value, path)?;
  Ok(StickyNote {
    source_id: required_str(SHAPE, object, "sourceId", path)?,
    text: required_str(SHAPE, object, "text", path)?,
  })
}
