//! Recursive extraction of canonical entities from a tree document.
//!
//! A single depth-first pass over the node tree collects shapes, connectors,
//! sections, and sticky notes into per-page [`FlowDiagram`]s. Connector
//! direction is resolved from the stroke caps on the two endpoints; an
//! arrow cap on the start endpoint only means the visual flow runs from the
//! end node to the start node, so source and target are swapped.

use crate::figjam::{TreeFile, TreeNode};
use crate::model::{EdgeKind, FlowDiagram, GraphEdge, GraphNode, PageGraph, Section, StickyNote};
use std::collections::{HashMap, HashSet};

/// Stroke caps that count as an arrowhead when resolving connector kind.
const ARROW_CAPS: [&str; 5] = [
  "ARROW_LINES",
  "ARROW_EQUILATERAL",
  "LINE_ARROW",
  "TRIANGLE_ARROW",
  "TRIANGLE_FILLED",
];

/// Collapses runs of whitespace (including newlines) to single spaces and
/// trims the ends.
pub fn clean_text(raw: &str) -> String {
  raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_arrow_cap(cap: Option<&String>) -> bool {
  cap.is_some_and(|cap| ARROW_CAPS.contains(&cap.as_str()))
}

/// First non-blank text content found by depth-first search, the node's own
/// `characters` included.
fn first_text(node: &TreeNode) -> Option<String> {
  if let Some(characters) = &node.characters {
    let cleaned = clean_text(characters);
    if !cleaned.is_empty() {
      return Some(cleaned);
    }
  }
  node.children.iter().find_map(first_text)
}

fn node_label(node: &TreeNode) -> String {
  first_text(node)
    .or_else(|| {
      node
        .name
        .as_deref()
        .map(clean_text)
        .filter(|name| !name.is_empty())
    })
    .unwrap_or_else(|| {
      let id = clean_text(&node.id);
      if id.is_empty() {
        "Node unknown".to_string()
      } else {
        format!("Node {id}")
      }
    })
}

/// Mutable accumulator for one page's traversal.
#[derive(Default)]
struct WalkState {
  nodes: Vec<GraphNode>,
  node_index: HashMap<String, usize>,
  edges: Vec<GraphEdge>,
  sections: Vec<Section>,
  section_index: HashMap<String, usize>,
  sticky_notes: Vec<StickyNote>,
}

impl WalkState {
  /// Registers or replaces a shape. A repeated id overwrites the earlier
  /// entry in place and does not re-append section membership.
  fn push_node(&mut self, node: GraphNode) {
    if let Some(&index) = self.node_index.get(&node.source_id) {
      self.nodes[index] = node;
      return;
    }
    if let Some(section_id) = &node.section_id
      && let Some(&section) = self.section_index.get(section_id)
    {
      self.sections[section].node_ids.push(node.source_id.clone());
    }
    self.node_index.insert(node.source_id.clone(), self.nodes.len());
    self.nodes.push(node);
  }

  fn into_diagram(self) -> FlowDiagram {
    let known: HashSet<&str> = self.nodes.iter().map(|node| node.source_id.as_str()).collect();
    let edges = self
      .edges
      .into_iter()
      .filter(|edge| known.contains(edge.source_id.as_str()) && known.contains(edge.target_id.as_str()))
      .collect();
    let sections = self
      .sections
      .into_iter()
      .filter(|section| !section.node_ids.is_empty())
      .collect();
    FlowDiagram {
      nodes: self.nodes,
      edges,
      sections,
      sticky_notes: self.sticky_notes,
    }
  }
}

/// Visits one tree node, threading the enclosing section id down the
/// recursion. The parameter is immutable; entering a `SECTION` rebinds it
/// for that subtree only.
fn visit(node: &TreeNode, section: Option<&str>, state: &mut WalkState) {
  let mut active_section = section;
  let section_id;

  match node.node_type.as_str() {
    "SECTION" => {
      if !state.section_index.contains_key(&node.id) {
        let label = node
          .name
          .as_deref()
          .map(clean_text)
          .filter(|name| !name.is_empty())
          .unwrap_or_else(|| format!("Section {}", state.sections.len() + 1));
        state.section_index.insert(node.id.clone(), state.sections.len());
        state.sections.push(Section {
          source_id: node.id.clone(),
          label,
          node_ids: Vec::new(),
        });
      }
      section_id = node.id.clone();
      active_section = Some(&section_id);
    }
    "SHAPE_WITH_TEXT" => {
      let (x, y) = node
        .bounding_box
        .map(|bounds| (Some(bounds.x), Some(bounds.y)))
        .unwrap_or((None, None));
      state.push_node(GraphNode {
        source_id: node.id.clone(),
        label: node_label(node),
        shape_type: node.shape_type.clone(),
        x,
        y,
        section_id: active_section.map(str::to_string),
      });
    }
    "CONNECTOR" => {
      let start = node
        .connector_start
        .as_ref()
        .and_then(|endpoint| endpoint.endpoint_node_id.as_deref())
        .filter(|id| !id.is_empty());
      let end = node
        .connector_end
        .as_ref()
        .and_then(|endpoint| endpoint.endpoint_node_id.as_deref())
        .filter(|id| !id.is_empty());
      if let (Some(start), Some(end)) = (start, end) {
        let arrow_start = is_arrow_cap(node.connector_start_stroke_cap.as_ref());
        let arrow_end = is_arrow_cap(node.connector_end_stroke_cap.as_ref());
        let label = first_text(node);
        let (source_id, target_id, kind) = match (arrow_start, arrow_end) {
          (true, true) => (start, end, EdgeKind::Bidirectional),
          // Arrowhead on the start endpoint only: visual flow end -> start.
          (true, false) => (end, start, EdgeKind::Arrow),
          (false, true) => (start, end, EdgeKind::Arrow),
          (false, false) => (start, end, EdgeKind::Line),
        };
        state.edges.push(GraphEdge {
          source_id: source_id.to_string(),
          target_id: target_id.to_string(),
          label,
          kind,
        });
      }
    }
    "STICKY" => {
      let text = first_text(node).or_else(|| {
        node
          .name
          .as_deref()
          .map(clean_text)
          .filter(|name| !name.is_empty())
      });
      if let Some(text) = text {
        state.sticky_notes.push(StickyNote {
          source_id: node.id.clone(),
          text,
        });
      }
    }
    _ => {}
  }

  for child in &node.children {
    visit(child, active_section, state);
  }
}

fn walk_page(root: &TreeNode) -> FlowDiagram {
  let mut state = WalkState::default();
  for child in &root.children {
    visit(child, None, &mut state);
  }
  state.into_diagram()
}

/// Extracts one [`PageGraph`] per canvas of the tree document.
///
/// Each `CANVAS` child of the document root becomes a page; a document
/// whose root has no canvases is treated as a single synthetic page.
pub fn parse_pages(file: &TreeFile) -> Vec<PageGraph> {
  let canvases: Vec<&TreeNode> = file
    .document
    .children
    .iter()
    .filter(|child| child.node_type == "CANVAS")
    .collect();

  if canvases.is_empty() {
    let page_name = file
      .document
      .name
      .as_deref()
      .map(clean_text)
      .filter(|name| !name.is_empty())
      .unwrap_or_else(|| "Page 1".to_string());
    return vec![PageGraph {
      page_id: file.document.id.clone(),
      page_name,
      diagram: walk_page(&file.document),
    }];
  }

  canvases
    .iter()
    .enumerate()
    .map(|(index, canvas)| {
      let page_name = canvas
        .name
        .as_deref()
        .map(clean_text)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| format!("Page {}", index + 1));
      PageGraph {
        page_id: canvas.id.clone(),
        page_name,
        diagram: walk_page(canvas),
      }
    })
    .collect()
}
