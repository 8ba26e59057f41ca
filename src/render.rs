//! Deterministic Mermaid flowchart rendering.
//!
//! One pass per page, no internal state: the same [`FlowDiagram`] always
//! renders the same text. Emission order is fixed (header, sticky-note
//! comments, section subgraphs, remaining nodes, edges) and synthetic node
//! ids are assigned in node-list encounter order.

use crate::model::{EdgeKind, FlowDiagram, GraphNode};
use std::collections::{HashMap, HashSet};

/// Flowchart direction keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
  /// Top-down.
  #[default]
  Td,
  /// Left-to-right.
  Lr,
  /// Top-to-bottom (alias of top-down).
  Tb,
  /// Bottom-up.
  Bt,
  /// Right-to-left.
  Rl,
}

impl std::fmt::Display for Direction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Direction::Td => write!(f, "TD"),
      Direction::Lr => write!(f, "LR"),
      Direction::Tb => write!(f, "TB"),
      Direction::Bt => write!(f, "BT"),
      Direction::Rl => write!(f, "RL"),
    }
  }
}

impl std::str::FromStr for Direction {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_uppercase().as_str() {
      "TD" => Ok(Direction::Td),
      "LR" => Ok(Direction::Lr),
      "TB" => Ok(Direction::Tb),
      "BT" => Ok(Direction::Bt),
      "RL" => Ok(Direction::Rl),
      other => Err(format!(
        "unknown direction \"{other}\". Direction must be one of: TD, LR, TB, BT, RL."
      )),
    }
  }
}

/// Rendering knobs. All optional; the defaults follow the source geometry.
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
  /// Explicit direction override; wins over geometry detection.
  pub direction: Option<Direction>,
}

/// Makes text safe inside Mermaid labels: collapse whitespace, neutralize
/// quote and pipe characters, strip brackets that would change node shape.
pub fn sanitize_text(value: &str) -> String {
  let replaced: String = value
    .chars()
    .filter_map(|character| match character {
      '"' | '`' => Some('\''),
      '|' => Some('/'),
      '[' | ']' | '{' | '}' => None,
      other => Some(other),
    })
    .collect();
  replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Picks a direction from node positions: with at least two positioned
/// nodes, a wider-than-tall spread reads left-to-right, otherwise top-down.
pub fn detect_direction(diagram: &FlowDiagram) -> Direction {
  let positioned: Vec<(f64, f64)> = diagram
    .nodes
    .iter()
    .filter_map(|node| node.x.zip(node.y))
    .collect();
  if positioned.len() < 2 {
    return Direction::Td;
  }

  let mut min_x = f64::INFINITY;
  let mut max_x = f64::NEG_INFINITY;
  let mut min_y = f64::INFINITY;
  let mut max_y = f64::NEG_INFINITY;
  for (x, y) in positioned {
    min_x = min_x.min(x);
    max_x = max_x.max(x);
    min_y = min_y.min(y);
    max_y = max_y.max(y);
  }

  if max_x - min_x >= max_y - min_y {
    Direction::Lr
  } else {
    Direction::Td
  }
}

fn node_shape(label: &str, shape_type: Option<&str>) -> String {
  match shape_type {
    Some("ROUNDED_RECTANGLE") => format!("({label})"),
    Some("DIAMOND") => format!("{{{label}}}"),
    Some("SQUARE") | Some("RECTANGLE") => format!("[{label}]"),
    Some("ELLIPSE") => format!("([{label}])"),
    Some("PARALLELOGRAM_RIGHT") => format!("[/{label}/]"),
    Some("PARALLELOGRAM_LEFT") => format!("[\\{label}\\]"),
    Some("ENG_DATABASE") => format!("[({label})]"),
    Some("HEXAGON") => format!("{{{{{label}}}}}"),
    Some("TRAPEZOID") => format!("[/{label}\\]"),
    Some("DOCUMENT_SINGLE") => format!(">{label}]"),
    _ => format!("[{label}]"),
  }
}

fn edge_operator(kind: EdgeKind) -> &'static str {
  match kind {
    EdgeKind::Arrow => "-->",
    EdgeKind::Line => "---",
    EdgeKind::Bidirectional => "<-->",
  }
}

fn render_node(mermaid_id: &str, node: &GraphNode) -> String {
  let raw = if node.label.is_empty() {
    node.source_id.as_str()
  } else {
    node.label.as_str()
  };
  let label = sanitize_text(raw);
  format!("{mermaid_id}{}", node_shape(&label, node.shape_type.as_deref()))
}

/// Renders one page as Mermaid flowchart text (no trailing newline).
pub fn render_mermaid(diagram: &FlowDiagram, options: &RenderOptions) -> String {
  let direction = options
    .direction
    .unwrap_or_else(|| detect_direction(diagram));
  let mut lines = vec![format!("flowchart {direction}")];

  let mut id_map: HashMap<&str, String> = HashMap::new();
  for node in &diagram.nodes {
    let next = format!("n{}", id_map.len() + 1);
    id_map.entry(node.source_id.as_str()).or_insert(next);
  }

  for sticky in &diagram.sticky_notes {
    let clean = sanitize_text(&sticky.text);
    if !clean.is_empty() {
      lines.push(format!("  %% Note: {clean}"));
    }
  }

  let node_by_id: HashMap<&str, &GraphNode> = diagram
    .nodes
    .iter()
    .map(|node| (node.source_id.as_str(), node))
    .collect();

  let mut rendered: HashSet<&str> = HashSet::new();
  for (index, section) in diagram.sections.iter().enumerate() {
    let members: Vec<&GraphNode> = section
      .node_ids
      .iter()
      .filter_map(|id| node_by_id.get(id.as_str()).copied())
      .collect();
    if members.is_empty() {
      continue;
    }

    let title = if section.label.is_empty() {
      sanitize_text(&format!("Section {}", index + 1))
    } else {
      sanitize_text(&section.label)
    };
    lines.push(format!("  subgraph s{}[\"{title}\"]", index + 1));
    for node in members {
      if let Some(mermaid_id) = id_map.get(node.source_id.as_str())
        && rendered.insert(node.source_id.as_str())
      {
        lines.push(format!("    {}", render_node(mermaid_id, node)));
      }
    }
    lines.push("  end".to_string());
  }

  for node in &diagram.nodes {
    if rendered.contains(node.source_id.as_str()) {
      continue;
    }
    if let Some(mermaid_id) = id_map.get(node.source_id.as_str()) {
      lines.push(format!("  {}", render_node(mermaid_id, node)));
      rendered.insert(node.source_id.as_str());
    }
  }

  for edge in &diagram.edges {
    let (Some(source), Some(target)) = (
      id_map.get(edge.source_id.as_str()),
      id_map.get(edge.target_id.as_str()),
    ) else {
      continue;
    };
    let operator = edge_operator(edge.kind);
    let label = edge.label.as_deref().map(sanitize_text).unwrap_or_default();
    if label.is_empty() {
      lines.push(format!("  {source} {operator} {target}"));
    } else {
      lines.push(format!("  {source} {operator}|{label}| {target}"));
    }
  }

  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{GraphEdge, Section, StickyNote};

  fn node(id: &str, label: &str, shape: Option<&str>) -> GraphNode {
    GraphNode {
      source_id: id.into(),
      label: label.into(),
      shape_type: shape.map(str::to_string),
      x: None,
      y: None,
      section_id: None,
    }
  }

  fn positioned(id: &str, label: &str, x: f64, y: f64) -> GraphNode {
    GraphNode {
      x: Some(x),
      y: Some(y),
      ..node(id, label, None)
    }
  }

  fn arrow(source: &str, target: &str, label: Option<&str>) -> GraphEdge {
    GraphEdge {
      source_id: source.into(),
      target_id: target.into(),
      label: label.map(str::to_string),
      kind: EdgeKind::Arrow,
    }
  }

  #[test]
  fn renders_the_full_emission_order() {
    let diagram = FlowDiagram {
      nodes: vec![
        node("a", "Start", Some("ROUNDED_RECTANGLE")),
        node("b", "Valid?", Some("DIAMOND")),
        node("c", "Done", None),
      ],
      edges: vec![arrow("a", "b", None), arrow("b", "c", Some("yes"))],
      sections: vec![Section {
        source_id: "s".into(),
        label: "Intake".into(),
        node_ids: vec!["a".into()],
      }],
      sticky_notes: vec![StickyNote {
        source_id: "n".into(),
        text: "check  auth\nfirst".into(),
      }],
    };

    let text = render_mermaid(&diagram, &RenderOptions::default());
    assert_eq!(
      text,
      "flowchart TD\n\
       \x20 %% Note: check auth first\n\
       \x20 subgraph s1[\"Intake\"]\n\
       \x20   n1(Start)\n\
       \x20 end\n\
       \x20 n2{Valid?}\n\
       \x20 n3[Done]\n\
       \x20 n1 --> n2\n\
       \x20 n2 -->|yes| n3"
    );
  }

  #[test]
  fn rendering_is_idempotent() {
    let diagram = FlowDiagram {
      nodes: vec![node("a", "A", None), node("b", "B", None)],
      edges: vec![arrow("a", "b", None)],
      ..FlowDiagram::default()
    };
    let first = render_mermaid(&diagram, &RenderOptions::default());
    let second = render_mermaid(&diagram, &RenderOptions::default());
    assert_eq!(first, second);
  }

  #[test]
  fn explicit_direction_wins_over_geometry() {
    let diagram = FlowDiagram {
      nodes: vec![positioned("a", "A", 0.0, 0.0), positioned("b", "B", 500.0, 10.0)],
      ..FlowDiagram::default()
    };
    assert_eq!(detect_direction(&diagram), Direction::Lr);
    let text = render_mermaid(
      &diagram,
      &RenderOptions {
        direction: Some(Direction::Bt),
      },
    );
    assert!(text.starts_with("flowchart BT\n"));
  }

  #[test]
  fn tall_spreads_and_unpositioned_graphs_read_top_down() {
    let tall = FlowDiagram {
      nodes: vec![positioned("a", "A", 0.0, 0.0), positioned("b", "B", 10.0, 500.0)],
      ..FlowDiagram::default()
    };
    assert_eq!(detect_direction(&tall), Direction::Td);

    let unpositioned = FlowDiagram {
      nodes: vec![node("a", "A", None), positioned("b", "B", 10.0, 500.0)],
      ..FlowDiagram::default()
    };
    assert_eq!(detect_direction(&unpositioned), Direction::Td);
  }

  #[test]
  fn all_shape_brackets_are_emitted() {
    let cases = [
      ("ROUNDED_RECTANGLE", "n1(L)"),
      ("DIAMOND", "n1{L}"),
      ("SQUARE", "n1[L]"),
      ("RECTANGLE", "n1[L]"),
      ("ELLIPSE", "n1([L])"),
      ("PARALLELOGRAM_RIGHT", "n1[/L/]"),
      ("PARALLELOGRAM_LEFT", "n1[\\L\\]"),
      ("ENG_DATABASE", "n1[(L)]"),
      ("HEXAGON", "n1{{L}}"),
      ("TRAPEZOID", "n1[/L\\]"),
      ("DOCUMENT_SINGLE", "n1>L]"),
      ("SOMETHING_ELSE", "n1[L]"),
    ];
    for (shape, expected) in cases {
      let diagram = FlowDiagram {
        nodes: vec![node("a", "L", Some(shape))],
        ..FlowDiagram::default()
      };
      let text = render_mermaid(&diagram, &RenderOptions::default());
      assert!(text.contains(expected), "shape {shape}: {text}");
    }
  }

  #[test]
  fn edge_operators_follow_the_kind() {
    let mut diagram = FlowDiagram {
      nodes: vec![node("a", "A", None), node("b", "B", None)],
      edges: vec![arrow("a", "b", None)],
      ..FlowDiagram::default()
    };
    diagram.edges[0].kind = EdgeKind::Line;
    assert!(render_mermaid(&diagram, &RenderOptions::default()).contains("n1 --- n2"));
    diagram.edges[0].kind = EdgeKind::Bidirectional;
    assert!(render_mermaid(&diagram, &RenderOptions::default()).contains("n1 <--> n2"));
  }

  #[test]
  fn edges_with_missing_endpoints_are_skipped() {
    let diagram = FlowDiagram {
      nodes: vec![node("a", "A", None)],
      edges: vec![arrow("a", "ghost", None)],
      ..FlowDiagram::default()
    };
    let text = render_mermaid(&diagram, &RenderOptions::default());
    assert!(!text.contains("-->"));
  }

  #[test]
  fn sanitization_neutralizes_breaking_characters() {
    assert_eq!(sanitize_text("say \"hi\" `now`"), "say 'hi' 'now'");
    assert_eq!(sanitize_text("a | b"), "a / b");
    assert_eq!(sanitize_text("keep [this] {out}"), "keep this out");
    assert_eq!(sanitize_text("  multi \n line\ttext "), "multi line text");
  }

  #[test]
  fn section_nodes_render_once() {
    let diagram = FlowDiagram {
      nodes: vec![node("a", "A", None), node("b", "B", None)],
      edges: vec![],
      sections: vec![
        Section {
          source_id: "s1".into(),
          label: "First".into(),
          node_ids: vec!["a".into()],
        },
        Section {
          source_id: "s2".into(),
          label: "Second".into(),
          node_ids: vec!["a".into(), "b".into()],
        },
      ],
      sticky_notes: vec![],
    };
    let text = render_mermaid(&diagram, &RenderOptions::default());
    assert_eq!(text.matches("n1[A]").count(), 1);
    assert_eq!(text.matches("n2[B]").count(), 1);
    assert!(text.contains("subgraph s2[\"Second\"]"));
  }

  #[test]
  fn blank_sticky_notes_are_dropped_from_output() {
    let diagram = FlowDiagram {
      nodes: vec![node("a", "A", None)],
      sticky_notes: vec![StickyNote {
        source_id: "n".into(),
        text: "[]{}".into(),
      }],
      ..FlowDiagram::default()
    };
    let text = render_mermaid(&diagram, &RenderOptions::default());
    assert!(!text.contains("%% Note:"));
  }
}
