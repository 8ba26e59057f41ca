//! Topology-driven layout preset selection.
//!
//! Picks a Mermaid layout preset from cheap graph signals and maps presets
//! to the renderer configuration the external rasterizer understands. The
//! heuristic never computes positions; it only chooses a preset.

use crate::model::FlowDiagram;
use serde_json::{Value, json};
use std::collections::HashMap;

/// A Mermaid layout preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LayoutPreset {
  /// Let the heuristic decide per page.
  #[default]
  Auto,
  /// Mermaid's stock dagre layout.
  Default,
  /// Tightened spacing for large diagrams.
  Compact,
  /// The ELK layered engine.
  Elk,
  /// ELK tuned for dense, highly-connected graphs.
  Organic,
  /// ELK's mrtree algorithm for hierarchies.
  Tree,
}

impl std::fmt::Display for LayoutPreset {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      LayoutPreset::Auto => write!(f, "auto"),
      LayoutPreset::Default => write!(f, "default"),
      LayoutPreset::Compact => write!(f, "compact"),
      LayoutPreset::Elk => write!(f, "elk"),
      LayoutPreset::Organic => write!(f, "organic"),
      LayoutPreset::Tree => write!(f, "tree"),
    }
  }
}

impl std::str::FromStr for LayoutPreset {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "auto" => Ok(LayoutPreset::Auto),
      "default" => Ok(LayoutPreset::Default),
      "compact" => Ok(LayoutPreset::Compact),
      "elk" => Ok(LayoutPreset::Elk),
      "organic" => Ok(LayoutPreset::Organic),
      "tree" => Ok(LayoutPreset::Tree),
      other => Err(format!(
        "unknown layout \"{other}\". Layout must be one of: auto, default, compact, elk, organic, tree."
      )),
    }
  }
}

/// Picks a preset for one page from its topology.
///
/// Rules are checked in order, first match wins: small sparse graphs stay
/// on the default engine; tree-shaped graphs (every in-degree at most one)
/// use mrtree; dense or heavily fanned-out graphs go organic; section-heavy
/// boards go to ELK; very large graphs tighten spacing.
pub fn detect_layout(diagram: &FlowDiagram) -> LayoutPreset {
  let node_count = diagram.nodes.len();
  let edge_count = diagram.edges.len();
  let density = edge_count as f64 / node_count.max(1) as f64;

  let mut out_degree: HashMap<&str, usize> = HashMap::new();
  let mut in_degree: HashMap<&str, usize> = HashMap::new();
  for node in &diagram.nodes {
    in_degree.insert(node.source_id.as_str(), 0);
  }
  for edge in &diagram.edges {
    *out_degree.entry(edge.source_id.as_str()).or_insert(0) += 1;
    if let Some(count) = in_degree.get_mut(edge.target_id.as_str()) {
      *count += 1;
    }
  }
  let max_out_degree = out_degree.values().copied().max().unwrap_or(0);
  let tree_shaped = in_degree.values().all(|&count| count <= 1);

  if node_count < 10 && density < 1.5 {
    LayoutPreset::Default
  } else if tree_shaped {
    LayoutPreset::Tree
  } else if density >= 2.0 || max_out_degree >= 5 {
    LayoutPreset::Organic
  } else if diagram.sections.len() >= 3 {
    LayoutPreset::Elk
  } else if node_count >= 30 {
    LayoutPreset::Compact
  } else {
    LayoutPreset::Default
  }
}

/// Resolves the preset to use for a page: `auto` runs the heuristic, any
/// pinned preset passes through.
pub fn resolve_layout(requested: LayoutPreset, diagram: &FlowDiagram) -> LayoutPreset {
  match requested {
    LayoutPreset::Auto => detect_layout(diagram),
    pinned => pinned,
  }
}

/// Renderer configuration for a preset, when the preset needs one.
pub fn layout_config(preset: LayoutPreset) -> Option<Value> {
  match preset {
    LayoutPreset::Auto | LayoutPreset::Default => None,
    LayoutPreset::Compact => Some(json!({
      "flowchart": { "nodeSpacing": 30, "rankSpacing": 30, "curve": "basis" }
    })),
    LayoutPreset::Elk => Some(json!({
      "flowchart": { "defaultRenderer": "elk" }
    })),
    LayoutPreset::Organic => Some(json!({
      "flowchart": { "defaultRenderer": "elk" },
      "elk": { "mergeEdges": true, "nodePlacementStrategy": "SIMPLE" }
    })),
    LayoutPreset::Tree => Some(json!({
      "flowchart": { "defaultRenderer": "elk" },
      "elk": { "algorithm": "mrtree", "mergeEdges": true }
    })),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::{EdgeKind, GraphEdge, GraphNode, Section};

  fn node(id: &str) -> GraphNode {
    GraphNode {
      source_id: id.into(),
      label: id.to_uppercase(),
      shape_type: None,
      x: None,
      y: None,
      section_id: None,
    }
  }

  fn edge(source: &str, target: &str) -> GraphEdge {
    GraphEdge {
      source_id: source.into(),
      target_id: target.into(),
      label: None,
      kind: EdgeKind::Arrow,
    }
  }

  fn diagram(nodes: usize, edges: Vec<(usize, usize)>) -> FlowDiagram {
    FlowDiagram {
      nodes: (0..nodes).map(|i| node(&format!("n{i}"))).collect(),
      edges: edges
        .into_iter()
        .map(|(a, b)| edge(&format!("n{a}"), &format!("n{b}")))
        .collect(),
      sections: Vec::new(),
      sticky_notes: Vec::new(),
    }
  }

  #[test]
  fn small_sparse_graphs_stay_default() {
    let small = diagram(5, vec![(0, 1), (1, 2), (2, 3)]);
    assert_eq!(detect_layout(&small), LayoutPreset::Default);
    assert_eq!(detect_layout(&FlowDiagram::default()), LayoutPreset::Default);
  }

  #[test]
  fn hierarchies_pick_the_tree_preset() {
    // 12 nodes, each non-root with exactly one parent.
    let edges = (1..12).map(|i| ((i - 1) / 2, i)).collect();
    assert_eq!(detect_layout(&diagram(12, edges)), LayoutPreset::Tree);
  }

  #[test]
  fn dense_graphs_pick_organic() {
    // 10 nodes, 20 edges, two incoming per node: density 2.0.
    let mut edges = Vec::new();
    for i in 0..10 {
      edges.push((i, (i + 1) % 10));
      edges.push((i, (i + 2) % 10));
    }
    assert_eq!(detect_layout(&diagram(10, edges)), LayoutPreset::Organic);
  }

  #[test]
  fn a_wide_fan_out_picks_organic() {
    // Hub with out-degree 5 among 10 nodes, plus a back edge so in-degrees
    // break tree shape.
    let edges = vec![(0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (6, 1), (7, 8)];
    assert_eq!(detect_layout(&diagram(10, edges)), LayoutPreset::Organic);
  }

  #[test]
  fn rule_order_is_observable_at_the_small_graph_boundary() {
    // 9 nodes with a degree-5 hub: the small-graph rule wins first.
    let edges = vec![
      (0, 1), (0, 2), (0, 3), (0, 4), (0, 5), (6, 1), (7, 1), (8, 2), (8, 3), (8, 4), (6, 5), (7, 5),
    ];
    let nine = diagram(9, edges.clone());
    assert_eq!(detect_layout(&nine), LayoutPreset::Default);

    // One more node crosses the boundary and the fan-out rule takes over.
    let ten = diagram(10, edges);
    assert_eq!(detect_layout(&ten), LayoutPreset::Organic);
  }

  #[test]
  fn section_heavy_boards_pick_elk() {
    // n1 and n4 each have two parents, so the tree rule does not apply.
    let mut board = diagram(12, vec![(0, 1), (2, 1), (3, 4), (5, 4), (6, 7), (8, 9)]);
    board.sections = (0..3)
      .map(|i| Section {
        source_id: format!("s{i}"),
        label: format!("Phase {i}"),
        node_ids: vec![format!("n{i}")],
      })
      .collect();
    assert_eq!(detect_layout(&board), LayoutPreset::Elk);
  }

  #[test]
  fn large_graphs_tighten_spacing() {
    // 30 sparse nodes; n1 has two parents so the tree rule does not apply.
    let mut edges: Vec<(usize, usize)> = (1..15).map(|i| (i - 1, i)).collect();
    edges.push((20, 1));
    assert_eq!(detect_layout(&diagram(30, edges)), LayoutPreset::Compact);
  }

  #[test]
  fn pinned_presets_bypass_the_heuristic() {
    let small = diagram(3, vec![(0, 1)]);
    assert_eq!(resolve_layout(LayoutPreset::Organic, &small), LayoutPreset::Organic);
    assert_eq!(resolve_layout(LayoutPreset::Auto, &small), LayoutPreset::Default);
  }

  #[test]
  fn preset_configs_match_the_rasterizer_vocabulary() {
    assert!(layout_config(LayoutPreset::Default).is_none());
    assert!(layout_config(LayoutPreset::Auto).is_none());

    let compact = layout_config(LayoutPreset::Compact).unwrap();
    assert_eq!(compact["flowchart"]["nodeSpacing"], 30);
    assert_eq!(compact["flowchart"]["curve"], "basis");

    let organic = layout_config(LayoutPreset::Organic).unwrap();
    assert_eq!(organic["flowchart"]["defaultRenderer"], "elk");
    assert_eq!(organic["elk"]["nodePlacementStrategy"], "SIMPLE");

    let tree = layout_config(LayoutPreset::Tree).unwrap();
    assert_eq!(tree["elk"]["algorithm"], "mrtree");
  }
}
