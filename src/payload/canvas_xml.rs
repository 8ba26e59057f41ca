//! Transcoder from canvas XML to the page-list document shape.
//!
//! The structured endpoint may answer with an XML fragment of repeated
//! root-level `<canvas>` elements. Each canvas transcodes 1:1 into a page;
//! its `<shape-with-text>`, `<connector>`, `<sticky>`, and `<section>`
//! children become the canonical record shapes. Stroke-cap attributes in
//! this dialect classify as arrowheads by the substring `ARROW`.

use crate::model::{EdgeKind, FlowDiagram, GraphEdge, GraphNode, PageGraph, Section, StickyNote};
use crate::payload::PagePayload;
use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;
use std::collections::HashMap;

/// One parsed element with its attributes, accumulated text, and children.
#[derive(Debug, Default)]
struct XmlElement {
  name: String,
  attrs: HashMap<String, String>,
  text: String,
  children: Vec<XmlElement>,
}

impl XmlElement {
  fn attr(&self, key: &str) -> Option<&str> {
    self.attrs.get(key).map(String::as_str)
  }

  fn text(&self) -> &str {
    self.text.trim()
  }
}

fn element_from_start(e: &quick_xml::events::BytesStart<'_>) -> Result<XmlElement, String> {
  let mut element = XmlElement {
    name: String::from_utf8_lossy(e.name().as_ref()).to_string(),
    ..XmlElement::default()
  };
  for attr in e.attributes() {
    let attr = attr.map_err(|error| error.to_string())?;
    let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
    let value = String::from_utf8_lossy(&attr.value).to_string();
    let value = unescape(&value).map(|cow| cow.into_owned()).unwrap_or(value);
    element.attrs.insert(key, value);
  }
  Ok(element)
}

/// Parses an XML fragment into its top-level elements.
fn parse_fragment(xml: &str) -> Result<Vec<XmlElement>, String> {
  let mut reader = Reader::from_str(xml);
  reader.config_mut().trim_text_start = true;
  reader.config_mut().trim_text_end = true;

  let mut stack: Vec<XmlElement> = Vec::new();
  let mut roots: Vec<XmlElement> = Vec::new();

  loop {
    match reader.read_event() {
      Ok(Event::Start(e)) => {
        stack.push(element_from_start(&e)?);
      }
      Ok(Event::Empty(e)) => {
        let element = element_from_start(&e)?;
        match stack.last_mut() {
          Some(parent) => parent.children.push(element),
          None => roots.push(element),
        }
      }
      Ok(Event::Text(e)) => {
        if let Some(element) = stack.last_mut() {
          let raw = String::from_utf8_lossy(e.as_ref()).into_owned();
          let text = unescape(&raw).map(|cow| cow.into_owned()).unwrap_or(raw);
          if !text.trim().is_empty() {
            if !element.text.is_empty() {
              element.text.push(' ');
            }
            element.text.push_str(text.trim());
          }
        }
      }
      Ok(Event::End(_)) => {
        if let Some(element) = stack.pop() {
          match stack.last_mut() {
            Some(parent) => parent.children.push(element),
            None => roots.push(element),
          }
        }
      }
      Ok(Event::Eof) => break,
      Err(error) => return Err(error.to_string()),
      _ => {}
    }
  }

  Ok(roots)
}

fn cap_is_arrow(cap: Option<&str>) -> bool {
  cap.is_some_and(|cap| cap.contains("ARROW"))
}

fn parse_float(raw: Option<&str>) -> Option<f64> {
  raw
    .and_then(|value| value.trim().parse::<f64>().ok())
    .filter(|number| number.is_finite())
}

fn to_node(element: &XmlElement) -> Option<GraphNode> {
  let source_id = element.attr("id").filter(|id| !id.is_empty())?;
  let name = element.attr("name").filter(|name| !name.is_empty());
  let text = element.text();
  let label = if !text.is_empty() {
    text.to_string()
  } else {
    name.unwrap_or(source_id).to_string()
  };
  Some(GraphNode {
    source_id: source_id.to_string(),
    label,
    shape_type: name.map(str::to_string),
    x: parse_float(element.attr("x")),
    y: parse_float(element.attr("y")),
    section_id: None,
  })
}

fn to_edge(element: &XmlElement) -> Option<GraphEdge> {
  let source_id = element.attr("connectorStart").filter(|id| !id.is_empty())?;
  let target_id = element.attr("connectorEnd").filter(|id| !id.is_empty())?;
  let arrow_start = cap_is_arrow(element.attr("connectorStartCap"));
  let arrow_end = cap_is_arrow(element.attr("connectorEndCap"));
  let kind = match (arrow_start, arrow_end) {
    (true, true) => EdgeKind::Bidirectional,
    (true, false) | (false, true) => EdgeKind::Arrow,
    (false, false) => EdgeKind::Line,
  };
  let text = element.text();
  Some(GraphEdge {
    source_id: source_id.to_string(),
    target_id: target_id.to_string(),
    label: (!text.is_empty()).then(|| text.to_string()),
    kind,
  })
}

fn to_sticky(element: &XmlElement) -> Option<StickyNote> {
  let source_id = element.attr("id").filter(|id| !id.is_empty())?;
  let text = element.text();
  if text.is_empty() {
    return None;
  }
  Some(StickyNote {
    source_id: source_id.to_string(),
    text: text.to_string(),
  })
}

fn to_section(element: &XmlElement) -> Option<Section> {
  let source_id = element.attr("id").filter(|id| !id.is_empty())?;
  let label = element.attr("name").filter(|name| !name.is_empty())?;
  let node_ids = element
    .children
    .iter()
    .filter(|child| child.name == "section-node")
    .filter_map(|child| {
      let id = child.text();
      (!id.is_empty()).then(|| id.to_string())
    })
    .collect();
  Some(Section {
    source_id: source_id.to_string(),
    label: label.to_string(),
    node_ids,
  })
}

fn to_page(canvas: &XmlElement, index: usize) -> PageGraph {
  let mut diagram = FlowDiagram::default();
  for child in &canvas.children {
    match child.name.as_str() {
      "shape-with-text" => diagram.nodes.extend(to_node(child)),
      "connector" => diagram.edges.extend(to_edge(child)),
      "sticky" => diagram.sticky_notes.extend(to_sticky(child)),
      "section" => diagram.sections.extend(to_section(child)),
      _ => {}
    }
  }
  PageGraph {
    page_id: canvas
      .attr("id")
      .filter(|id| !id.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| format!("canvas-{}", index + 1)),
    page_name: canvas
      .attr("name")
      .filter(|name| !name.is_empty())
      .map(str::to_string)
      .unwrap_or_else(|| format!("Canvas {}", index + 1)),
    diagram,
  }
}

/// Transcodes a canvas-XML fragment into a page-list document.
pub fn transcode(xml: &str) -> Result<PagePayload, String> {
  let roots = parse_fragment(xml)?;
  let canvases: Vec<&XmlElement> = roots.iter().filter(|root| root.name == "canvas").collect();
  if canvases.is_empty() {
    return Err("XML payload without <canvas> root element".to_string());
  }

  let pages: Vec<PageGraph> = canvases
    .iter()
    .enumerate()
    .map(|(index, canvas)| to_page(canvas, index))
    .collect();

  let file_name = if pages.len() == 1 {
    pages[0].page_name.clone()
  } else {
    format!("FigJam MCP ({} canvases)", pages.len())
  };

  Ok(PagePayload {
    file_name: Some(file_name),
    pages,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  const SAMPLE: &str = r#"
    <canvas id="c1" name="Main">
      <shape-with-text id="a" name="ROUNDED_RECTANGLE" x="10" y="20">Start</shape-with-text>
      <shape-with-text id="b" name="DIAMOND">Decide?</shape-with-text>
      <connector connectorStart="a" connectorEnd="b" connectorEndCap="ARROW_LINES">go</connector>
      <sticky id="n1">Remember the edge case</sticky>
      <section id="s1" name="Phase 1">
        <section-node>a</section-node>
        <section-node>b</section-node>
      </section>
    </canvas>
  "#;

  #[test]
  fn transcodes_a_full_canvas() {
    let document = transcode(SAMPLE).unwrap();
    assert_eq!(document.file_name.as_deref(), Some("Main"));
    assert_eq!(document.pages.len(), 1);

    let diagram = &document.pages[0].diagram;
    assert_eq!(diagram.nodes.len(), 2);
    assert_eq!(diagram.nodes[0].label, "Start");
    assert_eq!(diagram.nodes[0].shape_type.as_deref(), Some("ROUNDED_RECTANGLE"));
    assert_eq!(diagram.nodes[0].x, Some(10.0));
    assert_eq!(diagram.edges[0].kind, EdgeKind::Arrow);
    assert_eq!(diagram.edges[0].label.as_deref(), Some("go"));
    assert_eq!(diagram.sticky_notes[0].text, "Remember the edge case");
    assert_eq!(diagram.sections[0].node_ids, vec!["a".to_string(), "b".to_string()]);
  }

  #[test]
  fn multiple_canvases_synthesize_a_file_name() {
    let xml = r#"
      <canvas><shape-with-text id="a">A</shape-with-text></canvas>
      <canvas id="c2"><shape-with-text id="b">B</shape-with-text></canvas>
    "#;
    let document = transcode(xml).unwrap();
    assert_eq!(document.pages.len(), 2);
    assert_eq!(document.file_name.as_deref(), Some("FigJam MCP (2 canvases)"));
    assert_eq!(document.pages[0].page_id, "canvas-1");
    assert_eq!(document.pages[0].page_name, "Canvas 1");
    assert_eq!(document.pages[1].page_id, "c2");
  }

  #[test]
  fn caps_classify_by_arrow_substring() {
    let xml = r#"
      <canvas id="c1" name="Main">
        <shape-with-text id="a">A</shape-with-text>
        <shape-with-text id="b">B</shape-with-text>
        <connector connectorStart="a" connectorEnd="b"
                   connectorStartCap="TRIANGLE_ARROW" connectorEndCap="LINE_ARROW"/>
        <connector connectorStart="a" connectorEnd="b" connectorEndCap="ROUND"/>
      </canvas>
    "#;
    let diagram = &transcode(xml).unwrap().pages[0].diagram;
    assert_eq!(diagram.edges[0].kind, EdgeKind::Bidirectional);
    assert_eq!(diagram.edges[1].kind, EdgeKind::Line);
  }

  #[test]
  fn label_falls_back_to_name_then_id() {
    let xml = r#"
      <canvas id="c1" name="Main">
        <shape-with-text id="a" name="SQUARE"/>
        <shape-with-text id="b"/>
      </canvas>
    "#;
    let diagram = &transcode(xml).unwrap().pages[0].diagram;
    assert_eq!(diagram.nodes[0].label, "SQUARE");
    assert_eq!(diagram.nodes[1].label, "b");
  }

  #[test]
  fn records_missing_required_attributes_are_skipped() {
    let xml = r#"
      <canvas id="c1" name="Main">
        <shape-with-text>no id</shape-with-text>
        <connector connectorStart="a">half</connector>
        <sticky id="n1">   </sticky>
        <section id="s1"><section-node>a</section-node></section>
      </canvas>
    "#;
    let diagram = &transcode(xml).unwrap().pages[0].diagram;
    assert!(diagram.nodes.is_empty());
    assert!(diagram.edges.is_empty());
    assert!(diagram.sticky_notes.is_empty());
    assert!(diagram.sections.is_empty());
  }

  #[test]
  fn missing_canvas_root_is_an_error() {
    let error = transcode("<diagram><shape-with-text id=\"a\"/></diagram>").unwrap_err();
    assert!(error.contains("<canvas> root"));
  }

  #[test]
  fn entities_are_unescaped() {
    let xml = r#"<canvas id="c1" name="Main"><sticky id="n1">Fish &amp; chips</sticky></canvas>"#;
    let diagram = &transcode(xml).unwrap().pages[0].diagram;
    assert_eq!(diagram.sticky_notes[0].text, "Fish & chips");
  }
}
