//! Structural payload validators and format sniffing.
//!
//! Every raw body, wherever it came from, passes through here before it is
//! allowed near the normalizer. Validators walk `serde_json::Value` by hand
//! so failures carry the dotted/indexed path to the offending value instead
//! of a serde type error.

pub mod canvas_xml;
pub mod page_doc;
pub mod tree_doc;

pub use page_doc::PagePayload;

use crate::error::{PayloadShape, SourceError};
use crate::figjam::TreeFile;
use serde_json::{Map, Value};

/// Caller's claim about the wire shape of a textual payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
  /// Sniff the shape from the text.
  #[default]
  Auto,
  /// The payload must be a JSON tree document.
  Tree,
  /// The payload must be the structured page-list shape (canvas XML).
  Pages,
}

impl std::str::FromStr for FormatHint {
  type Err = String;

  fn from_str(value: &str) -> Result<Self, Self::Err> {
    match value.to_ascii_lowercase().as_str() {
      "auto" => Ok(FormatHint::Auto),
      "tree" => Ok(FormatHint::Tree),
      "pages" => Ok(FormatHint::Pages),
      other => Err(format!(
        "unknown format \"{other}\". Format must be one of: auto, tree, pages."
      )),
    }
  }
}

/// A validated payload, tagged with the shape it resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum SniffedPayload {
  /// A tree document, still to be walked by the tree parser.
  Tree(TreeFile),
  /// A page-list document in canonical record shapes.
  Pages(PagePayload),
}

/// True when a parsed JSON value looks like a tree document: a `document`
/// object carrying string `id` and `type`.
fn looks_like_tree(value: &Value) -> bool {
  value
    .get("document")
    .and_then(Value::as_object)
    .is_some_and(|document| {
      document.get("id").is_some_and(Value::is_string)
        && document.get("type").is_some_and(Value::is_string)
    })
}

/// Resolves a textual payload into a validated shape.
///
/// Leading `<` means canvas XML (rejected outright under a tree-only hint);
/// anything else must parse as JSON. JSON under a pages-only hint fails
/// fast, and auto-detection accepts JSON only when it looks tree-shaped.
pub fn ingest_payload(
  raw: &str,
  origin: &str,
  hint: FormatHint,
) -> Result<SniffedPayload, SourceError> {
  let trimmed = raw.trim();
  if trimmed.is_empty() {
    return Err(SourceError::InvalidInput(format!(
      "No input received from {origin}."
    )));
  }

  if trimmed.starts_with('<') {
    if hint == FormatHint::Tree {
      return Err(SourceError::InvalidInput(format!(
        "{origin} contains XML, but a tree-format JSON document was requested."
      )));
    }
    let document = canvas_xml::transcode(trimmed).map_err(|detail| SourceError::Malformed {
      format: "XML",
      origin: origin.to_string(),
      detail,
    })?;
    return Ok(SniffedPayload::Pages(document));
  }

  let value: Value = serde_json::from_str(trimmed).map_err(|error| SourceError::Malformed {
    format: "JSON",
    origin: origin.to_string(),
    detail: error.to_string(),
  })?;

  match hint {
    FormatHint::Tree => Ok(SniffedPayload::Tree(tree_doc::validate_tree(&value)?)),
    FormatHint::Pages => Err(SourceError::InvalidInput(format!(
      "{origin} contains JSON, but the pages format is canvas XML."
    ))),
    FormatHint::Auto => {
      if looks_like_tree(&value) {
        Ok(SniffedPayload::Tree(tree_doc::validate_tree(&value)?))
      } else {
        Err(SourceError::InvalidInput(format!(
          "cannot auto-detect the payload shape of {origin}. Expected a tree-format JSON \
           document or canvas XML; pass --format to disambiguate."
        )))
      }
    }
  }
}

// Shared hand-rolled checks used by both validators. Each returns the
// expected view of the value or a path-qualified error.

pub(crate) fn expect_object<'a>(
  shape: PayloadShape,
  value: &'a Value,
  path: &str,
) -> Result<&'a Map<String, Value>, SourceError> {
  value
    .as_object()
    .ok_or_else(|| SourceError::payload(shape, path, "expected an object."))
}

pub(crate) fn expect_array<'a>(
  shape: PayloadShape,
  value: &'a Value,
  path: &str,
) -> Result<&'a Vec<Value>, SourceError> {
  value
    .as_array()
    .ok_or_else(|| SourceError::payload(shape, path, "expected an array."))
}

pub(crate) fn expect_str<'a>(
  shape: PayloadShape,
  value: &'a Value,
  path: &str,
) -> Result<&'a str, SourceError> {
  value
    .as_str()
    .ok_or_else(|| SourceError::payload(shape, path, "expected a string."))
}

pub(crate) fn required_str(
  shape: PayloadShape,
  object: &Map<String, Value>,
  key: &str,
  path: &str,
) -> Result<String, SourceError> {
  let value = object
    .get(key)
    .ok_or_else(|| SourceError::payload(shape, format!("{path}.{key}"), "expected a string."))?;
  Ok(expect_str(shape, value, &format!("{path}.{key}"))?.to_string())
}

pub(crate) fn optional_str(
  shape: PayloadShape,
  object: &Map<String, Value>,
  key: &str,
  path: &str,
) -> Result<Option<String>, SourceError> {
  match object.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(value) => Ok(Some(
      expect_str(shape, value, &format!("{path}.{key}"))?.to_string(),
    )),
  }
}

pub(crate) fn optional_f64(
  shape: PayloadShape,
  object: &Map<String, Value>,
  key: &str,
  path: &str,
) -> Result<Option<f64>, SourceError> {
  match object.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(value) => value
      .as_f64()
      .filter(|number| number.is_finite())
      .map(Some)
      .ok_or_else(|| {
        SourceError::payload(shape, format!("{path}.{key}"), "expected a finite number.")
      }),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn blank_input_is_rejected_with_the_origin() {
    let error = ingest_payload("  \n ", "stdin", FormatHint::Auto).unwrap_err();
    assert_eq!(error.to_string(), "No input received from stdin.");
  }

  #[test]
  fn xml_under_a_tree_hint_is_rejected() {
    let error = ingest_payload("<canvas id=\"c\"/>", "file \"x.xml\"", FormatHint::Tree)
      .unwrap_err();
    assert!(error.to_string().contains("contains XML"));
  }

  #[test]
  fn json_under_a_pages_hint_is_rejected() {
    let error = ingest_payload("{\"pages\": []}", "stdin", FormatHint::Pages).unwrap_err();
    assert!(error.to_string().contains("canvas XML"));
  }

  #[test]
  fn auto_detects_tree_shaped_json() {
    let raw = r#"{"name":"Flow","document":{"id":"0:0","type":"DOCUMENT","children":[]}}"#;
    match ingest_payload(raw, "stdin", FormatHint::Auto).unwrap() {
      SniffedPayload::Tree(file) => assert_eq!(file.name.as_deref(), Some("Flow")),
      other => panic!("expected a tree payload, got {other:?}"),
    }
  }

  #[test]
  fn auto_detects_canvas_xml() {
    let raw = r#"<canvas id="c1" name="Main"><shape-with-text id="a" name="SQUARE">Start</shape-with-text></canvas>"#;
    match ingest_payload(raw, "stdin", FormatHint::Auto).unwrap() {
      SniffedPayload::Pages(document) => {
        assert_eq!(document.pages.len(), 1);
        assert_eq!(document.pages[0].page_name, "Main");
      }
      other => panic!("expected a pages payload, got {other:?}"),
    }
  }

  #[test]
  fn ambiguous_json_names_both_shapes() {
    let error = ingest_payload("{\"hello\": 1}", "stdin", FormatHint::Auto).unwrap_err();
    let message = error.to_string();
    assert!(message.contains("cannot auto-detect"));
    assert!(message.contains("tree-format JSON"));
    assert!(message.contains("canvas XML"));
  }

  #[test]
  fn unparseable_json_reports_the_origin() {
    let error = ingest_payload("{not json", "file \"broken.json\"", FormatHint::Auto).unwrap_err();
    assert!(matches!(
      error,
      SourceError::Malformed { format: "JSON", .. }
    ));
    assert!(error.to_string().contains("broken.json"));
  }
}
