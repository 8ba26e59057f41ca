//! Validator for the tree-document wire shape.
//!
//! Converts untyped JSON into [`TreeFile`] without coercion: a wrong type
//! anywhere is a path-qualified error rooted at `file`, never a silent
//! default.

use crate::error::{PayloadShape, SourceError};
use crate::figjam::{BoundingBox, Endpoint, TreeFile, TreeNode};
use crate::payload::{expect_array, expect_object, optional_str, required_str};
use serde_json::{Map, Value};

const SHAPE: PayloadShape = PayloadShape::Tree;

/// Validates a parsed JSON value as a tree document.
pub fn validate_tree(value: &Value) -> Result<TreeFile, SourceError> {
  let root = expect_object(SHAPE, value, "file")?;
  let name = optional_str(SHAPE, root, "name", "file")?;
  let document = root
    .get("document")
    .ok_or_else(|| SourceError::payload(SHAPE, "file.document", "expected an object."))?;
  Ok(TreeFile {
    name,
    document: validate_node(document, "file.document")?,
  })
}

fn validate_node(value: &Value, path: &str) -> Result<TreeNode, SourceError> {
  let object = expect_object(SHAPE, value, path)?;

  let id = required_str(SHAPE, object, "id", path)?;
  let node_type = required_str(SHAPE, object, "type", path)?;
  let name = optional_str(SHAPE, object, "name", path)?;
  let characters = optional_str(SHAPE, object, "characters", path)?;
  let shape_type = optional_str(SHAPE, object, "shapeType", path)?;
  let connector_start = optional_endpoint(object, "connectorStart", path)?;
  let connector_end = optional_endpoint(object, "connectorEnd", path)?;
  let connector_start_stroke_cap = optional_str(SHAPE, object, "connectorStartStrokeCap", path)?;
  let connector_end_stroke_cap = optional_str(SHAPE, object, "connectorEndStrokeCap", path)?;
  let bounding_box = optional_bounding_box(object, path)?;

  let children = match object.get("children") {
    None | Some(Value::Null) => Vec::new(),
    Some(raw) => {
      let items = expect_array(SHAPE, raw, &format!("{path}.children"))?;
      items
        .iter()
        .enumerate()
        .map(|(index, child)| validate_node(child, &format!("{path}.children[{index}]")))
        .collect::<Result<Vec<_>, _>>()?
    }
  };

  Ok(TreeNode {
    id,
    node_type,
    name,
    children,
    characters,
    shape_type,
    connector_start,
    connector_end,
    connector_start_stroke_cap,
    connector_end_stroke_cap,
    bounding_box,
  })
}

fn optional_endpoint(
  object: &Map<String, Value>,
  key: &str,
  path: &str,
) -> Result<Option<Endpoint>, SourceError> {
  match object.get(key) {
    None | Some(Value::Null) => Ok(None),
    Some(raw) => {
      let endpoint_path = format!("{path}.{key}");
      let endpoint = expect_object(SHAPE, raw, &endpoint_path)?;
      Ok(Some(Endpoint {
        endpoint_node_id: optional_str(SHAPE, endpoint, "endpointNodeId", &endpoint_path)?,
      }))
    }
  }
}

fn optional_bounding_box(
  object: &Map<String, Value>,
  path: &str,
) -> Result<Option<BoundingBox>, SourceError> {
  match object.get("absoluteBoundingBox") {
    None | Some(Value::Null) => Ok(None),
    Some(raw) => {
      let box_path = format!("{path}.absoluteBoundingBox");
      let bounds = expect_object(SHAPE, raw, &box_path)?;
      let field = |key: &str| -> Result<f64, SourceError> {
        bounds
          .get(key)
          .and_then(Value::as_f64)
          .filter(|number| number.is_finite())
          .ok_or_else(|| {
            SourceError::payload(SHAPE, format!("{box_path}.{key}"), "expected a finite number.")
          })
      };
      Ok(Some(BoundingBox {
        x: field("x")?,
        y: field("y")?,
        width: field("width")?,
        height: field("height")?,
      }))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn validates_a_minimal_document() {
    let value = json!({
      "name": "Flow",
      "document": {
        "id": "0:0",
        "type": "DOCUMENT",
        "children": [
          { "id": "1:1", "type": "CANVAS", "name": "Page 1", "children": [] }
        ]
      }
    });
    let file = validate_tree(&value).unwrap();
    assert_eq!(file.name.as_deref(), Some("Flow"));
    assert_eq!(file.document.children.len(), 1);
    assert_eq!(file.document.children[0].node_type, "CANVAS");
  }

  #[test]
  fn carries_connector_and_geometry_fields() {
    let value = json!({
      "document": {
        "id": "0:0",
        "type": "DOCUMENT",
        "children": [{
          "id": "2:1",
          "type": "CONNECTOR",
          "connectorStart": { "endpointNodeId": "a" },
          "connectorEnd": { "endpointNodeId": "b" },
          "connectorEndStrokeCap": "ARROW_LINES",
          "absoluteBoundingBox": { "x": 1.0, "y": 2.0, "width": 3.0, "height": 4.0 }
        }]
      }
    });
    let file = validate_tree(&value).unwrap();
    let connector = &file.document.children[0];
    assert_eq!(
      connector
        .connector_start
        .as_ref()
        .and_then(|endpoint| endpoint.endpoint_node_id.as_deref()),
      Some("a")
    );
    assert_eq!(connector.connector_end_stroke_cap.as_deref(), Some("ARROW_LINES"));
    assert_eq!(connector.bounding_box.unwrap().width, 3.0);
  }

  #[test]
  fn non_object_root_is_rooted_at_file() {
    let error = validate_tree(&json!([1, 2])).unwrap_err();
    assert_eq!(
      error.to_string(),
      "invalid tree payload at file: expected an object."
    );
  }

  #[test]
  fn missing_document_is_reported() {
    let error = validate_tree(&json!({ "name": "Flow" })).unwrap_err();
    assert!(error.to_string().contains("file.document"));
  }

  #[test]
  fn nested_type_errors_carry_the_child_index() {
    let value = json!({
      "document": {
        "id": "0:0",
        "type": "DOCUMENT",
        "children": [
          { "id": "1:1", "type": "CANVAS", "children": [{ "id": 7, "type": "STICKY" }] }
        ]
      }
    });
    let error = validate_tree(&value).unwrap_err();
    assert!(error
      .to_string()
      .contains("file.document.children[0].children[0].id: expected a string."));
  }

  #[test]
  fn numbers_are_not_coerced_from_strings() {
    let value = json!({
      "document": {
        "id": "0:0",
        "type": "DOCUMENT",
        "children": [{
          "id": "1:1",
          "type": "SHAPE_WITH_TEXT",
          "absoluteBoundingBox": { "x": "10", "y": 0, "width": 1, "height": 1 }
        }]
      }
    });
    let error = validate_tree(&value).unwrap_err();
    assert!(error.to_string().contains("absoluteBoundingBox.x"));
  }
}
