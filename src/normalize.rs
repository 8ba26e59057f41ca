//! Normalization of raw ingested documents into the canonical model.

use crate::figjam::tree_walk;
use crate::model::{DiagramDocument, SourceShape};
use crate::sources::RawDocument;

/// Converts a validated raw document into the source-agnostic model.
///
/// Tree documents are walked recursively; page-list documents already use
/// the canonical record shapes and copy over structurally.
pub fn normalize(raw: RawDocument) -> DiagramDocument {
  match raw {
    RawDocument::Tree { file_key, file } => DiagramDocument {
      shape: SourceShape::Tree,
      file_key,
      file_name: file.name.clone(),
      pages: tree_walk::parse_pages(&file),
    },
    RawDocument::Pages { file_key, document } => DiagramDocument {
      shape: SourceShape::Pages,
      file_key,
      file_name: document.file_name,
      pages: document.pages,
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::figjam::{TreeFile, TreeNode};
  use crate::model::PageGraph;
  use crate::payload::PagePayload;

  #[test]
  fn tree_documents_are_walked_into_pages() {
    let raw = RawDocument::Tree {
      file_key: "key123".into(),
      file: TreeFile {
        name: Some("Flow".into()),
        document: TreeNode {
          id: "0:0".into(),
          node_type: "DOCUMENT".into(),
          children: vec![TreeNode {
            id: "1:1".into(),
            node_type: "CANVAS".into(),
            name: Some("Main".into()),
            ..TreeNode::default()
          }],
          ..TreeNode::default()
        },
      },
    };
    let document = normalize(raw);
    assert_eq!(document.shape, SourceShape::Tree);
    assert_eq!(document.file_key, "key123");
    assert_eq!(document.file_name.as_deref(), Some("Flow"));
    assert_eq!(document.pages.len(), 1);
    assert_eq!(document.pages[0].page_name, "Main");
  }

  #[test]
  fn page_list_documents_copy_structurally() {
    let raw = RawDocument::Pages {
      file_key: "key123".into(),
      document: PagePayload {
        file_name: Some("Flow".into()),
        pages: vec![PageGraph {
          page_id: "p1".into(),
          page_name: "Main".into(),
          diagram: Default::default(),
        }],
      },
    };
    let document = normalize(raw);
    assert_eq!(document.shape, SourceShape::Pages);
    assert_eq!(document.pages[0].page_id, "p1");
  }
}
