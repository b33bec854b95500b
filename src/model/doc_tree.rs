use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::cell::{is_false, nullable_default};

/// A node of a project's document tree.
///
/// Children are reference counted: edits copy the vectors along the edited
/// path and share every other subtree with the previous snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DocNode {
    Folder {
        name: String,
        #[serde(default, deserialize_with = "nullable_default")]
        children: Arc<Vec<DocNode>>,
    },
    File {
        name: String,
        /// Storage path of the uploaded object
        #[serde(default)]
        value: String,
        /// Hidden from non-admin viewers. The backend spells the key `isHIdden`.
        #[serde(rename = "isHIdden", default, skip_serializing_if = "is_false")]
        hidden: bool,
    },
}

impl DocNode {
    pub fn folder(name: impl Into<String>) -> Self {
        DocNode::Folder {
            name: name.into(),
            children: Arc::new(Vec::new()),
        }
    }

    pub fn file(name: impl Into<String>, value: impl Into<String>) -> Self {
        DocNode::File {
            name: name.into(),
            value: value.into(),
            hidden: false,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            DocNode::Folder { name, .. } | DocNode::File { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, DocNode::Folder { .. })
    }

    pub fn is_hidden(&self) -> bool {
        matches!(self, DocNode::File { hidden: true, .. })
    }

    pub fn children(&self) -> &[DocNode] {
        match self {
            DocNode::Folder { children, .. } => children,
            DocNode::File { .. } => &[],
        }
    }
}

/// A file to attach to the tree: display name plus storage path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    pub name: String,
    pub value: String,
}

/// The root level of a project's document tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocTree {
    roots: Arc<Vec<DocNode>>,
}

impl DocTree {
    pub fn new() -> Self {
        DocTree::default()
    }

    pub fn from_nodes(nodes: Vec<DocNode>) -> Self {
        DocTree {
            roots: Arc::new(nodes),
        }
    }

    pub fn roots(&self) -> &[DocNode] {
        &self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Whether both trees are the very same snapshot (not merely equal)
    pub fn same_snapshot(&self, other: &DocTree) -> bool {
        Arc::ptr_eq(&self.roots, &other.roots)
    }

    pub(crate) fn roots_arc_mut(&mut self) -> &mut Arc<Vec<DocNode>> {
        &mut self.roots
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_backend_tree() {
        let raw = json!([
            { "name": "Drawings", "type": "folder", "children": [
                { "name": "plan.pdf", "type": "file", "value": "projects/p1/docs/Drawings/plan.pdf", "isHIdden": true }
            ]},
            { "name": "Empty", "type": "folder" },
            { "name": "notes.txt", "type": "file", "value": "projects/p1/docs/notes.txt" }
        ]);
        let tree: DocTree = serde_json::from_value(raw).unwrap();
        assert_eq!(tree.roots().len(), 3);
        assert!(tree.roots()[0].is_folder());
        assert!(tree.roots()[0].children()[0].is_hidden());
        // Folder without children reads as an empty folder
        assert!(tree.roots()[1].children().is_empty());
        assert!(!tree.roots()[2].is_hidden());
    }

    #[test]
    fn test_serialize_shape() {
        let tree = DocTree::from_nodes(vec![DocNode::folder("Reports")]);
        assert_eq!(
            serde_json::to_value(&tree).unwrap(),
            json!([{ "type": "folder", "name": "Reports", "children": [] }])
        );
        let file = DocNode::file("a.pdf", "x/a.pdf");
        // Visible files carry no hidden flag
        assert_eq!(
            serde_json::to_value(&file).unwrap(),
            json!({ "type": "file", "name": "a.pdf", "value": "x/a.pdf" })
        );
    }

    #[test]
    fn test_files_have_no_children() {
        assert!(DocNode::file("a", "b").children().is_empty());
    }
}
