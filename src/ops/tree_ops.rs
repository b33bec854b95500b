use std::sync::Arc;

use crate::model::doc_tree::{DocNode, DocTree, NewFile};
use crate::model::user::Role;

/// Error type for document tree operations
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum TreeError {
    #[error("path not found: {0}")]
    PathNotFound(String),
    #[error("invalid folder name: {0:?}")]
    InvalidName(String),
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Join path parts with `/`, dropping empty parts.
pub fn join_path<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(AsRef::as_ref)
        .filter(|p| !p.is_empty())
        .collect::<Vec<&str>>()
        .join("/")
}

/// Split a `/`-separated path into folder names. The empty path is the root.
pub fn split_path(path: &str) -> Vec<String> {
    path.split('/')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Storage prefix for files uploaded into the folder at `path`
pub fn upload_prefix<S: AsRef<str>>(base: &str, path: &[S]) -> String {
    let folder = join_path(path);
    join_path(&[base, folder.as_str()])
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

/// The children of the folder at `path` (the roots for the empty path).
/// Each segment resolves to the first folder with that name.
fn folder_at<'a, S: AsRef<str>>(nodes: &'a [DocNode], path: &[S]) -> Option<&'a [DocNode]> {
    let Some((head, rest)) = path.split_first() else {
        return Some(nodes);
    };
    let folder = nodes
        .iter()
        .find(|n| n.is_folder() && n.name() == head.as_ref())?;
    folder_at(folder.children(), rest)
}

/// Mutable children of the folder at `path`, copying each vector on the
/// way down that is still shared with another snapshot.
fn folder_at_mut<'a, S: AsRef<str>>(
    nodes: &'a mut Arc<Vec<DocNode>>,
    path: &[S],
) -> Option<&'a mut Arc<Vec<DocNode>>> {
    let Some((head, rest)) = path.split_first() else {
        return Some(nodes);
    };
    let idx = nodes
        .iter()
        .position(|n| n.is_folder() && n.name() == head.as_ref())?;
    match &mut Arc::make_mut(nodes)[idx] {
        DocNode::Folder { children, .. } => folder_at_mut(children, rest),
        DocNode::File { .. } => None,
    }
}

/// The node at `path`: folders by name for every segment but the last,
/// which may name a file or a folder.
pub fn find_node<'a, S: AsRef<str>>(tree: &'a DocTree, path: &[S]) -> Option<&'a DocNode> {
    let (last, parents) = path.split_last()?;
    folder_at(tree.roots(), parents)?
        .iter()
        .find(|n| n.name() == last.as_ref())
}

/// Index of the file named by the last segment of `path`, if the whole path resolves.
fn file_index<S: AsRef<str>>(tree: &DocTree, path: &[S]) -> Option<usize> {
    let (last, parents) = path.split_last()?;
    folder_at(tree.roots(), parents)?
        .iter()
        .position(|n| !n.is_folder() && n.name() == last.as_ref())
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

fn ensure_folder<S: AsRef<str>>(tree: &DocTree, path: &[S]) -> Result<(), TreeError> {
    match folder_at(tree.roots(), path) {
        Some(_) => Ok(()),
        None => Err(TreeError::PathNotFound(join_path(path))),
    }
}

/// Trim a folder name typed by a user. Blank names and names containing the
/// path separator are refused.
pub fn folder_name(raw: &str) -> Result<&str, TreeError> {
    let name = raw.trim();
    if name.is_empty() || name.contains('/') {
        return Err(TreeError::InvalidName(raw.to_string()));
    }
    Ok(name)
}

/// Append an empty folder named `name` under the folder at `path`.
pub fn add_folder<S: AsRef<str>>(
    tree: &DocTree,
    path: &[S],
    name: &str,
) -> Result<DocTree, TreeError> {
    ensure_folder(tree, path)?;
    let mut next = tree.clone();
    if let Some(children) = folder_at_mut(next.roots_arc_mut(), path) {
        Arc::make_mut(children).push(DocNode::folder(name));
    }
    tracing::debug!(path = %join_path(path), name, "folder added");
    Ok(next)
}

/// Append file nodes under the folder at `path`, in order.
pub fn add_files<S: AsRef<str>>(
    tree: &DocTree,
    path: &[S],
    files: &[NewFile],
) -> Result<DocTree, TreeError> {
    ensure_folder(tree, path)?;
    let mut next = tree.clone();
    if let Some(children) = folder_at_mut(next.roots_arc_mut(), path) {
        Arc::make_mut(children).extend(
            files
                .iter()
                .map(|f| DocNode::file(f.name.clone(), f.value.clone())),
        );
    }
    tracing::debug!(path = %join_path(path), count = files.len(), "files added");
    Ok(next)
}

/// Remove the file named by the last segment of `path`.
///
/// When nothing matches the input tree comes back as is.
pub fn remove_file<S: AsRef<str>>(tree: &DocTree, path: &[S]) -> DocTree {
    let Some(idx) = file_index(tree, path) else {
        return tree.clone();
    };
    let parents = &path[..path.len() - 1];
    let mut next = tree.clone();
    if let Some(children) = folder_at_mut(next.roots_arc_mut(), parents) {
        Arc::make_mut(children).remove(idx);
    }
    tracing::debug!(path = %join_path(path), "file removed");
    next
}

/// Set the hidden flag on the file named by the last segment of `path`.
///
/// When nothing matches the input tree comes back as is.
pub fn set_file_hidden<S: AsRef<str>>(tree: &DocTree, path: &[S], hidden: bool) -> DocTree {
    let Some(idx) = file_index(tree, path) else {
        return tree.clone();
    };
    let parents = &path[..path.len() - 1];
    let mut next = tree.clone();
    if let Some(children) = folder_at_mut(next.roots_arc_mut(), parents)
        && let DocNode::File { hidden: flag, .. } = &mut Arc::make_mut(children)[idx]
    {
        *flag = hidden;
    }
    next
}

// ---------------------------------------------------------------------------
// Visibility
// ---------------------------------------------------------------------------

/// The tree as `role` sees it: non-admins don't see hidden files.
pub fn visible_tree(tree: &DocTree, role: Role) -> DocTree {
    match role {
        Role::Admin => tree.clone(),
        Role::User => DocTree::from_nodes(visible_nodes(tree.roots())),
    }
}

fn visible_nodes(nodes: &[DocNode]) -> Vec<DocNode> {
    nodes
        .iter()
        .filter(|n| !n.is_hidden())
        .map(|n| match n {
            DocNode::Folder { name, children } => DocNode::Folder {
                name: name.clone(),
                children: Arc::new(visible_nodes(children)),
            },
            DocNode::File { .. } => n.clone(),
        })
        .collect()
}
