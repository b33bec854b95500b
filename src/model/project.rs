use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::cell::nullable_default;
use super::doc_tree::DocTree;

/// Lifecycle state of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectStatus {
    #[default]
    Ready,
    InProgress,
    Completed,
    Deleted,
}

impl ProjectStatus {
    pub const ALL: [ProjectStatus; 4] = [
        ProjectStatus::Ready,
        ProjectStatus::InProgress,
        ProjectStatus::Completed,
        ProjectStatus::Deleted,
    ];

    /// Human label, as offered in the status picker
    pub fn label(self) -> &'static str {
        match self {
            ProjectStatus::Ready => "Ready",
            ProjectStatus::InProgress => "In Progress",
            ProjectStatus::Completed => "Completed",
            ProjectStatus::Deleted => "Deleted",
        }
    }

    /// Parse the wire form (`IN_PROGRESS`) or the label (`in progress`)
    pub fn parse_status(s: &str) -> Option<Self> {
        let norm = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "READY" => Some(ProjectStatus::Ready),
            "IN_PROGRESS" => Some(ProjectStatus::InProgress),
            "COMPLETED" => Some(ProjectStatus::Completed),
            "DELETED" => Some(ProjectStatus::Deleted),
            _ => None,
        }
    }
}

/// A project document with its document tree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, deserialize_with = "nullable_default")]
    pub docs: DocTree,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
