//! Dotted-path patch applier.
//!
//! A patch sets one leaf of the tree and returns a new root. Only the objects
//! on the path from root to leaf are copied; every sibling branch is reused.
//! The applier is path-generic: list edits arrive as a whole replacement array
//! at the parent path.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::node::{Node, NodeMap};

/// A single field edit as sent by a section editor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, TS)]
#[ts(export, export_to = "../../bindings/page-editor.ts")]
pub struct FieldPatch {
    pub path: String,
    #[ts(type = "unknown")]
    pub value: serde_json::Value,
}

impl FieldPatch {
    pub fn new(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("invalid field path '{0}'")]
    InvalidPath(String),

    #[error("cannot descend into '{path}': found {found}, expected object")]
    NotAnObject { path: String, found: &'static str },
}

/// Parsed dot-delimited field path, e.g. `hero.headline`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: &str) -> Result<Self, PatchError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PatchError::InvalidPath(raw.to_string()));
        }
        let segments: Vec<String> = trimmed
            .split('.')
            .map(|segment| segment.trim().to_string())
            .collect();
        if segments.iter().any(String::is_empty) {
            return Err(PatchError::InvalidPath(raw.to_string()));
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn root(&self) -> &str {
        &self.segments[0]
    }

    /// True when one path is a prefix of the other (or they are equal).
    pub fn overlaps(&self, other: &FieldPath) -> bool {
        self.segments
            .iter()
            .zip(other.segments.iter())
            .all(|(a, b)| a == b)
    }

    fn prefix(&self, depth: usize) -> String {
        self.segments[..=depth].join(".")
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Set `value` at `path` below `root`, creating missing or null objects on
/// the way. Intermediate scalars and arrays are never overwritten.
pub fn set_path(root: &Node, path: &FieldPath, value: Node) -> Result<Node, PatchError> {
    assign(Some(root), path, 0, value)
}

fn assign(current: Option<&Node>, path: &FieldPath, depth: usize, value: Node) -> Result<Node, PatchError> {
    let Some(head) = path.segments.get(depth) else {
        return Ok(value);
    };

    let mut map: NodeMap = match current {
        None | Some(Node::Null) => NodeMap::new(),
        // Shallow copy: children are reference-counted.
        Some(Node::Object(map)) => (**map).clone(),
        Some(other) => {
            return Err(PatchError::NotAnObject {
                path: if depth == 0 {
                    "<root>".to_string()
                } else {
                    path.prefix(depth - 1)
                },
                found: other.kind(),
            })
        }
    };

    let child = assign(map.get(head), path, depth + 1, value)?;
    map.insert(head.clone(), child);
    Ok(Node::Object(Arc::new(map)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rejects_empty_segments() {
        assert!(FieldPath::parse("").is_err());
        assert!(FieldPath::parse("hero..headline").is_err());
        assert!(FieldPath::parse(".hero").is_err());
        assert!(FieldPath::parse("hero. .headline").is_err());
        assert_eq!(
            FieldPath::parse("hero.headline").unwrap().segments(),
            &["hero".to_string(), "headline".to_string()]
        );
    }

    #[test]
    fn test_parse_trims_segments() {
        let path = FieldPath::parse(" hero. headline ").unwrap();
        assert_eq!(path.segments(), &["hero".to_string(), "headline".to_string()]);
        assert_eq!(path.to_string(), "hero.headline");
    }

    #[test]
    fn test_overlaps() {
        let a = FieldPath::parse("hero").unwrap();
        let b = FieldPath::parse("hero.headline").unwrap();
        let c = FieldPath::parse("faq.title").unwrap();
        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!b.overlaps(&c));
    }

    #[test]
    fn test_set_path_creates_intermediates() {
        let root = Node::from(json!({}));
        let path = FieldPath::parse("pricing.tiers.basic").unwrap();
        let out = set_path(&root, &path, Node::from("9.99")).unwrap();
        assert_eq!(out.to_value(), json!({"pricing": {"tiers": {"basic": "9.99"}}}));
    }

    #[test]
    fn test_set_path_rejects_scalar_intermediate() {
        let root = Node::from(json!({"hero": {"headline": "x"}}));
        let path = FieldPath::parse("hero.headline.size").unwrap();
        let err = set_path(&root, &path, Node::from("big")).unwrap_err();
        assert_eq!(
            err,
            PatchError::NotAnObject {
                path: "hero.headline".to_string(),
                found: "string"
            }
        );
    }

    #[test]
    fn test_set_path_reuses_siblings() {
        let root = Node::from(json!({
            "hero": {"headline": "a", "subheadline": "b"},
            "faq": {"items": [{"question": "q"}]},
        }));
        let path = FieldPath::parse("hero.headline").unwrap();
        let out = set_path(&root, &path, Node::from("new")).unwrap();

        assert!(out.get("faq").unwrap().shares_storage_with(root.get("faq").unwrap()));
        assert!(!out.get("hero").unwrap().shares_storage_with(root.get("hero").unwrap()));
        assert_eq!(root.get_path(["hero", "headline"]).unwrap().as_str(), Some("a"));
    }
}
