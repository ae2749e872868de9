//! Subject/table hierarchy returned by the `subjects` endpoint, and its
//! flattening into printable tree lines.
//!
//! ```
//! use statbank::hierarchy::{flatten, parse_subjects};
//!
//! let v = serde_json::json!([{
//!     "id": "2401", "description": "Population and population projections",
//!     "active": true, "hasSubjects": true,
//!     "subjects": [{"id": "10021", "description": "Population in Denmark",
//!                   "active": true, "hasSubjects": false, "subjects": []}]
//! }]);
//! let roots = parse_subjects(&v)?;
//! let lines: Vec<String> = flatten(&roots).map(|l| l.to_string()).collect();
//! assert_eq!(lines.len(), 2);
//! # Ok::<(), statbank::Error>(())
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Prefix repeated once per level of depth.
pub const INDENT: &str = "\t |  ";
/// Marker in front of every node.
pub const BRANCH: &str = "\t |--";

/// A subject grouping (numeric id) or a table (alphanumeric id).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HierarchyNode {
    pub id: String,
    pub description: String,
    pub active: bool,
    pub has_children: bool,
    pub children: Vec<HierarchyNode>,
}

/// Wire shape of a node; subjects and tables share it loosely.
#[derive(Debug, Deserialize)]
struct RawNode {
    id: String,
    description: Option<String>,
    text: Option<String>,
    #[serde(default = "default_active")]
    active: bool,
    #[serde(default, rename = "hasSubjects")]
    has_subjects: bool,
    #[serde(default)]
    subjects: Vec<RawNode>,
    #[serde(default)]
    tables: Vec<RawNode>,
}

fn default_active() -> bool {
    true
}

impl TryFrom<RawNode> for HierarchyNode {
    type Error = Error;

    fn try_from(raw: RawNode) -> Result<Self> {
        // Subjects use `description`, tables use `text`.
        let description = match (raw.description, raw.text) {
            (Some(d), _) => d,
            (None, Some(t)) => t,
            (None, None) => return Err(Error::MissingText { id: raw.id }),
        };
        let children = raw
            .subjects
            .into_iter()
            .chain(raw.tables)
            .map(HierarchyNode::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            id: raw.id,
            description,
            active: raw.active,
            has_children: raw.has_subjects || !children.is_empty(),
            children,
        })
    }
}

impl HierarchyNode {
    /// Decode a single node (and its descendants) from JSON.
    pub fn from_value(v: &Value) -> Result<Self> {
        let raw: RawNode = RawNode::deserialize(v)?;
        HierarchyNode::try_from(raw)
    }

    /// Tables have alphanumeric ids; subjects are purely numeric.
    pub fn is_table(&self) -> bool {
        !self.id.chars().all(|c| c.is_ascii_digit())
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(HierarchyNode::node_count).sum::<usize>()
    }
}

/// Decode a `subjects` response: either a list of top-level nodes or a single node.
pub fn parse_subjects(v: &Value) -> Result<Vec<HierarchyNode>> {
    match v {
        Value::Array(items) => items.iter().map(HierarchyNode::from_value).collect(),
        Value::Object(_) => Ok(vec![HierarchyNode::from_value(v)?]),
        other => Err(Error::Decode(serde::de::Error::custom(format!(
            "expected a subject list, got {}",
            other
        )))),
    }
}

/// One printable row of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine<'a> {
    pub id: &'a str,
    pub description: &'a str,
    pub depth: usize,
}

impl fmt::Display for TreeLine<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for _ in 0..self.depth {
            f.write_str(INDENT)?;
        }
        write!(f, "{}('{}', '{}')", BRANCH, self.id, self.description)
    }
}

/// Lazy pre-order walk over a forest of nodes.
pub struct Flatten<'a> {
    stack: Vec<(&'a HierarchyNode, usize)>,
}

impl<'a> Iterator for Flatten<'a> {
    type Item = TreeLine<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        // Reverse push so the first child is visited next.
        self.stack
            .extend(node.children.iter().rev().map(|c| (c, depth + 1)));
        Some(TreeLine {
            id: &node.id,
            description: &node.description,
            depth,
        })
    }
}

/// Flatten `roots` depth-first, pre-order, keeping API order among siblings.
pub fn flatten(roots: &[HierarchyNode]) -> Flatten<'_> {
    Flatten {
        stack: roots.iter().rev().map(|n| (n, 0)).collect(),
    }
}

/// Flatten a single node.
pub fn flatten_node(root: &HierarchyNode) -> Flatten<'_> {
    flatten(std::slice::from_ref(root))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn description_takes_precedence_over_text() {
        let n = HierarchyNode::from_value(&json!({
            "id": "FOLK1A", "text": "short", "description": "long"
        }))
        .unwrap();
        assert_eq!(n.description, "long");
    }

    #[test]
    fn missing_both_texts_is_an_error() {
        let err = HierarchyNode::from_value(&json!({"id": "9"})).unwrap_err();
        assert!(matches!(err, Error::MissingText { ref id } if id == "9"));
    }

    #[test]
    fn line_rendering() {
        let line = TreeLine { id: "10021", description: "Population in Denmark", depth: 1 };
        assert_eq!(line.to_string(), "\t |  \t |--('10021', 'Population in Denmark')");
    }
}
