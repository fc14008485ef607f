use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;
use std::path::Path;

/// One node of a [`DigitTree`]. The children of a node sit next to each other in the arena.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TreeNode {
    pub first_child: usize,
    pub child_count: usize,
    /// Leaves at or below this node; a leaf counts itself.
    pub leaves: usize,
    /// Nodes below this one.
    pub descendants: usize,
    /// Longest path down to a leaf.
    pub height: usize,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.child_count == 0
    }

    /// Arena ids of the children, in order.
    pub fn children(&self) -> Range<usize> {
        self.first_child..self.first_child + self.child_count
    }
}

/// The digit tree in breadth-first order; the root is node 0.
///
/// Stored flat so that arbitrarily long inputs never recurse on build, walk or drop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitTree {
    nodes: Vec<TreeNode>,
}

impl Default for DigitTree {
    fn default() -> Self {
        Self::leaf()
    }
}

impl DigitTree {
    pub const ROOT: usize = 0;

    pub fn leaf() -> Self {
        Self::from_breadth_first(vec![TreeNode::default()])
    }

    /// Fills in the per-node aggregates bottom up. Every child id must be greater than its
    /// parent's, which breadth-first numbering guarantees.
    pub(crate) fn from_breadth_first(mut nodes: Vec<TreeNode>) -> Self {
        for id in (0..nodes.len()).rev() {
            let node = nodes[id];
            let (mut leaves, mut descendants, mut height) = (0, 0, 0);
            for child in &nodes[node.children()] {
                leaves += child.leaves;
                descendants += 1 + child.descendants;
                height = height.max(1 + child.height);
            }
            let slot = &mut nodes[id];
            slot.leaves = leaves.max(1);
            slot.descendants = descendants;
            slot.height = height;
        }
        Self { nodes }
    }

    pub fn node(&self, id: usize) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn root(&self) -> &TreeNode {
        self.node(Self::ROOT)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.root().is_leaf()
    }

    pub fn leaf_count(&self) -> usize {
        self.root().leaves
    }

    pub fn descendant_count(&self) -> usize {
        self.root().descendants
    }

    pub fn depth(&self) -> usize {
        self.root().height
    }
}

/// Result of splitting the encoded digits into flower tokens and the tree body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Segments {
    pub flowers: Vec<String>,
    pub remainder: String,
}

/// Everything derived from one input string before layout.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedText {
    pub text: String,
    pub digits: String,
    pub seed: f64,
    pub segments: Segments,
    pub tree: DigitTree,
}

impl ParsedText {
    pub fn has_tree_body(&self) -> bool {
        !self.segments.remainder.is_empty()
    }
}

/// A persisted name entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl NameRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            created_at: None,
        }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

pub fn load_names(path: &Path) -> anyhow::Result<Vec<NameRecord>> {
    let contents = std::fs::read_to_string(path)?;
    let records: Vec<NameRecord> = serde_json::from_str(&contents)?;
    Ok(records)
}

pub fn save_names(path: &Path, records: &[NameRecord]) -> anyhow::Result<()> {
    let contents = serde_json::to_string_pretty(records)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Drops nameless records and every repeat of an earlier name. Returns `(kept, duplicates)`.
pub fn dedupe_names(records: &[NameRecord]) -> (Vec<NameRecord>, Vec<NameRecord>) {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut kept = Vec::new();
    let mut duplicates = Vec::new();
    for record in records {
        if record.name.is_empty() {
            continue;
        }
        if seen.insert(record.name.as_str()) {
            kept.push(record.clone());
        } else {
            duplicates.push(record.clone());
        }
    }
    (kept, duplicates)
}

/// One page of an ordered record list.
pub fn page(records: &[NameRecord], index: usize, per_page: usize) -> &[NameRecord] {
    if per_page == 0 {
        return &[];
    }
    let start = index.saturating_mul(per_page).min(records.len());
    let end = start.saturating_add(per_page).min(records.len());
    &records[start..end]
}

pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    len.div_ceil(per_page)
}
