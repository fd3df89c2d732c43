//! Plain JSON records for persistence and sync.
//!
//! A document serializes as `{ "roots": [...], "nodes": { id: node, ... } }`
//! with nodes in pre-order, so the output is stable across runs and diffs
//! cleanly.

use crate::id::NodeId;
use crate::integrity::{IntegrityError, check_integrity};
use crate::model::Node;
use crate::tree::SceneTree;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("malformed record JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("record key {key} holds node {id}")]
    KeyMismatch { key: NodeId, id: NodeId },
    #[error("records are not a valid tree: {0}")]
    Integrity(#[from] IntegrityError),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub roots: Vec<NodeId>,
    pub nodes: IndexMap<NodeId, Node>,
}

/// Snapshot `tree` as records, in pre-order from the roots.
pub fn to_record(tree: &SceneTree) -> DocumentRecord {
    let mut nodes = IndexMap::with_capacity(tree.len());
    let mut seen = HashSet::new();
    for &root in tree.roots() {
        for id in std::iter::once(root).chain(tree.descendants(root)) {
            if seen.insert(id)
                && let Some(node) = tree.get(id)
            {
                nodes.insert(id, node.clone());
            }
        }
    }
    // Unreachable records still go out so a reader sees the whole state.
    let mut rest: Vec<NodeId> = tree
        .nodes()
        .keys()
        .copied()
        .filter(|id| !seen.contains(id))
        .collect();
    rest.sort();
    for id in rest {
        if let Some(node) = tree.get(id) {
            nodes.insert(id, node.clone());
        }
    }

    DocumentRecord {
        roots: tree.roots().to_vec(),
        nodes,
    }
}

/// Build a tree from records, rejecting records that are not a valid tree.
///
/// Frames are sanitized on the way in, so a zero or negative size loads as 1.
pub fn from_record(record: DocumentRecord) -> Result<SceneTree, RecordError> {
    for (key, node) in &record.nodes {
        if *key != node.id {
            return Err(RecordError::KeyMismatch {
                key: *key,
                id: node.id,
            });
        }
    }
    let nodes = record.nodes.into_values().map(|mut node| {
        node.set_frame(node.frame());
        node
    });
    let tree = SceneTree::from_parts(nodes, record.roots);
    check_integrity(&tree)?;
    Ok(tree)
}

pub fn to_json(tree: &SceneTree) -> Result<String, RecordError> {
    Ok(serde_json::to_string(&to_record(tree))?)
}

pub fn to_json_pretty(tree: &SceneTree) -> Result<String, RecordError> {
    Ok(serde_json::to_string_pretty(&to_record(tree))?)
}

pub fn from_json(text: &str) -> Result<SceneTree, RecordError> {
    let record: DocumentRecord = serde_json::from_str(text)?;
    log::debug!("from_json: {} records", record.nodes.len());
    from_record(record)
}
