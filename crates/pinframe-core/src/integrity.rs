//! Structural checks over a `SceneTree`.
//!
//! Store operations keep these invariants by construction. The check exists
//! for trees assembled from outside records and for tests.

use crate::geometry::MIN_SIZE;
use crate::id::NodeId;
use crate::tree::SceneTree;
use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntegrityError {
    #[error("root {0} is not in the node map")]
    MissingRoot(NodeId),
    #[error("root {root} records parent {parent}")]
    RootHasParent { root: NodeId, parent: NodeId },
    #[error("{parent} lists child {child}, which does not exist")]
    MissingChild { parent: NodeId, child: NodeId },
    #[error("{child} records parent {parent}, which does not exist")]
    MissingParent { child: NodeId, parent: NodeId },
    #[error("{child} is listed under {listed} but records parent {recorded:?}")]
    ParentMismatch {
        child: NodeId,
        listed: NodeId,
        recorded: Option<NodeId>,
    },
    #[error("{0} is listed {1} times")]
    DuplicateMembership(NodeId, usize),
    #[error("{0} is not listed by its parent or the root list")]
    Unlisted(NodeId),
    #[error("{0} is its own ancestor")]
    Cycle(NodeId),
    #[error("{id} has size {width}x{height}, below the 1px floor")]
    DegenerateSize { id: NodeId, width: f32, height: f32 },
}

/// Every violation in `tree`. Root-list findings come first, then node
/// findings in id order.
pub fn integrity_report(tree: &SceneTree) -> Vec<IntegrityError> {
    let mut errors = Vec::new();
    let mut listed: HashMap<NodeId, usize> = HashMap::new();
    let mut graph: DiGraphMap<NodeId, ()> = DiGraphMap::new();

    for &root in tree.roots() {
        *listed.entry(root).or_default() += 1;
        match tree.get(root) {
            None => errors.push(IntegrityError::MissingRoot(root)),
            Some(node) => {
                if let Some(parent) = node.parent {
                    errors.push(IntegrityError::RootHasParent { root, parent });
                }
            }
        }
    }

    let mut ids: Vec<NodeId> = tree.nodes().keys().copied().collect();
    ids.sort();

    for &id in &ids {
        let Some(node) = tree.get(id) else { continue };
        graph.add_node(id);

        if let Some(parent) = node.parent
            && !tree.contains(parent)
        {
            errors.push(IntegrityError::MissingParent { child: id, parent });
        }

        for &child in &node.children {
            *listed.entry(child).or_default() += 1;
            graph.add_edge(id, child, ());
            match tree.get(child) {
                None => errors.push(IntegrityError::MissingChild { parent: id, child }),
                Some(c) if c.parent != Some(id) => errors.push(IntegrityError::ParentMismatch {
                    child,
                    listed: id,
                    recorded: c.parent,
                }),
                Some(_) => {}
            }
        }

        let degenerate = |v: f32| !v.is_finite() || v < MIN_SIZE;
        if degenerate(node.width) || degenerate(node.height) {
            errors.push(IntegrityError::DegenerateSize {
                id,
                width: node.width,
                height: node.height,
            });
        }
    }

    for &id in &ids {
        match listed.get(&id).copied().unwrap_or(0) {
            0 => errors.push(IntegrityError::Unlisted(id)),
            1 => {}
            n => errors.push(IntegrityError::DuplicateMembership(id, n)),
        }
    }

    if let Err(cycle) = toposort(&graph, None) {
        errors.push(IntegrityError::Cycle(cycle.node_id()));
    }

    errors
}

/// `Ok` when `tree` satisfies every structural invariant, else the first
/// violation found.
pub fn check_integrity(tree: &SceneTree) -> Result<(), IntegrityError> {
    match integrity_report(tree).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
