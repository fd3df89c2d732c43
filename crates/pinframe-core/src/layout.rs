//! Layout cascade.
//!
//! Runs the sizer and the resolver over whole subtrees:
//!
//! 1. a bottom-up measure pass computes the hug size of every flow
//!    container, children before parents;
//! 2. a strict top-down pass places each parent's children against the
//!    parent's final box, then recurses into each child with its new box.
//!
//! Flow containers place children with [`arrange`]; every other container
//! uses pin constraints. [`resolve_layout`] produces canvas-space boxes for
//! the renderer, [`commit_layout`] writes parent-local geometry back into a
//! new `SceneTree`.

use crate::autolayout::{FlowItem, arrange, compute_size_from};
use crate::geometry::{MIN_SIZE, Rect, Size};
use crate::id::NodeId;
use crate::model::Node;
use crate::resolve::place_sized;
use crate::tree::{NodeMap, SceneTree};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Resolved boxes keyed by node id.
pub type LayoutMap = HashMap<NodeId, Rect>;

struct Cascade<'a> {
    nodes: &'a NodeMap,
    breakpoint: Option<&'a str>,
    /// Measured sizes; hug containers differ from their stored size.
    sizes: HashMap<NodeId, Size>,
    /// Nodes already placed (or being used as the subtree root).
    seen: HashSet<NodeId>,
    out: LayoutMap,
}

impl<'a> Cascade<'a> {
    fn new(nodes: &'a NodeMap, breakpoint: Option<&'a str>) -> Self {
        Self {
            nodes,
            breakpoint,
            sizes: HashMap::new(),
            seen: HashSet::new(),
            out: HashMap::new(),
        }
    }

    fn measure_tree(&mut self, id: NodeId) -> Size {
        let mut path = HashSet::new();
        self.measure(id, &mut path)
    }

    fn measure(&mut self, id: NodeId, path: &mut HashSet<NodeId>) -> Size {
        if let Some(size) = self.sizes.get(&id) {
            return *size;
        }
        let nodes = self.nodes;
        let Some(node) = nodes.get(&id) else {
            return Size::new(MIN_SIZE, MIN_SIZE);
        };
        if !path.insert(id) {
            log::warn!("layout: cycle through {id}, using stored size");
            return node.size();
        }

        let child_sizes: Vec<Size> = node
            .children
            .iter()
            .filter(|c| nodes.contains_key(*c))
            .map(|c| self.measure(*c, path))
            .collect();
        path.remove(&id);

        let size = if node.hugs_content() {
            compute_size_from(node, &child_sizes).unwrap_or_else(|| node.size())
        } else {
            node.size()
        };
        self.sizes.insert(id, size);
        size
    }

    fn size_of(&self, node: &Node) -> Size {
        self.sizes
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| node.size())
    }

    fn place_children(&mut self, parent: &'a Node, parent_box: Rect) {
        let nodes = self.nodes;
        let seen = &mut self.seen;
        let children: Vec<&'a Node> = parent
            .children
            .iter()
            .filter_map(|id| nodes.get(id).map(Arc::as_ref))
            .filter(|c| seen.insert(c.id))
            .collect();
        if children.is_empty() {
            return;
        }

        let placed: Vec<(NodeId, Rect)> = match &parent.auto_layout {
            Some(layout) => {
                let items: Vec<FlowItem<'_>> = children
                    .iter()
                    .map(|&c| FlowItem {
                        node: c,
                        size: self.size_of(c),
                    })
                    .collect();
                arrange(parent_box, layout, &items)
            }
            None => children
                .iter()
                .map(|&c| {
                    let constraints = c.effective_constraints(self.breakpoint);
                    let rect = place_sized(parent_box, c, self.size_of(c), constraints);
                    log::trace!("place {} -> {rect:?}", c.id);
                    (c.id, rect)
                })
                .collect(),
        };

        for (child, (id, rect)) in children.into_iter().zip(placed) {
            self.out.insert(id, rect);
            if !child.children.is_empty() {
                self.place_children(child, rect);
            }
        }
    }
}

/// Canvas-space boxes for every node reachable from the roots.
///
/// Roots sit at their own stored position with their measured size; every
/// other node is placed against its parent's resolved box.
pub fn resolve_layout(tree: &SceneTree, breakpoint: Option<&str>) -> LayoutMap {
    let nodes = tree.nodes();
    let mut cascade = Cascade::new(nodes, breakpoint);
    for &root_id in tree.roots() {
        let Some(root) = nodes.get(&root_id) else {
            continue;
        };
        if !cascade.seen.insert(root_id) {
            continue;
        }
        let size = cascade.measure_tree(root_id);
        let root_box = Rect::new(root.x, root.y, size.width, size.height).sanitized();
        cascade.out.insert(root_id, root_box);
        cascade.place_children(root, root_box);
    }
    log::debug!("resolve_layout: {} boxes", cascade.out.len());
    cascade.out
}

/// Boxes for everything below `root`, given `root`'s final box.
///
/// Output boxes share `root_box`'s coordinate space; `root` itself is not in
/// the map. Children missing from `nodes` are skipped. The editor's preview
/// path calls this with a ghost box for `root`.
pub fn resolve_subtree(
    nodes: &NodeMap,
    root: &Node,
    root_box: Rect,
    breakpoint: Option<&str>,
) -> LayoutMap {
    let mut cascade = Cascade::new(nodes, breakpoint);
    for &child in &root.children {
        cascade.measure_tree(child);
    }
    cascade.seen.insert(root.id);
    cascade.place_children(root, root_box.sanitized());
    cascade.out
}

/// Re-size `parent_id` (if it hugs its content) and write the resolved
/// geometry of its whole subtree into a new tree, in parent-local space.
///
/// Captured offsets are left untouched. Unknown ids return the tree as-is.
#[must_use]
pub fn commit_layout(tree: &SceneTree, parent_id: NodeId, breakpoint: Option<&str>) -> SceneTree {
    let Some(parent) = tree.get(parent_id) else {
        log::debug!("commit_layout {parent_id}: not found, ignoring");
        return tree.clone();
    };

    let mut cascade = Cascade::new(tree.nodes(), breakpoint);
    let size = cascade.measure_tree(parent_id);
    let local_box = Rect::from_size(size);
    cascade.seen.insert(parent_id);
    cascade.place_children(parent, local_box);

    let mut next = tree.clone();
    next.write_resolved(
        parent_id,
        Rect::new(parent.x, parent.y, size.width, size.height),
    );
    for (&id, rect) in &cascade.out {
        let origin = tree
            .parent_of(id)
            .filter(|p| *p != parent_id)
            .and_then(|p| cascade.out.get(&p))
            .copied()
            .unwrap_or(local_box);
        next.write_resolved(id, rect.translated(-origin.x, -origin.y));
    }
    log::debug!("commit_layout {parent_id}: {} nodes", cascade.out.len() + 1);
    next
}

/// [`commit_layout`] from every root.
#[must_use]
pub fn commit_all(tree: &SceneTree, breakpoint: Option<&str>) -> SceneTree {
    tree.roots()
        .iter()
        .fold(tree.clone(), |acc, &root| commit_layout(&acc, root, breakpoint))
}
