//! Scene Graph Store.
//!
//! `SceneTree` owns every node and the ordered list of roots. All public
//! edits are pure: they take `&self` and return a new tree, leaving the input
//! untouched. Nodes sit behind `Arc`, so a new tree shares every record it
//! did not change. That makes whole-tree undo snapshots cheap.
//!
//! Edits that name an unknown id return the tree unchanged. Callers may be
//! racing a remote writer, so nothing here panics or errors on stale ids.

use crate::geometry::{Rect, Size, union_all};
use crate::id::NodeId;
use crate::model::*;
use smallvec::SmallVec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Ordered id list used for both root lists and child lists.
pub type ChildList = SmallVec<[NodeId; 4]>;

/// Shared node records, keyed by id.
pub type NodeMap = HashMap<NodeId, Arc<Node>>;

/// The canonical node map plus the ordered root list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneTree {
    nodes: NodeMap,
    roots: ChildList,
}

impl SceneTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a tree from raw records without repairing them. Used by the
    /// record loader, which runs the integrity check afterwards.
    pub(crate) fn from_parts(
        nodes: impl IntoIterator<Item = Node>,
        roots: impl IntoIterator<Item = NodeId>,
    ) -> Self {
        Self {
            nodes: nodes.into_iter().map(|n| (n.id, Arc::new(n))).collect(),
            roots: roots.into_iter().collect(),
        }
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id).map(Arc::as_ref)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// The shared node map, for derivers that read many nodes at once.
    pub fn nodes(&self) -> &NodeMap {
        &self.nodes
    }

    /// Nodes in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().map(Arc::as_ref)
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Children in paint order; empty for unknown ids and leaves.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// The list `id` lives in: its parent's children, or the root list.
    pub fn siblings_of(&self, id: NodeId) -> &[NodeId] {
        match self.parent_of(id) {
            Some(parent) => self.children_of(parent),
            None => &self.roots,
        }
    }

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        self.siblings_of(id).iter().position(|&s| s == id)
    }

    /// Ancestors from the nearest parent up to the root.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.parent_of(id);
        while let Some(p) = current {
            // A malformed record set may loop; stop at the first repeat.
            if !seen.insert(p) {
                break;
            }
            chain.push(p);
            current = self.parent_of(p);
        }
        chain
    }

    /// Whether `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        ancestor != descendant && self.ancestors(descendant).contains(&ancestor)
    }

    /// Every node below `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<NodeId> = self.children_of(id).iter().rev().copied().collect();
        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next);
            stack.extend(self.children_of(next).iter().rev().copied());
        }
        out
    }

    /// The stored frame moved into canvas space by summing ancestor origins.
    pub fn absolute_frame(&self, id: NodeId) -> Option<Rect> {
        let frame = self.get(id)?.frame();
        let (dx, dy) = self
            .ancestors(id)
            .iter()
            .filter_map(|a| self.get(*a))
            .fold((0.0, 0.0), |(dx, dy), a| (dx + a.x, dy + a.y));
        Some(frame.translated(dx, dy))
    }

    /// Size of the box `id` is pinned against, if it has a parent.
    fn parent_size(&self, id: NodeId) -> Option<Size> {
        self.parent_of(id)
            .and_then(|p| self.get(p))
            .map(Node::size)
    }

    // ─── Tree edits ──────────────────────────────────────────────────────

    /// Insert `node` under `parent` (or as a root) at `index`, clamped to the
    /// list length.
    ///
    /// Inserting an id that already exists moves that node instead of
    /// duplicating it; the stored record is replaced but keeps its children.
    /// A fresh node arrives childless: subtrees are built by successive
    /// inserts. Offsets are stored as given; pin the node with
    /// [`SceneTree::set_frame`] or [`SceneTree::set_constraints`] to capture
    /// them from its frame.
    #[must_use]
    pub fn insert(&self, node: Node, parent: Option<NodeId>, index: usize) -> SceneTree {
        self.edit(|t| t.insert_mut(node, parent, index))
    }

    /// Move `id` to `new_index` within its current list (clamped).
    /// `parent = None` addresses the root list.
    #[must_use]
    pub fn reorder(&self, parent: Option<NodeId>, id: NodeId, new_index: usize) -> SceneTree {
        self.edit(|t| t.reorder_mut(parent, id, new_index))
    }

    /// Wrap `ids` in a new group node named `group_id`.
    ///
    /// The group takes the place of the first listed node inside that node's
    /// parent; members keep the order given. Only parent/children pointers
    /// change: the caller writes the group's box afterwards (see
    /// [`SceneTree::fit_group_to_children`]).
    #[must_use]
    pub fn group(&self, ids: &[NodeId], group_id: NodeId) -> SceneTree {
        self.edit(|t| t.group_mut(ids, group_id))
    }

    /// Dissolve a group, splicing its children into its place. Children keep
    /// their canvas position.
    #[must_use]
    pub fn ungroup(&self, group_id: NodeId) -> SceneTree {
        self.edit(|t| t.ungroup_mut(group_id))
    }

    /// Delete `id` and everything below it.
    #[must_use]
    pub fn remove(&self, id: NodeId) -> SceneTree {
        self.edit(|t| t.remove_mut(id))
    }

    /// Move `id` under `new_parent` at `index`. Refuses moves that would make
    /// a node its own ancestor. The frame keeps its parent-local values and
    /// offsets are re-pinned against the new parent.
    #[must_use]
    pub fn reparent(&self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> SceneTree {
        self.edit(|t| t.reparent_mut(id, new_parent, index))
    }

    #[must_use]
    pub fn set_locked(&self, id: NodeId, locked: bool) -> SceneTree {
        self.edit(|t| t.flag_mut(id, |n| &mut n.locked, locked))
    }

    #[must_use]
    pub fn set_hidden(&self, id: NodeId, hidden: bool) -> SceneTree {
        self.edit(|t| t.flag_mut(id, |n| &mut n.hidden, hidden))
    }

    #[must_use]
    pub fn lock(&self, id: NodeId) -> SceneTree {
        self.set_locked(id, true)
    }

    #[must_use]
    pub fn unlock(&self, id: NodeId) -> SceneTree {
        self.set_locked(id, false)
    }

    #[must_use]
    pub fn hide(&self, id: NodeId) -> SceneTree {
        self.set_hidden(id, true)
    }

    #[must_use]
    pub fn show(&self, id: NodeId) -> SceneTree {
        self.set_hidden(id, false)
    }

    // ─── Z-order ─────────────────────────────────────────────────────────

    /// One step toward the front (later in paint order).
    #[must_use]
    pub fn bring_forward(&self, id: NodeId) -> SceneTree {
        match self.index_in_parent(id) {
            Some(i) => self.reorder(self.parent_of(id), id, i + 1),
            None => self.clone(),
        }
    }

    /// One step toward the back.
    #[must_use]
    pub fn send_backward(&self, id: NodeId) -> SceneTree {
        match self.index_in_parent(id) {
            Some(i) if i > 0 => self.reorder(self.parent_of(id), id, i - 1),
            _ => self.clone(),
        }
    }

    #[must_use]
    pub fn bring_to_front(&self, id: NodeId) -> SceneTree {
        self.reorder(self.parent_of(id), id, usize::MAX)
    }

    #[must_use]
    pub fn send_to_back(&self, id: NodeId) -> SceneTree {
        self.reorder(self.parent_of(id), id, 0)
    }

    // ─── Geometry edits ──────────────────────────────────────────────────

    /// Write a node's parent-local frame (sizes floored to 1) and re-pin its
    /// offsets against the parent. Ignored for locked nodes.
    #[must_use]
    pub fn set_frame(&self, id: NodeId, frame: Rect) -> SceneTree {
        self.edit(|t| t.set_frame_mut(id, frame))
    }

    #[must_use]
    pub fn translate(&self, id: NodeId, dx: f32, dy: f32) -> SceneTree {
        match self.get(id) {
            Some(n) => self.set_frame(id, n.frame().translated(dx, dy)),
            None => self.clone(),
        }
    }

    #[must_use]
    pub fn resize(&self, id: NodeId, width: f32, height: f32) -> SceneTree {
        match self.get(id) {
            Some(n) => self.set_frame(id, Rect::new(n.x, n.y, width, height)),
            None => self.clone(),
        }
    }

    /// Explicitly pin a node: store `constraints` for `breakpoint` (or the
    /// base entry) and capture fresh offsets from its current frame. Roots
    /// have no parent box and capture only their left/top distances.
    /// Ignored for locked nodes.
    #[must_use]
    pub fn set_constraints(
        &self,
        id: NodeId,
        breakpoint: Option<&str>,
        constraints: AxisConstraints,
    ) -> SceneTree {
        self.edit(|t| t.set_constraints_mut(id, breakpoint, constraints))
    }

    /// Attach, replace, or (with `None`) remove a node's flow layout.
    #[must_use]
    pub fn set_auto_layout(&self, id: NodeId, layout: Option<AutoLayout>) -> SceneTree {
        self.edit(|t| match t.node_mut(id) {
            Some(node) if node.auto_layout != layout => {
                node.auto_layout = layout;
                true
            }
            _ => false,
        })
    }

    #[must_use]
    pub fn set_size_modes(&self, id: NodeId, size_x: SizeMode, size_y: SizeMode) -> SceneTree {
        self.edit(|t| match t.node_mut(id) {
            Some(node) if (node.size_x, node.size_y) != (size_x, size_y) => {
                node.size_x = size_x;
                node.size_y = size_y;
                true
            }
            _ => false,
        })
    }

    /// Size a group to the union of its children's boxes and rebase the
    /// children into the group's space, keeping their canvas position.
    ///
    /// Meant to follow [`SceneTree::group`], whose members still carry
    /// frames in the group's parent space.
    #[must_use]
    pub fn fit_group_to_children(&self, group_id: NodeId) -> SceneTree {
        self.edit(|t| t.fit_group_mut(group_id))
    }

    // ─── In-place implementations ────────────────────────────────────────

    /// Run an in-place edit on a copy; keep the copy only if it reports a
    /// change.
    fn edit(&self, f: impl FnOnce(&mut SceneTree) -> bool) -> SceneTree {
        let mut next = self.clone();
        if f(&mut next) { next } else { self.clone() }
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id).map(Arc::make_mut)
    }

    fn list_mut(&mut self, parent: Option<NodeId>) -> Option<&mut ChildList> {
        match parent {
            Some(p) => self.node_mut(p).map(|n| &mut n.children),
            None => Some(&mut self.roots),
        }
    }

    /// Unlink `id` from whatever list holds it. The record stays in the map.
    fn detach(&mut self, id: NodeId) {
        let parent = self.parent_of(id);
        if let Some(list) = self.list_mut(parent) {
            list.retain(|c| *c != id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = None;
        }
    }

    /// Link `id` into `parent`'s list at `index` (clamped), deduplicating.
    fn attach(&mut self, id: NodeId, parent: Option<NodeId>, index: usize) {
        if let Some(list) = self.list_mut(parent) {
            list.retain(|c| *c != id);
            let at = index.min(list.len());
            list.insert(at, id);
        }
        if let Some(node) = self.node_mut(id) {
            node.parent = parent;
        }
    }

    /// `true` when putting `id` under `parent` would close a loop.
    fn would_cycle(&self, id: NodeId, parent: Option<NodeId>) -> bool {
        parent.is_some_and(|p| p == id || self.is_ancestor_of(id, p))
    }

    fn insert_mut(&mut self, mut node: Node, parent: Option<NodeId>, index: usize) -> bool {
        let id = node.id;
        if let Some(p) = parent
            && !self.contains(p)
        {
            log::debug!("insert {id}: parent {p} not found, ignoring");
            return false;
        }
        if self.would_cycle(id, parent) {
            log::warn!("insert {id}: would become its own ancestor, ignoring");
            return false;
        }

        if let Some(existing) = self.nodes.get(&id) {
            node.children = existing.children.clone();
            self.detach(id);
        } else if !node.children.is_empty() {
            log::debug!(
                "insert {id}: dropping {} child ids, subtrees are built by insert",
                node.children.len()
            );
            node.children.clear();
        }

        node.parent = None;
        self.nodes.insert(id, Arc::new(node));
        self.attach(id, parent, index);
        true
    }

    fn reorder_mut(&mut self, parent: Option<NodeId>, id: NodeId, new_index: usize) -> bool {
        let Some(list) = self.list_mut(parent) else {
            log::debug!("reorder {id}: parent {parent:?} not found, ignoring");
            return false;
        };
        let Some(from) = list.iter().position(|c| *c == id) else {
            log::debug!("reorder {id}: not listed under {parent:?}, ignoring");
            return false;
        };
        let to = new_index.min(list.len() - 1);
        if from == to {
            return false;
        }
        let moved = list.remove(from);
        list.insert(to, moved);
        true
    }

    fn group_mut(&mut self, ids: &[NodeId], group_id: NodeId) -> bool {
        if self.contains(group_id) {
            log::debug!("group: id {group_id} already taken, ignoring");
            return false;
        }

        let mut seen = HashSet::new();
        let members: Vec<NodeId> = ids
            .iter()
            .copied()
            .filter(|id| self.contains(*id) && seen.insert(*id))
            .collect();
        let Some(&first) = members.first() else {
            log::debug!("group: no known ids in selection, ignoring");
            return false;
        };

        let target = self.parent_of(first);
        if let Some(p) = target
            && (members.contains(&p) || self.ancestors(p).iter().any(|a| members.contains(a)))
        {
            log::warn!("group {group_id}: selection contains an ancestor of the target parent");
            return false;
        }

        // Position of `first` once the other members have left the list.
        let index = self
            .siblings_of(first)
            .iter()
            .take_while(|s| **s != first)
            .filter(|s| !members.contains(s))
            .count();

        for &m in &members {
            self.detach(m);
        }

        let mut group = Node::new(group_id, NodeKind::Group);
        group.children = members.iter().copied().collect();
        self.nodes.insert(group_id, Arc::new(group));
        for &m in &members {
            if let Some(node) = self.node_mut(m) {
                node.parent = Some(group_id);
            }
        }
        self.attach(group_id, target, index);
        true
    }

    fn ungroup_mut(&mut self, group_id: NodeId) -> bool {
        let Some(group) = self.get(group_id) else {
            return false;
        };
        if group.kind != NodeKind::Group {
            log::debug!("ungroup {group_id}: not a group, ignoring");
            return false;
        }
        let parent = group.parent;
        let (gx, gy) = (group.x, group.y);
        let children = group.children.clone();
        let Some(index) = self.index_in_parent(group_id) else {
            return false;
        };
        let parent_size = self.parent_size(group_id);

        self.detach(group_id);
        self.nodes.remove(&group_id);

        for (offset, &child) in children.iter().enumerate() {
            if let Some(node) = self.node_mut(child) {
                node.x += gx;
                node.y += gy;
                if let Some(size) = parent_size {
                    node.constraint_offsets = ConstraintOffsets::capture(node.frame(), size);
                }
            }
            self.attach(child, parent, index + offset);
        }
        true
    }

    fn remove_mut(&mut self, id: NodeId) -> bool {
        if !self.contains(id) {
            log::debug!("remove {id}: not found, ignoring");
            return false;
        }
        let doomed = self.descendants(id);
        self.detach(id);
        self.nodes.remove(&id);
        for d in doomed {
            self.nodes.remove(&d);
        }
        true
    }

    fn reparent_mut(&mut self, id: NodeId, new_parent: Option<NodeId>, index: usize) -> bool {
        if !self.contains(id) {
            return false;
        }
        if let Some(p) = new_parent
            && !self.contains(p)
        {
            log::debug!("reparent {id}: parent {p} not found, ignoring");
            return false;
        }
        if self.would_cycle(id, new_parent) {
            log::warn!("reparent {id}: would become its own ancestor, ignoring");
            return false;
        }
        self.detach(id);
        self.attach(id, new_parent, index);
        if let Some(size) = self.parent_size(id)
            && let Some(node) = self.node_mut(id)
        {
            node.constraint_offsets = ConstraintOffsets::capture(node.frame(), size);
        }
        true
    }

    fn flag_mut(&mut self, id: NodeId, field: fn(&mut Node) -> &mut bool, value: bool) -> bool {
        let Some(node) = self.node_mut(id) else {
            log::debug!("flag edit on {id}: not found, ignoring");
            return false;
        };
        let slot = field(node);
        if *slot == value {
            return false;
        }
        *slot = value;
        true
    }

    fn set_frame_mut(&mut self, id: NodeId, frame: Rect) -> bool {
        let parent_size = self.parent_size(id);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.locked {
            log::debug!("set_frame {id}: node is locked, ignoring");
            return false;
        }
        node.set_frame(frame);
        if let Some(size) = parent_size {
            node.constraint_offsets = ConstraintOffsets::capture(node.frame(), size);
        }
        true
    }

    fn set_constraints_mut(
        &mut self,
        id: NodeId,
        breakpoint: Option<&str>,
        constraints: AxisConstraints,
    ) -> bool {
        let parent_size = self.parent_size(id);
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        if node.locked {
            log::debug!("set_constraints {id}: node is locked, ignoring");
            return false;
        }
        node.constraints
            .set(breakpoint.unwrap_or(BASE_BREAKPOINT), constraints);
        node.constraint_offsets = match parent_size {
            Some(size) => ConstraintOffsets::capture(node.frame(), size),
            None => ConstraintOffsets {
                left: node.x,
                top: node.y,
                ..Default::default()
            },
        };
        true
    }

    fn fit_group_mut(&mut self, group_id: NodeId) -> bool {
        let children: Vec<NodeId> = self.children_of(group_id).to_vec();
        let frames: Vec<Rect> = children
            .iter()
            .filter_map(|c| self.get(*c))
            .map(Node::frame)
            .collect();
        let Some(bounds) = union_all(&frames) else {
            return false;
        };
        let parent_size = self.parent_size(group_id);

        let Some(group) = self.node_mut(group_id) else {
            return false;
        };
        group.set_frame(bounds);
        let group_frame = group.frame();
        if let Some(size) = parent_size {
            group.constraint_offsets = ConstraintOffsets::capture(group_frame, size);
        }

        for child in children {
            if let Some(node) = self.node_mut(child) {
                node.x -= group_frame.x;
                node.y -= group_frame.y;
                node.constraint_offsets =
                    ConstraintOffsets::capture(node.frame(), group_frame.size());
            }
        }
        true
    }

    /// Write resolved geometry without re-pinning. Used by the layout commit,
    /// which must leave captured offsets alone. Skips unchanged records so
    /// they stay shared with the previous tree.
    pub(crate) fn write_resolved(&mut self, id: NodeId, frame: Rect) {
        let unchanged = self.get(id).is_none_or(|n| n.frame() == frame);
        if unchanged {
            return;
        }
        if let Some(node) = self.node_mut(id) {
            node.set_frame(frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::check_integrity;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    /// page ─┬─ header
    ///       ├─ body ── card
    ///       └─ footer
    fn sample() -> SceneTree {
        SceneTree::new()
            .insert(Node::frame_node("page").with_frame(0.0, 0.0, 800.0, 600.0), None, 0)
            .insert(rect("header", 0.0, 0.0, 800.0, 60.0), Some(id("page")), 0)
            .insert(
                Node::frame_node("body").with_frame(0.0, 60.0, 800.0, 480.0),
                Some(id("page")),
                1,
            )
            .insert(rect("footer", 0.0, 540.0, 800.0, 60.0), Some(id("page")), 2)
            .insert(rect("card", 40.0, 40.0, 200.0, 120.0), Some(id("body")), 0)
    }

    fn rect(name: &str, x: f32, y: f32, w: f32, h: f32) -> Node {
        Node::rect_node(name).with_frame(x, y, w, h)
    }

    #[test]
    fn insert_builds_hierarchy() {
        let tree = sample();
        assert_eq!(tree.roots(), &[id("page")]);
        assert_eq!(tree.children_of(id("page")), &[id("header"), id("body"), id("footer")]);
        assert_eq!(tree.parent_of(id("card")), Some(id("body")));
        assert_eq!(tree.len(), 5);
        assert!(check_integrity(&tree).is_ok());
    }

    #[test]
    fn insert_is_pure() {
        let before = sample();
        let snapshot = before.clone();
        let _after = before.insert(Node::rect_node("extra"), Some(id("page")), 0);
        assert_eq!(before, snapshot);
        assert!(!before.contains(id("extra")));
    }

    #[test]
    fn insert_under_missing_parent_is_noop() {
        let tree = sample();
        let next = tree.insert(Node::rect_node("orphan"), Some(id("nowhere")), 0);
        assert_eq!(next, tree);
    }

    #[test]
    fn insert_existing_id_moves_instead_of_duplicating() {
        let tree = sample();
        let card = tree.get(id("card")).cloned().unwrap_or_else(|| Node::rect_node("card"));
        let next = tree.insert(card, Some(id("page")), 99);
        assert_eq!(next.children_of(id("body")), &[] as &[NodeId]);
        assert_eq!(next.children_of(id("page")).last(), Some(&id("card")));
        assert_eq!(next.parent_of(id("card")), Some(id("page")));
        assert!(check_integrity(&next).is_ok());
    }

    #[test]
    fn insert_stores_offsets_as_given() {
        let tree = sample();
        let card = tree.get(id("card")).map(|n| n.constraint_offsets);
        assert_eq!(card, Some(ConstraintOffsets::default()));

        let pinned = rect("pinned", 10.0, 0.0, 100.0, 50.0).with_offsets(1.0, 2.0, 3.0, 4.0);
        let tree = tree.insert(pinned, Some(id("page")), 0);
        assert_eq!(
            tree.get(id("pinned")).map(|n| n.constraint_offsets),
            Some(ConstraintOffsets {
                left: 1.0,
                right: 2.0,
                top: 3.0,
                bottom: 4.0
            })
        );
    }

    #[test]
    fn insert_drops_foreign_child_ids() {
        let mut node = Node::frame_node("stray");
        node.children.push(id("card"));
        let next = sample().insert(node, None, 0);
        assert!(next.children_of(id("stray")).is_empty());
        assert_eq!(next.parent_of(id("card")), Some(id("body")));
        assert!(check_integrity(&next).is_ok());
    }

    #[test]
    fn reorder_clamps_index() {
        let tree = sample().reorder(Some(id("page")), id("header"), 42);
        assert_eq!(tree.children_of(id("page")), &[id("body"), id("footer"), id("header")]);
    }

    #[test]
    fn reorder_unknown_child_is_noop() {
        let tree = sample();
        assert_eq!(tree.reorder(Some(id("page")), id("card"), 0), tree);
        assert_eq!(tree.reorder(Some(id("ghost")), id("card"), 0), tree);
    }

    #[test]
    fn z_order_helpers() {
        let tree = sample();
        let t = tree.bring_forward(id("header"));
        assert_eq!(t.children_of(id("page")), &[id("body"), id("header"), id("footer")]);
        let t = t.send_to_back(id("footer"));
        assert_eq!(t.children_of(id("page")), &[id("footer"), id("body"), id("header")]);
        let t = t.send_backward(id("footer"));
        assert_eq!(t.children_of(id("page"))[0], id("footer"));
        let t = t.bring_to_front(id("footer"));
        assert_eq!(t.children_of(id("page")).last(), Some(&id("footer")));
    }

    #[test]
    fn group_rewires_pointers_only() {
        let tree = sample().group(&[id("header"), id("footer")], id("chrome"));
        assert_eq!(tree.children_of(id("page")), &[id("chrome"), id("body")]);
        assert_eq!(tree.children_of(id("chrome")), &[id("header"), id("footer")]);
        assert_eq!(tree.parent_of(id("header")), Some(id("chrome")));
        // no geometry computed yet
        assert_eq!(tree.get(id("footer")).map(|n| n.y), Some(540.0));
        assert!(check_integrity(&tree).is_ok());
    }

    #[test]
    fn group_takes_place_of_first_member() {
        let tree = sample().group(&[id("footer"), id("body")], id("lower"));
        assert_eq!(tree.children_of(id("page")), &[id("header"), id("lower")]);
        assert_eq!(tree.children_of(id("lower")), &[id("footer"), id("body")]);
    }

    #[test]
    fn group_rejects_ancestor_of_target() {
        let tree = sample();
        // card's parent is body; grouping body with card would nest body in itself
        let next = tree.group(&[id("card"), id("body")], id("loop"));
        assert_eq!(next, tree);
        assert!(!next.contains(id("loop")));
    }

    #[test]
    fn group_with_unknown_ids_is_noop() {
        let tree = sample();
        assert_eq!(tree.group(&[id("nope")], id("g_none")), tree);
        assert_eq!(tree.group(&[id("card")], id("header")), tree);
    }

    #[test]
    fn fit_group_writes_union_and_rebases_children() {
        let tree = sample()
            .group(&[id("header"), id("footer")], id("bars"))
            .fit_group_to_children(id("bars"));
        let bars = tree.get(id("bars")).map(Node::frame);
        assert_eq!(bars, Some(Rect::new(0.0, 0.0, 800.0, 600.0)));
        assert_eq!(
            tree.get(id("footer")).map(Node::frame),
            Some(Rect::new(0.0, 540.0, 800.0, 60.0))
        );

        let tree = sample()
            .group(&[id("card")], id("wrap"))
            .fit_group_to_children(id("wrap"));
        assert_eq!(
            tree.get(id("wrap")).map(Node::frame),
            Some(Rect::new(40.0, 40.0, 200.0, 120.0))
        );
        assert_eq!(
            tree.get(id("card")).map(Node::frame),
            Some(Rect::new(0.0, 0.0, 200.0, 120.0))
        );
        assert_eq!(
            tree.absolute_frame(id("card")),
            Some(Rect::new(40.0, 100.0, 200.0, 120.0))
        );
    }

    #[test]
    fn ungroup_restores_positions_and_order() {
        let grouped = sample()
            .group(&[id("card")], id("wrap"))
            .fit_group_to_children(id("wrap"));
        let tree = grouped.ungroup(id("wrap"));
        assert!(!tree.contains(id("wrap")));
        assert_eq!(tree.children_of(id("body")), &[id("card")]);
        assert_eq!(
            tree.get(id("card")).map(Node::frame),
            Some(Rect::new(40.0, 40.0, 200.0, 120.0))
        );
        assert!(check_integrity(&tree).is_ok());
    }

    #[test]
    fn ungroup_ignores_non_groups() {
        let tree = sample();
        assert_eq!(tree.ungroup(id("body")), tree);
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let tree = sample().remove(id("body"));
        assert!(!tree.contains(id("body")));
        assert!(!tree.contains(id("card")));
        assert_eq!(tree.children_of(id("page")), &[id("header"), id("footer")]);
        assert!(check_integrity(&tree).is_ok());
    }

    #[test]
    fn reparent_refuses_cycles() {
        let tree = sample();
        assert_eq!(tree.reparent(id("page"), Some(id("card")), 0), tree);
        assert_eq!(tree.reparent(id("body"), Some(id("body")), 0), tree);

        let moved = tree.reparent(id("card"), None, 0);
        assert_eq!(moved.roots(), &[id("card"), id("page")]);
        assert!(check_integrity(&moved).is_ok());
    }

    #[test]
    fn locked_nodes_ignore_geometry_writes() {
        let tree = sample().lock(id("card"));
        assert_eq!(tree.translate(id("card"), 10.0, 10.0), tree);
        assert_eq!(
            tree.set_constraints(id("card"), None, AxisConstraints::default()),
            tree
        );
        let unlocked = tree.unlock(id("card")).translate(id("card"), 10.0, 10.0);
        assert_eq!(unlocked.get(id("card")).map(|n| n.x), Some(50.0));
    }

    #[test]
    fn hide_and_show_toggle_flag() {
        let tree = sample().hide(id("footer"));
        assert_eq!(tree.get(id("footer")).map(|n| n.hidden), Some(true));
        let tree = tree.show(id("footer"));
        assert_eq!(tree.get(id("footer")).map(|n| n.hidden), Some(false));
        // unknown ids are ignored
        assert_eq!(tree.hide(id("missing")), tree);
    }

    #[test]
    fn set_frame_repins_offsets() {
        let tree = sample().set_frame(id("card"), Rect::new(100.0, 50.0, 300.0, 100.0));
        let card = tree.get(id("card")).cloned().unwrap_or_else(|| Node::rect_node("card"));
        assert_eq!(card.constraint_offsets.left, 100.0);
        assert_eq!(card.constraint_offsets.right, 400.0);
        assert_eq!(card.constraint_offsets.top, 50.0);
        assert_eq!(card.constraint_offsets.bottom, 330.0);
    }

    #[test]
    fn set_constraints_captures_offsets_and_breakpoint() {
        let c = AxisConstraints::new(HorizontalConstraint::Right, VerticalConstraint::Bottom);
        let tree = sample().set_constraints(id("card"), Some("mobile"), c);
        let card = tree.get(id("card")).cloned().unwrap_or_else(|| Node::rect_node("card"));
        assert_eq!(card.constraints.get("mobile"), Some(c));
        assert_eq!(card.constraints.get(BASE_BREAKPOINT), None);
        assert_eq!(card.constraint_offsets.right, 560.0);
        assert_eq!(card.constraint_offsets.bottom, 320.0);
    }

    #[test]
    fn untouched_records_stay_shared() {
        let before = sample();
        let after = before.translate(id("card"), 5.0, 0.0);
        let header_before = before.nodes().get(&id("header"));
        let header_after = after.nodes().get(&id("header"));
        assert!(matches!((header_before, header_after), (Some(a), Some(b)) if Arc::ptr_eq(a, b)));
    }

    #[test]
    fn descendants_are_pre_order() {
        let tree = sample();
        assert_eq!(
            tree.descendants(id("page")),
            vec![id("header"), id("body"), id("card"), id("footer")]
        );
        assert_eq!(tree.ancestors(id("card")), vec![id("body"), id("page")]);
        assert!(tree.is_ancestor_of(id("page"), id("card")));
        assert!(!tree.is_ancestor_of(id("card"), id("card")));
    }
}
