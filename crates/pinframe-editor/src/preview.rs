//! Preview compositor: ghost geometry for live drags and resizes.
//!
//! Everything here reads the committed tree and writes only into fresh maps.
//! The per-axis math is the resolver's own (through
//! [`pinframe_core::layout::resolve_subtree`]), so the subtree boxes of a
//! preview match what a commit resolves for the same ghost frame.
//!
//! The ghost itself is the raw pointer-driven frame. A node whose position
//! its parent decides (a `center` or `stretch` pin, or a flow child) is placed
//! by that rule again when the frame is committed.

use pinframe_core::geometry::{Rect, clamp_size, finite_or};
use pinframe_core::id::NodeId;
use pinframe_core::layout::{LayoutMap, resolve_subtree};
use pinframe_core::model::{Axis, Node};
use pinframe_core::tree::{NodeMap, SceneTree};
use serde::{Deserialize, Serialize};

/// Preview boxes keyed by node id.
pub type PreviewMap = LayoutMap;

/// Boxes for every node below `parent` if `parent` had `ghost_box`.
///
/// Output shares `ghost_box`'s coordinate space. Children missing from
/// `nodes` are skipped and non-finite fields take their defaults.
pub fn compute_preview(
    parent: &Node,
    ghost_box: Rect,
    nodes: &NodeMap,
    breakpoint: Option<&str>,
) -> PreviewMap {
    resolve_subtree(nodes, parent, ghost_box, breakpoint)
}

/// Resize handle on a selection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    /// Which edges this handle drags: `(left, right, top, bottom)`.
    fn edges(self) -> (bool, bool, bool, bool) {
        match self {
            Handle::N => (false, false, true, false),
            Handle::S => (false, false, false, true),
            Handle::E => (false, true, false, false),
            Handle::W => (true, false, false, false),
            Handle::NE => (false, true, true, false),
            Handle::NW => (true, false, true, false),
            Handle::SE => (false, true, false, true),
            Handle::SW => (true, false, false, true),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    Move,
    Resize(Handle),
}

/// What a pointer-move produces: the dragged node's ghost plus the boxes of
/// its whole subtree, all in canvas space.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewFrame {
    pub node: NodeId,
    pub ghost: Rect,
    pub boxes: PreviewMap,
}

/// A live drag or resize of one node.
///
/// Holds only its own state; the tree is passed in on every update so the
/// gesture can never write to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Gesture {
    node: NodeId,
    kind: GestureKind,
    anchor: (f32, f32),
    start: Rect,
    current: Rect,
    /// Canvas position of the parent's origin.
    parent_origin: (f32, f32),
}

impl Gesture {
    /// Start dragging `id`. `None` for unknown or locked nodes.
    pub fn begin_move(tree: &SceneTree, id: NodeId, pointer: (f32, f32)) -> Option<Self> {
        Self::begin(tree, id, GestureKind::Move, pointer)
    }

    /// Start resizing `id` from `handle`. `None` for unknown or locked nodes.
    pub fn begin_resize(
        tree: &SceneTree,
        id: NodeId,
        handle: Handle,
        pointer: (f32, f32),
    ) -> Option<Self> {
        Self::begin(tree, id, GestureKind::Resize(handle), pointer)
    }

    fn begin(
        tree: &SceneTree,
        id: NodeId,
        kind: GestureKind,
        pointer: (f32, f32),
    ) -> Option<Self> {
        let node = tree.get(id)?;
        if node.locked {
            log::debug!("gesture on {id}: node is locked");
            return None;
        }
        let parent_origin = tree
            .parent_of(id)
            .and_then(|p| tree.absolute_frame(p))
            .map_or((0.0, 0.0), |r| (r.x, r.y));
        let start = node.frame().sanitized();
        Some(Self {
            node: id,
            kind,
            anchor: sanitize_point(pointer),
            start,
            current: start,
            parent_origin,
        })
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// The candidate frame in parent-local space.
    pub fn current_frame(&self) -> Rect {
        self.current
    }

    /// Follow the pointer and preview the result. Reads `tree`, never
    /// writes it.
    pub fn update(
        &mut self,
        tree: &SceneTree,
        pointer: (f32, f32),
        breakpoint: Option<&str>,
    ) -> PreviewFrame {
        let (px, py) = sanitize_point(pointer);
        let (dx, dy) = (px - self.anchor.0, py - self.anchor.1);
        let limits = tree
            .get(self.node)
            .map(|n| (n.limits(Axis::Horizontal), n.limits(Axis::Vertical)));

        self.current = match self.kind {
            GestureKind::Move => self.start.translated(dx, dy),
            GestureKind::Resize(handle) => {
                let ((min_w, max_w), (min_h, max_h)) = limits.unwrap_or_default();
                let (left, right, top, bottom) = handle.edges();
                let (x, width) = drag_edges(
                    (self.start.x, self.start.width),
                    dx,
                    (left, right),
                    (min_w, max_w),
                );
                let (y, height) = drag_edges(
                    (self.start.y, self.start.height),
                    dy,
                    (top, bottom),
                    (min_h, max_h),
                );
                Rect::new(x, y, width, height)
            }
        };

        let ghost = self.current.translated(self.parent_origin.0, self.parent_origin.1);
        let boxes = tree
            .get(self.node)
            .map(|node| compute_preview(node, ghost, tree.nodes(), breakpoint))
            .unwrap_or_default();
        log::trace!("preview {} -> {ghost:?} ({} boxes)", self.node, boxes.len());
        PreviewFrame {
            node: self.node,
            ghost,
            boxes,
        }
    }

    /// End the gesture. Yields the frame to commit, or `None` when the
    /// pointer came back to where it started.
    pub fn finish(self) -> Option<(NodeId, Rect)> {
        (self.current != self.start).then_some((self.node, self.current))
    }

    /// Abandon the gesture; returns the frame the ghost should snap back to.
    pub fn cancel(self) -> Rect {
        self.start
    }
}

fn sanitize_point((x, y): (f32, f32)) -> (f32, f32) {
    (finite_or(x, 0.0), finite_or(y, 0.0))
}

/// Move the leading and/or trailing edge of a span by `delta`, keeping the
/// opposite edge fixed and the extent within limits.
fn drag_edges(
    (start, len): (f32, f32),
    delta: f32,
    (lead, trail): (bool, bool),
    (min, max): (Option<f32>, Option<f32>),
) -> (f32, f32) {
    if lead {
        let end = start + len;
        let new_len = clamp_size(len - delta, min, max);
        (end - new_len, new_len)
    } else if trail {
        (start, clamp_size(len + delta, min, max))
    } else {
        (start, len)
    }
}
