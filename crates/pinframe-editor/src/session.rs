//! Editing session: the owned store context the editor talks to.
//!
//! A `Session` holds the committed [`SceneTree`], its resolved layout, the
//! undo history and at most one live gesture. Every store write goes through
//! [`Mutation`] so it can be described, batched and undone. Live drags only
//! produce previews; the tree is written once when the gesture ends.

use crate::commands::CommandStack;
use crate::inspector::ConstraintPanel;
use crate::preview::{Gesture, GestureKind, Handle, PreviewFrame};
use pinframe_core::blend::{BlendedConstraints, blend};
use pinframe_core::config::{ConfigError, LayoutConfig};
use pinframe_core::geometry::Rect;
use pinframe_core::id::NodeId;
use pinframe_core::layout::{LayoutMap, commit_all, resolve_layout};
use pinframe_core::model::{
    AutoLayout, AxisConstraints, HorizontalConstraint, Node, SizeMode, VerticalConstraint,
};
use pinframe_core::records::{self, RecordError};
use pinframe_core::tree::SceneTree;
use serde::{Deserialize, Serialize};

/// Editor settings: the layout config plus the undo depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SessionConfig {
    pub layout: LayoutConfig,
    pub history_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            layout: LayoutConfig::default(),
            history_depth: 200,
        }
    }
}

impl SessionConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A store write, as issued by canvas tools and the inspector.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    Insert {
        node: Box<Node>,
        parent: Option<NodeId>,
        index: usize,
    },
    Remove {
        id: NodeId,
    },
    Reorder {
        parent: Option<NodeId>,
        id: NodeId,
        index: usize,
    },
    /// Group the nodes and size the group to their union.
    Group {
        ids: Vec<NodeId>,
        group_id: NodeId,
    },
    Ungroup {
        id: NodeId,
    },
    Reparent {
        id: NodeId,
        parent: Option<NodeId>,
        index: usize,
    },
    SetLocked {
        id: NodeId,
        locked: bool,
    },
    SetHidden {
        id: NodeId,
        hidden: bool,
    },
    SetFrame {
        id: NodeId,
        frame: Rect,
    },
    Translate {
        id: NodeId,
        dx: f32,
        dy: f32,
    },
    Resize {
        id: NodeId,
        width: f32,
        height: f32,
    },
    SetConstraints {
        id: NodeId,
        breakpoint: Option<String>,
        constraints: AxisConstraints,
    },
    SetAutoLayout {
        id: NodeId,
        layout: Option<AutoLayout>,
    },
    SetSizeModes {
        id: NodeId,
        size_x: SizeMode,
        size_y: SizeMode,
    },
}

impl Mutation {
    /// Apply to `tree`, returning the edited tree (or an equal one when the
    /// write was a no-op).
    ///
    /// A manual size change on a hug axis turns that axis `fixed`, otherwise
    /// the next cascade would undo the resize.
    pub fn apply(&self, tree: &SceneTree) -> SceneTree {
        match self {
            Mutation::Insert {
                node,
                parent,
                index,
            } => tree.insert(node.as_ref().clone(), *parent, *index),
            Mutation::Remove { id } => tree.remove(*id),
            Mutation::Reorder { parent, id, index } => tree.reorder(*parent, *id, *index),
            Mutation::Group { ids, group_id } => {
                tree.group(ids, *group_id).fit_group_to_children(*group_id)
            }
            Mutation::Ungroup { id } => tree.ungroup(*id),
            Mutation::Reparent { id, parent, index } => tree.reparent(*id, *parent, *index),
            Mutation::SetLocked { id, locked } => tree.set_locked(*id, *locked),
            Mutation::SetHidden { id, hidden } => tree.set_hidden(*id, *hidden),
            Mutation::SetFrame { id, frame } => {
                fix_resized_hug(tree, *id, frame.width, frame.height).set_frame(*id, *frame)
            }
            Mutation::Translate { id, dx, dy } => tree.translate(*id, *dx, *dy),
            Mutation::Resize { id, width, height } => {
                fix_resized_hug(tree, *id, *width, *height).resize(*id, *width, *height)
            }
            Mutation::SetConstraints {
                id,
                breakpoint,
                constraints,
            } => tree.set_constraints(*id, breakpoint.as_deref(), *constraints),
            Mutation::SetAutoLayout { id, layout } => tree.set_auto_layout(*id, *layout),
            Mutation::SetSizeModes { id, size_x, size_y } => {
                tree.set_size_modes(*id, *size_x, *size_y)
            }
        }
    }

    /// Short label for the history list.
    pub fn describe(&self) -> String {
        match self {
            Mutation::Insert { node, .. } => format!("Insert {}", node.id),
            Mutation::Remove { id } => format!("Delete {id}"),
            Mutation::Reorder { id, .. } => format!("Reorder {id}"),
            Mutation::Group { group_id, .. } => format!("Group into {group_id}"),
            Mutation::Ungroup { id } => format!("Ungroup {id}"),
            Mutation::Reparent { id, .. } => format!("Move {id} to new parent"),
            Mutation::SetLocked { id, locked: true } => format!("Lock {id}"),
            Mutation::SetLocked { id, locked: false } => format!("Unlock {id}"),
            Mutation::SetHidden { id, hidden: true } => format!("Hide {id}"),
            Mutation::SetHidden { id, hidden: false } => format!("Show {id}"),
            Mutation::SetFrame { id, .. } => format!("Set frame of {id}"),
            Mutation::Translate { id, .. } => format!("Move {id}"),
            Mutation::Resize { id, .. } => format!("Resize {id}"),
            Mutation::SetConstraints { id, .. } => format!("Set constraints of {id}"),
            Mutation::SetAutoLayout { id, .. } => format!("Set auto layout of {id}"),
            Mutation::SetSizeModes { id, .. } => format!("Set sizing of {id}"),
        }
    }
}

/// Switch each hug axis whose extent is about to change to `fixed`.
fn fix_resized_hug(tree: &SceneTree, id: NodeId, width: f32, height: f32) -> SceneTree {
    let Some(node) = tree.get(id) else {
        return tree.clone();
    };
    if node.locked {
        return tree.clone();
    }
    let pick = |mode: SizeMode, old: f32, new: f32| match mode {
        SizeMode::Hug if old != new => SizeMode::Fixed,
        other => other,
    };
    tree.set_size_modes(
        id,
        pick(node.size_x, node.width, width),
        pick(node.size_y, node.height, height),
    )
}

/// One open document.
#[derive(Debug)]
pub struct Session {
    tree: SceneTree,
    layout: LayoutMap,
    config: SessionConfig,
    history: CommandStack,
    gesture: Option<Gesture>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

impl Session {
    pub fn new(config: SessionConfig) -> Self {
        Self::from_tree(SceneTree::new(), config)
    }

    /// Open an existing tree. It is committed once so the stored geometry
    /// matches what the cascade resolves.
    pub fn from_tree(tree: SceneTree, config: SessionConfig) -> Self {
        let tree = if config.layout.auto_commit {
            commit_all(&tree, config.layout.breakpoint())
        } else {
            tree
        };
        let layout = resolve_layout(&tree, config.layout.breakpoint());
        Self {
            tree,
            layout,
            history: CommandStack::new(config.history_depth),
            config,
            gesture: None,
        }
    }

    /// Open a document from its JSON records.
    pub fn from_json(text: &str, config: SessionConfig) -> Result<Self, RecordError> {
        Ok(Self::from_tree(records::from_json(text)?, config))
    }

    pub fn to_json(&self) -> Result<String, RecordError> {
        records::to_json(&self.tree)
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Absolute boxes of every node, as the renderer draws them.
    pub fn layout(&self) -> &LayoutMap {
        &self.layout
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn breakpoint(&self) -> Option<&str> {
        self.config.layout.breakpoint()
    }

    /// Switch the active breakpoint. Only the derived layout changes; the
    /// stored tree and the history are untouched.
    pub fn set_breakpoint(&mut self, breakpoint: Option<&str>) {
        self.config.layout.breakpoint = breakpoint.map(str::to_string);
        self.layout = resolve_layout(&self.tree, self.breakpoint());
    }

    // ─── Store writes ────────────────────────────────────────────────────

    /// Apply one mutation as one undo step. Returns whether the tree changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        let next = mutation.apply(&self.tree);
        self.commit(next, &mutation.describe())
    }

    /// Apply several mutations as a single undo step. Returns whether the
    /// tree changed.
    pub fn apply_all(
        &mut self,
        mutations: impl IntoIterator<Item = Mutation>,
        description: &str,
    ) -> bool {
        let before = self.tree.clone();
        self.history.begin_batch(&self.tree);
        for mutation in mutations {
            self.apply(mutation);
        }
        self.history.end_batch(&self.tree, description);
        self.tree != before
    }

    /// Create a default-sized frame at `(x, y)` in `parent`'s space, pinned
    /// where it was placed, and return its id.
    pub fn insert_frame(&mut self, parent: Option<NodeId>, x: f32, y: f32) -> NodeId {
        let id = NodeId::with_prefix("frame");
        let size = self.config.layout.default_frame_size;
        let frame = Rect::new(x, y, size.width, size.height);
        let node = Node::frame_node(id.as_str()).with_frame(x, y, size.width, size.height);
        let index = match parent {
            Some(p) => self.tree.children_of(p).len(),
            None => self.tree.roots().len(),
        };
        self.apply_all(
            [
                Mutation::Insert {
                    node: Box::new(node),
                    parent,
                    index,
                },
                Mutation::SetFrame { id, frame },
            ],
            &format!("Insert {id}"),
        );
        id
    }

    fn commit(&mut self, next: SceneTree, description: &str) -> bool {
        let next = if self.config.layout.auto_commit {
            commit_all(&next, self.breakpoint())
        } else {
            next
        };
        if next == self.tree {
            log::debug!("'{description}' changed nothing");
            return false;
        }
        let before = std::mem::replace(&mut self.tree, next);
        self.history.record(before, &self.tree, description);
        self.refresh();
        true
    }

    fn refresh(&mut self) {
        self.layout = resolve_layout(&self.tree, self.breakpoint());
    }

    // ─── Gestures ────────────────────────────────────────────────────────

    /// Start dragging `id`. Returns `false` (and starts nothing) for unknown
    /// or locked nodes. An unfinished gesture is cancelled first.
    ///
    /// The gesture holds a history batch open until it ends, so edits applied
    /// meanwhile join its undo step.
    pub fn begin_move(&mut self, id: NodeId, pointer: (f32, f32)) -> bool {
        self.cancel_gesture();
        let gesture = Gesture::begin_move(&self.tree, id, pointer);
        self.start_gesture(gesture)
    }

    pub fn begin_resize(&mut self, id: NodeId, handle: Handle, pointer: (f32, f32)) -> bool {
        self.cancel_gesture();
        let gesture = Gesture::begin_resize(&self.tree, id, handle, pointer);
        self.start_gesture(gesture)
    }

    fn start_gesture(&mut self, gesture: Option<Gesture>) -> bool {
        if gesture.is_some() {
            self.history.begin_batch(&self.tree);
        }
        self.gesture = gesture;
        self.gesture.is_some()
    }

    pub fn is_gesturing(&self) -> bool {
        self.gesture.is_some()
    }

    /// Follow the pointer. Produces ghost geometry only; neither the tree
    /// nor the history changes.
    pub fn pointer_move(&mut self, pointer: (f32, f32)) -> Option<PreviewFrame> {
        let breakpoint = self.config.layout.breakpoint.as_deref();
        let gesture = self.gesture.as_mut()?;
        Some(gesture.update(&self.tree, pointer, breakpoint))
    }

    /// End the gesture and commit its final frame as one undo step.
    pub fn end_gesture(&mut self) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        let description = match gesture.kind() {
            GestureKind::Move => format!("Move {}", gesture.node()),
            GestureKind::Resize(_) => format!("Resize {}", gesture.node()),
        };
        let changed = match gesture.finish() {
            Some((id, frame)) => self.apply(Mutation::SetFrame { id, frame }),
            None => false,
        };
        self.history.end_batch(&self.tree, &description);
        changed
    }

    /// Drop the live gesture without writing anything. Returns the frame the
    /// ghost snaps back to.
    pub fn cancel_gesture(&mut self) -> Option<Rect> {
        let gesture = self.gesture.take()?;
        self.history.end_batch(&self.tree, "Cancelled gesture");
        Some(gesture.cancel())
    }

    // ─── History ─────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> Option<String> {
        self.cancel_gesture();
        let desc = self.history.undo(&mut self.tree)?;
        self.refresh();
        Some(desc)
    }

    pub fn redo(&mut self) -> Option<String> {
        self.cancel_gesture();
        let desc = self.history.redo(&mut self.tree)?;
        self.refresh();
        Some(desc)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_len(&self) -> usize {
        self.history.undo_len()
    }

    // ─── Inspector ───────────────────────────────────────────────────────

    /// Blend the selection's constraints at the active breakpoint.
    pub fn blend_selection(&self, ids: &[NodeId]) -> Option<BlendedConstraints> {
        blend(ids.iter().filter_map(|&id| self.tree.get(id)), self.breakpoint())
    }

    pub fn constraint_panel(&self, ids: &[NodeId]) -> Option<ConstraintPanel> {
        ConstraintPanel::from_selection(&self.tree, ids, self.breakpoint())
    }

    /// Set the horizontal constraint of every unlocked selected node in one
    /// undo step.
    pub fn set_selection_horizontal(
        &mut self,
        ids: &[NodeId],
        value: HorizontalConstraint,
    ) -> bool {
        let mutations = ConstraintPanel::set_horizontal(&self.tree, ids, self.breakpoint(), value);
        self.apply_all(mutations, "Set horizontal constraint")
    }

    pub fn set_selection_vertical(&mut self, ids: &[NodeId], value: VerticalConstraint) -> bool {
        let mutations = ConstraintPanel::set_vertical(&self.tree, ids, self.breakpoint(), value);
        self.apply_all(mutations, "Set vertical constraint")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pinframe_core::blend::Blended;
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> NodeId {
        NodeId::intern(s)
    }

    fn session() -> Session {
        let tree = SceneTree::new()
            .insert(Node::frame_node("ss_page").with_frame(0.0, 0.0, 400.0, 300.0), None, 0)
            .insert(
                Node::rect_node("ss_a").with_frame(10.0, 10.0, 50.0, 50.0),
                Some(id("ss_page")),
                0,
            )
            .insert(
                Node::rect_node("ss_b")
                    .with_frame(100.0, 10.0, 50.0, 50.0)
                    .with_constraints(HorizontalConstraint::Right, VerticalConstraint::Top),
                Some(id("ss_page")),
                1,
            )
            .set_frame(id("ss_a"), Rect::new(10.0, 10.0, 50.0, 50.0))
            .set_frame(id("ss_b"), Rect::new(100.0, 10.0, 50.0, 50.0));
        Session::from_tree(tree, SessionConfig::default())
    }

    #[test]
    fn apply_records_one_step() {
        let mut s = session();
        assert!(s.apply(Mutation::Translate {
            id: id("ss_a"),
            dx: 5.0,
            dy: 0.0
        }));
        assert_eq!(s.undo_len(), 1);
        assert_eq!(s.layout()[&id("ss_a")].x, 15.0);
        assert_eq!(s.undo(), Some("Move #ss_a".to_string()));
        assert_eq!(s.tree().get(id("ss_a")).map(|n| n.x), Some(10.0));
    }

    #[test]
    fn noop_mutation_is_not_recorded() {
        let mut s = session();
        assert!(!s.apply(Mutation::Remove { id: id("ss_missing") }));
        assert!(!s.can_undo());
    }

    #[test]
    fn resize_of_hug_axis_fixes_it() {
        let mut s = session();
        s.apply(Mutation::SetSizeModes {
            id: id("ss_a"),
            size_x: SizeMode::Hug,
            size_y: SizeMode::Hug,
        });
        s.apply(Mutation::Resize {
            id: id("ss_a"),
            width: 80.0,
            height: 50.0,
        });
        let node = s.tree().get(id("ss_a")).cloned().unwrap();
        assert_eq!((node.size_x, node.size_y), (SizeMode::Fixed, SizeMode::Hug));
        assert_eq!(node.width, 80.0);
    }

    #[test]
    fn insert_frame_uses_default_size() {
        let mut s = session();
        let new = s.insert_frame(Some(id("ss_page")), 20.0, 30.0);
        assert_eq!(s.layout()[&new], Rect::new(20.0, 30.0, 100.0, 100.0));
        assert_eq!(s.tree().children_of(id("ss_page")).last(), Some(&new));
    }

    #[test]
    fn insert_frame_is_one_undo_step() {
        let mut s = session();
        let before = s.tree().clone();
        let new = s.insert_frame(Some(id("ss_page")), 20.0, 30.0);
        assert_eq!(s.undo_len(), 1);
        assert_eq!(s.undo(), Some(format!("Insert {new}")));
        assert_eq!(s.tree(), &before);
    }

    #[test]
    fn edits_during_a_gesture_join_its_undo_step() {
        let mut s = session();
        s.begin_move(id("ss_a"), (0.0, 0.0));
        s.pointer_move((30.0, 0.0));
        s.apply(Mutation::SetHidden {
            id: id("ss_b"),
            hidden: true,
        });
        assert!(!s.can_undo());
        assert!(s.end_gesture());
        assert_eq!(s.undo_len(), 1);

        s.undo();
        assert_eq!(s.tree().get(id("ss_b")).map(|n| n.hidden), Some(false));
        assert_eq!(s.tree().get(id("ss_a")).map(|n| n.x), Some(10.0));
    }

    #[test]
    fn undo_mid_gesture_drops_the_gesture() {
        let mut s = session();
        s.apply(Mutation::Translate {
            id: id("ss_b"),
            dx: 5.0,
            dy: 0.0,
        });
        s.begin_move(id("ss_a"), (0.0, 0.0));
        s.pointer_move((30.0, 0.0));
        assert_eq!(s.undo(), Some("Move #ss_b".to_string()));
        assert!(!s.is_gesturing());
        assert!(!s.end_gesture());
        assert!(s.can_redo());
    }

    #[test]
    fn gesture_commits_once() {
        let mut s = session();
        assert!(s.begin_move(id("ss_a"), (0.0, 0.0)));
        for step in 1..=10 {
            let frame = s.pointer_move((step as f32, 0.0)).unwrap();
            assert_eq!(frame.ghost.x, 10.0 + step as f32);
        }
        assert!(!s.can_undo());
        assert_eq!(s.tree().get(id("ss_a")).map(|n| n.x), Some(10.0));

        assert!(s.end_gesture());
        assert_eq!(s.undo_len(), 1);
        assert_eq!(s.tree().get(id("ss_a")).map(|n| n.x), Some(20.0));
    }

    #[test]
    fn locked_node_cannot_be_dragged() {
        let mut s = session();
        s.apply(Mutation::SetLocked {
            id: id("ss_a"),
            locked: true,
        });
        assert!(!s.begin_move(id("ss_a"), (0.0, 0.0)));
        assert_eq!(s.pointer_move((5.0, 5.0)), None);
    }

    #[test]
    fn breakpoint_switch_keeps_history() {
        let mut s = session();
        s.apply(Mutation::SetConstraints {
            id: id("ss_a"),
            breakpoint: Some("mobile".into()),
            constraints: AxisConstraints::new(
                HorizontalConstraint::Stretch,
                VerticalConstraint::Top,
            ),
        });
        let steps = s.undo_len();
        s.set_breakpoint(Some("mobile"));
        assert_eq!(s.layout()[&id("ss_a")].width, 400.0);
        s.set_breakpoint(None);
        assert_eq!(s.layout()[&id("ss_a")].width, 50.0);
        assert_eq!(s.undo_len(), steps);
    }

    #[test]
    fn selection_blend_and_bulk_set() {
        let mut s = session();
        let sel = [id("ss_a"), id("ss_b")];
        assert_eq!(s.blend_selection(&sel).map(|b| b.horizontal), Some(Blended::Mixed));

        assert!(s.set_selection_horizontal(&sel, HorizontalConstraint::Center));
        assert_eq!(s.undo_len(), 1);
        assert_eq!(
            s.blend_selection(&sel).map(|b| b.horizontal),
            Some(Blended::Uniform(HorizontalConstraint::Center))
        );
        assert_eq!(s.layout()[&id("ss_a")].x, 175.0);
    }

    #[test]
    fn config_from_partial_json() {
        let text = r#"{"historyDepth": 5, "layout": {"breakpoint": "tablet"}}"#;
        let config = SessionConfig::from_json(text).unwrap();
        assert_eq!(config.history_depth, 5);
        assert_eq!(config.layout.breakpoint(), Some("tablet"));
        assert!(config.layout.auto_commit);
    }
}
