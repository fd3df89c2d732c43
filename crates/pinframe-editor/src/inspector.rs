//! Constraint inspector panel model.
//!
//! Read side: blend a selection into one value per control. Write side:
//! turn a control change into per-node [`Mutation`]s the session applies as
//! one undo step.

use crate::session::Mutation;
use pinframe_core::blend::{Blended, BlendedConstraints, blend, blend_by};
use pinframe_core::id::NodeId;
use pinframe_core::model::{AxisConstraints, HorizontalConstraint, Node, VerticalConstraint};
use pinframe_core::tree::SceneTree;
use serde::Serialize;

/// Blended pin distances of a selection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BlendedOffsets {
    pub left: Blended<f32>,
    pub right: Blended<f32>,
    pub top: Blended<f32>,
    pub bottom: Blended<f32>,
}

/// What the constraint section of the inspector shows for a selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintPanel {
    /// Selected ids that exist in the tree, in selection order.
    pub selection: Vec<NodeId>,
    pub breakpoint: Option<String>,
    pub constraints: BlendedConstraints,
    pub offsets: BlendedOffsets,
    pub locked: Blended<bool>,
}

impl ConstraintPanel {
    /// `None` when nothing in `ids` exists.
    pub fn from_selection(
        tree: &SceneTree,
        ids: &[NodeId],
        breakpoint: Option<&str>,
    ) -> Option<Self> {
        let nodes: Vec<&Node> = ids.iter().filter_map(|&id| tree.get(id)).collect();
        let constraints = blend(nodes.iter().copied(), breakpoint)?;
        let offset = |f: fn(&Node) -> f32| blend_by(nodes.iter().map(|n| f(n)), |v| v);
        Some(Self {
            selection: nodes.iter().map(|n| n.id).collect(),
            breakpoint: breakpoint.map(str::to_string),
            constraints,
            offsets: BlendedOffsets {
                left: offset(|n| n.constraint_offsets.left)?,
                right: offset(|n| n.constraint_offsets.right)?,
                top: offset(|n| n.constraint_offsets.top)?,
                bottom: offset(|n| n.constraint_offsets.bottom)?,
            },
            locked: blend_by(nodes.iter().map(|n| n.locked), |v| v)?,
        })
    }

    /// Mutations setting the horizontal constraint of each unlocked node in
    /// `ids`. Each node keeps its own vertical constraint.
    pub fn set_horizontal(
        tree: &SceneTree,
        ids: &[NodeId],
        breakpoint: Option<&str>,
        value: HorizontalConstraint,
    ) -> Vec<Mutation> {
        Self::rewrite(tree, ids, breakpoint, |c| AxisConstraints {
            horizontal: value,
            ..c
        })
    }

    /// Vertical counterpart of [`ConstraintPanel::set_horizontal`].
    pub fn set_vertical(
        tree: &SceneTree,
        ids: &[NodeId],
        breakpoint: Option<&str>,
        value: VerticalConstraint,
    ) -> Vec<Mutation> {
        Self::rewrite(tree, ids, breakpoint, |c| AxisConstraints {
            vertical: value,
            ..c
        })
    }

    fn rewrite(
        tree: &SceneTree,
        ids: &[NodeId],
        breakpoint: Option<&str>,
        f: impl Fn(AxisConstraints) -> AxisConstraints,
    ) -> Vec<Mutation> {
        ids.iter()
            .filter_map(|&id| tree.get(id))
            .filter(|n| !n.locked)
            .map(|n| Mutation::SetConstraints {
                id: n.id,
                breakpoint: breakpoint.map(str::to_string),
                constraints: f(n.effective_constraints(breakpoint)),
            })
            .collect()
    }
}
