//! Geometry resolver: pin constraints → child boxes.
//!
//! Given a parent's final box and its direct children, computes each child's
//! box from its effective constraints and captured offsets. Resolution is one
//! level deep; the cascade in [`crate::layout`] re-invokes it per container
//! child with that child's freshly resolved box.
//!
//! [`place_axis`] is the only place the per-axis math lives. The commit path
//! and the editor's preview path both go through it.

use crate::geometry::{Rect, Size, clamp_size, finite_or, floor_size};
use crate::id::NodeId;
use crate::model::{Axis, AxisConstraints, HorizontalConstraint, Node, VerticalConstraint};

/// Axis-neutral form of a horizontal or vertical constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pin {
    /// Keep the leading offset (left / top).
    Start,
    Center,
    /// Keep the trailing offset (right / bottom).
    End,
    /// Keep both offsets; the size follows the parent.
    Both,
    /// Fill the parent exactly, ignoring offsets.
    Stretch,
}

impl From<HorizontalConstraint> for Pin {
    fn from(c: HorizontalConstraint) -> Self {
        match c {
            HorizontalConstraint::Left => Pin::Start,
            HorizontalConstraint::Center => Pin::Center,
            HorizontalConstraint::Right => Pin::End,
            HorizontalConstraint::LeftRight => Pin::Both,
            HorizontalConstraint::Stretch => Pin::Stretch,
        }
    }
}

impl From<VerticalConstraint> for Pin {
    fn from(c: VerticalConstraint) -> Self {
        match c {
            VerticalConstraint::Top => Pin::Start,
            VerticalConstraint::Center => Pin::Center,
            VerticalConstraint::Bottom => Pin::End,
            VerticalConstraint::TopBottom => Pin::Both,
            VerticalConstraint::Stretch => Pin::Stretch,
        }
    }
}

/// A 1-D interval: position and extent along one axis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Span {
    pub start: f32,
    pub len: f32,
}

impl Span {
    pub const fn new(start: f32, len: f32) -> Self {
        Self { start, len }
    }
}

/// `(min, max)` size clamps for one axis.
pub type Limits = (Option<f32>, Option<f32>);

/// Place one axis of a child inside `parent`.
///
/// `size` is the child's current extent; `lead`/`trail` are its captured
/// offsets to the parent's leading and trailing edges. The resulting extent
/// is clamped into `limits` and floored to 1. Positions are derived from the
/// clamped extent so `End`/`Center` stay flush.
pub fn place_axis(
    pin: Pin,
    parent: Span,
    size: f32,
    lead: f32,
    trail: f32,
    limits: Limits,
) -> Span {
    let origin = finite_or(parent.start, 0.0);
    let extent = floor_size(parent.len);
    let lead = finite_or(lead, 0.0);
    let trail = finite_or(trail, 0.0);
    let (min, max) = limits;
    let clamp = |v: f32| clamp_size(finite_or(v, 1.0), min, max);

    match pin {
        Pin::Start => Span::new(origin + lead, clamp(size)),
        Pin::End => {
            let len = clamp(size);
            Span::new(origin + extent - len - trail, len)
        }
        Pin::Center => {
            let len = clamp(size);
            Span::new(origin + extent / 2.0 - len / 2.0, len)
        }
        Pin::Both => Span::new(origin + lead, clamp(extent - lead - trail)),
        Pin::Stretch => Span::new(origin, clamp(extent)),
    }
}

/// Place `child` inside `parent` under explicit `constraints`.
pub fn place(parent: Rect, child: &Node, constraints: AxisConstraints) -> Rect {
    place_sized(parent, child, Size::new(child.width, child.height), constraints)
}

/// Like [`place`], with `size` standing in for the child's stored size.
/// The cascade passes re-measured hug sizes through here.
pub fn place_sized(parent: Rect, child: &Node, size: Size, constraints: AxisConstraints) -> Rect {
    let o = child.constraint_offsets;
    let h = place_axis(
        constraints.horizontal.into(),
        Span::new(parent.x, parent.width),
        size.width,
        o.left,
        o.right,
        child.limits(Axis::Horizontal),
    );
    let v = place_axis(
        constraints.vertical.into(),
        Span::new(parent.y, parent.height),
        size.height,
        o.top,
        o.bottom,
        child.limits(Axis::Vertical),
    );
    Rect::new(h.start, v.start, h.len, v.len)
}

/// Place `child` inside `parent` using its constraints for `breakpoint`.
pub fn resolve_child(parent: Rect, child: &Node, breakpoint: Option<&str>) -> Rect {
    place(parent, child, child.effective_constraints(breakpoint))
}

/// Resolve every child against the same final parent box, in input order.
pub fn resolve<'a>(
    parent: Rect,
    children: impl IntoIterator<Item = &'a Node>,
    breakpoint: Option<&str>,
) -> Vec<(NodeId, Rect)> {
    children
        .into_iter()
        .map(|child| {
            let rect = resolve_child(parent, child, breakpoint);
            log::trace!("resolve {} -> {rect:?}", child.id);
            (child.id, rect)
        })
        .collect()
}
