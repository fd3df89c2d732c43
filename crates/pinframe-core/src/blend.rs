//! Constraint blending for multi-selection.
//!
//! Reduces the effective constraints of a selection to one value per axis,
//! or [`Blended::Mixed`] when the nodes disagree. Read-only: nothing here
//! touches a node.

use crate::model::{HorizontalConstraint, Node, VerticalConstraint};
use serde::{Serialize, Serializer};

/// One shared value, or the "mixed" sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Blended<T> {
    Uniform(T),
    Mixed,
}

/// `Uniform(v)` serializes as `v`; `Mixed` as the string `"mixed"`.
impl<T: Serialize> Serialize for Blended<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Blended::Uniform(v) => v.serialize(serializer),
            Blended::Mixed => serializer.serialize_str("mixed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BlendedConstraints {
    pub horizontal: Blended<HorizontalConstraint>,
    pub vertical: Blended<VerticalConstraint>,
}

/// Blend arbitrary values, comparing them through `normalize`.
///
/// Returns `None` for no values. When every raw value is identical that value
/// is returned as-is; when they only agree after normalizing, the normalized
/// value is returned.
pub fn blend_by<T, I, F>(values: I, normalize: F) -> Option<Blended<T>>
where
    T: Copy + PartialEq,
    I: IntoIterator<Item = T>,
    F: Fn(T) -> T,
{
    let mut iter = values.into_iter();
    let first = iter.next()?;
    let canonical = normalize(first);
    let mut identical = true;
    for v in iter {
        if normalize(v) != canonical {
            return Some(Blended::Mixed);
        }
        identical &= v == first;
    }
    Some(Blended::Uniform(if identical { first } else { canonical }))
}

/// Blend the effective constraints of `nodes` at `breakpoint`.
/// `None` for an empty selection.
pub fn blend<'a>(
    nodes: impl IntoIterator<Item = &'a Node>,
    breakpoint: Option<&str>,
) -> Option<BlendedConstraints> {
    let effective: Vec<_> = nodes
        .into_iter()
        .map(|n| n.effective_constraints(breakpoint))
        .collect();
    Some(BlendedConstraints {
        horizontal: blend_by(
            effective.iter().map(|c| c.horizontal),
            HorizontalConstraint::normalized,
        )?,
        vertical: blend_by(
            effective.iter().map(|c| c.vertical),
            VerticalConstraint::normalized,
        )?,
    })
}
