//! Shared box math: rectangles, sizes, clamps, and sanitizing.
//!
//! Every size leaving this crate passes through [`floor_size`], so a
//! degenerate or non-finite input can never produce a zero, negative, or NaN
//! extent downstream.

use serde::{Deserialize, Serialize};

/// Hard lower bound for any width or height.
pub const MIN_SIZE: f32 = 1.0;

/// A width/height pair.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Size with both axes floored to [`MIN_SIZE`].
    #[must_use]
    pub fn floored(self) -> Self {
        Self {
            width: floor_size(self.width),
            height: floor_size(self.height),
        }
    }
}

/// An axis-aligned box. Depending on the producer it is in parent-local
/// space (stored frames) or canvas space (layout maps).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// A box of `size` at the origin.
    pub const fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    #[must_use]
    pub fn translated(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Smallest box covering both.
    #[must_use]
    pub fn union(&self, other: &Rect) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Self {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    /// Replace non-finite coordinates with 0 and floor both sizes.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            x: finite_or(self.x, 0.0),
            y: finite_or(self.y, 0.0),
            width: floor_size(self.width),
            height: floor_size(self.height),
        }
    }
}

/// Union of every box in `rects`, or `None` when empty.
pub fn union_all<'a>(rects: impl IntoIterator<Item = &'a Rect>) -> Option<Rect> {
    rects
        .into_iter()
        .fold(None, |acc: Option<Rect>, r| Some(acc.map_or(*r, |a| a.union(r))))
}

/// `value` if finite, else `fallback`.
pub fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

/// Floor a size to [`MIN_SIZE`]. NaN and negative infinity floor too;
/// positive infinity is treated as degenerate and also floors.
pub fn floor_size(value: f32) -> f32 {
    if value.is_finite() {
        value.max(MIN_SIZE)
    } else {
        MIN_SIZE
    }
}

/// Clamp into `[min, max]` (either bound optional), then apply the hard floor.
///
/// When `min > max` the minimum wins.
pub fn clamp_size(value: f32, min: Option<f32>, max: Option<f32>) -> f32 {
    let mut v = value;
    if let Some(max) = max.filter(|m| m.is_finite()) {
        v = v.min(max);
    }
    if let Some(min) = min.filter(|m| m.is_finite()) {
        v = v.max(min);
    }
    floor_size(v)
}
