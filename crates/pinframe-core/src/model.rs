//! Scene-tree data model.
//!
//! A document is a forest of `Node` values. Each node stores its frame in
//! parent-local space, per-axis pin constraints (optionally keyed by
//! breakpoint), the offsets captured when it was last pinned, and, for flow
//! containers, an `AutoLayout` description. Every type here serializes to
//! plain JSON-compatible records.

use crate::geometry::{Rect, Size, finite_or, floor_size};
use crate::id::NodeId;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Breakpoint name used when no breakpoint-specific entry exists.
pub const BASE_BREAKPOINT: &str = "base";

// ─── Pin constraints ─────────────────────────────────────────────────────

/// How a node's horizontal edges track its parent's on resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HorizontalConstraint {
    #[default]
    Left,
    Center,
    Right,
    /// Pin both edges; width follows the parent minus both offsets.
    LeftRight,
    /// Span the whole parent width, ignoring offsets.
    Stretch,
}

impl HorizontalConstraint {
    /// Canonical form for comparison: `Stretch` counts as `LeftRight`.
    pub fn normalized(self) -> Self {
        match self {
            Self::Stretch => Self::LeftRight,
            other => other,
        }
    }
}

/// How a node's vertical edges track its parent's on resize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerticalConstraint {
    #[default]
    Top,
    Center,
    Bottom,
    TopBottom,
    Stretch,
}

impl VerticalConstraint {
    /// Canonical form for comparison: `Stretch` counts as `TopBottom`.
    pub fn normalized(self) -> Self {
        match self {
            Self::Stretch => Self::TopBottom,
            other => other,
        }
    }
}

/// One constraint per axis. Defaults to `{left, top}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AxisConstraints {
    pub horizontal: HorizontalConstraint,
    pub vertical: VerticalConstraint,
}

impl AxisConstraints {
    pub const fn new(horizontal: HorizontalConstraint, vertical: VerticalConstraint) -> Self {
        Self {
            horizontal,
            vertical,
        }
    }
}

/// Breakpoint-keyed constraints with a `base` fallback.
///
/// Sparse: most nodes carry a single `base` entry, so entries live inline in
/// a `SmallVec` and lookup is a linear scan. Insertion order is preserved.
///
/// On the wire this is either a plain `{horizontal, vertical}` object (taken
/// as the `base` entry) or a map from breakpoint name to such an object.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(
    from = "ConstraintSetRepr",
    into = "IndexMap<String, AxisConstraints>"
)]
pub struct ConstraintSet {
    entries: SmallVec<[(String, AxisConstraints); 1]>,
}

impl ConstraintSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set holding only a `base` entry.
    pub fn uniform(constraints: AxisConstraints) -> Self {
        let mut set = Self::new();
        set.set(BASE_BREAKPOINT, constraints);
        set
    }

    /// Insert or replace the entry for `breakpoint`.
    pub fn set(&mut self, breakpoint: &str, constraints: AxisConstraints) {
        match self.entries.iter_mut().find(|(name, _)| name == breakpoint) {
            Some(entry) => entry.1 = constraints,
            None => self.entries.push((breakpoint.to_string(), constraints)),
        }
    }

    /// Remove the entry for `breakpoint`; returns what was stored.
    pub fn remove(&mut self, breakpoint: &str) -> Option<AxisConstraints> {
        let pos = self.entries.iter().position(|(name, _)| name == breakpoint)?;
        Some(self.entries.remove(pos).1)
    }

    /// The entry stored for exactly this breakpoint, without fallback.
    pub fn get(&self, breakpoint: &str) -> Option<AxisConstraints> {
        self.entries
            .iter()
            .find(|(name, _)| name == breakpoint)
            .map(|(_, c)| *c)
    }

    /// `self[breakpoint] ?? self.base ?? {left, top}`.
    pub fn effective(&self, breakpoint: Option<&str>) -> AxisConstraints {
        breakpoint
            .and_then(|bp| self.get(bp))
            .or_else(|| self.get(BASE_BREAKPOINT))
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn breakpoints(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConstraintSetRepr {
    Single(AxisConstraints),
    Keyed(IndexMap<String, AxisConstraints>),
}

impl From<ConstraintSetRepr> for ConstraintSet {
    fn from(repr: ConstraintSetRepr) -> Self {
        match repr {
            ConstraintSetRepr::Single(c) => ConstraintSet::uniform(c),
            ConstraintSetRepr::Keyed(map) => {
                let mut set = ConstraintSet::new();
                for (name, c) in map {
                    set.set(&name, c);
                }
                set
            }
        }
    }
}

impl From<ConstraintSet> for IndexMap<String, AxisConstraints> {
    fn from(set: ConstraintSet) -> Self {
        set.entries.into_iter().collect()
    }
}

/// Distances from each node edge to the matching parent edge, captured when
/// the node was last pinned. Missing fields read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstraintOffsets {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl ConstraintOffsets {
    /// Offsets of `frame` inside a parent of `parent` size.
    pub fn capture(frame: Rect, parent: Size) -> Self {
        Self {
            left: frame.x,
            right: parent.width - frame.x - frame.width,
            top: frame.y,
            bottom: parent.height - frame.y - frame.height,
        }
    }

    /// Non-finite offsets read as zero.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        Self {
            left: finite_or(self.left, 0.0),
            right: finite_or(self.right, 0.0),
            top: finite_or(self.top, 0.0),
            bottom: finite_or(self.bottom, 0.0),
        }
    }
}

// ─── Auto layout ─────────────────────────────────────────────────────────

/// Main axis of a flow container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlowDirection {
    #[default]
    Row,
    Column,
}

/// Cross-axis placement of children in a flow container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Align {
    #[default]
    Start,
    Center,
    End,
    Stretch,
}

/// Main-axis distribution of children in a flow container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Justify {
    #[default]
    Start,
    Center,
    End,
    SpaceBetween,
}

/// Flow layout description. Present only on flow containers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoLayout {
    pub direction: FlowDirection,
    pub gap: f32,
    pub padding: f32,
    pub align: Align,
    pub justify: Justify,
}

impl AutoLayout {
    pub fn row(gap: f32, padding: f32) -> Self {
        Self {
            direction: FlowDirection::Row,
            gap,
            padding,
            ..Default::default()
        }
    }

    pub fn column(gap: f32, padding: f32) -> Self {
        Self {
            direction: FlowDirection::Column,
            gap,
            padding,
            ..Default::default()
        }
    }
}

/// Per-axis sizing behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SizeMode {
    /// Keep the stored size.
    #[default]
    Fixed,
    /// Derive the size from the content (flow containers only).
    Hug,
    /// Take the space offered by a flow parent.
    Fill,
}

/// Which axis a per-axis setting applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// What kind of element a node is. Layout treats every kind alike; the kind
/// matters to painting, grouping, and the inspector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum NodeKind {
    /// Visible container with its own box.
    Frame,
    /// Structural container produced by grouping.
    Group,
    Rect,
    Ellipse,
    Text {
        #[serde(default)]
        content: String,
    },
    Image {
        #[serde(default)]
        source: String,
    },
    /// Placed copy of a reusable component.
    ComponentInstance {
        component: NodeId,
    },
    Vector,
}

impl NodeKind {
    /// Whether nodes of this kind normally hold children.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            NodeKind::Frame | NodeKind::Group | NodeKind::ComponentInstance { .. }
        )
    }
}

fn default_extent() -> f32 {
    1.0
}

fn default_opacity() -> f32 {
    1.0
}

/// A single element in the scene tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    #[serde(flatten)]
    pub kind: NodeKind,

    /// `None` for roots.
    #[serde(default)]
    pub parent: Option<NodeId>,

    /// Paint/tab order: first child paints first (back-most).
    #[serde(default)]
    pub children: SmallVec<[NodeId; 4]>,

    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default = "default_extent")]
    pub width: f32,
    #[serde(default = "default_extent")]
    pub height: f32,

    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    /// Still resolved; geometry and constraint edits are ignored.
    #[serde(default)]
    pub locked: bool,
    /// Still resolved; not painted.
    #[serde(default)]
    pub hidden: bool,

    #[serde(default, skip_serializing_if = "ConstraintSet::is_empty")]
    pub constraints: ConstraintSet,
    #[serde(default)]
    pub constraint_offsets: ConstraintOffsets,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_layout: Option<AutoLayout>,

    #[serde(default)]
    pub size_x: SizeMode,
    #[serde(default)]
    pub size_y: SizeMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_height: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_height: Option<f32>,
}

impl Node {
    /// A detached 1×1 node at the origin with default `{left, top}` pinning.
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            parent: None,
            children: SmallVec::new(),
            x: 0.0,
            y: 0.0,
            width: 1.0,
            height: 1.0,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            hidden: false,
            constraints: ConstraintSet::new(),
            constraint_offsets: ConstraintOffsets::default(),
            auto_layout: None,
            size_x: SizeMode::Fixed,
            size_y: SizeMode::Fixed,
            min_width: None,
            max_width: None,
            min_height: None,
            max_height: None,
        }
    }

    pub fn frame_node(id: &str) -> Self {
        Self::new(NodeId::intern(id), NodeKind::Frame)
    }

    pub fn rect_node(id: &str) -> Self {
        Self::new(NodeId::intern(id), NodeKind::Rect)
    }

    #[must_use]
    pub fn with_frame(mut self, x: f32, y: f32, width: f32, height: f32) -> Self {
        self.set_frame(Rect::new(x, y, width, height));
        self
    }

    #[must_use]
    pub fn with_constraints(
        mut self,
        horizontal: HorizontalConstraint,
        vertical: VerticalConstraint,
    ) -> Self {
        self.constraints
            .set(BASE_BREAKPOINT, AxisConstraints::new(horizontal, vertical));
        self
    }

    #[must_use]
    pub fn with_breakpoint_constraints(
        mut self,
        breakpoint: &str,
        horizontal: HorizontalConstraint,
        vertical: VerticalConstraint,
    ) -> Self {
        self.constraints
            .set(breakpoint, AxisConstraints::new(horizontal, vertical));
        self
    }

    #[must_use]
    pub fn with_offsets(mut self, left: f32, right: f32, top: f32, bottom: f32) -> Self {
        self.constraint_offsets = ConstraintOffsets {
            left,
            right,
            top,
            bottom,
        };
        self
    }

    #[must_use]
    pub fn with_auto_layout(mut self, layout: AutoLayout) -> Self {
        self.auto_layout = Some(layout);
        self
    }

    #[must_use]
    pub fn with_size_modes(mut self, size_x: SizeMode, size_y: SizeMode) -> Self {
        self.size_x = size_x;
        self.size_y = size_y;
        self
    }

    #[must_use]
    pub fn with_width_limits(mut self, min: Option<f32>, max: Option<f32>) -> Self {
        self.min_width = min;
        self.max_width = max;
        self
    }

    /// The stored frame in parent-local space.
    pub fn frame(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Write the frame, flooring both sizes.
    pub fn set_frame(&mut self, frame: Rect) {
        let frame = frame.sanitized();
        self.x = frame.x;
        self.y = frame.y;
        self.width = frame.width;
        self.height = frame.height;
    }

    pub fn size(&self) -> Size {
        Size::new(floor_size(self.width), floor_size(self.height))
    }

    pub fn effective_constraints(&self, breakpoint: Option<&str>) -> AxisConstraints {
        self.constraints.effective(breakpoint)
    }

    pub fn size_mode(&self, axis: Axis) -> SizeMode {
        match axis {
            Axis::Horizontal => self.size_x,
            Axis::Vertical => self.size_y,
        }
    }

    /// `(min, max)` clamps for one axis.
    pub fn limits(&self, axis: Axis) -> (Option<f32>, Option<f32>) {
        match axis {
            Axis::Horizontal => (self.min_width, self.max_width),
            Axis::Vertical => (self.min_height, self.max_height),
        }
    }

    /// True when at least one axis derives its size from the content.
    pub fn hugs_content(&self) -> bool {
        self.auto_layout.is_some()
            && (self.size_x == SizeMode::Hug || self.size_y == SizeMode::Hug)
    }
}
