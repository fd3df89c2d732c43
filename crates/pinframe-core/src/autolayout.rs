//! Auto-layout sizer and flow placement.
//!
//! [`compute_size`] derives a flow container's own size from its children
//! (hug sizing). [`arrange`] places the children of a flow container once
//! its box is final.
//!
//! Padding insets the main axis at both ends and the cross axis at the
//! leading edge only: a row with padding 8 and a 30px-tall child hugs to a
//! height of 38.

use crate::geometry::{Rect, Size, clamp_size, finite_or, floor_size};
use crate::id::NodeId;
use crate::model::{Align, Axis, AutoLayout, FlowDirection, Justify, Node, SizeMode};

impl FlowDirection {
    pub fn main_axis(self) -> Axis {
        match self {
            FlowDirection::Row => Axis::Horizontal,
            FlowDirection::Column => Axis::Vertical,
        }
    }

    pub fn cross_axis(self) -> Axis {
        match self {
            FlowDirection::Row => Axis::Vertical,
            FlowDirection::Column => Axis::Horizontal,
        }
    }

    fn main(self, size: Size) -> f32 {
        match self {
            FlowDirection::Row => size.width,
            FlowDirection::Column => size.height,
        }
    }

    fn cross(self, size: Size) -> f32 {
        match self {
            FlowDirection::Row => size.height,
            FlowDirection::Column => size.width,
        }
    }

    fn size(self, main: f32, cross: f32) -> Size {
        match self {
            FlowDirection::Row => Size::new(main, cross),
            FlowDirection::Column => Size::new(cross, main),
        }
    }
}

/// Gap and padding with non-finite values read as zero.
fn spacing(layout: &AutoLayout) -> (f32, f32) {
    (finite_or(layout.gap, 0.0), finite_or(layout.padding, 0.0))
}

/// Size of the flow content plus padding, before size modes and clamps.
/// `None` for an empty child list.
pub fn content_size(layout: &AutoLayout, children: &[Size]) -> Option<Size> {
    if children.is_empty() {
        return None;
    }
    let dir = layout.direction;
    let (gap, padding) = spacing(layout);
    let gaps = gap * (children.len() - 1) as f32;
    let main: f32 = children.iter().map(|s| floor_size(dir.main(*s))).sum::<f32>() + gaps;
    let cross = children
        .iter()
        .map(|s| floor_size(dir.cross(*s)))
        .fold(0.0, f32::max);
    Some(dir.size(main + 2.0 * padding, cross + padding))
}

/// Hug size of `parent` given its children's current sizes.
///
/// `None` when the parent has no auto layout or no children. Each axis takes
/// the computed value only when its size mode is exactly `hug`; other axes
/// keep the stored size. Both axes are then clamped to the parent's limits.
pub fn compute_size_from(parent: &Node, children: &[Size]) -> Option<Size> {
    let layout = parent.auto_layout.as_ref()?;
    let content = content_size(layout, children)?;
    let pick = |axis: Axis, computed: f32, stored: f32| {
        let value = if parent.size_mode(axis) == SizeMode::Hug {
            computed
        } else {
            stored
        };
        let (min, max) = parent.limits(axis);
        clamp_size(value, min, max)
    };
    Some(Size::new(
        pick(Axis::Horizontal, content.width, parent.width),
        pick(Axis::Vertical, content.height, parent.height),
    ))
}

/// Hug size of `parent` from its child nodes' stored sizes.
pub fn compute_size<'a>(
    parent: &Node,
    children: impl IntoIterator<Item = &'a Node>,
) -> Option<Size> {
    let sizes: Vec<Size> = children.into_iter().map(Node::size).collect();
    compute_size_from(parent, &sizes)
}

/// One child's input to [`arrange`]: its node and its current size, which
/// may differ from the stored one when a nested container was re-measured.
#[derive(Debug, Clone, Copy)]
pub struct FlowItem<'a> {
    pub node: &'a Node,
    pub size: Size,
}

impl<'a> FlowItem<'a> {
    pub fn new(node: &'a Node) -> Self {
        Self {
            node,
            size: node.size(),
        }
    }
}

/// Place flow children inside `parent_box`, in list order.
///
/// Children with a `fill` main-axis mode share the space left over by the
/// others equally; a `fill` cross-axis mode or `align: stretch` takes the
/// whole inner cross extent. Sizes are clamped to each child's limits.
pub fn arrange(
    parent_box: Rect,
    layout: &AutoLayout,
    items: &[FlowItem<'_>],
) -> Vec<(NodeId, Rect)> {
    if items.is_empty() {
        return Vec::new();
    }
    let dir = layout.direction;
    let (main_axis, cross_axis) = (dir.main_axis(), dir.cross_axis());
    let (gap, padding) = spacing(layout);
    let n = items.len();
    let gaps = gap * (n - 1) as f32;

    let inner_main = dir.main(parent_box.size()) - 2.0 * padding;
    let inner_cross = dir.cross(parent_box.size()) - padding;

    let fills = |item: &FlowItem<'_>, axis| item.node.size_mode(axis) == SizeMode::Fill;
    let fixed_main: f32 = items
        .iter()
        .filter(|i| !fills(*i, main_axis))
        .map(|i| floor_size(dir.main(i.size)))
        .sum();
    let fill_count = items.iter().filter(|i| fills(*i, main_axis)).count();
    let fill_share = if fill_count > 0 {
        (inner_main - fixed_main - gaps) / fill_count as f32
    } else {
        0.0
    };

    let sizes: Vec<(f32, f32)> = items
        .iter()
        .map(|item| {
            let (min, max) = item.node.limits(main_axis);
            let main = if fills(item, main_axis) {
                clamp_size(fill_share, min, max)
            } else {
                clamp_size(dir.main(item.size), min, max)
            };
            let (min, max) = item.node.limits(cross_axis);
            let cross = if fills(item, cross_axis) || layout.align == Align::Stretch {
                clamp_size(inner_cross, min, max)
            } else {
                clamp_size(dir.cross(item.size), min, max)
            };
            (main, cross)
        })
        .collect();

    let used: f32 = sizes.iter().map(|(m, _)| m).sum::<f32>() + gaps;
    let free = inner_main - used;
    let (lead, step) = match layout.justify {
        Justify::Start => (0.0, gap),
        Justify::Center => (free / 2.0, gap),
        Justify::End => (free, gap),
        Justify::SpaceBetween if n > 1 && free > 0.0 => (0.0, gap + free / (n - 1) as f32),
        Justify::SpaceBetween => (0.0, gap),
    };

    let (origin_main, origin_cross) = match dir {
        FlowDirection::Row => (parent_box.x, parent_box.y),
        FlowDirection::Column => (parent_box.y, parent_box.x),
    };

    let mut cursor = origin_main + padding + lead;
    items
        .iter()
        .zip(sizes)
        .map(|(item, (main, cross))| {
            let offset = match layout.align {
                Align::Start | Align::Stretch => 0.0,
                Align::Center => (inner_cross - cross) / 2.0,
                Align::End => inner_cross - cross,
            };
            let cross_pos = origin_cross + padding + offset;
            let rect = match dir {
                FlowDirection::Row => Rect::new(cursor, cross_pos, main, cross),
                FlowDirection::Column => Rect::new(cross_pos, cursor, cross, main),
            };
            cursor += main + step;
            log::trace!("arrange {} -> {rect:?}", item.node.id);
            (item.node.id, rect)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hug_row(gap: f32, padding: f32) -> Node {
        Node::frame_node("al_row")
            .with_frame(0.0, 0.0, 10.0, 10.0)
            .with_auto_layout(AutoLayout::row(gap, padding))
            .with_size_modes(SizeMode::Hug, SizeMode::Hug)
    }

    fn leaf(name: &str, w: f32, h: f32) -> Node {
        Node::rect_node(name).with_frame(0.0, 0.0, w, h)
    }

    #[test]
    fn row_hug_sums_children() {
        let parent = hug_row(8.0, 8.0);
        let children = [leaf("al_a", 50.0, 20.0), leaf("al_b", 70.0, 30.0)];
        assert_eq!(
            compute_size(&parent, &children),
            Some(Size::new(144.0, 38.0))
        );
    }

    #[test]
    fn column_swaps_axes() {
        let parent = Node::frame_node("al_col")
            .with_auto_layout(AutoLayout::column(4.0, 0.0))
            .with_size_modes(SizeMode::Hug, SizeMode::Hug);
        let children = [leaf("al_c", 50.0, 20.0), leaf("al_d", 70.0, 30.0)];
        assert_eq!(compute_size(&parent, &children), Some(Size::new(70.0, 54.0)));
    }

    #[test]
    fn only_hug_axes_take_computed_values() {
        let parent = hug_row(8.0, 8.0)
            .with_frame(0.0, 0.0, 300.0, 90.0)
            .with_size_modes(SizeMode::Fixed, SizeMode::Hug);
        let children = [leaf("al_e", 50.0, 20.0)];
        assert_eq!(compute_size(&parent, &children), Some(Size::new(300.0, 28.0)));
    }

    #[test]
    fn no_layout_or_no_children_yields_none() {
        let plain = Node::frame_node("al_plain");
        assert_eq!(compute_size(&plain, &[leaf("al_f", 5.0, 5.0)]), None);
        assert_eq!(compute_size(&hug_row(0.0, 0.0), &Vec::<Node>::new()), None);
    }

    #[test]
    fn hug_result_respects_limits() {
        let parent = hug_row(0.0, 0.0).with_width_limits(Some(200.0), None);
        let children = [leaf("al_g", 50.0, 20.0)];
        assert_eq!(compute_size(&parent, &children).map(|s| s.width), Some(200.0));

        let parent = hug_row(0.0, 0.0).with_width_limits(None, Some(40.0));
        assert_eq!(compute_size(&parent, &children).map(|s| s.width), Some(40.0));
    }

    #[test]
    fn arrange_row_start() {
        let layout = AutoLayout::row(8.0, 8.0);
        let (a, b) = (leaf("al_h", 50.0, 20.0), leaf("al_i", 70.0, 30.0));
        let placed = arrange(
            Rect::new(100.0, 0.0, 144.0, 38.0),
            &layout,
            &[FlowItem::new(&a), FlowItem::new(&b)],
        );
        assert_eq!(
            placed,
            vec![
                (a.id, Rect::new(108.0, 8.0, 50.0, 20.0)),
                (b.id, Rect::new(166.0, 8.0, 70.0, 30.0)),
            ]
        );
    }

    #[test]
    fn arrange_space_between_and_center_align() {
        let layout = AutoLayout {
            justify: Justify::SpaceBetween,
            align: Align::Center,
            ..AutoLayout::row(0.0, 0.0)
        };
        let (a, b) = (leaf("al_j", 20.0, 10.0), leaf("al_k", 20.0, 30.0));
        let placed = arrange(
            Rect::new(0.0, 0.0, 100.0, 30.0),
            &layout,
            &[FlowItem::new(&a), FlowItem::new(&b)],
        );
        assert_eq!(placed[0].1, Rect::new(0.0, 10.0, 20.0, 10.0));
        assert_eq!(placed[1].1, Rect::new(80.0, 0.0, 20.0, 30.0));
    }

    #[test]
    fn arrange_fill_children_share_remaining_space() {
        let layout = AutoLayout::column(10.0, 0.0);
        let fixed = leaf("al_l", 40.0, 100.0);
        let grow_a = leaf("al_m", 40.0, 1.0).with_size_modes(SizeMode::Fill, SizeMode::Fill);
        let grow_b = leaf("al_n", 40.0, 1.0).with_size_modes(SizeMode::Fixed, SizeMode::Fill);
        let placed = arrange(
            Rect::new(0.0, 0.0, 200.0, 400.0),
            &layout,
            &[FlowItem::new(&fixed), FlowItem::new(&grow_a), FlowItem::new(&grow_b)],
        );
        // 400 - 100 - 2 * 10 = 280, split two ways
        assert_eq!(placed[1].1, Rect::new(0.0, 110.0, 200.0, 140.0));
        assert_eq!(placed[2].1, Rect::new(0.0, 260.0, 40.0, 140.0));
    }

    #[test]
    fn arrange_end_and_stretch() {
        let layout = AutoLayout {
            justify: Justify::End,
            align: Align::Stretch,
            ..AutoLayout::row(0.0, 4.0)
        };
        let a = leaf("al_o", 30.0, 10.0);
        let placed = arrange(Rect::new(0.0, 0.0, 100.0, 50.0), &layout, &[FlowItem::new(&a)]);
        assert_eq!(placed[0].1, Rect::new(66.0, 4.0, 30.0, 46.0));
    }
}
