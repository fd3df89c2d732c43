//! Integration tests: live gestures preview without writing, then commit
//! as one undo step.

use pinframe_core::geometry::Rect;
use pinframe_core::id::NodeId;
use pinframe_core::layout::resolve_layout;
use pinframe_core::model::*;
use pinframe_core::tree::SceneTree;
use pinframe_editor::preview::{Handle, compute_preview};
use pinframe_editor::session::{Session, SessionConfig};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn id(s: &str) -> NodeId {
    NodeId::intern(s)
}

/// A page holding a panel; the panel holds a stretched header and a footer
/// pinned to its bottom edge.
fn make_session() -> Session {
    let tree = SceneTree::new()
        .insert(
            Node::frame_node("ps_page").with_frame(0.0, 0.0, 1000.0, 800.0),
            None,
            0,
        )
        .insert(
            Node::frame_node("ps_panel").with_frame(100.0, 100.0, 300.0, 200.0),
            Some(id("ps_page")),
            0,
        )
        .insert(
            Node::rect_node("ps_header")
                .with_frame(0.0, 0.0, 300.0, 40.0)
                .with_constraints(HorizontalConstraint::Stretch, VerticalConstraint::Top),
            Some(id("ps_panel")),
            0,
        )
        .insert(
            Node::rect_node("ps_footer")
                .with_frame(10.0, 170.0, 280.0, 20.0)
                .with_constraints(HorizontalConstraint::LeftRight, VerticalConstraint::Bottom),
            Some(id("ps_panel")),
            1,
        )
        .set_frame(id("ps_panel"), Rect::new(100.0, 100.0, 300.0, 200.0))
        .set_frame(id("ps_footer"), Rect::new(10.0, 170.0, 280.0, 20.0));
    Session::from_tree(tree, SessionConfig::default())
}

#[test]
fn pointer_moves_never_touch_the_store() {
    init_logging();
    let mut s = make_session();
    let committed = s.tree().clone();
    let layout = s.layout().clone();

    assert!(s.begin_resize(id("ps_panel"), Handle::SE, (400.0, 300.0)));
    for step in 0..20 {
        let p = 400.0 + step as f32 * 10.0;
        s.pointer_move((p, p - 100.0));
        assert_eq!(s.tree(), &committed);
        assert_eq!(s.layout(), &layout);
        assert!(!s.can_undo());
    }
}

#[test]
fn preview_tracks_resized_parent() {
    let mut s = make_session();
    s.begin_resize(id("ps_panel"), Handle::SE, (400.0, 300.0));
    let frame = s.pointer_move((500.0, 400.0)).unwrap();

    assert_eq!(frame.ghost, Rect::new(100.0, 100.0, 400.0, 300.0));
    assert_eq!(frame.boxes[&id("ps_header")], Rect::new(100.0, 100.0, 400.0, 40.0));
    assert_eq!(frame.boxes[&id("ps_footer")], Rect::new(110.0, 370.0, 380.0, 20.0));
}

#[test]
fn gesture_commits_what_it_previewed() {
    let mut s = make_session();
    s.begin_resize(id("ps_panel"), Handle::SE, (400.0, 300.0));
    s.pointer_move((450.0, 320.0));
    let last = s.pointer_move((500.0, 400.0)).unwrap();
    assert!(s.end_gesture());

    assert_eq!(s.undo_len(), 1);
    for (node, rect) in &last.boxes {
        assert_eq!(s.layout().get(node), Some(rect), "{node}");
    }
    assert_eq!(s.layout()[&id("ps_panel")], last.ghost);
}

#[test]
fn undo_after_gesture_restores_pre_gesture_tree() {
    let mut s = make_session();
    let before = s.tree().clone();

    s.begin_move(id("ps_panel"), (150.0, 150.0));
    s.pointer_move((170.0, 160.0));
    s.pointer_move((250.0, 190.0));
    s.end_gesture();
    assert_eq!(s.layout()[&id("ps_footer")], Rect::new(210.0, 310.0, 280.0, 20.0));

    assert_eq!(s.undo(), Some("Move #ps_panel".to_string()));
    assert_eq!(s.tree(), &before);
    assert_eq!(s.layout(), &resolve_layout(&before, None));
}

#[test]
fn cancelled_or_still_gesture_records_nothing() {
    let mut s = make_session();
    s.begin_move(id("ps_panel"), (150.0, 150.0));
    s.pointer_move((300.0, 300.0));
    assert_eq!(s.cancel_gesture(), Some(Rect::new(100.0, 100.0, 300.0, 200.0)));
    assert!(!s.end_gesture());

    s.begin_move(id("ps_panel"), (150.0, 150.0));
    s.pointer_move((180.0, 150.0));
    s.pointer_move((150.0, 150.0));
    assert!(!s.end_gesture());
    assert!(!s.can_undo());
}

#[test]
fn compute_preview_matches_commit_math() {
    let s = make_session();
    let panel = s.tree().get(id("ps_panel")).unwrap();
    let ghost = s.layout()[&id("ps_panel")];
    let preview = compute_preview(panel, ghost, s.tree().nodes(), None);
    for (node, rect) in &preview {
        assert_eq!(s.layout().get(node), Some(rect), "{node}");
    }
    assert_eq!(preview.len(), 2);
}
