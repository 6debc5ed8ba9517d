//! End-to-end session scenarios: every mutating operation funneled through
//! one EditSession, with the history invariants checked along the way.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::{Rgba, RgbaImage};
use postfe::{
    AsyncStatus, Bitmap, CropRect, DrawTool, EditSession, EnhanceOptions, LocalEnhancementService,
    StickerGlyph, StickerOverlay, TextOverlay,
};

fn new_session() -> EditSession {
    let img = RgbaImage::from_fn(48, 36, |x, y| {
        Rgba([(x * 5) as u8, (y * 7) as u8, ((x + y) * 3) as u8, 255])
    });
    EditSession::new(Bitmap::new(img), Arc::new(LocalEnhancementService))
}

fn assert_invariants(session: &EditSession) {
    let snap = session.snapshot();
    assert!(snap.history_index < snap.history.len());
    assert_eq!(
        snap.current.id(),
        snap.history[snap.history_index].bitmap.id(),
        "current bitmap must be the indexed history entry"
    );
    assert!(snap.history.len() <= 20);
}

fn drain_async(session: &mut EditSession) {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = session.poll_async().status;
        if status != AsyncStatus::Processing {
            break;
        }
        assert!(Instant::now() < deadline, "async operation timed out");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn full_editing_walkthrough() {
    let mut session = new_session();

    // Geometric edits.
    session.rotate(90).unwrap();
    assert_eq!(session.current_bitmap().width(), 36);
    session.flip(postfe::FlipAxis::Horizontal).unwrap();
    assert_invariants(&session);

    // Crop down to a square.
    session.show_crop_tool();
    session.set_crop_rect(CropRect::new(4.0, 4.0, 24.0, 24.0));
    session.apply_crop().unwrap();
    assert_eq!(
        (session.current_bitmap().width(), session.current_bitmap().height()),
        (24, 24)
    );
    assert_invariants(&session);

    // Filter + adjustment.
    session.apply_filter("warm").unwrap();
    session.apply_adjustment("contrast", 15.0).unwrap();
    assert_invariants(&session);

    // Draw something and commit it.
    session.add_drawing_path(
        vec![(2.0, 2.0), (20.0, 20.0)],
        [255, 0, 0, 255],
        2.0,
        1.0,
        DrawTool::Pen,
    );
    let merged = session.render_drawing().unwrap();
    assert!(session.apply_drawing(merged));
    assert_invariants(&session);

    // Overlay a sticker and flatten.
    session.add_sticker_overlay(StickerOverlay::new(StickerGlyph::Heart, 12.0, 12.0));
    assert!(session.flatten_overlays().unwrap());
    assert!(session.overlays().is_empty());
    assert_invariants(&session);

    // Async enhancement commits exactly one entry.
    let before = session.history().len();
    session.run_enhance(EnhanceOptions::default());
    drain_async(&mut session);
    assert_eq!(session.history().len(), before + 1);
    assert_eq!(session.history().current().action, "enhance");
    assert_invariants(&session);

    // Walk all the way back, then all the way forward.
    let mut undos = 0;
    while session.undo() {
        undos += 1;
        assert_invariants(&session);
    }
    assert_eq!(session.current_bitmap(), session.original_bitmap());
    let mut redos = 0;
    while session.redo() {
        redos += 1;
        assert_invariants(&session);
    }
    assert_eq!(undos, redos);
    assert_eq!(session.history().current().action, "enhance");
}

#[test]
fn undo_then_flatten_prunes_redo_branch() {
    // The exact sequence: [s0] -> rotate -> [s0, s1] -> undo -> flatten with
    // a text overlay -> the rotated s1 is gone for good, s1' is in its place.
    let mut session = new_session();
    session.rotate(90).unwrap();
    let rotated = session.current_bitmap();

    assert!(session.undo());
    assert_eq!(session.snapshot().history_index, 0);

    session.add_text_overlay(TextOverlay::new("caption", 6.0, 18.0));
    session.add_sticker_overlay(StickerOverlay::new(StickerGlyph::Star, 24.0, 18.0));
    assert!(session.flatten_overlays().unwrap());

    let snap = session.snapshot();
    assert_eq!(snap.history.len(), 2);
    assert_eq!(snap.history_index, 1);
    assert_eq!(snap.history[1].action, "flatten_overlays");
    assert!(snap.texts.is_empty());
    assert!(snap.stickers.is_empty());
    assert!(!snap.can_redo);

    // The old rotated snapshot is unreachable: no redo brings it back.
    assert!(!session.redo());
    assert_ne!(session.current_bitmap(), rotated);
    // Un-rotated dimensions prove s1' was built from s0, not s1.
    assert_eq!(session.current_bitmap().width(), 48);
}

#[test]
fn history_stays_bounded_during_long_sessions() {
    let mut session = new_session();
    for i in 0..40 {
        match i % 3 {
            0 => session.rotate(180).unwrap(),
            1 => session.apply_adjustment("brightness", 2.0).unwrap(),
            _ => session.apply_filter("cool").unwrap(),
        }
        assert_invariants(&session);
    }
    assert_eq!(session.history().len(), 20);

    // After eviction the far past is gone but undo still works stepwise.
    let mut steps = 0;
    while session.undo() {
        steps += 1;
        assert_invariants(&session);
    }
    assert_eq!(steps, 19);
}

#[test]
fn cancelling_async_never_commits_a_stale_result() {
    let mut session = new_session();
    let before = session.history().len();

    session.run_enhance(EnhanceOptions::default());
    session.cancel_async();
    assert_eq!(session.async_state().status, AsyncStatus::Idle);

    // Even if the worker finishes afterwards, polling must not commit.
    std::thread::sleep(Duration::from_millis(150));
    session.poll_async();
    assert_eq!(session.history().len(), before);
    assert_eq!(session.async_state().status, AsyncStatus::Idle);

    // A fresh request still works after the cancellation.
    session.run_enhance(EnhanceOptions::default());
    drain_async(&mut session);
    assert_eq!(session.history().len(), before + 1);
}

#[test]
fn superseding_request_commits_only_the_second_result() {
    let mut session = new_session();
    session.run_enhance(EnhanceOptions::default());
    session.run_detect_objects();
    drain_async(&mut session);
    std::thread::sleep(Duration::from_millis(150));
    session.poll_async();

    // detect_objects never commits; the superseded enhance must not either.
    assert_eq!(session.history().len(), 1);
}
