use crate::*;

use datagrid_virtual::{Align, VirtualRows, VirtualRowsOptions};
use std::collections::HashMap;

fn body(count: usize, height: u32, viewport: u32) -> ScrollController<u64> {
    let mut c = ScrollController::new(VirtualRowsOptions::new(count, move |_| height));
    c.on_viewport_height(viewport);
    c
}

fn flick(c: &mut ScrollController<u64>, from_y: f32, step: f32, frames: u64) -> u64 {
    c.touch_start(from_y, 0);
    let mut y = from_y;
    for f in 1..=frames {
        y -= step;
        c.touch_move(y, f * 16);
    }
    frames * 16
}

#[test]
fn anchor_preserves_position_across_prepend() {
    let mut v1 = VirtualRows::new(VirtualRowsOptions::new_keyed(100, |_| 10, |i| {
        1000u64 + i as u64
    }));
    v1.set_viewport_height(100);
    v1.set_scroll_offset_clamped(505);

    let anchor = capture_first_visible_anchor(&v1).unwrap();
    assert_eq!(anchor.key, 1050);
    assert_eq!(anchor.offset_in_viewport, 5);

    // Ten older rows arrive above the current data.
    let mut v2 = VirtualRows::new(VirtualRowsOptions::new_keyed(110, |_| 10, |i| {
        if i < 10 {
            2000u64 + i as u64
        } else {
            1000u64 + (i - 10) as u64
        }
    }));
    v2.set_viewport_height(100);

    let map: HashMap<u64, usize> = (0..110).map(|i| (v2.key_for(i), i)).collect();
    assert!(apply_anchor(&mut v2, &anchor, |k| map.get(k).copied()));
    assert_eq!(v2.scroll_offset(), 605);
}

#[test]
fn anchor_for_removed_row_is_not_applied() {
    let mut rows = VirtualRows::new(VirtualRowsOptions::new(50, |_| 10));
    rows.set_viewport_height(100);
    rows.set_scroll_offset_clamped(200);
    let anchor = capture_anchor_at(&rows, 35).unwrap();
    assert_eq!(anchor.key, 23);
    assert_eq!(anchor.offset_in_viewport, 0);

    assert!(!apply_anchor(&mut rows, &anchor, |_| None));
    assert_eq!(rows.scroll_offset(), 200);
}

#[test]
fn tween_reaches_target_monotonically() {
    let mut c = body(1000, 1, 10);
    let to = c.start_tween_to_index(500, Align::Start, 0, 100, Easing::SmoothStep);
    assert_eq!(to, 500);

    let mut last = 0u64;
    for now_ms in [0u64, 10, 20, 40, 80, 100, 120] {
        if let Some(off) = c.tick(now_ms) {
            assert!(off >= last);
            last = off;
        }
    }
    assert!(!c.is_animating());
    assert!(!c.rows().is_scrolling());
    assert_eq!(c.rows().scroll_offset(), to);
}

#[test]
fn retargeting_tween_starts_from_current_position() {
    let mut c = body(1000, 1, 10);
    c.start_tween_to_offset(400, 0, 100, Easing::Linear);
    assert_eq!(c.tick(50), Some(200));

    c.start_tween_to_offset(0, 50, 100, Easing::Linear);
    assert_eq!(c.tick(100), Some(100));
    assert_eq!(c.tick(150), Some(0));
    assert!(!c.is_animating());
}

#[test]
fn user_scroll_cancels_tween() {
    let mut c = body(1000, 1, 10);
    c.start_tween_to_offset(900, 0, 100, Easing::Linear);
    c.tick(10);
    c.on_scroll(42, 20);
    assert!(!c.is_animating());
    assert_eq!(c.tick(30), None);
    assert_eq!(c.rows().scroll_offset(), 42);
}

#[test]
fn touch_moves_follow_the_finger() {
    let mut c = body(1000, 40, 400);
    c.touch_start(500.0, 0);
    assert_eq!(c.touch_move(480.0, 16), 20);
    assert_eq!(c.touch_move(470.0, 32), 30);
    // Dragging down past the top clamps.
    assert_eq!(c.touch_move(600.0, 48), 0);
    assert!(c.rows().is_scrolling());
}

#[test]
fn fast_release_starts_decaying_momentum() {
    let mut c = body(1000, 40, 400);
    let released_at = flick(&mut c, 500.0, 20.0, 3);
    assert_eq!(c.rows().scroll_offset(), 60);
    assert!(c.touch_end(released_at));
    assert!(c.is_momentum_active());

    let mut last = c.rows().scroll_offset();
    let mut steps = Vec::new();
    let mut now = released_at;
    while c.is_momentum_active() {
        now += 16;
        let off = c.tick(now).unwrap();
        assert!(off >= last);
        steps.push(off - last);
        last = off;
        assert!(now < released_at + 10_000, "momentum never settled");
    }
    assert!(last > 60);
    assert!(steps.first() > steps.last());
    assert!(!c.rows().is_scrolling());
}

#[test]
fn slow_release_does_not_start_momentum() {
    let mut c = body(1000, 40, 400);
    let last_move = flick(&mut c, 500.0, 20.0, 3);
    let release = last_move + c.momentum_config().release_window_ms + 1;
    assert!(!c.touch_end(release));
    assert!(!c.is_momentum_active());
}

#[test]
fn momentum_stops_at_content_end() {
    let mut c = body(100, 40, 400);
    c.on_scroll(3500, 0);
    let max = c.rows().max_scroll_offset();
    assert_eq!(max, 3600);

    c.touch_start(500.0, 1000);
    c.touch_move(450.0, 1016);
    c.touch_move(400.0, 1032);
    assert!(c.touch_end(1032));

    let mut now = 1032;
    while c.is_momentum_active() {
        now += 16;
        c.tick(now);
        assert!(now < 5000);
    }
    assert_eq!(c.rows().scroll_offset(), max);
}

#[test]
fn touch_start_stops_momentum() {
    let mut c = body(1000, 40, 400);
    let t = flick(&mut c, 500.0, 20.0, 3);
    assert!(c.touch_end(t));
    c.tick(t + 16);
    c.touch_start(300.0, t + 20);
    assert!(!c.is_momentum_active());
    assert!(c.is_touching());
}

#[test]
fn starting_a_tween_replaces_momentum() {
    let mut c = body(1000, 40, 400);
    let t = flick(&mut c, 500.0, 20.0, 3);
    assert!(c.touch_end(t));
    c.start_tween_to_offset(0, t, 50, Easing::Linear);
    assert!(c.is_animating());
    assert!(!c.is_momentum_active());
}

#[test]
fn easing_curves_hit_endpoints() {
    for e in [
        Easing::Linear,
        Easing::SmoothStep,
        Easing::EaseOutCubic,
        Easing::EaseInOutCubic,
    ] {
        assert_eq!(e.sample(0.0), 0.0);
        assert_eq!(e.sample(1.0), 1.0);
        assert!(e.sample(0.5) > 0.0 && e.sample(0.5) < 1.0);
    }
}
