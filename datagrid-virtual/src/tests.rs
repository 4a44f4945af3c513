use crate::*;

use alloc::sync::Arc;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicUsize, Ordering};

#[derive(Clone, Copy, Debug)]
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0
    }

    fn gen_range_u64(&mut self, start: u64, end_exclusive: u64) -> u64 {
        debug_assert!(start < end_exclusive);
        start + (self.next_u64() % (end_exclusive - start))
    }

    fn gen_range_u32(&mut self, start: u32, end_exclusive: u32) -> u32 {
        self.gen_range_u64(start as u64, end_exclusive as u64) as u32
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        self.gen_range_u64(start as u64, end_exclusive as u64) as usize
    }
}

fn rows_with_heights(heights: &[u32]) -> VirtualRows {
    let owned: Arc<[u32]> = heights.into();
    VirtualRows::new(VirtualRowsOptions::new(heights.len(), move |i| owned[i]))
}

fn expected_index_at(heights: &[u32], padding_start: u32, offset: u64) -> usize {
    let ps = padding_start as u64;
    if offset < ps {
        return 0;
    }
    let target = offset - ps;
    let mut prefix = 0u64;
    let mut consumed = 0usize;
    for &h in heights {
        if prefix + h as u64 <= target {
            prefix += h as u64;
            consumed += 1;
        } else {
            break;
        }
    }
    consumed.min(heights.len() - 1)
}

fn expected_visible_range(
    heights: &[u32],
    padding_start: u32,
    padding_end: u32,
    scroll_offset: u64,
    viewport: u32,
) -> RowRange {
    let count = heights.len();
    if count == 0 || viewport == 0 {
        return RowRange::EMPTY;
    }
    let sum: u64 = heights.iter().map(|&h| h as u64).sum();
    let ps = padding_start as u64;
    let total = ps + sum + padding_end as u64;
    let view = viewport as u64;
    let offset = scroll_offset.min(total.saturating_sub(view));
    let end = offset + view;
    if end <= ps {
        return RowRange::EMPTY;
    }
    if offset >= ps + sum {
        return RowRange {
            start: count,
            end: count,
        };
    }
    let start = expected_index_at(heights, padding_start, offset);
    let last = expected_index_at(heights, padding_start, (end - 1).max(offset));
    RowRange {
        start,
        end: (last + 1).min(count),
    }
}

fn assert_gap_free<K>(window: &VirtualWindow<K>) {
    for pair in window.rows.windows(2) {
        assert_eq!(pair[0].index + 1, pair[1].index);
        assert_eq!(pair[0].end(), pair[1].offset);
    }
}

#[test]
fn fixed_height_window_and_total() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 1));
    v.set_viewport_height(10);
    assert_eq!(v.total_height(), 100);
    assert_eq!(v.visible_range(), RowRange { start: 0, end: 10 });
    // overscan(1) only widens the end at the top of the list
    assert_eq!(v.window_range(), RowRange { start: 0, end: 11 });
}

#[test]
fn overscan_widens_both_edges() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 1).with_overscan(3));
    v.set_viewport_height(10);
    v.set_scroll_offset(50);
    assert_eq!(v.visible_range(), RowRange { start: 50, end: 60 });
    assert_eq!(v.window_range(), RowRange { start: 47, end: 63 });

    let window = v.window();
    assert_eq!(window.len(), 16);
    assert_eq!(window.rows[0].offset, 47);
    assert_gap_free(&window);
}

#[test]
fn padding_shifts_row_offsets() {
    let v = VirtualRows::new(VirtualRowsOptions::new(3, |_| 2).with_padding(10, 5));
    assert_eq!(v.total_height(), 21);
    assert_eq!(v.row_start(1), Some(12));
    assert_eq!(v.row_end(2), Some(16));
    // viewport height 0 => nothing is materialized
    assert!(v.window().is_empty());
}

#[test]
fn empty_dataset_renders_empty_window() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(0, |_| 40));
    v.set_viewport_height(600);
    v.set_scroll_offset(1_000);
    let window = v.window();
    assert!(window.is_empty());
    assert_eq!(window.total_height, 0);
    assert_eq!(v.index_at_offset(0), None);
    assert_eq!(v.scroll_to_index_offset(5, Align::Start), 0);
}

#[test]
fn visible_range_matches_linear_scan() {
    let mut rng = Lcg::new(0x5eed);
    for _ in 0..300 {
        let count = rng.gen_range_usize(0, 120);
        let heights: Vec<u32> = (0..count).map(|_| rng.gen_range_u32(1, 30)).collect();
        let ps = rng.gen_range_u32(0, 20);
        let pe = rng.gen_range_u32(0, 20);
        let viewport = rng.gen_range_u32(0, 200);

        let mut v = rows_with_heights(&heights);
        v.set_padding(ps, pe);
        let total = v.total_height();
        let offset = rng.gen_range_u64(0, total + 50);

        assert_eq!(
            v.visible_range_for(offset, viewport),
            expected_visible_range(&heights, ps, pe, offset, viewport),
            "count={count} ps={ps} pe={pe} offset={offset} viewport={viewport}"
        );
    }
}

#[test]
fn window_stays_bounded_for_any_row_count() {
    for count in [0usize, 1, 10, 1_000, 100_000] {
        let mut v = VirtualRows::new(
            VirtualRowsOptions::new(count, |_| 40)
                .with_overscan(16)
                .with_min_row_height(40),
        );
        v.set_viewport_height(600);
        let mut pool: SurfacePool<u64, ()> = SurfacePool::new();
        let max = v.max_scroll_offset();
        let step = if count > 1_000 { 4_003 } else { 37 };
        let mut offset = 0u64;
        loop {
            v.set_scroll_offset(offset);
            let window = v.window();
            pool.reconcile(&window.rows);
            assert!(pool.len() <= v.max_window_rows());
            assert!(pool.len() < 80, "count={count} offset={offset}");
            if offset >= max {
                break;
            }
            offset = (offset + step).min(max);
        }
    }
}

#[test]
fn window_bound_holds_with_measured_heights() {
    let mut rng = Lcg::new(7);
    let mut v = VirtualRows::new(
        VirtualRowsOptions::new(2_000, |_| 40)
            .with_overscan(4)
            .with_min_row_height(24),
    );
    v.set_viewport_height(480);
    for i in 0..2_000 {
        v.measure_row(i, rng.gen_range_u32(0, 200));
    }
    for _ in 0..200 {
        let offset = rng.gen_range_u64(0, v.total_height());
        v.set_scroll_offset_clamped(offset);
        let window = v.window();
        assert!(window.len() <= v.max_window_rows());
        assert_gap_free(&window);
    }
}

#[test]
fn resize_above_viewport_compensates_scroll() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    v.set_viewport_height(30);
    v.set_scroll_offset(200);

    assert_eq!(v.resize_row(0, 30), 20);
    assert_eq!(v.scroll_offset(), 220);
    // the row that was at the top of the viewport stays there
    assert_eq!(v.row_start(20), Some(220));
}

#[test]
fn resize_below_viewport_never_moves_scroll() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    v.set_viewport_height(30);
    v.set_scroll_offset(200);

    assert_eq!(v.resize_row(21, 80), 0);
    assert_eq!(v.resize_row(60, 5), 0);
    assert_eq!(v.scroll_offset(), 200);
}

#[test]
fn custom_compensation_hook_overrides_default() {
    let mut v = VirtualRows::new(
        VirtualRowsOptions::new(100, |_| 10)
            .with_should_compensate(Some(|_: &VirtualRows, _: usize, _: u64, _: i64| false)),
    );
    v.set_viewport_height(30);
    v.set_scroll_offset(200);
    assert_eq!(v.resize_row(0, 50), 0);
    assert_eq!(v.scroll_offset(), 200);
}

#[test]
fn rapid_expand_collapse_converges() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10).with_overscan(2));
    v.set_viewport_height(30);
    v.set_scroll_offset(200);

    for step in 0..101 {
        let height = if step % 2 == 0 { 60 } else { 10 };
        v.resize_row(5, height);
        // a row below the viewport toggling too must not disturb anything
        v.resize_row(40, height);
    }

    assert_eq!(v.row_height(5), Some(60));
    assert_eq!(v.scroll_offset(), 250);
    let window = v.window();
    assert_eq!(window.visible.start, 20);
    assert_eq!(window.rows[2].offset, v.scroll_offset());
    assert_gap_free(&window);
}

#[test]
fn measured_heights_follow_keys_across_replacement() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new_keyed(5, |_| 10, |i| 100 + i as u64));
    v.measure_row(2, 40);
    assert_eq!(v.measurement_cache_len(), 1);

    v.set_row_keys(6, |i| 105 - i as u64);
    assert_eq!(v.key_for(3), 102);
    assert_eq!(v.row_height(3), Some(40));
    assert!(v.is_measured(3));
    assert!(!v.is_measured(2));
    assert_eq!(v.total_height(), 90);
}

#[test]
fn measurements_clamp_to_min_row_height() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(3, |_| 2).with_min_row_height(8));
    assert_eq!(v.row_height(0), Some(8));
    v.measure_row(1, 1);
    assert_eq!(v.row_height(1), Some(8));
    assert_eq!(v.total_height(), 24);
}

#[test]
fn scroll_to_index_alignments() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    v.set_viewport_height(30);

    assert_eq!(v.scroll_to_index_offset(10, Align::Start), 100);
    assert_eq!(v.scroll_to_index_offset(10, Align::End), 80);
    assert_eq!(v.scroll_to_index_offset(10, Align::Center), 90);
    assert_eq!(v.scroll_to_index_offset(1, Align::Auto), 0);
    assert_eq!(v.scroll_to_index_offset(50, Align::Auto), 480);
    assert_eq!(v.scroll_to_index_offset(99, Align::Start), 970);

    assert_eq!(v.scroll_to_index(50, Align::Start), 500);
    assert_eq!(v.scroll_direction(), Some(ScrollDirection::Forward));
}

#[test]
fn batch_update_coalesces_notifications() {
    let calls = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&calls);
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10).with_on_change(Some(
        move |_: &VirtualRows, _: bool| {
            seen.fetch_add(1, Ordering::SeqCst);
        },
    )));

    v.batch_update(|v| {
        v.set_viewport_height(30);
        v.set_scroll_offset(40);
        v.measure_row(3, 20);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    v.set_scroll_offset(50);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn is_scrolling_resets_after_delay() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    v.set_viewport_height(30);
    v.apply_scroll_event(20, 1_000);
    assert!(v.is_scrolling());
    v.update_scrolling(1_100);
    assert!(v.is_scrolling());
    v.update_scrolling(1_150);
    assert!(!v.is_scrolling());
    assert_eq!(v.scroll_direction(), None);
}

#[test]
fn scroll_events_clamp_to_content() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(10, |_| 10));
    v.set_viewport_height(30);
    v.apply_scroll_event(1_000, 0);
    assert_eq!(v.scroll_offset(), 70);
}

#[test]
fn frame_state_round_trips() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    v.apply_scroll_frame(
        ViewportRect {
            height: 40,
            width: 300,
        },
        120,
        5,
    );
    let frame = v.frame_state();

    let mut restored = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10));
    restored.restore_frame_state(frame, 5);
    assert_eq!(restored.frame_state(), frame);
}

#[test]
fn measurement_cache_export_import() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(10, |_| 10));
    v.measure_row(1, 30);
    v.measure_row(4, 50);
    let mut cache = v.export_measurement_cache();
    cache.sort();
    assert_eq!(cache, alloc::vec![(1, 30), (4, 50)]);

    let mut other = VirtualRows::new(VirtualRowsOptions::new(10, |_| 10));
    other.import_measurement_cache(cache);
    assert_eq!(other.total_height(), 160);

    other.reset_measurements();
    assert_eq!(other.total_height(), 100);
    assert_eq!(other.measurement_cache_len(), 0);
}

#[test]
fn pool_reuses_surfaces_by_key() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10).with_overscan(0));
    v.set_viewport_height(50);
    let mut pool: SurfacePool<u64, u32> = SurfacePool::new();

    let first = pool.reconcile(&v.window().rows);
    assert_eq!(first.created, 5);
    for s in pool.iter_mut() {
        *s.content_mut() = s.index() as u32;
        s.mark_rendered();
    }
    let id_of_row_1 = pool.get(&1).map(|s| s.id());

    v.set_scroll_offset(10);
    let stats = pool.reconcile(&v.window().rows);
    assert_eq!(
        stats,
        ReconcileStats {
            reused: 4,
            recycled: 1,
            created: 0,
            released: 0,
        }
    );
    assert!(pool.get(&0).is_none());
    assert_eq!(pool.get(&1).map(|s| s.id()), id_of_row_1);
    assert_eq!(pool.get(&1).map(|s| s.needs_render()), Some(false));

    let entering = pool.get(&5).map(|s| (s.needs_render(), s.offset()));
    assert_eq!(entering, Some((true, 50)));
}

#[test]
fn pool_shrinks_with_window_and_clears() {
    let mut v = VirtualRows::new(VirtualRowsOptions::new(100, |_| 10).with_overscan(0));
    v.set_viewport_height(50);
    v.set_scroll_offset(10);
    let mut pool: SurfacePool<u64, ()> = SurfacePool::new();
    pool.reconcile(&v.window().rows);
    assert_eq!(pool.len(), 5);

    v.set_viewport_height(20);
    let stats = pool.reconcile(&v.window().rows);
    assert_eq!(stats.reused, 2);
    assert_eq!(stats.released, 3);
    assert_eq!(pool.len(), 2);
    assert_eq!(
        pool.iter().map(|s| s.index()).collect::<Vec<_>>(),
        alloc::vec![1, 2]
    );

    for s in pool.iter_mut() {
        s.mark_rendered();
    }
    assert!(pool.invalidate(&2));
    assert!(!pool.invalidate(&50));
    assert_eq!(pool.get(&2).map(|s| s.needs_render()), Some(true));

    pool.clear();
    assert!(pool.is_empty());
    let stats = pool.reconcile(&v.window().rows);
    assert_eq!(stats.created, 2);
}
