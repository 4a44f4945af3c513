// Expanding a row above the viewport does not move the rows already in view.
use datagrid_virtual::{Align, SurfacePool, VirtualRows, VirtualRowsOptions};

fn main() {
    let mut rows = VirtualRows::new(VirtualRowsOptions::new(1_000, |_| 40).with_overscan(4));
    rows.set_viewport_height(600);
    rows.scroll_to_index(200, Align::Start);

    let mut pool: SurfacePool<u64, String> = SurfacePool::new();
    let stats = pool.reconcile(&rows.window().rows);
    println!(
        "offset={} window={:?} created={}",
        rows.scroll_offset(),
        rows.window_range(),
        stats.created
    );

    // A detail row above the viewport expands.
    let applied = rows.resize_row(10, 240);
    println!("compensated={applied} offset={}", rows.scroll_offset());

    // Scroll by one row: one surface is recycled, the rest are reused.
    rows.apply_scroll_event(rows.scroll_offset() + 40, 16);
    let stats = pool.reconcile(&rows.window().rows);
    println!(
        "reused={} recycled={} created={}",
        stats.reused, stats.recycled, stats.created
    );
}
