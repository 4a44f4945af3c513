use datagrid_scroll::{Easing, ScrollController};
use datagrid_virtual::{Align, VirtualRowsOptions};

fn main() {
    let mut c = ScrollController::new(VirtualRowsOptions::new(10_000, |_| 32).with_overscan(4));
    c.on_viewport_height(480);

    c.touch_start(600.0, 0);
    for (i, y) in [570.0, 535.0, 495.0, 450.0].into_iter().enumerate() {
        c.touch_move(y, (i as u64 + 1) * 16);
    }
    let released = c.touch_end(64);
    println!("released at {} momentum={released}", c.rows().scroll_offset());

    let mut now = 64;
    while let Some(offset) = c.tick(now + 16) {
        now += 16;
        if !c.is_momentum_active() {
            println!("settled at {offset} after {} ms", now - 64);
            break;
        }
    }

    let to = c.start_tween_to_index(5_000, Align::Center, now, 300, Easing::EaseInOutCubic);
    while c.tick(now).is_some() {
        now += 16;
    }
    let range = c.rows().visible_range();
    println!("tweened to {to}, visible rows {}..{}", range.start, range.end);
}
