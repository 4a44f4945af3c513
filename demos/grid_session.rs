// A grid session driven the way a host would: rows and columns in, frames out.
use datagrid::{
    ColumnConfig, Grid, GridOptions, GridRef, PluginEvent, PluginManifest, Plugin, RowId,
    SortDirection, ViewportRect,
};
use serde_json::{Value, json};
use std::sync::Arc;

/// Sorts the display rows by the grid's active sort column.
struct Sorting;

impl Plugin<Value> for Sorting {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("sorting")
    }

    fn process_rows(
        &mut self,
        grid: &mut GridRef<'_, Value>,
        mut rows: Vec<Arc<Value>>,
    ) -> Vec<Arc<Value>> {
        let Some(sort) = grid.config().sort_model().cloned() else {
            return rows;
        };
        rows.sort_by(|a, b| {
            let ord = a[&sort.field].as_f64().partial_cmp(&b[&sort.field].as_f64());
            ord.unwrap_or(std::cmp::Ordering::Equal)
        });
        if sort.direction == SortDirection::Desc {
            rows.reverse();
        }
        rows
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("datagrid=debug")),
        )
        .init();

    let options = GridOptions::default().with_on_event(|event: &PluginEvent| {
        println!("event {} {}", event.kind, event.detail);
    });
    let mut grid = Grid::new(options)
        .with_row_identity(|row: &Value| row.get("id").and_then(RowId::from_value));
    grid.set_columns(vec![
        ColumnConfig::new("id").with_width(60).with_lock_position(true),
        ColumnConfig::new("name").with_template("{{value}} <{{row.email}}>"),
        ColumnConfig::new("score").with_sort(SortDirection::Desc, 0),
    ]);
    grid.attach(Sorting).expect("sorting has no dependencies");
    grid.set_rows((0..10_000).map(|i| {
        json!({
            "id": i,
            "name": format!("user {i}"),
            "email": format!("u{i}@example.com"),
            "score": (i * 7919) % 1000
        })
    }))
    .expect("ids are unique");
    grid.set_viewport(ViewportRect {
        height: 600,
        width: 900,
    });

    let report = grid.frame(0);
    println!(
        "phase={:?} window={:?} surfaces={} rendered={}",
        report.phase,
        report.window,
        grid.surface_count(),
        report.rendered_rows
    );
    if let Some(top) = grid.surfaces().next() {
        let cells: Vec<_> = top.content().cells.iter().map(|c| c.text.as_str()).collect();
        println!("top row {} at {}: {cells:?}", top.key(), top.offset());
    }

    // A fast flick, then frames until momentum settles.
    grid.touch_start(500.0, 16);
    grid.touch_move(420.0, 24);
    grid.touch_move(340.0, 32);
    grid.touch_end(36);
    let mut now = 48;
    while grid.body().is_momentum_active() {
        grid.frame(now);
        now += 16;
    }
    println!("momentum settled at offset {} after {} ms", grid.scroll_offset(), now - 48);

    grid.set_column_width("name", 240);
    grid.toggle_sort("score");
    for _ in 0..10 {
        now += 16;
        grid.frame(now);
    }
    let state = grid.collect_state();
    println!("{}", serde_json::to_string_pretty(&state).unwrap_or_default());
}
