use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use super::*;

const VIEWPORT: ViewportRect = ViewportRect {
    height: 600,
    width: 800,
};

fn ids_in_window(grid: &Grid<Value>) -> Vec<RowId> {
    grid.surfaces().map(|s| s.key().clone()).collect()
}

fn assert_gap_free(grid: &Grid<Value>) {
    let window = grid.window();
    for pair in window.rows.windows(2) {
        assert_eq!(
            pair[0].end(),
            pair[1].offset,
            "gap between rows {} and {}",
            pair[0].index,
            pair[1].index
        );
    }
}

#[test]
fn rows_without_identity_are_keyed_by_position() {
    let grid = ready_grid_unkeyed(3);
    assert_eq!(ids_in_window(&grid), [RowId::Index(0), RowId::Index(1), RowId::Index(2)]);
}

fn ready_grid_unkeyed(n: usize) -> Grid<Value> {
    let mut grid = Grid::new(GridOptions::default());
    grid.set_rows(people(n)).unwrap();
    grid.set_viewport(VIEWPORT);
    grid.frame(0);
    grid
}

#[test]
fn rows_are_rejected_whole_on_identity_errors() {
    let mut grid = ready_grid(GridOptions::default(), 5);

    let mut duplicated = people(3);
    duplicated[2]["id"] = json!(0);
    match grid.set_rows(duplicated) {
        Err(GridError::DuplicateRowId { id, first, second }) => {
            assert_eq!(id, RowId::Index(0));
            assert_eq!((first, second), (0, 2));
        }
        other => panic!("expected a duplicate id error, got {other:?}"),
    }

    let mut missing = people(3);
    missing[1] = json!({ "name": "no id" });
    assert!(matches!(grid.set_rows(missing), Err(GridError::MissingRowId { index: 1 })));
    assert_eq!(grid.rows().len(), 5);

    let mut panicking = Grid::new(GridOptions::default()).with_row_identity(|row: &Value| {
        if row["id"] == 1 {
            panic!("bad row");
        }
        by_id(row)
    });
    assert!(matches!(
        panicking.set_rows(people(3)),
        Err(GridError::IdentityPanicked { index: 1 })
    ));
    assert!(panicking.rows().is_empty());
}

#[test]
fn columns_are_inferred_when_rows_arrive_first() {
    let grid = ready_grid_unkeyed(4);
    let fields: Vec<_> = grid.columns().iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, ["id", "name", "age"]);
    let surface = grid.surface(&RowId::Index(1)).unwrap();
    assert_eq!(surface.content().cell("name").unwrap().text, "person 1");
}

#[test]
fn empty_dataset_renders_an_empty_window() {
    let mut grid: Grid<Value> = Grid::new(GridOptions::default());
    grid.set_columns(columns(&["id"]));
    grid.set_viewport(VIEWPORT);
    let report = grid.frame(0);
    assert!(report.window.is_empty());
    assert_eq!(grid.surface_count(), 0);
    assert_eq!(report.rendered_rows, 0);
}

#[test]
fn mutations_between_frames_coalesce_into_one_pass() {
    let mut grid = ready_grid(GridOptions::default(), 50);
    let frames = grid.frames_rendered();

    grid.set_column_width("name", 150);
    grid.toggle_sort("age");
    grid.on_scroll(100, 10);
    grid.set_fit_mode(FitMode::Fixed);
    assert_eq!(grid.pending_render(), Some(RenderPhase::Full));

    let report = grid.frame(16);
    assert_eq!(report.phase, Some(RenderPhase::Full));
    assert_eq!(grid.frames_rendered(), frames + 1);

    let idle = grid.frame(32);
    assert_eq!(idle.phase, None);
    assert_eq!(grid.frames_rendered(), frames + 1);
}

#[test]
fn window_stays_bounded_for_many_variable_rows() {
    let options = GridOptions::default()
        .with_default_row_height(40)
        .with_min_row_height(20)
        .with_overscan(16);
    let mut grid = ready_grid(options, 1000);
    let bound = 600usize.div_ceil(20) + 1 + 2 * 16;

    let mut seed = 0x5eed_u64;
    let mut offset = 0;
    let mut now = 0;
    while offset <= grid.body().rows().max_scroll_offset() {
        now += 16;
        grid.on_scroll(offset, now);
        grid.frame(now);
        let measured: Vec<(RowId, u32)> = ids_in_window(&grid)
            .into_iter()
            .map(|id| {
                seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                (id, 20 + ((seed >> 33) % 41) as u32)
            })
            .collect();
        grid.measure_rows(measured.iter().map(|(id, h)| (id, *h)));
        now += 16;
        grid.frame(now);

        assert!(grid.surface_count() <= bound);
        assert!(grid.surface_count() < 80, "{} surfaces at {offset}", grid.surface_count());
        assert_gap_free(&grid);
        offset += 173;
    }
}

#[test]
fn surfaces_follow_their_rows_while_scrolling() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    let id = RowId::Index(20);
    let before = grid.surface(&id).unwrap().id();

    grid.on_scroll(84, 10);
    let report = grid.frame(16);
    assert_eq!(grid.surface(&id).unwrap().id(), before);
    assert!(report.reconcile.reused >= 20);
    assert_eq!(
        report.reconcile.reused + report.reconcile.recycled + report.reconcile.created,
        report.window.len()
    );
    // surfaces that kept their row are not re-rendered
    assert_eq!(report.rendered_rows, report.reconcile.recycled + report.reconcile.created);
}

#[test]
fn hiding_a_column_rebuilds_every_surface() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    let window = grid.surface_count();
    assert!(grid.set_column_visible("age", false));

    let report = grid.frame(16);
    assert_eq!(report.reconcile.created, window);
    assert_eq!(report.reconcile.reused, 0);
    assert_eq!(report.rendered_rows, window);
    let content = grid.surface(&RowId::Index(0)).unwrap().content();
    assert!(content.cell("age").is_none());
    assert_eq!(content.cells.len(), 2);
}

struct EvenRows;

impl Plugin<Value> for EvenRows {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("even-rows")
    }

    fn process_rows(
        &mut self,
        _grid: &mut GridRef<'_, Value>,
        rows: Vec<Arc<Value>>,
    ) -> Vec<Arc<Value>> {
        rows.into_iter()
            .filter(|r| r["id"].as_u64().is_some_and(|id| id % 2 == 0))
            .collect()
    }

    fn after_cell_render(&mut self, ctx: &mut CellRenderContext<'_, Value>) {
        if ctx.column.field == "name" && ctx.row_index == 0 {
            ctx.cell.add_class("first");
        }
    }
}

#[test]
fn plugins_transform_the_display_rows() {
    let mut grid = ready_grid(GridOptions::default(), 20);
    grid.attach(EvenRows).unwrap();
    grid.frame(16);

    assert_eq!(grid.rows().len(), 20);
    assert_eq!(grid.display_rows().len(), 10);
    assert_eq!(grid.row_index(&RowId::Index(4)), Some(2));
    assert_eq!(grid.row_index(&RowId::Index(3)), None);
    assert!(grid.row(&RowId::Index(3)).is_some());
    assert_eq!(grid.surface_count(), 10);

    let first = grid.surface(&RowId::Index(0)).unwrap().content();
    assert!(first.cell("name").unwrap().has_class("first"));
    assert!(!first.cell("id").unwrap().has_class("first"));
    let second = grid.surface(&RowId::Index(2)).unwrap().content();
    assert!(!second.cell("name").unwrap().has_class("first"));
}

#[test]
fn cells_use_renderers_then_templates_then_text() {
    let mut grid = Grid::new(GridOptions::default()).with_row_identity(by_id);
    grid.set_columns(vec![
        ColumnConfig::new("id"),
        ColumnConfig::new("name").with_template("{{value}} ({{row.age}})"),
        ColumnConfig::new("age")
            .with_template("ignored")
            .with_renderer(CellRenderer::new(|value, _| format!("{} yrs", cell_text(value)))),
    ]);
    grid.set_rows(people(3)).unwrap();
    grid.set_viewport(VIEWPORT);
    grid.frame(0);

    let content = grid.surface(&RowId::Index(2)).unwrap().content();
    let texts: Vec<_> = content.cells.iter().map(|c| c.text.as_str()).collect();
    assert_eq!(texts, ["2", "person 2 (22)", "22 yrs"]);
}

#[test]
fn replacing_rows_keeps_the_first_visible_row_in_place() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    grid.on_scroll(50 * 28 + 10, 10);
    grid.frame(16);
    assert_eq!(grid.body().rows().visible_range().start, 50);

    let mut rows: Vec<Value> = (1000..1010)
        .map(|i| json!({ "id": i, "name": format!("new {i}"), "age": 1 }))
        .collect();
    rows.extend(people(100));
    grid.set_rows(rows).unwrap();
    grid.frame(32);

    assert_eq!(grid.row_index(&RowId::Index(50)), Some(60));
    assert_eq!(grid.scroll_offset(), 60 * 28 + 10);
}

#[test]
fn height_changes_compensate_only_above_the_scroll_offset() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    grid.on_scroll(1400, 10);
    grid.frame(16);

    assert!(grid.measure_row(&RowId::Index(10), 100));
    assert_eq!(grid.scroll_offset(), 1400 + 72);
    assert!(grid.measure_row(&RowId::Index(70), 100));
    assert_eq!(grid.scroll_offset(), 1472);
    assert!(!grid.measure_row(&RowId::Index(5000), 100));
    grid.frame(32);
    assert_eq!(grid.body().rows().visible_range().start, 50);
}

#[test]
fn rapid_expand_collapse_converges() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    grid.on_scroll(1400, 10);
    grid.frame(16);

    let mut now = 16;
    for i in 0..50 {
        let height = if i % 2 == 0 { 120 } else { 28 };
        grid.measure_row(&RowId::Index(40), height);
        grid.measure_row(&RowId::Index(55), height);
        now += 16;
        grid.frame(now);
        assert_gap_free(&grid);
    }
    grid.frame(now + 16);
    assert_eq!(grid.scroll_offset(), 1400);
    assert_eq!(grid.frame(now + 32).phase, None);
    assert_eq!(grid.body().rows().total_height(), 100 * 28);
}

#[test]
fn row_animations_mark_surfaces_until_they_expire() {
    let mut grid = ready_grid(GridOptions::default(), 10);
    let id = RowId::Index(2);
    assert!(grid.animate_row(&id, RowAnimationKind::Change, 1000));
    assert!(!grid.animate_row(&RowId::Index(99), RowAnimationKind::Change, 1000));

    grid.frame(1000);
    assert_eq!(
        grid.surface(&id).unwrap().content().animation,
        Some(RowAnimationKind::Change)
    );
    let animation = grid.row_animation(&id).unwrap();
    assert_eq!(animation.duration_ms(), 300);
    let mid = animation.progress(1150);
    assert!(mid > 0.0 && mid < 1.0);

    grid.frame(1300);
    assert!(grid.row_animation(&id).is_none());
    assert_eq!(grid.surface(&id).unwrap().content().animation, None);
}

#[test]
fn row_animations_fail_when_disabled() {
    let mut grid = ready_grid(GridOptions::default(), 10);
    grid.set_grid_config(GridConfig {
        animation: Some(AnimationConfig {
            mode: AnimationMode::Off,
            row_duration_ms: None,
        }),
        ..GridConfig::default()
    });
    grid.frame(16);
    assert!(!grid.animate_row(&RowId::Index(1), RowAnimationKind::Insert, 20));
}

#[test]
fn touch_release_drives_momentum_until_stopped() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    grid.touch_start(500.0, 0);
    grid.touch_move(460.0, 8);
    assert_eq!(grid.touch_move(420.0, 16), 80);
    assert!(grid.touch_end(20));
    assert!(grid.body().is_momentum_active());

    let mut last = grid.scroll_offset();
    for now in [36, 52, 68] {
        grid.frame(now);
        assert!(grid.scroll_offset() > last);
        last = grid.scroll_offset();
    }

    grid.touch_start(300.0, 80);
    assert!(!grid.body().is_momentum_active());
    grid.frame(96);
    assert_eq!(grid.scroll_offset(), last);
}

#[test]
fn smooth_scroll_reaches_its_row() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    assert!(grid.smooth_scroll_to_row(&RowId::Index(50), Align::Start, 0, 200));
    assert!(!grid.smooth_scroll_to_row(&RowId::Index(500), Align::Start, 0, 200));

    let mut now = 0;
    while now <= 224 {
        grid.frame(now);
        now += 16;
    }
    assert_eq!(grid.scroll_offset(), 1400);
    assert!(!grid.body().is_animating());
    assert!(grid.surface(&RowId::Index(50)).is_some());
}

#[test]
fn momentum_survives_a_column_resize() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    grid.touch_start(500.0, 0);
    grid.touch_move(460.0, 8);
    grid.touch_move(420.0, 16);
    assert!(grid.touch_end(20));
    let before = grid.scroll_offset();

    assert!(grid.set_column_width("name", 150));
    let report = grid.frame(36);
    assert_eq!(report.phase, Some(RenderPhase::Columns));
    assert!(grid.body().is_momentum_active());
    assert!(grid.scroll_offset() > before);
}

#[test]
fn smooth_scroll_survives_a_data_refresh() {
    let mut grid = ready_grid(GridOptions::default(), 100);
    assert!(grid.smooth_scroll_to_row(&RowId::Index(50), Align::Start, 0, 200));
    grid.frame(0);
    grid.frame(16);

    grid.set_rows(people(100)).unwrap();
    grid.frame(32);
    assert!(grid.body().is_animating());

    let mut now = 48;
    while now <= 224 {
        grid.frame(now);
        now += 16;
    }
    assert_eq!(grid.scroll_offset(), 1400);
}

struct ReverseWhenSorted;

impl Plugin<Value> for ReverseWhenSorted {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("reverse-when-sorted")
    }

    fn process_rows(
        &mut self,
        grid: &mut GridRef<'_, Value>,
        mut rows: Vec<Arc<Value>>,
    ) -> Vec<Arc<Value>> {
        if grid.config().sort_model().is_some() {
            rows.reverse();
        }
        rows
    }
}

#[test]
fn reordering_rows_keeps_the_scroll_offset() {
    let mut grid = ready_grid(GridOptions::default(), 1000);
    grid.attach(ReverseWhenSorted).unwrap();
    grid.frame(16);

    assert!(grid.set_sort("name", Some(SortDirection::Desc)));
    grid.frame(32);
    assert_eq!(grid.scroll_offset(), 0);
    assert_eq!(grid.body().rows().visible_range().start, 0);
    assert_eq!(grid.row_index(&RowId::Index(999)), Some(0));
    assert!(grid.surface(&RowId::Index(999)).is_some());

    grid.on_scroll(1400, 40);
    grid.frame(48);
    assert!(grid.set_sort("name", None));
    grid.frame(64);
    assert_eq!(grid.scroll_offset(), 1400);
    assert_eq!(grid.row_index(&RowId::Index(0)), Some(0));
}

struct SummaryRow;

impl Plugin<Value> for SummaryRow {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new("summary-row")
    }

    fn process_rows(
        &mut self,
        _grid: &mut GridRef<'_, Value>,
        rows: Vec<Arc<Value>>,
    ) -> Vec<Arc<Value>> {
        let mut out = vec![Arc::new(json!({ "name": "total" }))];
        out.extend(rows);
        out
    }
}

#[test]
fn generated_display_ids_never_shadow_caller_keys() {
    let mut grid = Grid::new(GridOptions::default()).with_row_identity(by_id);
    grid.set_columns(columns(&["id", "name"]));
    let mut rows = vec![json!({ "id": "display:0", "name": "keyed" })];
    rows.extend(people(3));
    grid.set_rows(rows).unwrap();
    grid.attach(SummaryRow).unwrap();
    grid.set_viewport(VIEWPORT);
    grid.frame(0);

    assert_eq!(grid.display_rows().len(), 5);
    assert_eq!(grid.row_index(&RowId::Generated { display: 0 }), Some(0));
    assert_eq!(grid.row_index(&RowId::from("display:0")), Some(1));
    assert_eq!(grid.surface_count(), 5);
}

#[test]
fn state_changes_are_announced_after_the_debounce() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&events);
    let options = GridOptions::default().with_on_event(move |event: &PluginEvent| {
        if event.kind == "column-state-change" {
            seen.lock().unwrap().push(event.detail.clone());
        }
    });
    let mut grid = ready_grid(options, 10);

    grid.set_column_width("name", 150);
    assert!(!grid.frame(0).state_changed);
    grid.set_column_width("name", 160);
    assert!(!grid.frame(50).state_changed);
    assert!(!grid.frame(100).state_changed);
    assert!(grid.frame(150).state_changed);
    assert!(!grid.frame(400).state_changed);

    let events = events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["columns"][1]["width"], json!(160));
}

#[test]
fn structural_declarations_merge_once_settled() {
    let mut grid = ready_grid(GridOptions::default(), 10);
    grid.observe_structural_columns(columns(&["notes"]), 10);
    grid.observe_structural_columns(columns(&["notes", "tags"]), 30);

    assert_eq!(grid.frame(40).phase, None);
    assert_eq!(grid.columns().len(), 3);
    assert_eq!(grid.frame(80).phase, Some(RenderPhase::Full));
    let fields: Vec<_> = grid.columns().iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, ["id", "name", "age", "notes", "tags"]);
}

#[test]
fn state_apply_and_reset_rerender_surfaces() {
    let mut grid = ready_grid(GridOptions::default(), 10);
    let initial = grid.collect_state();
    grid.move_column("age", 0);
    grid.set_column_visible("id", false);
    let changed = grid.collect_state();

    grid.reset_state();
    grid.frame(16);
    assert_eq!(grid.collect_state(), initial);
    assert_eq!(grid.surface(&RowId::Index(0)).unwrap().content().cells.len(), 3);

    grid.apply_state(&changed);
    grid.frame(32);
    assert_eq!(grid.collect_state(), changed);
    let content = grid.surface(&RowId::Index(0)).unwrap().content();
    let fields: Vec<_> = content.cells.iter().map(|c| c.field.as_str()).collect();
    assert_eq!(fields, ["age", "name"]);
}

#[test]
fn merges_and_frames_are_traced() {
    let mut grid: Grid<Value> = Grid::new(GridOptions::default());
    grid.set_columns(columns(&["id"]));
    grid.set_rows(people(2)).unwrap();
    let (_, logs) = capture_logs(|| grid.frame(0));
    assert!(logs.contains("datagrid::config"));
    assert!(logs.contains("merged configuration"));
}
