mod grid;

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::{Value, json};

use crate::*;

fn people(n: usize) -> Vec<Value> {
    (0..n)
        .map(|i| json!({ "id": i, "name": format!("person {i}"), "age": 20 + i % 50 }))
        .collect()
}

fn by_id(row: &Value) -> Option<RowId> {
    row.get("id").and_then(RowId::from_value)
}

fn columns(fields: &[&str]) -> Vec<ColumnConfig> {
    fields.iter().copied().map(ColumnConfig::new).collect()
}

/// A grid with `id`/`name`/`age` columns, `n` keyed rows and a 600px viewport, after one frame.
fn ready_grid(options: GridOptions, n: usize) -> Grid<Value> {
    let mut grid = Grid::new(options).with_row_identity(by_id);
    grid.set_columns(columns(&["id", "name", "age"]));
    grid.set_rows(people(n)).unwrap();
    grid.set_viewport(ViewportRect {
        height: 600,
        width: 800,
    });
    grid.frame(0);
    grid
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Runs `f` with a subscriber writing every event into the returned buffer.
fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    (out, buffer.contents())
}
