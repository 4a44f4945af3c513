use core::fmt;

use datagrid_virtual::{RowKey, VirtualRows};

/// Pins the viewport to a row identity so data replacement does not make content jump.
#[derive(Clone, PartialEq, Eq)]
pub struct RowAnchor<K> {
    pub key: K,
    /// Distance from the anchored row's start to the scroll offset.
    pub offset_in_viewport: u64,
}

impl<K: fmt::Debug> fmt::Debug for RowAnchor<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowAnchor")
            .field("key", &self.key)
            .field("offset_in_viewport", &self.offset_in_viewport)
            .finish()
    }
}

/// Anchors the first visible row. `None` when nothing is visible.
pub fn capture_first_visible_anchor<K: RowKey>(rows: &VirtualRows<K>) -> Option<RowAnchor<K>> {
    let visible = rows.visible_range();
    if visible.is_empty() {
        return None;
    }
    anchor_for_index(rows, visible.start)
}

/// Anchors the row under `offset_in_viewport` pixels below the top of the viewport.
pub fn capture_anchor_at<K: RowKey>(
    rows: &VirtualRows<K>,
    offset_in_viewport: u64,
) -> Option<RowAnchor<K>> {
    let abs = rows.scroll_offset().saturating_add(offset_in_viewport);
    let index = rows.index_at_offset(abs)?;
    anchor_for_index(rows, index)
}

fn anchor_for_index<K: RowKey>(rows: &VirtualRows<K>, index: usize) -> Option<RowAnchor<K>> {
    let start = rows.row_start(index)?;
    Some(RowAnchor {
        key: rows.key_for(index),
        offset_in_viewport: rows.scroll_offset().saturating_sub(start),
    })
}

/// Restores `anchor` against the current dataset. `key_to_index` maps keys of the current rows.
///
/// Returns `false` when the anchored row no longer exists.
pub fn apply_anchor<K: RowKey>(
    rows: &mut VirtualRows<K>,
    anchor: &RowAnchor<K>,
    mut key_to_index: impl FnMut(&K) -> Option<usize>,
) -> bool {
    let Some(index) = key_to_index(&anchor.key) else {
        return false;
    };
    let Some(start) = rows.row_start(index) else {
        return false;
    };
    rows.set_scroll_offset_clamped(start.saturating_add(anchor.offset_in_viewport));
    true
}
