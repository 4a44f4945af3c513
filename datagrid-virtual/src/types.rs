use alloc::vec::Vec;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Align {
    Start,
    Center,
    End,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// Size of the scrollable viewport: `height` is the virtualized axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewportRect {
    pub height: u32,
    pub width: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RowRange {
    pub start: usize,
    pub end: usize, // exclusive
}

impl RowRange {
    pub const EMPTY: Self = Self { start: 0, end: 0 };

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && index < self.end
    }
}

/// One materialized row of a [`VirtualWindow`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowRow<K> {
    pub key: K,
    pub index: usize,
    /// Offset of the row's top edge in the scroll axis (includes `padding_start`).
    pub offset: u64,
    pub height: u32,
}

impl<K> WindowRow<K> {
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.height as u64)
    }
}

/// The contiguous range of materialized rows plus their computed offsets.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualWindow<K> {
    /// Rows intersecting the viewport.
    pub visible: RowRange,
    /// `visible` widened by overscan on both sides; `rows` covers exactly this range.
    pub range: RowRange,
    pub rows: Vec<WindowRow<K>>,
    pub total_height: u64,
}

impl<K> VirtualWindow<K> {
    pub fn empty() -> Self {
        Self {
            visible: RowRange::EMPTY,
            range: RowRange::EMPTY,
            rows: Vec::new(),
            total_height: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
