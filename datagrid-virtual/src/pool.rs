use alloc::vec::Vec;

use crate::WindowRow;
use crate::key::{KeyMap, RowKey};

/// Stable identity of a pooled render surface, for hosts that map surfaces to visual units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceId(pub u32);

/// A reusable render surface bound to one row of the current window.
#[derive(Clone, Debug)]
pub struct Surface<K, T> {
    id: SurfaceId,
    key: K,
    index: usize,
    offset: u64,
    height: u32,
    stale: bool,
    content: T,
}

impl<K, T> Surface<K, T> {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// True when the surface was (re)assigned or invalidated since its content was last rendered.
    pub fn needs_render(&self) -> bool {
        self.stale
    }

    pub fn content(&self) -> &T {
        &self.content
    }

    pub fn content_mut(&mut self) -> &mut T {
        &mut self.content
    }

    pub fn mark_rendered(&mut self) {
        self.stale = false;
    }
}

/// What a [`SurfacePool::reconcile`] pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Surfaces that kept their row.
    pub reused: usize,
    /// Surfaces handed from a row leaving the window to a row entering it.
    pub recycled: usize,
    /// Surfaces allocated because no free surface was left.
    pub created: usize,
    /// Surfaces dropped because the window shrank.
    pub released: usize,
}

/// Pool of render surfaces keyed by row identity.
///
/// After each [`reconcile`](Self::reconcile) the pool holds exactly one surface per window row,
/// so its size is bounded by the window size and never by the total row count.
#[derive(Clone, Debug)]
pub struct SurfacePool<K, T> {
    surfaces: Vec<Surface<K, T>>,
    by_key: KeyMap<K, usize>,
    next_id: u32,
}

impl<K: RowKey, T: Default> Default for SurfacePool<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: RowKey, T: Default> SurfacePool<K, T> {
    pub fn new() -> Self {
        Self {
            surfaces: Vec::new(),
            by_key: KeyMap::new(),
            next_id: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    /// Surfaces in row-index order.
    pub fn iter(&self) -> impl Iterator<Item = &Surface<K, T>> {
        self.surfaces.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Surface<K, T>> {
        self.surfaces.iter_mut()
    }

    pub fn get(&self, key: &K) -> Option<&Surface<K, T>> {
        self.by_key.get(key).map(|&i| &self.surfaces[i])
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut Surface<K, T>> {
        let i = *self.by_key.get(key)?;
        self.surfaces.get_mut(i)
    }

    /// Binds surfaces to `rows`: a row keeps the surface it had, rows entering the window take
    /// surfaces from rows that left it, and new surfaces are only allocated when none are free.
    pub fn reconcile(&mut self, rows: &[WindowRow<K>]) -> ReconcileStats {
        let mut stats = ReconcileStats::default();
        let mut live = alloc::vec![false; self.surfaces.len()];
        let mut unbound = Vec::new();

        for (ri, row) in rows.iter().enumerate() {
            match self.by_key.get(&row.key) {
                Some(&si) if !live[si] => {
                    live[si] = true;
                    let s = &mut self.surfaces[si];
                    s.index = row.index;
                    s.offset = row.offset;
                    s.height = row.height;
                    stats.reused += 1;
                }
                _ => unbound.push(ri),
            }
        }

        let mut free: Vec<usize> = (0..self.surfaces.len()).filter(|&i| !live[i]).collect();
        for ri in unbound {
            let row = &rows[ri];
            if let Some(si) = free.pop() {
                let s = &mut self.surfaces[si];
                s.key = row.key.clone();
                s.index = row.index;
                s.offset = row.offset;
                s.height = row.height;
                s.stale = true;
                live[si] = true;
                stats.recycled += 1;
            } else {
                let id = SurfaceId(self.next_id);
                self.next_id = self.next_id.wrapping_add(1);
                self.surfaces.push(Surface {
                    id,
                    key: row.key.clone(),
                    index: row.index,
                    offset: row.offset,
                    height: row.height,
                    stale: true,
                    content: T::default(),
                });
                live.push(true);
                stats.created += 1;
            }
        }

        stats.released = free.len();
        if !free.is_empty() {
            let mut i = 0usize;
            self.surfaces.retain(|_| {
                let keep = live[i];
                i += 1;
                keep
            });
        }
        self.surfaces.sort_by_key(|s| s.index);
        self.rebuild_index();
        vtrace!(
            reused = stats.reused,
            recycled = stats.recycled,
            created = stats.created,
            released = stats.released,
            "SurfacePool::reconcile"
        );
        stats
    }

    /// Forces every surface to re-render its content on the next pass.
    pub fn invalidate_all(&mut self) {
        for s in &mut self.surfaces {
            s.stale = true;
        }
    }

    pub fn invalidate(&mut self, key: &K) -> bool {
        match self.get_mut(key) {
            Some(s) => {
                s.stale = true;
                true
            }
            None => false,
        }
    }

    /// Drops every surface. Used when cell identity assumptions no longer hold.
    pub fn clear(&mut self) {
        vdebug!(dropped = self.surfaces.len(), "SurfacePool::clear");
        self.surfaces.clear();
        self.by_key.clear();
    }

    fn rebuild_index(&mut self) {
        self.by_key.clear();
        for (i, s) in self.surfaces.iter().enumerate() {
            self.by_key.insert(s.key.clone(), i);
        }
    }
}
