use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::warn;

use crate::{GridError, IdentityFn, Result, RowId};

/// Source rows with validated ids, plus the display list produced by plugins.
pub(crate) struct RowStore<R> {
    identity: Option<IdentityFn<R>>,
    source: Vec<Arc<R>>,
    source_ids: Vec<RowId>,
    source_index: HashMap<RowId, usize>,
    display: Vec<Arc<R>>,
    display_ids: Arc<Vec<RowId>>,
    display_index: HashMap<RowId, usize>,
}

impl<R> Default for RowStore<R> {
    fn default() -> Self {
        Self {
            identity: None,
            source: Vec::new(),
            source_ids: Vec::new(),
            source_index: HashMap::new(),
            display: Vec::new(),
            display_ids: Arc::new(Vec::new()),
            display_index: HashMap::new(),
        }
    }
}

impl<R> RowStore<R> {
    pub(crate) fn set_identity(&mut self, identity: IdentityFn<R>) {
        self.identity = Some(identity);
    }

    fn identify(&self, row: &R) -> std::result::Result<Option<RowId>, ()> {
        match &self.identity {
            None => Ok(None),
            Some(f) => panic::catch_unwind(AssertUnwindSafe(|| f(row))).map_err(|_| ()),
        }
    }

    /// Replaces the source rows. The whole assignment is rejected, and the previous rows kept,
    /// when an id cannot be produced or is duplicated.
    pub(crate) fn replace(&mut self, rows: Vec<Arc<R>>) -> Result<()> {
        let mut ids = Vec::with_capacity(rows.len());
        let mut seen: HashMap<RowId, usize> = HashMap::with_capacity(rows.len());
        for (index, row) in rows.iter().enumerate() {
            let id = match self.identify(row) {
                Err(()) => return Err(GridError::IdentityPanicked { index }),
                Ok(Some(id)) => id,
                Ok(None) if self.identity.is_none() => RowId::Index(index as u64),
                Ok(None) => return Err(GridError::MissingRowId { index }),
            };
            if let Some(&first) = seen.get(&id) {
                return Err(GridError::DuplicateRowId {
                    id,
                    first,
                    second: index,
                });
            }
            seen.insert(id.clone(), index);
            ids.push(id);
        }
        self.source = rows;
        self.source_ids = ids;
        self.source_index = seen;
        Ok(())
    }

    pub(crate) fn source(&self) -> &[Arc<R>] {
        &self.source
    }

    pub(crate) fn first(&self) -> Option<&Arc<R>> {
        self.source.first()
    }

    /// Installs the display list. Rows taken from the source keep their id; rows a plugin
    /// created get one from the identity function or their display position.
    pub(crate) fn set_display(&mut self, display: Vec<Arc<R>>) {
        let by_ptr: HashMap<*const R, usize> = self
            .source
            .iter()
            .enumerate()
            .map(|(i, r)| (Arc::as_ptr(r), i))
            .collect();

        let mut rows = Vec::with_capacity(display.len());
        let mut ids = Vec::with_capacity(display.len());
        let mut used: HashSet<RowId> = HashSet::with_capacity(display.len());
        for (position, row) in display.into_iter().enumerate() {
            let id = match by_ptr.get(&Arc::as_ptr(&row)) {
                Some(&i) => self.source_ids[i].clone(),
                None => match self.identify(&row) {
                    Ok(Some(id)) => id,
                    Ok(None) => RowId::Generated {
                        display: position as u64,
                    },
                    Err(()) => {
                        warn!(
                            target: "datagrid::render",
                            position,
                            "identity panicked for a display row"
                        );
                        continue;
                    }
                },
            };
            if !used.insert(id.clone()) {
                warn!(target: "datagrid::render", %id, "dropping display row with a duplicate id");
                continue;
            }
            rows.push(row);
            ids.push(id);
        }

        self.display_index = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
        self.display = rows;
        self.display_ids = Arc::new(ids);
    }

    pub(crate) fn display(&self) -> &[Arc<R>] {
        &self.display
    }

    pub(crate) fn display_ids(&self) -> &Arc<Vec<RowId>> {
        &self.display_ids
    }

    pub(crate) fn display_index(&self, id: &RowId) -> Option<usize> {
        self.display_index.get(id).copied()
    }

    pub(crate) fn source_index(&self, id: &RowId) -> Option<usize> {
        self.source_index.get(id).copied()
    }

    /// Looks a row up by id in the display list, then in the source rows.
    pub(crate) fn get(&self, id: &RowId) -> Option<&Arc<R>> {
        match self.display_index(id) {
            Some(i) => self.display.get(i),
            None => self.source_index(id).and_then(|i| self.source.get(i)),
        }
    }

    pub(crate) fn contains(&self, id: &RowId) -> bool {
        self.get(id).is_some()
    }
}
