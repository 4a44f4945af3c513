use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use super::{EventBus, GridRef, KeyEvent, Plugin, PluginEvent, PluginManifest, PluginQuery};
use crate::grid::GridCore;
use crate::{CellRenderContext, ColumnConfig, ColumnState, PluginError, RenderPhase};

/// Nested emit/query chains deeper than this are dropped.
pub(crate) const MAX_DISPATCH_DEPTH: usize = 16;

struct PluginSlot<R> {
    name: Arc<str>,
    manifest: PluginManifest,
    // `None` while the plugin is running a hook.
    plugin: Option<Box<dyn Plugin<R>>>,
}

/// Attached plugins in attach order, plus their event subscriptions.
pub struct PluginManager<R> {
    slots: Vec<PluginSlot<R>>,
    pub(crate) bus: EventBus,
    depth: usize,
}

impl<R> Default for PluginManager<R> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            bus: EventBus::default(),
            depth: 0,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s
    } else {
        "non-string panic payload"
    }
}

/// Runs one plugin hook, turning a panic into `None`.
fn isolate<T>(plugin: &str, hook: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(v) => Some(v),
        Err(payload) => {
            warn!(
                target: "datagrid::plugin",
                plugin,
                hook,
                panic = panic_message(payload.as_ref()),
                "plugin hook panicked"
            );
            None
        }
    }
}

impl<R> PluginManager<R> {
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn is_attached(&self, name: &str) -> bool {
        self.slot_index(name).is_some()
    }

    /// Plugin names in attach order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|s| s.name.as_ref())
    }

    pub fn manifest(&self, name: &str) -> Option<&PluginManifest> {
        self.slot_index(name).map(|i| &self.slots[i].manifest)
    }

    /// Number of event subscriptions held by `name`.
    pub fn subscriptions_of(&self, name: &str) -> usize {
        self.bus.subscriptions_of(name)
    }

    pub(crate) fn subscribe(&mut self, plugin: &Arc<str>, kind: &str) -> bool {
        self.bus.on(plugin, kind)
    }

    pub(crate) fn unsubscribe(&mut self, plugin: &str, kind: &str) -> bool {
        self.bus.off(plugin, kind)
    }

    fn slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name.as_ref() == name)
    }

    pub(crate) fn collect_column_state(&self, column: &ColumnConfig, state: &mut ColumnState) {
        for slot in &self.slots {
            if let Some(plugin) = &slot.plugin {
                isolate(&slot.name, "collect_column_state", || {
                    plugin.collect_column_state(column, state)
                });
            }
        }
    }

    pub(crate) fn apply_column_state(&mut self, column: &mut ColumnConfig, state: &ColumnState) {
        for slot in &mut self.slots {
            if let Some(plugin) = slot.plugin.as_mut() {
                isolate(&slot.name, "apply_column_state", || {
                    plugin.apply_column_state(column, state)
                });
            }
        }
    }

    pub(crate) fn reset_column_state(&mut self, column: &mut ColumnConfig) {
        for slot in &mut self.slots {
            if let Some(plugin) = slot.plugin.as_mut() {
                isolate(&slot.name, "reset_column_state", || {
                    plugin.reset_column_state(column)
                });
            }
        }
    }

    pub(crate) fn after_cell_render(&mut self, ctx: &mut CellRenderContext<'_, R>) {
        for slot in &mut self.slots {
            if let Some(plugin) = slot.plugin.as_mut() {
                isolate(&slot.name, "after_cell_render", || plugin.after_cell_render(ctx));
            }
        }
    }
}

impl<R: crate::GridRow + 'static> PluginManager<R> {
    pub(crate) fn attach(
        &mut self,
        core: &mut GridCore<R>,
        mut plugin: Box<dyn Plugin<R>>,
    ) -> Result<(), PluginError> {
        let manifest = plugin.manifest();
        let name: Arc<str> = Arc::from(manifest.name.as_str());
        if self.is_attached(&name) {
            return Err(PluginError::AlreadyAttached(name.to_string()));
        }
        for dep in &manifest.dependencies {
            if self.is_attached(&dep.name) {
                continue;
            }
            if dep.required {
                warn!(
                    target: "datagrid::plugin",
                    plugin = %name,
                    dependency = %dep.name,
                    "missing required dependency"
                );
                return Err(PluginError::MissingDependency {
                    plugin: name.to_string(),
                    dependency: dep.name.clone(),
                    reason: dep.reason.clone(),
                });
            }
            debug!(
                target: "datagrid::plugin",
                plugin = %name,
                dependency = %dep.name,
                reason = %dep.reason,
                "optional dependency not attached"
            );
        }

        self.slots.push(PluginSlot {
            name: Arc::clone(&name),
            manifest,
            plugin: None,
        });
        let index = self.slots.len() - 1;
        let attached = isolate(&name, "attach", || {
            let mut grid = GridRef::new(core, self, Arc::clone(&name));
            plugin.attach(&mut grid);
        });
        if attached.is_none() {
            self.slots.remove(index);
            self.bus.remove_plugin(&name);
            return Err(PluginError::Hook {
                plugin: name.to_string(),
                hook: "attach",
                message: "attach hook panicked".to_owned(),
            });
        }
        self.slots[index].plugin = Some(plugin);
        core.scheduler.request(RenderPhase::Full);
        debug!(target: "datagrid::plugin", plugin = %name, "attached");
        Ok(())
    }

    pub(crate) fn detach(
        &mut self,
        core: &mut GridCore<R>,
        name: &str,
    ) -> Result<Box<dyn Plugin<R>>, PluginError> {
        let index = self
            .slot_index(name)
            .ok_or_else(|| PluginError::NotAttached(name.to_owned()))?;
        if let Some(dependent) = self
            .slots
            .iter()
            .find(|s| s.manifest.depends_on(name))
        {
            return Err(PluginError::RequiredBy {
                plugin: name.to_owned(),
                dependent: dependent.name.to_string(),
            });
        }

        let mut slot = self.slots.remove(index);
        let Some(mut plugin) = slot.plugin.take() else {
            self.slots.insert(index, slot);
            return Err(PluginError::NotAttached(name.to_owned()));
        };
        isolate(&slot.name, "detach", || {
            let mut grid = GridRef::new(core, self, Arc::clone(&slot.name));
            plugin.detach(&mut grid);
        });
        let removed = self.bus.remove_plugin(name);
        core.scheduler.request(RenderPhase::Full);
        debug!(target: "datagrid::plugin", plugin = name, subscriptions = removed, "detached");
        Ok(plugin)
    }

    fn enter(&mut self, what: &str) -> bool {
        if self.depth >= MAX_DISPATCH_DEPTH {
            warn!(
                target: "datagrid::plugin",
                what,
                depth = self.depth,
                "dispatch too deep, dropped"
            );
            return false;
        }
        self.depth += 1;
        true
    }

    /// Delivers `event` to the host callback and then to every subscriber in subscription
    /// order. Plugins already running a hook further up the stack are skipped.
    pub(crate) fn emit(&mut self, core: &mut GridCore<R>, event: &PluginEvent) {
        if !self.enter(&event.kind) {
            return;
        }
        if let Some(source) = event.source.as_deref() {
            if self.manifest(source).is_some_and(|m| !m.declares_event(&event.kind)) {
                debug!(
                    target: "datagrid::plugin",
                    plugin = source,
                    event = %event.kind,
                    "event not declared in manifest"
                );
            }
        }
        if let Some(on_event) = core.options.on_event.clone() {
            on_event(event);
        }

        let targets: Vec<usize> = self
            .bus
            .subscribers(&event.kind)
            .filter_map(|name| self.slot_index(name))
            .collect();
        for index in targets {
            let Some(mut plugin) = self.slots[index].plugin.take() else {
                continue;
            };
            let name = Arc::clone(&self.slots[index].name);
            let outcome = isolate(&name, "on_event", || {
                let mut grid = GridRef::new(core, self, Arc::clone(&name));
                plugin.on_event(&mut grid, event)
            });
            self.slots[index].plugin = Some(plugin);
            if let Some(Err(error)) = outcome {
                warn!(
                    target: "datagrid::plugin",
                    plugin = %name,
                    event = %event.kind,
                    %error,
                    "event handler failed"
                );
            }
        }
        self.depth -= 1;
    }

    /// Asks every attached plugin in attach order. A plugin whose manifest lists the query type
    /// answers through `resolve_query`, any other through `handle_query`.
    pub(crate) fn query(&mut self, core: &mut GridCore<R>, query: &PluginQuery) -> Vec<Value> {
        let mut answers = Vec::new();
        if !self.enter(&query.kind) {
            return answers;
        }
        for index in 0..self.slots.len() {
            let Some(mut plugin) = self.slots[index].plugin.take() else {
                continue;
            };
            let name = Arc::clone(&self.slots[index].name);
            let declared = self.slots[index].manifest.declares_query(&query.kind);
            let answer = isolate(&name, "query", || {
                if declared {
                    let mut grid = GridRef::new(core, self, Arc::clone(&name));
                    plugin.resolve_query(&mut grid, query)
                } else {
                    plugin.handle_query(query)
                }
            });
            self.slots[index].plugin = Some(plugin);
            if let Some(Some(value)) = answer {
                answers.push(value);
            }
        }
        let declared = self.slots.iter().any(|s| s.manifest.declares_query(&query.kind));
        if answers.is_empty() && !declared {
            debug!(
                target: "datagrid::plugin",
                query = %query.kind,
                "no plugin declares this query; only legacy handlers were asked"
            );
        }
        self.depth -= 1;
        answers
    }

    /// Offers a key event in attach order until a plugin handles it.
    pub(crate) fn key_down(&mut self, core: &mut GridCore<R>, event: &KeyEvent) -> bool {
        if !self.enter("keydown") {
            return false;
        }
        let mut handled = false;
        for index in 0..self.slots.len() {
            let Some(mut plugin) = self.slots[index].plugin.take() else {
                continue;
            };
            let name = Arc::clone(&self.slots[index].name);
            handled = isolate(&name, "on_key_down", || {
                let mut grid = GridRef::new(core, self, Arc::clone(&name));
                plugin.on_key_down(&mut grid, event)
            })
            .unwrap_or(false);
            self.slots[index].plugin = Some(plugin);
            if handled {
                debug!(target: "datagrid::plugin", plugin = %name, key = %event.key, "key handled");
                break;
            }
        }
        self.depth -= 1;
        handled
    }

    /// Threads the row list through every plugin's `process_rows` in attach order. A panicking
    /// plugin leaves its input unchanged.
    pub(crate) fn process_rows(
        &mut self,
        core: &mut GridCore<R>,
        rows: Vec<Arc<R>>,
    ) -> Vec<Arc<R>> {
        let mut rows = rows;
        for index in 0..self.slots.len() {
            let Some(mut plugin) = self.slots[index].plugin.take() else {
                continue;
            };
            let name = Arc::clone(&self.slots[index].name);
            let input = rows.clone();
            let output = isolate(&name, "process_rows", || {
                let mut grid = GridRef::new(core, self, Arc::clone(&name));
                plugin.process_rows(&mut grid, input)
            });
            self.slots[index].plugin = Some(plugin);
            if let Some(output) = output {
                rows = output;
            }
        }
        rows
    }

    pub(crate) fn after_render(&mut self, core: &mut GridCore<R>) {
        for index in 0..self.slots.len() {
            let Some(mut plugin) = self.slots[index].plugin.take() else {
                continue;
            };
            let name = Arc::clone(&self.slots[index].name);
            isolate(&name, "after_render", || {
                let mut grid = GridRef::new(core, self, Arc::clone(&name));
                plugin.after_render(&mut grid);
            });
            self.slots[index].plugin = Some(plugin);
        }
    }
}
