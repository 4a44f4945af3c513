use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::Plugin;

pub type PluginFactory<R> = Arc<dyn Fn() -> Box<dyn Plugin<R>> + Send + Sync>;

/// Feature name to plugin factory, owned by one application and handed to each grid it builds.
pub struct FeatureRegistry<R> {
    factories: IndexMap<String, PluginFactory<R>>,
}

impl<R> Default for FeatureRegistry<R> {
    fn default() -> Self {
        Self {
            factories: IndexMap::new(),
        }
    }
}

impl<R> Clone for FeatureRegistry<R> {
    fn clone(&self) -> Self {
        Self {
            factories: self.factories.clone(),
        }
    }
}

impl<R> FeatureRegistry<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory; a later registration under the same name replaces the earlier one.
    pub fn register<P>(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn() -> P + Send + Sync + 'static,
    ) where
        P: Plugin<R> + 'static,
    {
        self.factories
            .insert(name.into(), Arc::new(move || Box::new(factory()) as Box<dyn Plugin<R>>));
    }

    pub fn with<P>(
        mut self,
        name: impl Into<String>,
        factory: impl Fn() -> P + Send + Sync + 'static,
    ) -> Self
    where
        P: Plugin<R> + 'static,
    {
        self.register(name, factory);
        self
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.factories.shift_remove(name).is_some()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn create(&self, name: &str) -> Option<Box<dyn Plugin<R>>> {
        self.factories.get(name).map(|f| f())
    }
}

impl<R> fmt::Debug for FeatureRegistry<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.factories.keys()).finish()
    }
}
