use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub name: String,
    /// Why the dependency is needed; part of the attach error.
    pub reason: String,
    pub required: bool,
}

/// What a plugin needs, emits and answers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
    #[serde(default)]
    pub events: Vec<String>,
    #[serde(default)]
    pub queries: Vec<String>,
}

impl PluginManifest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn requires(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.dependencies.push(Dependency {
            name: name.into(),
            reason: reason.into(),
            required: true,
        });
        self
    }

    pub fn optional(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.dependencies.push(Dependency {
            name: name.into(),
            reason: reason.into(),
            required: false,
        });
        self
    }

    pub fn emits(mut self, event: impl Into<String>) -> Self {
        self.events.push(event.into());
        self
    }

    pub fn answers(mut self, query: impl Into<String>) -> Self {
        self.queries.push(query.into());
        self
    }

    pub fn depends_on(&self, name: &str) -> bool {
        self.dependencies.iter().any(|d| d.required && d.name == name)
    }

    pub fn declares_event(&self, event: &str) -> bool {
        self.events.iter().any(|e| e == event)
    }

    pub fn declares_query(&self, query: &str) -> bool {
        self.queries.iter().any(|q| q == query)
    }
}
