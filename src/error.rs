use crate::RowId;

/// Errors raised by plugin attach/detach and isolated plugin hooks.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("plugin `{plugin}` requires `{dependency}`: {reason}")]
    MissingDependency {
        plugin: String,
        dependency: String,
        reason: String,
    },

    #[error("plugin `{0}` is already attached")]
    AlreadyAttached(String),

    #[error("plugin `{0}` is not attached")]
    NotAttached(String),

    #[error("plugin `{plugin}` is required by `{dependent}`")]
    RequiredBy { plugin: String, dependent: String },

    #[error("plugin `{plugin}` failed in `{hook}`: {message}")]
    Hook {
        plugin: String,
        hook: &'static str,
        message: String,
    },
}

/// Errors surfaced by [`Grid`](crate::Grid) operations.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error(transparent)]
    Plugin(#[from] PluginError),

    #[error("row identity function panicked at row {index}")]
    IdentityPanicked { index: usize },

    #[error("row identity function returned no id for row {index}")]
    MissingRowId { index: usize },

    #[error("duplicate row id `{id}` at rows {first} and {second}")]
    DuplicateRowId {
        id: RowId,
        first: usize,
        second: usize,
    },

    #[error("unknown feature `{0}`")]
    UnknownFeature(String),
}

pub type Result<T, E = GridError> = std::result::Result<T, E>;

/// Error type returned by fallible plugin hooks.
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

pub type HookResult = std::result::Result<(), HookError>;
