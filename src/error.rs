//! Error types.
//!
//! Load-time and transition failures are recoverable and surface as
//! [`AreaError`]. Script failures surface as [`ScriptError`] and are either
//! logged or promoted to a panic depending on
//! [`EngineConfig::halt_on_script_error`](crate::resources::engineconfig::EngineConfig).
//! Lookups of unregistered layer depths are not errors: they panic.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AreaError {
    #[error("area descriptor '{area}' is malformed: {reason}")]
    Malformed { area: String, reason: String },

    #[error("area '{0}' could not be found")]
    NotFound(String),

    #[error("layer depth {depth} registered twice in area '{area}'")]
    DuplicateDepth { area: String, depth: f64 },

    #[error("script for {what} in area '{area}' is invalid: {source}")]
    InvalidTrigger {
        area: String,
        what: String,
        #[source]
        source: ScriptError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, Clone)]
pub enum ScriptError {
    #[error("script file '{0}' does not exist")]
    MissingFile(String),

    #[error("script '{name}' failed: {message}")]
    Failed { name: String, message: String },

    #[error("no script runtime is available to run '{0}'")]
    NoRuntime(String),

    #[cfg(feature = "lua")]
    #[error("Lua error in '{name}': {source}")]
    Lua {
        name: String,
        #[source]
        source: mlua::Error,
    },
}

impl ScriptError {
    /// Convenience constructor for native script failures.
    pub fn failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        ScriptError::Failed {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load config file: {0}")]
    Load(String),

    #[error("failed to save config file: {0}")]
    Save(String),

    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}
