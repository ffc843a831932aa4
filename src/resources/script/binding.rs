use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::context::ScriptContext;
use crate::error::ScriptError;

/// Signature of a script implemented in Rust.
pub type NativeScript = dyn Fn(&mut ScriptContext<'_>) -> Result<(), ScriptError> + Send + Sync;

/// A script bound to a tile, tile type, entity or area hook.
///
/// Bindings are cheap to clone: native callables and Lua sources are shared.
#[derive(Clone)]
pub enum ScriptBinding {
    /// Rust callable, invoked directly with the script context.
    Native { name: Arc<str>, func: Arc<NativeScript> },
    /// Lua source file, read and cached by the Lua runtime on first use.
    File { path: PathBuf },
    /// Lua chunk carried in memory.
    Inline { name: Arc<str>, source: Arc<str> },
}

impl ScriptBinding {
    pub fn native<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut ScriptContext<'_>) -> Result<(), ScriptError> + Send + Sync + 'static,
    {
        ScriptBinding::Native {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        ScriptBinding::File { path: path.into() }
    }

    pub fn inline(name: impl Into<Arc<str>>, source: impl Into<Arc<str>>) -> Self {
        ScriptBinding::Inline {
            name: name.into(),
            source: source.into(),
        }
    }

    /// Human readable name used in logs.
    pub fn name(&self) -> String {
        match self {
            ScriptBinding::Native { name, .. } | ScriptBinding::Inline { name, .. } => {
                name.to_string()
            }
            ScriptBinding::File { path } => path.display().to_string(),
        }
    }

    /// Check the binding can run, without running it.
    ///
    /// Files must exist and Lua sources must compile. Native callables are
    /// always valid.
    pub fn validate(&self) -> Result<(), ScriptError> {
        match self {
            ScriptBinding::Native { .. } => Ok(()),
            ScriptBinding::File { path } => {
                if !path.is_file() {
                    return Err(ScriptError::MissingFile(path.display().to_string()));
                }
                check_lua_file(path)
            }
            ScriptBinding::Inline { name, source } => check_lua_source(name, source),
        }
    }

    /// Run the script synchronously. Returns once the script finished or failed.
    pub fn invoke(&self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        match self {
            ScriptBinding::Native { func, .. } => func(ctx),
            ScriptBinding::File { path } => run_lua_file(ctx, path),
            ScriptBinding::Inline { name, source } => run_lua_source(ctx, name, source),
        }
    }
}

impl fmt::Debug for ScriptBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptBinding::Native { name, .. } => f.debug_tuple("Native").field(name).finish(),
            ScriptBinding::File { path } => f.debug_tuple("File").field(path).finish(),
            ScriptBinding::Inline { name, .. } => f.debug_tuple("Inline").field(name).finish(),
        }
    }
}

#[cfg(feature = "lua")]
fn check_lua_file(path: &Path) -> Result<(), ScriptError> {
    let name = path.display().to_string();
    let source = std::fs::read_to_string(path).map_err(|e| ScriptError::failed(&name, e.to_string()))?;
    check_lua_source(&name, &source)
}

#[cfg(feature = "lua")]
fn check_lua_source(name: &str, source: &str) -> Result<(), ScriptError> {
    super::lua::LuaRuntime::check_syntax(name, source)
}

#[cfg(feature = "lua")]
fn run_lua_file(ctx: &mut ScriptContext<'_>, path: &Path) -> Result<(), ScriptError> {
    let name = path.display().to_string();
    ctx.with_lua(&name, |runtime, bindings| {
        let source = runtime.source_for(path)?;
        runtime.run_chunk(&name, &source, bindings)
    })
}

#[cfg(feature = "lua")]
fn run_lua_source(ctx: &mut ScriptContext<'_>, name: &str, source: &str) -> Result<(), ScriptError> {
    ctx.with_lua(name, |runtime, bindings| runtime.run_chunk(name, source, bindings))
}

#[cfg(not(feature = "lua"))]
fn check_lua_file(path: &Path) -> Result<(), ScriptError> {
    Err(ScriptError::NoRuntime(path.display().to_string()))
}

#[cfg(not(feature = "lua"))]
fn check_lua_source(name: &str, _source: &str) -> Result<(), ScriptError> {
    Err(ScriptError::NoRuntime(name.to_string()))
}

#[cfg(not(feature = "lua"))]
fn run_lua_file(_ctx: &mut ScriptContext<'_>, path: &Path) -> Result<(), ScriptError> {
    Err(ScriptError::NoRuntime(path.display().to_string()))
}

#[cfg(not(feature = "lua"))]
fn run_lua_source(_ctx: &mut ScriptContext<'_>, name: &str, _source: &str) -> Result<(), ScriptError> {
    Err(ScriptError::NoRuntime(name.to_string()))
}
