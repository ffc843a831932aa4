//! Script bindings and the runtime that executes them.
//!
//! A [`ScriptBinding`] is either a Rust callable or a Lua source (file or
//! inline chunk). Every invocation receives a [`ScriptContext`] holding the
//! area world and the ambient [`ScriptBindings`] (acting entity, tile, area).
//!
//! - [`binding`] – the binding sum type with `validate` / `invoke`
//! - [`context`] – invocation context and ambient bindings
//! - [`commands`] – engine commands scripts can issue
//! - `lua` – the Lua runtime (feature `lua`)

mod binding;
mod commands;
mod context;
#[cfg(feature = "lua")]
mod lua;

pub use binding::{NativeScript, ScriptBinding};
pub use commands::ScriptCmd;
pub use context::{ScriptBindings, ScriptContext};
#[cfg(feature = "lua")]
pub use lua::LuaRuntime;
