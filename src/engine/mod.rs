//! Engine boundary
//!
//! The interpreter engine is an opaque collaborator. Everything the
//! handle needs from it goes through [`Engine`]:
//!
//! - create a context (`None` means the engine could not allocate one)
//! - evaluate a script against a context
//! - destroy a context
//!
//! A context is a move-only token. It cannot be copied or cloned, so the
//! only way to destroy it is to give it up, and the only way to use it is
//! through the handle that owns it.

pub mod quickjs;

pub use quickjs::{QuickJs, QuickJsContext};

use crate::environment::HostEnvironment;
use crate::error::ScriptError;

/// An embeddable script engine
pub trait Engine {
    /// Opaque per-session engine state (globals, heap, compiled code)
    type Context;

    /// Allocate a fresh context with `env` registered for callbacks
    fn create_context(&self, env: &HostEnvironment) -> Option<Self::Context>;

    /// Release everything `context` owns
    fn destroy_context(&self, context: Self::Context);

    /// Run `script` and return the string coercion of its completion value
    ///
    /// `file_name` only labels diagnostics.
    fn evaluate(
        &self,
        context: &mut Self::Context,
        script: &str,
        file_name: &str,
    ) -> Result<String, ScriptError>;

    /// Run the engine's garbage collector, if it has one
    fn collect_garbage(&self, context: &mut Self::Context) {
        let _ = context;
    }
}
