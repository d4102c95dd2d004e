//! Interpreter handle
//!
//! An [`InterpreterHandle`] owns exactly one engine context from creation
//! until [`release`](InterpreterHandle::release). All access to the
//! context goes through a single per-handle lock, so the engine never
//! sees two threads in the same context. Separate handles share nothing
//! and run in parallel freely.
//!
//! Release is explicit. Dropping a handle that was never released logs a
//! leak warning and does not hand the context back to the engine.

use std::fmt;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::engine::{Engine, QuickJs};
use crate::environment::HostEnvironment;
use crate::error::{Error, Result};

/// File name used when the caller doesn't supply one
pub const DEFAULT_FILE_NAME: &str = "?";

/// A handle to one embedded interpreter instance
///
/// ```ignore
/// use js_handle::InterpreterHandle;
///
/// let js = InterpreterHandle::create()?;
/// assert_eq!(js.evaluate("1 + 2")?, "3");
/// js.release();
/// ```
pub struct InterpreterHandle<E: Engine = QuickJs> {
    engine: E,

    /// `None` once released; never goes back to `Some`
    context: Mutex<Option<E::Context>>,
}

impl InterpreterHandle {
    /// Create an interpreter on the default QuickJS engine
    ///
    /// Must be matched with a call to [`release`](Self::release).
    pub fn create() -> Result<Self> {
        Self::with_engine(QuickJs::default())
    }
}

impl<E: Engine> InterpreterHandle<E> {
    /// Create an interpreter on `engine`
    pub fn with_engine(engine: E) -> Result<Self> {
        let Some(context) = engine.create_context(&HostEnvironment::default()) else {
            return Err(Error::OutOfResources);
        };
        debug!("interpreter handle created");

        Ok(InterpreterHandle {
            engine,
            context: Mutex::new(Some(context)),
        })
    }

    /// Evaluate `script` and return the string form of its result
    pub fn evaluate(&self, script: &str) -> Result<String> {
        self.evaluate_named(script, DEFAULT_FILE_NAME)
    }

    /// Evaluate `script`, labelling any failure with `file_name`
    ///
    /// Blocks while another thread is evaluating on this handle.
    pub fn evaluate_named(&self, script: &str, file_name: &str) -> Result<String> {
        let mut context = self.context.lock();
        let context = context.as_mut().ok_or(Error::UseAfterRelease)?;
        Ok(self.engine.evaluate(context, script, file_name)?)
    }

    /// Run the engine's garbage collector on this context
    pub fn collect_garbage(&self) -> Result<()> {
        let mut context = self.context.lock();
        let context = context.as_mut().ok_or(Error::UseAfterRelease)?;
        self.engine.collect_garbage(context);
        Ok(())
    }

    /// Destroy the engine context
    ///
    /// Only the first call does anything. Later calls, including ones
    /// racing on other threads, find the handle already released.
    pub fn release(&self) {
        let mut slot = self.context.lock();
        let Some(context) = slot.take() else {
            return;
        };
        self.engine.destroy_context(context);
        debug!("interpreter handle released");
    }

    pub fn is_released(&self) -> bool {
        self.context.lock().is_none()
    }
}

impl<E: Engine> Drop for InterpreterHandle<E> {
    fn drop(&mut self) {
        if self.context.get_mut().is_some() {
            warn!(
                engine = std::any::type_name::<E>(),
                "interpreter handle leaked: dropped without release()"
            );
        }
    }
}

impl<E: Engine> fmt::Debug for InterpreterHandle<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterpreterHandle")
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
