//! js-handle - thread-safe handles to an embedded JavaScript interpreter
//!
//! Each [`InterpreterHandle`] owns one engine context. Scripts are
//! evaluated one at a time per handle, failures come back as typed
//! errors, and the context is released exactly once.
//!
//! # Features
//! - QuickJS backend by default, any [`Engine`] pluggable
//! - Per-handle locking; separate handles run in parallel
//! - Idempotent `release()`, leak warnings on drop
//! - Host time zone exposed to the engine's `Date`
//!
//! # Example
//! ```ignore
//! use js_handle::InterpreterHandle;
//!
//! let js = InterpreterHandle::create()?;
//! assert_eq!(js.evaluate("[1, 2].map(x => x * 2)")?, "2,4");
//! js.release();
//! ```

// Handle lifecycle
pub mod handle;

// Engine boundary and backends
pub mod engine;

// Host callbacks
pub mod environment;

pub mod config;
pub mod error;

// Re-export main types
pub use config::EngineConfig;
pub use engine::{Engine, QuickJs};
pub use environment::{HostEnvironment, local_time_zone_offset_seconds};
pub use error::{Error, Result, ScriptError};
pub use handle::{DEFAULT_FILE_NAME, InterpreterHandle};
