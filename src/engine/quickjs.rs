//! QuickJS backend
//!
//! Each context gets its own QuickJS runtime, so two contexts never share
//! a heap, an atom table or a GC. The runtime is built with rquickjs'
//! `parallel` support, which makes a context safe to move to whichever
//! thread currently holds the owning handle's lock.
//!
//! Scripts are compiled as sloppy-mode global code under the caller's file
//! name, so stack frames point at that name.

use std::ffi::CString;

use rquickjs::convert::Coerced;
use rquickjs::{Context, Ctx, Function, Runtime, Value, qjs};
use tracing::debug;

use super::Engine;
use crate::config::EngineConfig;
use crate::environment::HostEnvironment;
use crate::error::{Result, ScriptError};

/// Routes `Date.prototype.getTimezoneOffset` through the host callback.
/// Evaluates to a function taking the callback. Offsets are whole minutes,
/// as the engine's own local-time accessors report them.
const TIME_ZONE_BRIDGE: &str = r#"(function (offsetSeconds) {
    Object.defineProperty(Date.prototype, "getTimezoneOffset", {
        value: function getTimezoneOffset() {
            var t = this.getTime();
            return t !== t ? NaN : Math.trunc(-offsetSeconds(t) / 60);
        },
        writable: true,
        configurable: true
    });
})"#;

/// The QuickJS engine
#[derive(Debug, Clone, Copy, Default)]
pub struct QuickJs {
    config: EngineConfig,
}

impl QuickJs {
    /// Create an engine whose contexts use `config`
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(QuickJs { config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn try_create(&self, env: &HostEnvironment) -> rquickjs::Result<QuickJsContext> {
        let runtime = Runtime::new()?;
        runtime.set_memory_limit(self.config.memory_limit);
        runtime.set_max_stack_size(self.config.max_stack_size);
        if let Some(threshold) = self.config.gc_threshold {
            runtime.set_gc_threshold(threshold);
        }

        let context = Context::full(&runtime)?;
        context.with(|ctx| install_environment(&ctx, env))?;

        Ok(QuickJsContext { context, runtime })
    }
}

/// A live QuickJS context and the runtime backing it
pub struct QuickJsContext {
    context: Context,
    runtime: Runtime,
}

impl Engine for QuickJs {
    type Context = QuickJsContext;

    fn create_context(&self, env: &HostEnvironment) -> Option<QuickJsContext> {
        match self.try_create(env) {
            Ok(context) => {
                debug!(memory_limit = self.config.memory_limit, "QuickJS context created");
                Some(context)
            }
            Err(err) => {
                debug!(error = %err, "QuickJS context allocation failed");
                None
            }
        }
    }

    fn destroy_context(&self, context: QuickJsContext) {
        drop(context);
        debug!("QuickJS context destroyed");
    }

    fn evaluate(
        &self,
        context: &mut QuickJsContext,
        script: &str,
        file_name: &str,
    ) -> std::result::Result<String, ScriptError> {
        context.context.with(|ctx| eval_script(&ctx, script, file_name))
    }

    fn collect_garbage(&self, context: &mut QuickJsContext) {
        context.runtime.run_gc();
    }
}

/// Evaluate `script` as global code named `file_name`.
fn eval_script(
    ctx: &Ctx<'_>,
    script: &str,
    file_name: &str,
) -> std::result::Result<String, ScriptError> {
    let source = CString::new(script)
        .map_err(|_| ScriptError::new(file_name, "script contains a NUL byte"))?;
    let name = CString::new(file_name)
        .map_err(|_| ScriptError::new(file_name, "file name contains a NUL byte"))?;

    // SAFETY: `source` and `name` are NUL-terminated and outlive the call,
    // and the context pointer stays valid for the whole `Context::with`.
    let raw = unsafe {
        qjs::JS_Eval(
            ctx.as_raw().as_ptr(),
            source.as_ptr(),
            source.as_bytes().len() as _,
            name.as_ptr(),
            qjs::JS_EVAL_TYPE_GLOBAL as _,
        )
    };
    if unsafe { qjs::JS_VALUE_GET_NORM_TAG(raw) } == qjs::JS_TAG_EXCEPTION {
        return Err(caught_error(ctx, file_name));
    }

    // SAFETY: `raw` is an owned, non-exception value of this context.
    let value = unsafe { Value::from_raw(ctx.clone(), raw) };
    match value.get::<Coerced<String>>() {
        Ok(Coerced(result)) => Ok(result),
        Err(rquickjs::Error::Exception) => Err(caught_error(ctx, file_name)),
        Err(err) => Err(ScriptError::new(file_name, err.to_string())),
    }
}

fn install_environment(ctx: &Ctx<'_>, env: &HostEnvironment) -> rquickjs::Result<()> {
    let env = *env;
    let offset_seconds = Function::new(ctx.clone(), move |epoch_millis: f64| {
        env.local_time_zone_offset_seconds(epoch_millis)
    })?;
    let install: Function = ctx.eval(TIME_ZONE_BRIDGE)?;
    install.call::<_, ()>((offset_seconds,))
}

/// Take the pending exception off `ctx` and describe it.
///
/// The message is the engine's own string coercion of the thrown value,
/// so `throw new Error("boom")` reads `Error: boom`.
fn caught_error(ctx: &Ctx<'_>, file_name: &str) -> ScriptError {
    let thrown = ctx.catch();
    let message = match thrown.get::<Coerced<String>>() {
        Ok(Coerced(message)) => message,
        Err(_) => "uncaught exception".to_string(),
    };
    let stack = thrown.as_exception().and_then(|exception| exception.stack());
    ScriptError::new(file_name, message).with_stack(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn engine_and_context() -> (QuickJs, QuickJsContext) {
        let engine = QuickJs::default();
        let context = engine.create_context(&HostEnvironment::default()).unwrap();
        (engine, context)
    }

    #[test]
    fn test_eval_completion_values() {
        let (engine, mut ctx) = engine_and_context();

        assert_eq!(engine.evaluate(&mut ctx, "1 + 2", "?").unwrap(), "3");
        assert_eq!(engine.evaluate(&mut ctx, "[1, 2, 3]", "?").unwrap(), "1,2,3");
        assert_eq!(engine.evaluate(&mut ctx, "'a' + 'b'", "?").unwrap(), "ab");
        assert_eq!(engine.evaluate(&mut ctx, "null", "?").unwrap(), "null");
        assert_eq!(engine.evaluate(&mut ctx, "", "?").unwrap(), "undefined");
        assert_eq!(engine.evaluate(&mut ctx, "({})", "?").unwrap(), "[object Object]");

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_globals_persist_within_context() {
        let (engine, mut ctx) = engine_and_context();

        engine.evaluate(&mut ctx, "var x = 10;", "?").unwrap();
        assert_eq!(engine.evaluate(&mut ctx, "x * 2", "?").unwrap(), "20");

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_thrown_error() {
        let (engine, mut ctx) = engine_and_context();

        let err = engine
            .evaluate(
                &mut ctx,
                "function fail() { throw new Error('boom'); }\nfail();",
                "boom.js",
            )
            .unwrap_err();
        assert_eq!(err.file_name, "boom.js");
        assert_eq!(err.message, "Error: boom");
        assert!(err.stack.as_deref().unwrap_or_default().contains("fail"));

        assert_eq!(engine.evaluate(&mut ctx, "40 + 2", "?").unwrap(), "42");
        engine.destroy_context(ctx);
    }

    #[test]
    fn test_thrown_non_error() {
        let (engine, mut ctx) = engine_and_context();

        let err = engine.evaluate(&mut ctx, "throw 'plain';", "?").unwrap_err();
        assert_eq!(err.message, "plain");
        assert_eq!(err.stack, None);

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_syntax_error() {
        let (engine, mut ctx) = engine_and_context();

        let err = engine.evaluate(&mut ctx, "var = ;", "bad.js").unwrap_err();
        assert!(err.message.starts_with("SyntaxError"), "{}", err.message);

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_sloppy_mode_global_code() {
        let (engine, mut ctx) = engine_and_context();

        assert_eq!(engine.evaluate(&mut ctx, "undeclared = 5; undeclared", "?").unwrap(), "5");
        assert_eq!(engine.evaluate(&mut ctx, "010", "?").unwrap(), "8");
        assert_eq!(
            engine
                .evaluate(&mut ctx, "(function () { return typeof this; })()", "?")
                .unwrap(),
            "object"
        );

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_stack_names_file() {
        let (engine, mut ctx) = engine_and_context();

        let err = engine
            .evaluate(&mut ctx, "function f() { throw new Error('x'); }\nf();", "main.js")
            .unwrap_err();
        let stack = err.stack.unwrap_or_default();
        assert!(stack.contains("main.js"), "{}", stack);
        assert!(!stack.contains("eval_script"), "{}", stack);

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_nul_byte_rejected() {
        let (engine, mut ctx) = engine_and_context();

        let err = engine.evaluate(&mut ctx, "1\0", "?").unwrap_err();
        assert!(err.message.contains("NUL"));
        assert_eq!(engine.evaluate(&mut ctx, "1", "?").unwrap(), "1");

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_time_zone_offset_matches_local_accessors() {
        let (engine, mut ctx) = engine_and_context();

        // Local wall-clock fields re-read as UTC, minus the instant, is the
        // offset the engine itself applies.
        let check = r#"
            [1673784000000, 1689422400000, 0].every(function (t) {
                var d = new Date(t);
                var wall = Date.UTC(d.getFullYear(), d.getMonth(), d.getDate(),
                                    d.getHours(), d.getMinutes(), d.getSeconds());
                return Math.round((wall - t) / 60000) === -d.getTimezoneOffset();
            })
        "#;
        assert_eq!(engine.evaluate(&mut ctx, check, "?").unwrap(), "true");
        assert_eq!(
            engine
                .evaluate(&mut ctx, "new Date(NaN).getTimezoneOffset()", "?")
                .unwrap(),
            "NaN"
        );
        assert_eq!(
            engine
                .evaluate(&mut ctx, "Number.isInteger(new Date(0).getTimezoneOffset())", "?")
                .unwrap(),
            "true"
        );

        engine.destroy_context(ctx);
    }

    #[test]
    fn test_with_config() {
        let config = EngineConfig::default()
            .with_memory_limit(16 * 1024 * 1024)
            .with_gc_threshold(1024 * 1024);
        let engine = QuickJs::with_config(config).unwrap();
        assert_eq!(engine.config().memory_limit, 16 * 1024 * 1024);

        let mut ctx = engine.create_context(&HostEnvironment::default()).unwrap();
        engine.collect_garbage(&mut ctx);
        assert_eq!(engine.evaluate(&mut ctx, "typeof Date", "?").unwrap(), "function");
        engine.destroy_context(ctx);

        let bad = EngineConfig::default().with_memory_limit(1024);
        assert!(QuickJs::with_config(bad).is_err());
    }
}
