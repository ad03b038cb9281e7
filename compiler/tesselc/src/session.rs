//! REPL-style sessions.
//!
//! A [`Session`] owns one locality, a pattern registry and the global table
//! every compilation shares, so a `define` in one compilation is visible to
//! the next. Compile ids are drawn from a per-session counter: localities
//! that compile the same inputs in the same order agree on every node name.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::{Handle, Runtime};
use tracing::debug;

use tessel_eval::{core_registry, CompiledFunction, Compiler, SharedGlobals};
use tessel_ir::Expr;
use tessel_patterns::{CollectiveHub, EvalMode, Locality, PatternRegistry, Transport, Value};

use crate::config::SessionConfig;
use crate::error::Error;

/// Builder for [`Session`].
pub struct SessionBuilder {
    config: SessionConfig,
    registry: Option<PatternRegistry>,
    globals: Option<SharedGlobals>,
    hub: Option<Arc<CollectiveHub>>,
    transport: Option<Arc<dyn Transport>>,
}

impl SessionBuilder {
    /// A builder for a single-locality session with default settings.
    pub fn new() -> Self {
        Self::from_config(SessionConfig::default())
    }

    pub fn from_config(config: SessionConfig) -> Self {
        SessionBuilder {
            config,
            registry: None,
            globals: None,
            hub: None,
            transport: None,
        }
    }

    /// Place the session at locality `id` of a cluster of `count`.
    #[must_use]
    pub fn locality(mut self, id: u32, count: u32) -> Self {
        self.config.locality = id;
        self.config.num_localities = count;
        self
    }

    #[must_use]
    pub fn collective_timeout(mut self, timeout: Duration) -> Self {
        self.config.collective_timeout = timeout;
        self
    }

    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.config.mode = mode;
        self
    }

    #[must_use]
    pub fn worker_threads(mut self, threads: usize) -> Self {
        self.config.worker_threads = Some(threads);
        self
    }

    /// Use `registry` instead of the core catalogue.
    #[must_use]
    pub fn registry(mut self, registry: PatternRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Start from an existing global table.
    #[must_use]
    pub fn globals(mut self, globals: SharedGlobals) -> Self {
        self.globals = Some(globals);
        self
    }

    /// Meet the other localities at `hub`.
    #[must_use]
    pub fn hub(mut self, hub: Arc<CollectiveHub>) -> Self {
        self.hub = Some(hub);
        self
    }

    /// Reach the other localities through `transport`.
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<Session, Error> {
        let config = self.config;
        config.validate()?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => core_registry()?,
        };
        let hub = match self.hub {
            Some(hub) => hub,
            None => {
                let participants = usize::try_from(config.num_localities)
                    .map_err(|e| Error::Runtime(format!("cluster too large: {e}")))?;
                Arc::new(CollectiveHub::new(participants))
            }
        };
        let locality = Locality::new(
            config.locality,
            config.num_localities,
            hub,
            config.collective_timeout,
        )?;
        if let Some(transport) = self.transport {
            locality.set_transport(transport);
        }
        debug!(
            locality = config.locality,
            localities = config.num_localities,
            patterns = registry.len(),
            "session created"
        );

        Ok(Session {
            registry,
            globals: self.globals.unwrap_or_default(),
            locality,
            mode: config.mode,
            worker_threads: config.worker_threads,
            next_compile_id: AtomicU64::new(1),
            runtime: OnceLock::new(),
        })
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiles programs against an accumulating global environment.
pub struct Session {
    registry: PatternRegistry,
    globals: SharedGlobals,
    locality: Arc<Locality>,
    mode: EvalMode,
    worker_threads: Option<usize>,
    next_compile_id: AtomicU64,
    runtime: OnceLock<Runtime>,
}

impl Session {
    /// A single-locality session with the core catalogue.
    pub fn new() -> Result<Self, Error> {
        SessionBuilder::new().build()
    }

    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    #[inline]
    pub fn registry(&self) -> &PatternRegistry {
        &self.registry
    }

    #[inline]
    pub fn globals(&self) -> &SharedGlobals {
        &self.globals
    }

    #[inline]
    pub fn locality(&self) -> &Arc<Locality> {
        &self.locality
    }

    #[inline]
    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Compile `exprs` under the next compile id.
    ///
    /// Names of trees dropped since the last compilation are pruned first.
    pub fn compile(&self, exprs: &[Expr]) -> Result<CompiledFunction, Error> {
        self.locality.names().prune();
        let compile_id = self.next_compile_id.fetch_add(1, Ordering::Relaxed);
        let compiler = Compiler::new(
            &self.registry,
            self.globals.clone(),
            Arc::clone(&self.locality),
            compile_id,
        );
        let compiled = compiler.compile_function(exprs)?;
        debug!(
            compile_id,
            locality = self.locality.id(),
            root = %compiled.name(),
            "compiled"
        );
        Ok(compiled.with_mode(self.mode))
    }

    /// Compile and run `exprs`.
    pub async fn eval(&self, exprs: &[Expr]) -> Result<Value, Error> {
        let compiled = self.compile(exprs)?;
        Ok(compiled.run().await?)
    }

    /// Compile and run `exprs`, blocking on the session runtime.
    ///
    /// Must not be called from inside an async context.
    pub fn eval_blocking(&self, exprs: &[Expr]) -> Result<Value, Error> {
        let compiled = self.compile(exprs)?;
        self.block_on(compiled.run())?.map_err(Error::from)
    }

    /// Drive `future` to completion on the session runtime, building the
    /// runtime on first use.
    pub fn block_on<F: Future>(&self, future: F) -> Result<F::Output, Error> {
        if Handle::try_current().is_ok() {
            return Err(Error::Runtime(
                "cannot block on the session runtime from inside an async context".to_string(),
            ));
        }
        Ok(self.runtime()?.block_on(future))
    }

    fn runtime(&self) -> Result<&Runtime, Error> {
        if let Some(runtime) = self.runtime.get() {
            return Ok(runtime);
        }
        let mut builder = tokio::runtime::Builder::new_multi_thread();
        builder.enable_all().thread_name("tessel-worker");
        if let Some(threads) = self.worker_threads {
            builder.worker_threads(threads);
        }
        let runtime = builder
            .build()
            .map_err(|e| Error::Runtime(format!("cannot start session runtime: {e}")))?;
        debug!(locality = self.locality.id(), "session runtime started");
        Ok(self.runtime.get_or_init(|| runtime))
    }
}
