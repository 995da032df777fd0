//! Startup, worker-exit and shutdown hooks called by the process supervisor.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::assets::{SassCompiler, StylesheetCompiler};
use crate::cache::{Client, RedisClient};
use crate::config::Config;
use crate::error::HookError;
use crate::metrics;
use crate::multiproc::MultiprocessDir;

const CHECK_KEY: &str = "testkey";
const CHECK_VALUE: &str = "testvalue";
const CHECK_TTL_SECS: u64 = 1;

/// The supervisor's view of the server. Hooks accept it but do not act on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerHandle {
    pub pid: u32,
    pub bind: String,
}

impl ServerHandle {
    pub fn current(config: &Config) -> Self {
        Self {
            pid: std::process::id(),
            bind: config.bind.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerHandle {
    pub pid: u32,
}

/// Callbacks a supervisor invokes at fixed points of the server lifetime.
///
/// `on_starting` runs before any worker is forked, `worker_exit` once per
/// terminating worker, and `on_exit` last, as the process group exits.
#[async_trait]
pub trait LifecycleHooks {
    async fn on_starting(&self, server: &ServerHandle) -> Result<(), HookError>;

    async fn worker_exit(
        &self,
        server: &ServerHandle,
        worker: &WorkerHandle,
    ) -> Result<(), HookError>;

    async fn on_exit(&self, server: &ServerHandle) -> Result<(), HookError>;
}

pub struct Hooks {
    config: Config,
    metrics_dir: MultiprocessDir,
    stylesheet: Arc<dyn StylesheetCompiler + Send + Sync>,
    cache: Arc<dyn Client + Send + Sync>,
}

impl Hooks {
    pub fn new(
        config: Config,
        stylesheet: Arc<dyn StylesheetCompiler + Send + Sync>,
        cache: Arc<dyn Client + Send + Sync>,
    ) -> Self {
        let metrics_dir = MultiprocessDir::new(config.prometheus_multiproc_dir.clone());
        Self {
            config,
            metrics_dir,
            stylesheet,
            cache,
        }
    }

    /// Wires the Sass compiler and redis client described by `config`.
    pub fn from_config(config: Config) -> Result<Self, HookError> {
        let stylesheet = SassCompiler::new(
            config.sass_binary.clone(),
            config.sass_source(),
            config.css_output(),
        );
        let cache = RedisClient::new(config.cache_connection())?;
        Ok(Self::new(config, Arc::new(stylesheet), Arc::new(cache)))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn metrics_dir(&self) -> &MultiprocessDir {
        &self.metrics_dir
    }

    /// Best-effort: an unavailable compiler is logged and skipped, any other
    /// failure is returned.
    async fn build_stylesheet(&self) -> Result<(), HookError> {
        match self.stylesheet.compile().await {
            Ok(path) => {
                debug!(path = %path.display(), "stylesheet ready");
                Ok(())
            }
            Err(e) if e.is_unavailable() => {
                error!(error = %e, "Exception occurred while building stylesheet");
                metrics::emit_stylesheet_skipped();
                Ok(())
            }
            Err(e) => Err(HookError::Asset(e)),
        }
    }

    /// A refused connection aborts startup. Any other cache error is returned
    /// unchanged as [`HookError::Cache`].
    async fn check_cache(&self) -> Result<(), HookError> {
        let connection = self.config.cache_connection();
        match self
            .cache
            .setex(
                CHECK_KEY.to_string(),
                CHECK_VALUE.to_string(),
                CHECK_TTL_SECS,
            )
            .await
        {
            Ok(()) => {
                debug!(url = %connection.url(), "Cache is working properly");
                Ok(())
            }
            Err(e) if e.is_connection_refused() => {
                error!(url = %connection.url(), error = %e, "Cache is not running");
                Err(HookError::CacheUnavailable(e))
            }
            Err(e) => Err(HookError::Cache(e)),
        }
    }

    fn prepare_metrics_dir(&self) -> Result<(), HookError> {
        self.metrics_dir.prepare()?;
        self.metrics_dir.export_env();
        Ok(())
    }

    async fn starting(&self) -> Result<(), HookError> {
        self.build_stylesheet().await?;
        self.check_cache().await?;
        self.prepare_metrics_dir()
    }
}

fn record<T>(hook: &str, start: Instant, result: &Result<T, HookError>) {
    let outcome = match result {
        Ok(_) => "ok",
        Err(e) => e.kind(),
    };
    metrics::emit_hook_result(hook, outcome, start.elapsed().as_secs_f64());
}

#[async_trait]
impl LifecycleHooks for Hooks {
    async fn on_starting(&self, server: &ServerHandle) -> Result<(), HookError> {
        let start = Instant::now();
        info!(pid = server.pid, bind = %server.bind, "running startup hook");

        let result = self.starting().await;
        record("on_starting", start, &result);
        result
    }

    async fn worker_exit(
        &self,
        _server: &ServerHandle,
        worker: &WorkerHandle,
    ) -> Result<(), HookError> {
        let start = Instant::now();

        let result = self
            .metrics_dir
            .mark_process_dead(worker.pid)
            .map(|_| ())
            .map_err(HookError::from);
        if let Err(e) = &result {
            warn!(pid = worker.pid, error = %e, "failed to retire worker metrics");
        }
        record("worker_exit", start, &result);
        result
    }

    async fn on_exit(&self, server: &ServerHandle) -> Result<(), HookError> {
        let start = Instant::now();
        info!(pid = server.pid, "running shutdown hook");

        let result = self.metrics_dir.remove().map_err(HookError::from);
        record("on_exit", start, &result);
        result
    }
}
