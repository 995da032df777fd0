use std::collections::BTreeMap;
use std::ops::Deref;
use std::path::PathBuf;
use std::str::FromStr;

use envconfig::Envconfig;
use serde::Serialize;

use crate::cache::CacheConnection;
use crate::multiproc::MULTIPROC_DIR_ENV;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlexBool(pub bool);

impl FromStr for FlexBool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Ok(FlexBool(true)),
            "false" | "0" | "no" | "off" | "" => Ok(FlexBool(false)),
            _ => Err(format!("Invalid boolean value: {}", s)),
        }
    }
}

impl From<FlexBool> for bool {
    fn from(flex: FlexBool) -> Self {
        flex.0
    }
}

impl Deref for FlexBool {
    type Target = bool;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[derive(Envconfig, Clone, Debug)]
pub struct Config {
    /// Server executable the supervisor launches.
    #[envconfig(default = "/usr/local/bin/hyperglass")]
    pub command: PathBuf,

    /// Application root, also the base for the stylesheet paths.
    #[envconfig(default = "/opt/hyperglass/hyperglass")]
    pub app_root: PathBuf,

    #[envconfig(from = "BIND_ADDRESS", default = "[::1]:8001")]
    pub bind: String,

    #[envconfig(default = "true")]
    pub preload: FlexBool,

    /// Worker count override. When unset, see [`Config::worker_count`].
    pub workers: Option<usize>,

    #[envconfig(from = "RUN_AS_USER", default = "www-data")]
    pub user: String,

    #[envconfig(default = "60")]
    pub timeout_secs: u64,

    #[envconfig(default = "10")]
    pub keepalive_secs: u64,

    #[envconfig(default = "/tmp/hyperglass_prometheus")]
    pub prometheus_multiproc_dir: PathBuf,

    #[envconfig(default = "sass")]
    pub sass_binary: String,

    /// Overrides `<app_root>/static/sass/hyperglass.scss`.
    pub sass_source: Option<PathBuf>,

    /// Overrides `<app_root>/static/css/hyperglass.css`.
    pub css_output: Option<PathBuf>,

    #[envconfig(default = "false")]
    pub debug: FlexBool,

    #[envconfig(nested = true)]
    pub cache: CacheConfig,
}

#[derive(Envconfig, Clone, Debug)]
pub struct CacheConfig {
    #[envconfig(from = "CACHE_HOST", default = "localhost")]
    pub host: String,

    #[envconfig(from = "CACHE_PORT", default = "6379")]
    pub port: u16,

    #[envconfig(from = "CACHE_DATABASE", default = "0")]
    pub database: i64,

    #[envconfig(from = "CACHE_CHARSET", default = "utf-8")]
    pub charset: String,

    #[envconfig(from = "CACHE_DECODE_RESPONSES", default = "true")]
    pub decode_responses: FlexBool,
}

/// The static values a supervisor reads to launch the server.
///
/// `env` lists variables the supervisor must export to its workers; the hooks
/// binary cannot set them in the supervisor's own environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupervisorSettings {
    pub command: PathBuf,
    pub app_root: PathBuf,
    pub bind: String,
    pub preload: bool,
    pub workers: usize,
    pub user: String,
    pub timeout_secs: u64,
    pub keepalive_secs: u64,
    pub prometheus_multiproc_dir: PathBuf,
    pub env: BTreeMap<String, String>,
}

impl Config {
    pub fn default_test_config() -> Self {
        Self {
            command: PathBuf::from("/usr/local/bin/hyperglass"),
            app_root: PathBuf::from("/opt/hyperglass/hyperglass"),
            bind: "[::1]:8001".to_string(),
            preload: FlexBool(true),
            workers: None,
            user: "www-data".to_string(),
            timeout_secs: 60,
            keepalive_secs: 10,
            prometheus_multiproc_dir: PathBuf::from("/tmp/hyperglass_prometheus"),
            sass_binary: "sass".to_string(),
            sass_source: None,
            css_output: None,
            debug: FlexBool(false),
            cache: CacheConfig {
                host: "localhost".to_string(),
                port: 6379,
                database: 0,
                charset: "utf-8".to_string(),
                decode_responses: FlexBool(true),
            },
        }
    }

    /// Two workers per available processing unit, unless overridden.
    pub fn worker_count(&self) -> usize {
        self.workers
            .unwrap_or_else(|| available_parallelism().saturating_mul(2))
    }

    pub fn sass_source(&self) -> PathBuf {
        self.sass_source
            .clone()
            .unwrap_or_else(|| self.app_root.join("static/sass/hyperglass.scss"))
    }

    pub fn css_output(&self) -> PathBuf {
        self.css_output
            .clone()
            .unwrap_or_else(|| self.app_root.join("static/css/hyperglass.css"))
    }

    pub fn cache_connection(&self) -> CacheConnection {
        CacheConnection {
            host: self.cache.host.clone(),
            port: self.cache.port,
            charset: self.cache.charset.clone(),
            decode_responses: *self.cache.decode_responses,
            database: self.cache.database,
        }
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            command: self.command.clone(),
            app_root: self.app_root.clone(),
            bind: self.bind.clone(),
            preload: *self.preload,
            workers: self.worker_count(),
            user: self.user.clone(),
            timeout_secs: self.timeout_secs,
            keepalive_secs: self.keepalive_secs,
            prometheus_multiproc_dir: self.prometheus_multiproc_dir.clone(),
            env: BTreeMap::from([(
                MULTIPROC_DIR_ENV.to_string(),
                self.prometheus_multiproc_dir.display().to_string(),
            )]),
        }
    }
}

/// Returns the available parallelism, respecting container CPU limits on Linux.
pub fn available_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or_else(|_| {
            tracing::warn!("Failed to determine available parallelism, falling back to 1");
            1
        })
}
