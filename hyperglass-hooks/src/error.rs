use thiserror::Error;

use crate::assets::AssetError;
use crate::cache::CacheError;

/// Errors a hook hands back to the supervisor.
///
/// `CacheUnavailable` is the deliberate startup abort. The other variants are
/// propagated as-is from the step that failed; no hook suppresses them.
#[derive(Error, Debug)]
pub enum HookError {
    #[error("cache service is not running: {0}")]
    CacheUnavailable(CacheError),
    #[error("cache check failed: {0}")]
    Cache(CacheError),
    #[error(transparent)]
    Asset(AssetError),
    #[error("metrics directory error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<CacheError> for HookError {
    fn from(err: CacheError) -> Self {
        if err.is_connection_refused() {
            HookError::CacheUnavailable(err)
        } else {
            HookError::Cache(err)
        }
    }
}

impl HookError {
    /// Label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HookError::CacheUnavailable(_) => "cache_unavailable",
            HookError::Cache(_) => "cache",
            HookError::Asset(_) => "asset",
            HookError::Io(_) => "io",
        }
    }
}
