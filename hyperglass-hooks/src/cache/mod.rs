//! Minimal cache client used to confirm the cache service is reachable.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

mod client;
mod mock;

pub use client::RedisClient;
pub use mock::{MockRedisCall, MockRedisClient};

#[derive(Error, Debug, Clone)]
pub enum CacheError {
    #[error("connection refused by cache: {0}")]
    ConnectionRefused(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Timeout error")]
    Timeout,
    #[error(transparent)]
    Redis(#[from] Arc<redis::RedisError>),
}

impl From<redis::RedisError> for CacheError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_connection_refusal() {
            CacheError::ConnectionRefused(err.to_string())
        } else if err.is_timeout() {
            CacheError::Timeout
        } else {
            CacheError::Redis(Arc::new(err))
        }
    }
}

impl CacheError {
    pub fn is_connection_refused(&self) -> bool {
        matches!(self, CacheError::ConnectionRefused(_))
    }
}

/// Where and how to reach the cache.
///
/// `charset` and `decode_responses` describe how replies are read back; the
/// health check never reads a reply body, so they only show up in logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConnection {
    pub host: String,
    pub port: u16,
    pub charset: String,
    pub decode_responses: bool,
    pub database: i64,
}

impl CacheConnection {
    pub fn url(&self) -> String {
        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };
        format!("redis://{}:{}/{}", host, self.port, self.database)
    }
}

#[async_trait]
pub trait Client {
    /// SET `k` to `v` with an expiry of `seconds`.
    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CacheError>;
}
