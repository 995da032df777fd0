use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::cache::{CacheError, Client};

#[derive(Clone, Default)]
pub struct MockRedisClient {
    setex_ret: HashMap<String, Result<(), CacheError>>,
    calls: Arc<Mutex<Vec<MockRedisCall>>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRedisCall {
    pub op: String,
    pub key: String,
    pub value: String,
    pub ttl_seconds: u64,
}

impl MockRedisClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_calls(&self) -> std::sync::MutexGuard<'_, Vec<MockRedisCall>> {
        match self.calls.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Keys without a configured result succeed.
    pub fn setex_ret(&mut self, key: &str, ret: Result<(), CacheError>) -> Self {
        self.setex_ret.insert(key.to_owned(), ret);
        self.clone()
    }

    pub fn get_calls(&self) -> Vec<MockRedisCall> {
        self.lock_calls().clone()
    }
}

#[async_trait]
impl Client for MockRedisClient {
    async fn setex(&self, key: String, value: String, seconds: u64) -> Result<(), CacheError> {
        self.lock_calls().push(MockRedisCall {
            op: "setex".to_string(),
            key: key.clone(),
            value,
            ttl_seconds: seconds,
        });

        match self.setex_ret.get(&key) {
            Some(result) => result.clone(),
            None => Ok(()),
        }
    }
}
