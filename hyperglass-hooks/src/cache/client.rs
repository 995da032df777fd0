use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::cache::{CacheConnection, CacheError, Client};

/// Redis-backed [`Client`].
///
/// Construction only parses the connection URL. The connection is opened on
/// each call, so an unreachable server is reported by the call itself.
pub struct RedisClient {
    client: redis::Client,
    connection: CacheConnection,
}

impl RedisClient {
    pub fn new(connection: CacheConnection) -> Result<RedisClient, CacheError> {
        let client = redis::Client::open(connection.url())
            .map_err(|e| CacheError::InvalidConfiguration(e.to_string()))?;

        Ok(RedisClient { client, connection })
    }

    pub fn connection(&self) -> &CacheConnection {
        &self.connection
    }
}

#[async_trait]
impl Client for RedisClient {
    async fn setex(&self, k: String, v: String, seconds: u64) -> Result<(), CacheError> {
        debug!(
            host = %self.connection.host,
            port = self.connection.port,
            db = self.connection.database,
            charset = %self.connection.charset,
            decode_responses = self.connection.decode_responses,
            "connecting to cache"
        );
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.set_ex::<_, _, ()>(k, v, seconds).await?;
        Ok(())
    }
}
