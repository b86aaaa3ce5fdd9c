use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::{debug, info};

use crate::error::Result;

/// TTL key-value cache over opaque byte strings.
///
/// `get` returning `None` is a miss, never an error; errors mean the backend
/// itself failed, and callers are expected to degrade to a miss rather than
/// fail the read.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Overwrites `key` with `value`. The TTL is mandatory; nothing is
    /// cached forever.
    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()>;
}

#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl fmt::Debug for RedisCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisCache")
            .field("connection", &"ConnectionManager")
            .finish()
    }
}

impl RedisCache {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        info!("Connecting to Redis cache at {}", redis_url);

        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;

        info!("Successfully connected to Redis cache");

        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let data: Option<Vec<u8>> = conn.get(key).await?;

        match &data {
            Some(_) => debug!("Cache HIT: {}", key),
            None => debug!("Cache MISS: {}", key),
        }

        Ok(data)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> Result<()> {
        debug!("Cache SET: {} (TTL: {:?})", key, ttl);

        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs()).await?;

        Ok(())
    }
}
