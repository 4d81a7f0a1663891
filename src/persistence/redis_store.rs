use std::time::Duration;

use parking_lot::Mutex;
use redis::Commands;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::StorageError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Redis-backed string store.
///
/// The connection is opened lazily and dropped on any error, so a Redis
/// that is down at startup (or restarts later) only costs failed calls,
/// never a crash.
pub struct RedisStore {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
}

impl RedisStore {
    /// Only validates the URL; no connection is made here.
    pub fn open(url: &str) -> Result<Self, StorageError> {
        let client = redis::Client::open(url)
            .map_err(|e| StorageError::Unavailable(format!("invalid Redis URL \"{url}\": {e}")))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
        })
    }

    fn with_conn<T>(
        &self,
        op: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>,
    ) -> Result<T, StorageError> {
        let mut guard = self.conn.lock();
        if guard.is_none() {
            let conn = self.client.get_connection_with_timeout(CONNECT_TIMEOUT)?;
            conn.set_read_timeout(Some(IO_TIMEOUT))?;
            conn.set_write_timeout(Some(IO_TIMEOUT))?;
            debug!("connected to Redis");
            *guard = Some(conn);
        }

        let Some(conn) = guard.as_mut() else {
            return Err(StorageError::Unavailable("no Redis connection".into()));
        };
        match op(conn) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(error = %e, "Redis command failed, dropping connection");
                *guard = None;
                Err(e.into())
            }
        }
    }
}

impl KeyValueStore for RedisStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| conn.get(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.set(key, value))
    }
}
