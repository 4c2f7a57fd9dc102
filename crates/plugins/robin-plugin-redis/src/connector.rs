/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use r2d2::ManageConnection;
use redis::{Commands, ConnectionLike, IntoConnectionInfo};
use robin_common::RelayJob;
use robin_queue::{validate_table_name, QueueBackend, QueueError};

/// Connection parameters for the Redis LIST backend.
#[derive(Debug, serde::Deserialize)]
pub struct Parameters {
    pub url: String,
    #[serde(default = "Parameters::default_timeout", with = "humantime_serde")]
    pub timeout: std::time::Duration,
    #[serde(default = "Parameters::default_connections")]
    pub connections: u32,
    /// Name of the Redis key backing the queue `LIST`; validated against
    /// [`validate_table_name`] before use.
    pub key: String,
}

impl Parameters {
    const fn default_connections() -> u32 {
        4
    }

    const fn default_timeout() -> std::time::Duration {
        std::time::Duration::from_secs(30)
    }
}

#[derive(Debug)]
struct RedisManager {
    connection_info: redis::ConnectionInfo,
}

impl ManageConnection for RedisManager {
    type Connection = redis::Connection;
    type Error = redis::RedisError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        redis::Client::open(self.connection_info.clone())?.get_connection()
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        redis::cmd("PING").query(conn)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        !conn.is_open()
    }
}

/// A Redis LIST backed [`QueueBackend`]: `RPUSH`/`LPOP` for FIFO order,
/// `LPUSH` for priority (bounce) enqueues, `LSET`-then-`LREM` of a unique
/// sentinel for indexed/by-UID removal (Redis has no direct
/// remove-by-index on a list).
pub struct RedisBackend {
    pool: r2d2::Pool<RedisManager>,
    key: String,
}

impl RedisBackend {
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] if `key` fails [`validate_table_name`]
    /// or the connection pool cannot be built.
    pub fn connect(params: &Parameters) -> Result<Self, QueueError> {
        validate_table_name(&params.key)?;

        let connection_info = params
            .url
            .as_str()
            .into_connection_info()
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        let pool = r2d2::Pool::builder()
            .max_size(params.connections)
            .connection_timeout(params.timeout)
            .build(RedisManager { connection_info })
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        Ok(Self {
            pool,
            key: params.key.clone(),
        })
    }

    fn connection(&self) -> Result<r2d2::PooledConnection<RedisManager>, QueueError> {
        self.pool
            .get()
            .map_err(|error| QueueError::Backend(error.to_string()))
    }

    fn deserialize(raw: &str) -> Result<RelayJob, QueueError> {
        Ok(serde_json::from_str(raw)?)
    }
}

impl QueueBackend for RedisBackend {
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError> {
        let raw = serde_json::to_string(job)?;
        self.connection()?
            .rpush::<_, _, ()>(&self.key, raw)
            .map_err(|error| QueueError::Backend(error.to_string()))
    }

    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        let raw = serde_json::to_string(job)?;
        self.connection()?
            .lpush::<_, _, ()>(&self.key, raw)
            .map_err(|error| QueueError::Backend(error.to_string()))
    }

    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError> {
        let raw: Option<String> = self
            .connection()?
            .lpop(&self.key, None)
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        raw.as_deref().map(Self::deserialize).transpose()
    }

    fn peek(&self) -> Result<Vec<RelayJob>, QueueError> {
        let raw: Vec<String> = self
            .connection()?
            .lrange(&self.key, 0, -1)
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        raw.iter().map(|s| Self::deserialize(s)).collect()
    }

    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError> {
        let mut conn = self.connection()?;
        let index =
            i64::try_from(index).map_err(|_| QueueError::Backend("index out of range".to_owned()))?;
        let raw: Option<String> = conn
            .lindex(&self.key, index)
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        remove_at_index(&mut conn, &self.key, index)?;
        Ok(Some(Self::deserialize(&raw)?))
    }

    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError> {
        let mut conn = self.connection()?;
        let raw: Vec<String> = conn
            .lrange(&self.key, 0, -1)
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        for (index, entry) in raw.iter().enumerate() {
            let job = Self::deserialize(entry)?;
            if job.uid == uid {
                #[allow(clippy::cast_possible_wrap)]
                remove_at_index(&mut conn, &self.key, index as i64)?;
                return Ok(Some(job));
            }
        }
        Ok(None)
    }

    fn clear(&self) -> Result<(), QueueError> {
        self.connection()?
            .del::<_, ()>(&self.key)
            .map_err(|error| QueueError::Backend(error.to_string()))
    }

    fn len(&self) -> Result<usize, QueueError> {
        let len: usize = self
            .connection()?
            .llen(&self.key)
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(len)
    }
}

/// Remove the element currently at `index` from `key`: Redis lists have no
/// direct remove-by-index, so overwrite it with a unique sentinel, then
/// remove the sentinel.
fn remove_at_index(
    conn: &mut redis::Connection,
    key: &str,
    index: i64,
) -> Result<(), QueueError> {
    let sentinel = format!("\u{0}robin-tombstone-{}\u{0}", uuid::Uuid::new_v4());
    conn.lset(key, index, &sentinel)
        .map_err(|error| QueueError::Backend(error.to_string()))?;
    conn.lrem::<_, _, ()>(key, 1, sentinel)
        .map_err(|error| QueueError::Backend(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{Parameters, RedisBackend};
    use robin_queue::QueueBackend;

    fn test_backend() -> Option<RedisBackend> {
        let params = Parameters {
            url: "redis://127.0.0.1:6379".to_owned(),
            timeout: std::time::Duration::from_secs(1),
            connections: 1,
            key: format!("robin_test_{}", uuid::Uuid::new_v4().simple()),
        };
        RedisBackend::connect(&params).ok()
    }

    #[test]
    #[ignore = "requires a running redis on 127.0.0.1:6379"]
    fn fifo_order_round_trips_through_redis() {
        use robin_common::relay_job::Protocol;
        use robin_common::{RelayJob, RelayProtocol};

        let backend = test_backend().expect("redis not reachable");
        let (a, b) = (
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
        );
        backend.enqueue(&a).unwrap();
        backend.enqueue(&b).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, a.uid);
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, b.uid);
        backend.clear().unwrap();
    }
}
