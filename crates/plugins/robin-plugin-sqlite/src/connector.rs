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
use robin_common::RelayJob;
use robin_queue::{validate_table_name, QueueBackend, QueueError};
use rusqlite::OptionalExtension;

/// Connection parameters for the SQLite table backend.
#[derive(Debug, serde::Deserialize)]
pub struct Parameters {
    pub path: String,
    #[serde(default = "Parameters::default_timeout", with = "humantime_serde")]
    pub timeout: std::time::Duration,
    #[serde(default = "Parameters::default_connections")]
    pub connections: u32,
    /// Name of the backing table; validated against [`validate_table_name`]
    /// before ever being interpolated into a SQL string.
    pub table: String,
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
struct ConnectionManager {
    path: String,
}

impl ManageConnection for ConnectionManager {
    type Connection = rusqlite::Connection;
    type Error = rusqlite::Error;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        rusqlite::Connection::open(&self.path)
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.query_row("SELECT sqlite_version()", (), |row| row.get::<_, String>(0))
            .map(|_| ())
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        self.is_valid(conn).is_err()
    }
}

/// A SQLite-table-backed [`QueueBackend`]: one row per job, a `seq` column
/// gives FIFO order (`enqueue` appends past the current max, `enqueue_front`
/// inserts below the current min), `payload` is the job's JSON serialized
/// to a `BLOB`.
pub struct SqliteBackend {
    pool: r2d2::Pool<ConnectionManager>,
    table: String,
}

impl SqliteBackend {
    /// # Errors
    ///
    /// Returns [`QueueError::Backend`] if `params.table` fails
    /// [`validate_table_name`] or the pool/table cannot be created.
    pub fn connect(params: &Parameters) -> Result<Self, QueueError> {
        validate_table_name(&params.table)?;

        let pool = r2d2::Pool::builder()
            .max_size(params.connections)
            .connection_timeout(params.timeout)
            .build(ConnectionManager {
                path: params.path.clone(),
            })
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        let backend = Self {
            pool,
            table: params.table.clone(),
        };
        backend.create_table_if_missing()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager>, QueueError> {
        self.pool
            .get()
            .map_err(|error| QueueError::Backend(error.to_string()))
    }

    fn create_table_if_missing(&self) -> Result<(), QueueError> {
        let conn = self.connection()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (\
                     id INTEGER PRIMARY KEY AUTOINCREMENT, \
                     seq INTEGER NOT NULL, \
                     uid TEXT NOT NULL, \
                     payload BLOB NOT NULL\
                 )",
                self.table
            ),
            (),
        )
        .map_err(|error| QueueError::Backend(error.to_string()))?;
        conn.execute(
            &format!(
                "CREATE INDEX IF NOT EXISTS {table}_seq_idx ON {table} (seq)",
                table = self.table
            ),
            (),
        )
        .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(())
    }

    fn insert(&self, job: &RelayJob, seq_expr: &str) -> Result<(), QueueError> {
        let raw = serde_json::to_vec(job)?;
        self.connection()?
            .execute(
                &format!(
                    "INSERT INTO {table} (seq, uid, payload) VALUES ({seq_expr}, ?1, ?2)",
                    table = self.table
                ),
                rusqlite::params![job.uid.to_string(), raw],
            )
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(())
    }

    fn deserialize(raw: &[u8]) -> Result<RelayJob, QueueError> {
        Ok(serde_json::from_slice(raw)?)
    }

    fn row_at_offset(
        conn: &rusqlite::Connection,
        table: &str,
        offset: usize,
    ) -> Result<Option<(i64, Vec<u8>)>, QueueError> {
        conn.query_row(
            &format!("SELECT id, payload FROM {table} ORDER BY seq ASC LIMIT 1 OFFSET ?1"),
            [offset],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()
        .map_err(|error| QueueError::Backend(error.to_string()))
    }
}

impl QueueBackend for SqliteBackend {
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError> {
        self.insert(
            job,
            &format!("COALESCE((SELECT MAX(seq) FROM {}), 0) + 1", self.table),
        )
    }

    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        self.insert(
            job,
            &format!("COALESCE((SELECT MIN(seq) FROM {}), 0) - 1", self.table),
        )
    }

    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError> {
        let conn = self.connection()?;
        let Some((id, payload)) = Self::row_at_offset(&conn, &self.table, 0)? else {
            return Ok(None);
        };
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), [id])
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(Some(Self::deserialize(&payload)?))
    }

    fn peek(&self) -> Result<Vec<RelayJob>, QueueError> {
        let conn = self.connection()?;
        let mut stmt = conn
            .prepare(&format!("SELECT payload FROM {} ORDER BY seq ASC", self.table))
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        let rows = stmt
            .query_map([], |row| row.get::<_, Vec<u8>>(0))
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        let mut jobs = Vec::new();
        for row in rows {
            let payload = row.map_err(|error| QueueError::Backend(error.to_string()))?;
            jobs.push(Self::deserialize(&payload)?);
        }
        Ok(jobs)
    }

    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError> {
        let conn = self.connection()?;
        let Some((id, payload)) = Self::row_at_offset(&conn, &self.table, index)? else {
            return Ok(None);
        };
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), [id])
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(Some(Self::deserialize(&payload)?))
    }

    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError> {
        let conn = self.connection()?;
        let row: Option<(i64, Vec<u8>)> = conn
            .query_row(
                &format!(
                    "SELECT id, payload FROM {} WHERE uid = ?1 ORDER BY seq ASC LIMIT 1",
                    self.table
                ),
                [uid.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|error| QueueError::Backend(error.to_string()))?;

        let Some((id, payload)) = row else {
            return Ok(None);
        };
        conn.execute(&format!("DELETE FROM {} WHERE id = ?1", self.table), [id])
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(Some(Self::deserialize(&payload)?))
    }

    fn clear(&self) -> Result<(), QueueError> {
        self.connection()?
            .execute(&format!("DELETE FROM {}", self.table), ())
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        Ok(())
    }

    fn len(&self) -> Result<usize, QueueError> {
        let count: i64 = self
            .connection()?
            .query_row(&format!("SELECT COUNT(*) FROM {}", self.table), (), |row| row.get(0))
            .map_err(|error| QueueError::Backend(error.to_string()))?;
        usize::try_from(count).map_err(|error| QueueError::Backend(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::{Parameters, SqliteBackend};
    use robin_common::relay_job::Protocol;
    use robin_common::{RelayJob, RelayProtocol};
    use robin_queue::QueueBackend;

    fn backend() -> SqliteBackend {
        let params = Parameters {
            path: ":memory:".to_owned(),
            timeout: std::time::Duration::from_secs(1),
            connections: 1,
            table: "robin_queue".to_owned(),
        };
        SqliteBackend::connect(&params).unwrap()
    }

    #[test]
    fn rejects_an_unsafe_table_name() {
        let params = Parameters {
            path: ":memory:".to_owned(),
            timeout: std::time::Duration::from_secs(1),
            connections: 1,
            table: "robin_queue; DROP TABLE users".to_owned(),
        };
        assert!(SqliteBackend::connect(&params).is_err());
    }

    #[test]
    fn fifo_order_is_preserved() {
        let backend = backend();
        let (a, b) = (
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
        );
        backend.enqueue(&a).unwrap();
        backend.enqueue(&b).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, a.uid);
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, b.uid);
        assert!(backend.dequeue().unwrap().is_none());
    }

    #[test]
    fn enqueue_front_jumps_the_line() {
        let backend = backend();
        let (a, bounce) = (
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
        );
        backend.enqueue(&a).unwrap();
        backend.enqueue_front(&bounce).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, bounce.uid);
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, a.uid);
    }

    #[test]
    fn remove_by_uid_finds_job_anywhere_in_queue() {
        let backend = backend();
        let (a, b, c) = (
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
            RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)),
        );
        backend.enqueue(&a).unwrap();
        backend.enqueue(&b).unwrap();
        backend.enqueue(&c).unwrap();

        let removed = backend.remove_by_uid(b.uid).unwrap().unwrap();
        assert_eq!(removed.uid, b.uid);
        assert_eq!(backend.len().unwrap(), 2);
    }

    #[test]
    fn clear_empties_the_queue() {
        let backend = backend();
        backend
            .enqueue(&RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp)))
            .unwrap();
        backend.clear().unwrap();
        assert_eq!(backend.len().unwrap(), 0);
    }
}
