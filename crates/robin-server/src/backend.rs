/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! A single concrete [`QueueBackend`] delegating to whichever of
//! `robin-queue`'s own backends, or a plugin's, the operator selected in
//! `queue_backend`. Lets every generic consumer (`QueueCron`,
//! `robin_working`'s processors) be instantiated over one concrete type
//! regardless of the configured backend.

use crate::config::QueueBackendConfig;
use robin_common::RelayJob;
use robin_queue::{FileBackend, MemoryBackend, QueueBackend, QueueError};

pub enum Backend {
    Memory(MemoryBackend),
    File(FileBackend),
    Redis(robin_plugin_redis::connector::RedisBackend),
    Sqlite(robin_plugin_sqlite::connector::SqliteBackend),
}

impl Backend {
    /// # Errors
    ///
    /// Returns [`QueueError`] if the selected backend fails to connect
    /// (bad table/key name, unreachable Redis/SQLite, unwritable spool
    /// directory).
    pub fn open(config: &QueueBackendConfig, default_dir: &std::path::Path) -> Result<Self, QueueError> {
        match config {
            QueueBackendConfig::Memory => Ok(Self::Memory(MemoryBackend::new())),
            QueueBackendConfig::File { dir } => {
                let dir = if dir.as_os_str().is_empty() { default_dir.to_path_buf() } else { dir.clone() };
                Ok(Self::File(FileBackend::open(dir)?))
            }
            QueueBackendConfig::Redis { url, timeout, connections, key } => {
                let params = robin_plugin_redis::connector::Parameters {
                    url: url.clone(),
                    timeout: *timeout,
                    connections: *connections,
                    key: key.clone(),
                };
                Ok(Self::Redis(robin_plugin_redis::connector::RedisBackend::connect(&params)?))
            }
            QueueBackendConfig::Sqlite { path, timeout, connections, table } => {
                let params = robin_plugin_sqlite::connector::Parameters {
                    path: path.to_string_lossy().into_owned(),
                    timeout: *timeout,
                    connections: *connections,
                    table: table.clone(),
                };
                Ok(Self::Sqlite(robin_plugin_sqlite::connector::SqliteBackend::connect(&params)?))
            }
        }
    }
}

macro_rules! delegate {
    ($self:ident, $method:ident($($arg:ident),*)) => {
        match $self {
            Self::Memory(b) => b.$method($($arg),*),
            Self::File(b) => b.$method($($arg),*),
            Self::Redis(b) => b.$method($($arg),*),
            Self::Sqlite(b) => b.$method($($arg),*),
        }
    };
}

impl QueueBackend for Backend {
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError> {
        delegate!(self, enqueue(job))
    }

    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        delegate!(self, enqueue_front(job))
    }

    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError> {
        delegate!(self, dequeue())
    }

    fn peek(&self) -> Result<Vec<RelayJob>, QueueError> {
        delegate!(self, peek())
    }

    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError> {
        delegate!(self, remove_by_index(index))
    }

    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError> {
        delegate!(self, remove_by_uid(uid))
    }

    fn clear(&self) -> Result<(), QueueError> {
        delegate!(self, clear())
    }

    fn len(&self) -> Result<usize, QueueError> {
        delegate!(self, len())
    }
}

#[cfg(test)]
mod tests {
    use super::Backend;
    use crate::config::QueueBackendConfig;
    use robin_queue::QueueBackend as _;

    #[test]
    fn memory_backend_opens_and_starts_empty() {
        let backend = Backend::open(&QueueBackendConfig::Memory, std::path::Path::new("/tmp")).unwrap();
        assert!(backend.is_empty().unwrap());
    }

    #[test]
    fn file_backend_opens_under_the_given_directory() {
        let dir = std::env::temp_dir().join(format!("robin-server-test-{}", uuid::Uuid::new_v4()));
        let backend = Backend::open(&QueueBackendConfig::File { dir: dir.clone() }, std::path::Path::new("/tmp")).unwrap();
        assert!(backend.is_empty().unwrap());
        std::fs::remove_dir_all(dir).ok();
    }
}
