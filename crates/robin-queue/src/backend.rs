/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_common::RelayJob;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("queue I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to (de)serialize a queued job: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("invalid backend table/key name `{0}`: must be alphanumeric or underscore")]
    InvalidTableName(String),
    #[error("queue backend error: {0}")]
    Backend(String),
}

/// Contract every queue backend (file, Redis, SQL, in-memory) implements
/// identically, per `jobId -> RelayJob` with FIFO dequeue.
pub trait QueueBackend: Send + Sync {
    /// Append a job at the back of the queue.
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError>;

    /// Push a job to the front of the queue, ahead of everything already
    /// waiting. Used for bounces, which are top-priority relay jobs.
    /// Backends without a cheap front-insert may fall back to `enqueue`.
    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        self.enqueue(job)
    }

    /// Pop and return the job at the front of the queue, if any.
    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError>;

    /// Return every job currently queued, front to back, without removing
    /// any of them.
    fn peek(&self) -> Result<Vec<RelayJob>, QueueError>;

    /// Remove and return the job at the given position (0 = front).
    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError>;

    /// Remove and return the job with the given UID, wherever it sits in
    /// the queue.
    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError>;

    /// Drop every job currently queued.
    fn clear(&self) -> Result<(), QueueError>;

    /// Number of jobs currently queued.
    fn len(&self) -> Result<usize, QueueError>;

    fn is_empty(&self) -> Result<bool, QueueError> {
        Ok(self.len()? == 0)
    }
}

/// SQL and key/value backends key jobs by a user-configured table/key
/// prefix; validate it is alphanumeric-or-underscore before interpolating
/// it into a query or path, foreclosing injection.
pub fn validate_table_name(name: &str) -> Result<(), QueueError> {
    if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        Ok(())
    } else {
        Err(QueueError::InvalidTableName(name.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::validate_table_name;

    #[test]
    fn accepts_alphanumeric_and_underscore() {
        assert!(validate_table_name("relay_queue_1").is_ok());
    }

    #[test]
    fn rejects_sql_metacharacters() {
        assert!(validate_table_name("relay; DROP TABLE users;--").is_err());
        assert!(validate_table_name("").is_err());
    }
}
