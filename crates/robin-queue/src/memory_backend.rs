/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::backend::{QueueBackend, QueueError};
use robin_common::RelayJob;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-memory backend, used for tests and for the `in-memory list (testing)`
/// configuration option; nothing is persisted across process restarts.
#[derive(Default)]
pub struct MemoryBackend {
    jobs: Mutex<VecDeque<RelayJob>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl QueueBackend for MemoryBackend {
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).push_back(job.clone());
        Ok(())
    }

    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).push_front(job.clone());
        Ok(())
    }

    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError> {
        Ok(self.jobs.lock().unwrap_or_else(|e| e.into_inner()).pop_front())
    }

    fn peek(&self) -> Result<Vec<RelayJob>, QueueError> {
        Ok(self
            .jobs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect())
    }

    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError> {
        Ok(self.jobs.lock().unwrap_or_else(|e| e.into_inner()).remove(index))
    }

    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError> {
        let mut jobs = self.jobs.lock().unwrap_or_else(|e| e.into_inner());
        let position = jobs.iter().position(|job| job.uid == uid);
        Ok(position.and_then(|index| jobs.remove(index)))
    }

    fn clear(&self) -> Result<(), QueueError> {
        self.jobs.lock().unwrap_or_else(|e| e.into_inner()).clear();
        Ok(())
    }

    fn len(&self) -> Result<usize, QueueError> {
        Ok(self.jobs.lock().unwrap_or_else(|e| e.into_inner()).len())
    }
}

#[cfg(test)]
mod tests {
    use super::MemoryBackend;
    use crate::backend::QueueBackend;
    use pretty_assertions::assert_eq;
    use robin_common::relay_job::Protocol;
    use robin_common::{RelayJob, RelayProtocol};

    fn job() -> RelayJob {
        RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp))
    }

    #[test]
    fn fifo_order_is_preserved() {
        let backend = MemoryBackend::new();
        let (a, b) = (job(), job());
        backend.enqueue(&a).unwrap();
        backend.enqueue(&b).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, a.uid);
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, b.uid);
        assert!(backend.dequeue().unwrap().is_none());
    }

    #[test]
    fn enqueue_front_jumps_the_line() {
        let backend = MemoryBackend::new();
        let (a, bounce) = (job(), job());
        backend.enqueue(&a).unwrap();
        backend.enqueue_front(&bounce).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, bounce.uid);
    }

    #[test]
    fn remove_by_uid_finds_job_anywhere_in_queue() {
        let backend = MemoryBackend::new();
        let (a, b, c) = (job(), job(), job());
        for j in [&a, &b, &c] {
            backend.enqueue(j).unwrap();
        }
        let removed = backend.remove_by_uid(b.uid).unwrap().unwrap();
        assert_eq!(removed.uid, b.uid);
        assert_eq!(backend.len().unwrap(), 2);
        assert_eq!(backend.peek().unwrap()[0].uid, a.uid);
        assert_eq!(backend.peek().unwrap()[1].uid, c.uid);
    }

    #[test]
    fn clear_empties_the_queue() {
        let backend = MemoryBackend::new();
        backend.enqueue(&job()).unwrap();
        backend.clear().unwrap();
        assert!(backend.is_empty().unwrap());
    }
}
