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
use std::sync::atomic::{AtomicU64, Ordering};

/// Midpoint of the `u64` range: back-pushes count up from here, front-pushes
/// (bounces) count down from here, so filenames sort in FIFO/priority order
/// with a plain lexicographic directory listing.
const SEQ_BIAS: u64 = u64::MAX / 2;

/// Embedded key/value file store: one JSON file per job, named
/// `<sequence>-<uid>.json`, under a single spool directory. The directory
/// listing, sorted by name, is the FIFO order.
pub struct FileBackend {
    dir: std::path::PathBuf,
    back_seq: AtomicU64,
    front_seq: AtomicU64,
}

struct Entry {
    path: std::path::PathBuf,
    seq: u64,
    uid: uuid::Uuid,
}

impl FileBackend {
    /// # Errors
    ///
    /// Returns [`QueueError::Io`] if `dir` cannot be created or listed.
    pub fn open(dir: impl Into<std::path::PathBuf>) -> Result<Self, QueueError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        let existing = Self::list(&dir)?;
        let max_seq = existing.iter().map(|e| e.seq).max().unwrap_or(SEQ_BIAS);
        let min_seq = existing.iter().map(|e| e.seq).min().unwrap_or(SEQ_BIAS);
        Ok(Self {
            dir,
            back_seq: AtomicU64::new(max_seq.max(SEQ_BIAS) + 1),
            front_seq: AtomicU64::new(min_seq.min(SEQ_BIAS).saturating_sub(1)),
        })
    }

    fn list(dir: &std::path::Path) -> Result<Vec<Entry>, QueueError> {
        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(std::ffi::OsStr::to_str) != Some("json") {
                continue;
            }
            if let Some((seq, uid)) = Self::parse_filename(&path) {
                entries.push(Entry { path, seq, uid });
            }
        }
        entries.sort_by_key(|e| e.seq);
        Ok(entries)
    }

    fn parse_filename(path: &std::path::Path) -> Option<(u64, uuid::Uuid)> {
        let stem = path.file_stem()?.to_str()?;
        let (seq, uid) = stem.split_once('-')?;
        Some((seq.parse().ok()?, uid.parse().ok()?))
    }

    fn path_for(&self, seq: u64, uid: uuid::Uuid) -> std::path::PathBuf {
        self.dir.join(format!("{seq:020}-{uid}.json"))
    }

    fn write_at(&self, seq: u64, job: &RelayJob) -> Result<(), QueueError> {
        let path = self.path_for(seq, job.uid);
        let tmp = self.dir.join(format!(".{seq:020}-{}.json.tmp", job.uid));
        std::fs::write(&tmp, serde_json::to_vec(job)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn read(path: &std::path::Path) -> Result<RelayJob, QueueError> {
        let raw = std::fs::read(path)?;
        Ok(serde_json::from_slice(&raw)?)
    }
}

impl QueueBackend for FileBackend {
    fn enqueue(&self, job: &RelayJob) -> Result<(), QueueError> {
        let seq = self.back_seq.fetch_add(1, Ordering::SeqCst);
        self.write_at(seq, job)
    }

    fn enqueue_front(&self, job: &RelayJob) -> Result<(), QueueError> {
        let seq = self.front_seq.fetch_sub(1, Ordering::SeqCst);
        self.write_at(seq, job)
    }

    fn dequeue(&self) -> Result<Option<RelayJob>, QueueError> {
        let entries = Self::list(&self.dir)?;
        let Some(front) = entries.first() else {
            return Ok(None);
        };
        let job = Self::read(&front.path)?;
        std::fs::remove_file(&front.path)?;
        Ok(Some(job))
    }

    fn peek(&self) -> Result<Vec<RelayJob>, QueueError> {
        Self::list(&self.dir)?
            .iter()
            .map(|e| Self::read(&e.path))
            .collect()
    }

    fn remove_by_index(&self, index: usize) -> Result<Option<RelayJob>, QueueError> {
        let entries = Self::list(&self.dir)?;
        let Some(entry) = entries.get(index) else {
            return Ok(None);
        };
        let job = Self::read(&entry.path)?;
        std::fs::remove_file(&entry.path)?;
        Ok(Some(job))
    }

    fn remove_by_uid(&self, uid: uuid::Uuid) -> Result<Option<RelayJob>, QueueError> {
        let entries = Self::list(&self.dir)?;
        let Some(entry) = entries.iter().find(|e| e.uid == uid) else {
            return Ok(None);
        };
        let job = Self::read(&entry.path)?;
        std::fs::remove_file(&entry.path)?;
        Ok(Some(job))
    }

    fn clear(&self) -> Result<(), QueueError> {
        for entry in Self::list(&self.dir)? {
            std::fs::remove_file(entry.path)?;
        }
        Ok(())
    }

    fn len(&self) -> Result<usize, QueueError> {
        Ok(Self::list(&self.dir)?.len())
    }
}

#[cfg(test)]
mod tests {
    use super::FileBackend;
    use crate::backend::QueueBackend;
    use pretty_assertions::assert_eq;
    use robin_common::relay_job::Protocol;
    use robin_common::{RelayJob, RelayProtocol};

    fn job() -> RelayJob {
        RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp))
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("robin-queue-file-{}", uuid::Uuid::new_v4()));
        dir
    }

    #[test]
    fn fifo_order_and_reload_across_instances() {
        let dir = tempdir();
        let (a, b) = (job(), job());
        {
            let backend = FileBackend::open(&dir).unwrap();
            backend.enqueue(&a).unwrap();
            backend.enqueue(&b).unwrap();
        }
        // A fresh instance over the same directory must preserve order.
        let backend = FileBackend::open(&dir).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, a.uid);
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, b.uid);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn enqueue_front_is_dequeued_first() {
        let dir = tempdir();
        let backend = FileBackend::open(&dir).unwrap();
        let (a, bounce) = (job(), job());
        backend.enqueue(&a).unwrap();
        backend.enqueue_front(&bounce).unwrap();
        assert_eq!(backend.dequeue().unwrap().unwrap().uid, bounce.uid);
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn remove_by_uid_deletes_the_backing_file() {
        let dir = tempdir();
        let backend = FileBackend::open(&dir).unwrap();
        let target = job();
        backend.enqueue(&target).unwrap();
        assert_eq!(backend.len().unwrap(), 1);
        let removed = backend.remove_by_uid(target.uid).unwrap().unwrap();
        assert_eq!(removed.uid, target.uid);
        assert!(backend.is_empty().unwrap());
        std::fs::remove_dir_all(&dir).ok();
    }
}
