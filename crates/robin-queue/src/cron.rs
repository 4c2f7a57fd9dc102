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
use crate::bounce::BounceBuilder;
use crate::spool::{persist_payload, queue_payload_path};
use robin_common::envelope::{Payload, Recipient};
use robin_common::RelayJob;

/// One recipient that failed on the most recent delivery attempt, with
/// enough detail to render a DSN bounce once retries are exhausted.
#[derive(Debug, Clone)]
pub struct FailedRecipient {
    pub recipient: Recipient,
    /// RFC 3464 enhanced status code, e.g. `5.0.0`.
    pub status: String,
    pub diagnostic_code: Option<String>,
    pub remote_mta: Option<String>,
}

/// Outcome of one delivery attempt against one envelope within a job.
#[derive(Debug, Clone)]
pub enum DeliveryOutcome {
    Delivered,
    Failed(Vec<FailedRecipient>),
}

/// Drives the actual delivery attempt (LDA subprocess or outbound SMTP, per
/// the job's [`robin_common::relay_job::Protocol`]); supplied by whichever
/// crate wires the cron to a live delivery path. Returns one outcome per
/// entry of `job.envelopes`, in the same order.
pub trait Deliverer: Send + Sync {
    fn deliver(&self, job: &RelayJob) -> Vec<DeliveryOutcome>;
}

#[derive(Debug, Clone)]
pub struct CronConfig {
    pub period_seconds: u64,
    pub initial_delay_seconds: u64,
    pub max_dequeue_per_tick: usize,
    pub first_wait_minutes: f64,
    pub growth_factor: f64,
    pub max_retries: u32,
    pub queue_dir: std::path::PathBuf,
}

impl Default for CronConfig {
    fn default() -> Self {
        Self {
            period_seconds: 60,
            initial_delay_seconds: 10,
            max_dequeue_per_tick: 50,
            first_wait_minutes: 1.0,
            growth_factor: 1.2,
            max_retries: 30,
            queue_dir: std::path::PathBuf::from("/var/spool/robin/queue"),
        }
    }
}

/// The single-threaded retry scheduler described in §4.5: dequeues due
/// jobs, hands them to a [`Deliverer`], and re-enqueues/bounces/drops them
/// according to the outcome. Retry-count accounting happens here only, even
/// though the `Deliverer` itself may fan out to a worker pool.
pub struct QueueCron<B, D> {
    backend: std::sync::Arc<B>,
    deliverer: std::sync::Arc<D>,
    bounce_builder: BounceBuilder,
    config: CronConfig,
}

impl<B: QueueBackend, D: Deliverer> QueueCron<B, D> {
    pub fn new(
        backend: std::sync::Arc<B>,
        deliverer: std::sync::Arc<D>,
        bounce_builder: BounceBuilder,
        config: CronConfig,
    ) -> Self {
        Self {
            backend,
            deliverer,
            bounce_builder,
            config,
        }
    }

    /// Runs until `shutdown` is signalled, ticking every `period_seconds`
    /// after an initial `initial_delay_seconds` delay.
    pub async fn run(&self, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        tokio::time::sleep(std::time::Duration::from_secs(self.config.initial_delay_seconds)).await;

        loop {
            if *shutdown.borrow() {
                return;
            }
            if let Err(error) = self.tick() {
                tracing::error!(%error, "queue cron tick failed");
            }

            tokio::select! {
                () = tokio::time::sleep(std::time::Duration::from_secs(self.config.period_seconds)) => {}
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Run a single tick synchronously; exposed directly for tests and for
    /// callers driving their own scheduling loop.
    pub fn tick(&self) -> Result<(), QueueError> {
        let now = time::OffsetDateTime::now_utc();
        for _ in 0..self.config.max_dequeue_per_tick {
            let Some(job) = self.backend.dequeue()? else {
                break;
            };
            self.process_job(job, now)?;
        }
        Ok(())
    }

    fn process_job(&self, mut job: RelayJob, now: time::OffsetDateTime) -> Result<(), QueueError> {
        if !job.is_due(now, self.config.first_wait_minutes, self.config.growth_factor) {
            self.persist_job_payloads(&mut job)?;
            self.backend.enqueue(&job)?;
            return Ok(());
        }

        let outcomes = self.deliverer.deliver(&job);
        let mut failures_per_envelope = Vec::with_capacity(job.envelopes.len());

        for (envelope, outcome) in job.envelopes.iter_mut().zip(outcomes) {
            match outcome {
                DeliveryOutcome::Delivered => {
                    if let Some(Payload::Path(path)) = &envelope.payload {
                        let _ = std::fs::remove_file(path);
                    }
                    envelope.recipients.clear();
                    failures_per_envelope.push(Vec::new());
                }
                DeliveryOutcome::Failed(failed) => {
                    envelope.recipients = failed.iter().map(|f| f.recipient.clone()).collect();
                    failures_per_envelope.push(failed);
                }
            }
        }

        let mut remaining_envelopes = Vec::new();
        let mut remaining_failures = Vec::new();
        for (envelope, failures) in job.envelopes.drain(..).zip(failures_per_envelope) {
            if !envelope.recipients.is_empty() {
                remaining_envelopes.push(envelope);
                remaining_failures.push(failures);
            }
        }
        job.envelopes = remaining_envelopes;

        if job.envelopes.is_empty() {
            return Ok(());
        }

        if job.retry_count < self.config.max_retries {
            job.retry_count += 1;
            job.last_retry_at = Some(now);
            self.persist_job_payloads(&mut job)?;
            self.backend.enqueue(&job)?;
        } else {
            for (envelope, failures) in job.envelopes.iter().zip(remaining_failures.iter()) {
                let bounce = self.bounce_builder.build(envelope, failures, now);
                self.backend.enqueue_front(&bounce)?;
            }
        }

        Ok(())
    }

    fn persist_job_payloads(&self, job: &mut RelayJob) -> Result<(), QueueError> {
        std::fs::create_dir_all(&self.config.queue_dir)?;
        for (index, envelope) in job.envelopes.iter_mut().enumerate() {
            let Some(payload) = &mut envelope.payload else {
                continue;
            };
            let destination =
                queue_payload_path(&self.config.queue_dir, "mail", job.uid, index, job.retry_count, "eml");
            persist_payload(&self.config.queue_dir, &destination, payload)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{CronConfig, DeliveryOutcome, FailedRecipient, QueueCron};
    use crate::backend::QueueBackend;
    use crate::bounce::BounceBuilder;
    use crate::memory_backend::MemoryBackend;
    use crate::Deliverer;
    use pretty_assertions::assert_eq;
    use robin_common::envelope::Recipient;
    use robin_common::relay_job::Protocol;
    use robin_common::{Envelope, RelayJob, RelayProtocol};
    use std::sync::Arc;

    struct AlwaysDelivers;
    impl Deliverer for AlwaysDelivers {
        fn deliver(&self, job: &RelayJob) -> Vec<DeliveryOutcome> {
            job.envelopes.iter().map(|_| DeliveryOutcome::Delivered).collect()
        }
    }

    struct AlwaysFails;
    impl Deliverer for AlwaysFails {
        fn deliver(&self, job: &RelayJob) -> Vec<DeliveryOutcome> {
            job.envelopes
                .iter()
                .map(|e| {
                    DeliveryOutcome::Failed(
                        e.recipients
                            .iter()
                            .map(|r| FailedRecipient {
                                recipient: r.clone(),
                                status: "4.0.0".to_owned(),
                                diagnostic_code: Some("450 try again".to_owned()),
                                remote_mta: None,
                            })
                            .collect(),
                    )
                })
                .collect()
        }
    }

    fn envelope() -> Envelope {
        let sender: robin_protocol::Address = "alice@example.test".parse().unwrap();
        let recipient: robin_protocol::Address = "bob@example.test".parse().unwrap();
        let mut envelope = Envelope::new(Some(sender));
        envelope.add_recipient(Recipient::new(recipient));
        envelope
    }

    fn config(queue_dir: std::path::PathBuf) -> CronConfig {
        CronConfig {
            period_seconds: 1,
            initial_delay_seconds: 0,
            max_dequeue_per_tick: 10,
            first_wait_minutes: 1.0,
            growth_factor: 1.2,
            max_retries: 2,
            queue_dir,
        }
    }

    #[test]
    fn delivered_job_is_not_requeued() {
        let backend = Arc::new(MemoryBackend::new());
        let job = RelayJob::new(vec![envelope()], Protocol::Remote(RelayProtocol::Esmtp));
        backend.enqueue(&job).unwrap();

        let cron = QueueCron::new(
            backend.clone(),
            Arc::new(AlwaysDelivers),
            BounceBuilder::new("mx.example.test"),
            config(std::env::temp_dir().join(format!("robin-queue-cron-{}", uuid::Uuid::new_v4()))),
        );
        cron.tick().unwrap();

        assert!(backend.is_empty().unwrap());
    }

    #[test]
    fn exhausted_retries_produce_a_bounce_and_drop_the_original() {
        let backend = Arc::new(MemoryBackend::new());
        let mut job = RelayJob::new(vec![envelope()], Protocol::Remote(RelayProtocol::Esmtp));
        job.retry_count = 2; // == max_retries, next failure exhausts it
        backend.enqueue(&job).unwrap();

        let cron = QueueCron::new(
            backend.clone(),
            Arc::new(AlwaysFails),
            BounceBuilder::new("mx.example.test"),
            config(std::env::temp_dir().join(format!("robin-queue-cron-{}", uuid::Uuid::new_v4()))),
        );
        cron.tick().unwrap();

        let remaining = backend.peek().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(
            remaining[0].envelopes[0].reverse_path.as_ref().unwrap().full(),
            "mailer-daemon@mx.example.test"
        );
    }

    #[test]
    fn not_yet_due_job_is_requeued_untouched() {
        let backend = Arc::new(MemoryBackend::new());
        let mut job = RelayJob::new(vec![envelope()], Protocol::Remote(RelayProtocol::Esmtp));
        job.last_retry_at = Some(time::OffsetDateTime::now_utc());
        backend.enqueue(&job).unwrap();

        let cron = QueueCron::new(
            backend.clone(),
            Arc::new(AlwaysFails),
            BounceBuilder::new("mx.example.test"),
            config(std::env::temp_dir().join(format!("robin-queue-cron-{}", uuid::Uuid::new_v4()))),
        );
        cron.tick().unwrap();

        let remaining = backend.peek().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].retry_count, 0);
    }
}
