/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::chain::{StorageOutcome, StorageProcessor};
use robin_common::relay_job::Protocol;
use robin_common::{Envelope, RelayJob, RelayProtocol, Session};
use robin_queue::QueueBackend;

/// §4.3's terminal Queue-or-RelayDecision stage: whatever recipients are
/// still on the envelope after AV/Spam/Webhook/Bot-dispatch/LocalDelivery
/// haven't run require outbound delivery, so they become a `RelayJob` on
/// the retry queue. The actual MX/route resolution happens at delivery
/// time, not here.
pub struct QueueDecisionProcessor<B> {
    queue: std::sync::Arc<B>,
}

impl<B: QueueBackend> QueueDecisionProcessor<B> {
    #[must_use]
    pub fn new(queue: std::sync::Arc<B>) -> Self {
        Self { queue }
    }
}

#[async_trait::async_trait]
impl<B: QueueBackend> StorageProcessor for QueueDecisionProcessor<B> {
    fn name(&self) -> &'static str {
        "queue-decision"
    }

    async fn run(&self, _session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        if envelope.recipients.is_empty() {
            return StorageOutcome::StopOk;
        }

        let job = RelayJob::new(vec![envelope.clone()], Protocol::Remote(RelayProtocol::Esmtp));
        if let Err(error) = self.queue.enqueue(&job) {
            tracing::error!(%error, "failed to enqueue envelope for outbound relay");
            return StorageOutcome::StopReject(451, "4.3.0 local queueing error".to_owned());
        }

        StorageOutcome::StopOk
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use robin_common::envelope::Recipient;
    use robin_protocol::Address;
    use robin_queue::MemoryBackend;
    use std::str::FromStr;

    fn session() -> Session {
        Session::new(
            robin_common::session::Direction::Inbound,
            robin_protocol::ConnectionKind::Smtp,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn remaining_recipients_are_enqueued_for_relay() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let processor = QueueDecisionProcessor::new(queue.clone());
        let mut envelope = Envelope::new(Some(Address::from_str("a@example.com").unwrap()));
        envelope.recipients.push(Recipient::new(Address::from_str("b@example.net").unwrap()));

        let outcome = processor.run(&session(), &mut envelope).await;

        assert!(matches!(outcome, StorageOutcome::StopOk));
        assert_eq!(queue.len().unwrap(), 1);
    }

    #[tokio::test]
    async fn empty_recipient_list_enqueues_nothing() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let processor = QueueDecisionProcessor::new(queue.clone());
        let mut envelope = Envelope::new(Some(Address::from_str("a@example.com").unwrap()));

        let outcome = processor.run(&session(), &mut envelope).await;

        assert!(matches!(outcome, StorageOutcome::StopOk));
        assert_eq!(queue.len().unwrap(), 0);
    }
}
