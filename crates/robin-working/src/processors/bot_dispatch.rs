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
use robin_common::bot_binding::BotBinding;
use robin_common::relay_job::Protocol;
use robin_common::{Envelope, RelayJob, RelayProtocol, Session};
use robin_queue::QueueBackend;

/// Produces the analysis reply message for a bot-bound recipient. Runs off
/// the session's hot path, in a cloned copy of the session/envelope.
pub trait BotAnalyzer: Send + Sync {
    fn analyze(&self, session: &Session, envelope: &Envelope, bot_name: &str) -> Envelope;
}

/// §4.3's Bot-dispatch stage: recipients bound to a bot are pulled out of
/// the envelope and handed to a background task that runs the bot and
/// enqueues its reply as a new relay job. Never blocks or rejects.
pub struct BotDispatchProcessor<A, B> {
    bindings: Vec<BotBinding>,
    analyzer: std::sync::Arc<A>,
    queue: std::sync::Arc<B>,
}

impl<A: BotAnalyzer + 'static, B: QueueBackend + 'static> BotDispatchProcessor<A, B> {
    #[must_use]
    pub fn new(bindings: Vec<BotBinding>, analyzer: std::sync::Arc<A>, queue: std::sync::Arc<B>) -> Self {
        Self {
            bindings,
            analyzer,
            queue,
        }
    }
}

#[async_trait::async_trait]
impl<A: BotAnalyzer + 'static, B: QueueBackend + 'static> StorageProcessor for BotDispatchProcessor<A, B> {
    fn name(&self) -> &'static str {
        "bot-dispatch"
    }

    async fn run(&self, session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        if self.bindings.is_empty() {
            return StorageOutcome::Continue;
        }

        let peer = session.client_addr.ip();
        let mut matched = Vec::new();
        envelope.recipients.retain(|recipient| {
            let Some(binding) = BotBinding::find_match(&self.bindings, recipient.forward_path.local_part(), peer)
            else {
                return true;
            };
            matched.push(binding.bot_name.clone());
            false
        });

        if matched.is_empty() {
            return StorageOutcome::Continue;
        }

        envelope.matched_bots.extend(matched.iter().cloned());

        for bot_name in matched {
            let session = session.clone_for_background();
            let envelope = envelope.clone();
            let analyzer = self.analyzer.clone();
            let queue = self.queue.clone();

            tokio::task::spawn_blocking(move || {
                let reply = analyzer.analyze(&session, &envelope, &bot_name);
                let job = RelayJob::new(vec![reply], Protocol::Remote(RelayProtocol::Esmtp));
                if let Err(error) = queue.enqueue(&job) {
                    tracing::error!(%error, bot = bot_name, "failed to enqueue bot reply");
                }
            });
        }

        StorageOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::{BotAnalyzer, BotDispatchProcessor};
    use crate::chain::{StorageOutcome, StorageProcessor};
    use robin_common::envelope::Recipient;
    use robin_common::session::Direction;
    use robin_common::{Envelope, Session};
    use robin_protocol::{Address, ConnectionKind};
    use robin_queue::{MemoryBackend, QueueBackend};
    use std::str::FromStr;

    struct Echo;
    impl BotAnalyzer for Echo {
        fn analyze(&self, _session: &Session, envelope: &Envelope, _bot_name: &str) -> Envelope {
            envelope.clone()
        }
    }

    fn session() -> Session {
        Session::new(
            Direction::Inbound,
            ConnectionKind::Smtp,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn no_bindings_passes_every_recipient_through() {
        let queue = std::sync::Arc::new(MemoryBackend::default());
        let processor = BotDispatchProcessor::new(Vec::new(), std::sync::Arc::new(Echo), queue.clone());
        let mut envelope = Envelope::new(None);
        envelope
            .recipients
            .push(Recipient::new(Address::from_str("human@example.com").unwrap()));

        let outcome = processor.run(&session(), &mut envelope).await;

        assert_eq!(outcome, StorageOutcome::Continue);
        assert_eq!(envelope.recipients.len(), 1);
        assert_eq!(queue.len().unwrap(), 0);
    }
}
