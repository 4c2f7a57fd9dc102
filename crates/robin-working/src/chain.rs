/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_common::{Envelope, Session};

/// Result of a single [`StorageProcessor::run`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageOutcome {
    /// Proceed to the next processor in the chain.
    Continue,
    /// Accept the envelope now; skip every remaining processor.
    StopOk,
    /// Reject the envelope with the given SMTP reply; skip every remaining
    /// processor.
    StopReject(u16, String),
}

/// One stage of the post-DATA storage chain described in §4.3. Processors
/// see the whole envelope (not just the payload) so they can consult or
/// mutate recipients, scan results, and the header-prefix buffer.
#[async_trait::async_trait]
pub trait StorageProcessor: Send + Sync {
    /// Stable name used in logging and quarantine routing.
    fn name(&self) -> &'static str;

    async fn run(&self, session: &Session, envelope: &mut Envelope) -> StorageOutcome;
}

/// The canonical ordered chain: AV → Spam → Webhook-RAW → Bot-dispatch →
/// LocalStorage → LDA → ProxyStream → Queue-or-RelayDecision. Built by
/// whichever binary wires up the configured processors; any subset/order is
/// technically acceptable, but `new` takes the stages in the order they
/// should run.
pub struct Chain {
    stages: Vec<Box<dyn StorageProcessor>>,
}

impl Chain {
    #[must_use]
    pub fn new(stages: Vec<Box<dyn StorageProcessor>>) -> Self {
        Self { stages }
    }

    /// Run every stage in order against `envelope`, stopping at the first
    /// `StopOk`/`StopReject`. Per invariant (1), the caller must treat a
    /// `Continue` that falls off the end of the chain as `StopOk`.
    pub async fn run(&self, session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        for stage in &self.stages {
            match stage.run(session, envelope).await {
                StorageOutcome::Continue => {}
                outcome @ (StorageOutcome::StopOk | StorageOutcome::StopReject(..)) => {
                    tracing::debug!(stage = stage.name(), ?outcome, "storage chain stopped");
                    return outcome;
                }
            }
        }
        StorageOutcome::StopOk
    }
}

#[cfg(test)]
mod tests {
    use super::{Chain, StorageOutcome, StorageProcessor};
    use robin_common::session::Direction;
    use robin_common::{Envelope, Session};
    use robin_protocol::ConnectionKind;

    struct AlwaysContinue;
    #[async_trait::async_trait]
    impl StorageProcessor for AlwaysContinue {
        fn name(&self) -> &'static str {
            "always-continue"
        }
        async fn run(&self, _: &Session, _: &mut Envelope) -> StorageOutcome {
            StorageOutcome::Continue
        }
    }

    struct RejectsEverything;
    #[async_trait::async_trait]
    impl StorageProcessor for RejectsEverything {
        fn name(&self) -> &'static str {
            "rejects-everything"
        }
        async fn run(&self, _: &Session, _: &mut Envelope) -> StorageOutcome {
            StorageOutcome::StopReject(554, "5.7.0 rejected".to_owned())
        }
    }

    fn session() -> Session {
        Session::new(
            Direction::Inbound,
            ConnectionKind::Relay,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn falls_through_to_stop_ok_when_every_stage_continues() {
        let chain = Chain::new(vec![Box::new(AlwaysContinue), Box::new(AlwaysContinue)]);
        let outcome = chain.run(&session(), &mut Envelope::new(None)).await;
        assert_eq!(outcome, StorageOutcome::StopOk);
    }

    #[tokio::test]
    async fn stops_at_the_first_rejecting_stage() {
        let chain = Chain::new(vec![Box::new(AlwaysContinue), Box::new(RejectsEverything), Box::new(AlwaysContinue)]);
        let outcome = chain.run(&session(), &mut Envelope::new(None)).await;
        assert_eq!(outcome, StorageOutcome::StopReject(554, "5.7.0 rejected".to_owned()));
    }
}
