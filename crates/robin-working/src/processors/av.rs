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
use crate::policy::ScanPolicy;
use crate::payload;
use robin_antivirus::Antivirus;
use robin_common::{Envelope, Session};

/// §4.3's AV stage: streams the payload to a [`Antivirus`] scanner and
/// applies `policy` to an infected result.
pub struct AvProcessor<A> {
    scanner: A,
    policy: ScanPolicy,
}

impl<A: Antivirus> AvProcessor<A> {
    #[must_use]
    pub const fn new(scanner: A, policy: ScanPolicy) -> Self {
        Self { scanner, policy }
    }
}

#[async_trait::async_trait]
impl<A: Antivirus> StorageProcessor for AvProcessor<A> {
    fn name(&self) -> &'static str {
        "av"
    }

    async fn run(&self, _session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        let bytes = match payload::read(envelope) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "failed to read payload for AV scan");
                return StorageOutcome::Continue;
            }
        };

        let result = match self.scanner.scan(&bytes) {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "AV scan failed, treating as clean");
                return StorageOutcome::Continue;
            }
        };

        let infected = result.infected;
        envelope.scan_results.push(result.into_scan_result(None));

        if !infected {
            return StorageOutcome::Continue;
        }

        match self.policy {
            ScanPolicy::Reject => StorageOutcome::StopReject(554, "5.7.0 Virus".to_owned()),
            ScanPolicy::Discard => StorageOutcome::StopOk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AvProcessor;
    use crate::chain::{StorageOutcome, StorageProcessor};
    use crate::policy::ScanPolicy;
    use robin_antivirus::{Antivirus, AntivirusResult};
    use robin_common::session::Direction;
    use robin_common::{Envelope, Session};
    use robin_protocol::ConnectionKind;

    struct AlwaysInfected;
    impl Antivirus for AlwaysInfected {
        fn scan(&self, _: &[u8]) -> Result<AntivirusResult, std::io::Error> {
            Ok(AntivirusResult {
                infected: true,
                viruses: vec!["EICAR-Test".to_owned()],
            })
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
    async fn reject_policy_stops_the_chain() {
        let processor = AvProcessor::new(AlwaysInfected, ScanPolicy::Reject);
        let mut envelope = Envelope::new(None);
        let outcome = processor.run(&session(), &mut envelope).await;
        assert_eq!(outcome, StorageOutcome::StopReject(554, "5.7.0 Virus".to_owned()));
        assert_eq!(envelope.scan_results.len(), 1);
    }

    #[tokio::test]
    async fn discard_policy_accepts_silently() {
        let processor = AvProcessor::new(AlwaysInfected, ScanPolicy::Discard);
        let outcome = processor.run(&session(), &mut Envelope::new(None)).await;
        assert_eq!(outcome, StorageOutcome::StopOk);
    }
}
