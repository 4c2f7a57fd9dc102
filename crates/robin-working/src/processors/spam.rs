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
use crate::payload;
use crate::policy::ScanPolicy;
use robin_common::ScanResult;
use robin_common::{Envelope, Session};

#[derive(Debug, serde::Deserialize)]
struct RspamdReply {
    score: f64,
    #[serde(default)]
    symbols: std::collections::HashMap<String, serde_json::Value>,
}

/// A thin client for `rspamd`'s HTTP `checkv2` endpoint.
pub struct RspamdClient {
    client: reqwest::Client,
    base_url: String,
}

impl RspamdClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn check(&self, bytes: &[u8]) -> Result<(f64, Vec<String>), reqwest::Error> {
        let reply: RspamdReply = self
            .client
            .post(format!("{}/checkv2", self.base_url))
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .await?
            .json()
            .await?;
        Ok((reply.score, reply.symbols.into_keys().collect()))
    }
}

/// §4.3's Spam stage: scores the payload through `rspamd` and applies
/// `policy` when `score > threshold`.
pub struct SpamProcessor {
    client: RspamdClient,
    threshold: f64,
    policy: ScanPolicy,
}

impl SpamProcessor {
    #[must_use]
    pub const fn new(client: RspamdClient, threshold: f64, policy: ScanPolicy) -> Self {
        Self {
            client,
            threshold,
            policy,
        }
    }
}

#[async_trait::async_trait]
impl StorageProcessor for SpamProcessor {
    fn name(&self) -> &'static str {
        "spam"
    }

    async fn run(&self, _session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        let bytes = match payload::read(envelope) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "failed to read payload for spam scan");
                return StorageOutcome::Continue;
            }
        };

        let (score, symbols) = match self.client.check(&bytes).await {
            Ok(result) => result,
            Err(error) => {
                tracing::warn!(%error, "rspamd request failed, treating as clean");
                return StorageOutcome::Continue;
            }
        };

        let spam = score > self.threshold;
        envelope.scan_results.push(ScanResult::Rspamd { score, spam, symbols });

        if !spam {
            return StorageOutcome::Continue;
        }

        match self.policy {
            ScanPolicy::Reject => StorageOutcome::StopReject(554, "5.7.1 Spam".to_owned()),
            ScanPolicy::Discard => StorageOutcome::StopOk,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RspamdClient;

    /// Exercises a real `rspamd` instance; run explicitly with
    /// `cargo test -- --ignored` against `RSPAMD_URL`.
    #[tokio::test]
    #[ignore = "requires a running rspamd instance"]
    async fn checkv2_reports_a_score() {
        let url = std::env::var("RSPAMD_URL").unwrap_or_else(|_| "http://127.0.0.1:11333".to_owned());
        let client = RspamdClient::new(url);
        let (score, _symbols) = client.check(b"Subject: test\r\n\r\nhello\r\n").await.unwrap();
        assert!(score >= 0.0);
    }
}
