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
use robin_common::session::TlsState;
use robin_common::{Envelope, Session};

/// Configuration for the post-DATA raw webhook: posts the full message,
/// optionally base64-encoded, with session context headers. Per §4.3, its
/// response never affects acceptance.
#[derive(Debug, Clone)]
pub struct WebhookConfig {
    pub url: String,
    pub base64: bool,
    pub wait_for_response: bool,
    pub hostname: String,
}

pub struct WebhookRawProcessor {
    client: reqwest::Client,
    config: WebhookConfig,
}

impl WebhookRawProcessor {
    #[must_use]
    pub fn new(config: WebhookConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn build_request(&self, session: &Session, envelope: &Envelope, body: Vec<u8>) -> reqwest::RequestBuilder {
        let recipients = envelope
            .recipients
            .iter()
            .map(|r| r.forward_path.to_string())
            .collect::<Vec<_>>()
            .join(",");

        let (content_type, payload) = if self.config.base64 {
            use base64::Engine;
            ("text/plain", base64::engine::general_purpose::STANDARD.encode(body).into_bytes())
        } else {
            ("text/plain", body)
        };

        self.client
            .post(&self.config.url)
            .header("Content-Type", content_type)
            .header("Hostname", self.config.hostname.clone())
            .header("Direction", format!("{:?}", session.direction))
            .header("UID", session.uid.to_string())
            .header("TLS", matches!(session.tls, TlsState::Secured(_)).to_string())
            .header(
                "EHLO",
                session
                    .client_name
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string),
            )
            .header("Username", session.authenticated_as.clone().unwrap_or_default())
            .header("SenderIP", session.client_addr.ip().to_string())
            .header("SenderRDNS", session.reverse_dns.clone().unwrap_or_default())
            .header(
                "Sender",
                envelope
                    .reverse_path
                    .as_ref()
                    .map_or_else(String::new, ToString::to_string),
            )
            .header("Recipients", recipients)
            .body(payload)
    }
}

#[async_trait::async_trait]
impl StorageProcessor for WebhookRawProcessor {
    fn name(&self) -> &'static str {
        "webhook-raw"
    }

    async fn run(&self, session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        let body = match payload::read(envelope) {
            Ok(body) => body,
            Err(error) => {
                tracing::warn!(%error, "failed to read payload for webhook");
                return StorageOutcome::Continue;
            }
        };

        let request = self.build_request(session, envelope, body);

        if self.config.wait_for_response {
            if let Err(error) = request.send().await {
                tracing::warn!(%error, "raw webhook request failed");
            }
        } else {
            tokio::spawn(async move {
                if let Err(error) = request.send().await {
                    tracing::warn!(%error, "raw webhook request failed");
                }
            });
        }

        StorageOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::{WebhookConfig, WebhookRawProcessor};
    use robin_common::envelope::Recipient;
    use robin_common::session::Direction;
    use robin_common::{Envelope, Session};
    use robin_protocol::{Address, ConnectionKind};
    use std::str::FromStr;

    fn session() -> Session {
        Session::new(
            Direction::Inbound,
            ConnectionKind::Smtp,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    fn envelope() -> Envelope {
        let mut envelope = Envelope::new(Some(Address::from_str("sender@example.com").unwrap()));
        envelope.recipients.push(Recipient::new(Address::from_str("rcpt@example.net").unwrap()));
        envelope
    }

    #[test]
    fn context_headers_carry_session_and_envelope_data() {
        let config = WebhookConfig {
            url: "http://127.0.0.1:9/hook".to_owned(),
            base64: false,
            wait_for_response: false,
            hostname: "mx.example.org".to_owned(),
        };
        let processor = WebhookRawProcessor::new(config);
        let request = processor
            .build_request(&session(), &envelope(), b"body".to_vec())
            .build()
            .unwrap();

        let headers = request.headers();
        assert_eq!(headers.get("Hostname").unwrap(), "mx.example.org");
        assert_eq!(headers.get("Sender").unwrap(), "sender@example.com");
        assert_eq!(headers.get("Recipients").unwrap(), "rcpt@example.net");
    }

    #[test]
    fn base64_mode_encodes_the_body() {
        let config = WebhookConfig {
            url: "http://127.0.0.1:9/hook".to_owned(),
            base64: true,
            wait_for_response: false,
            hostname: "mx.example.org".to_owned(),
        };
        let processor = WebhookRawProcessor::new(config);
        let request = processor
            .build_request(&session(), &envelope(), b"hello".to_vec())
            .build()
            .unwrap();

        let body = request.body().unwrap().as_bytes().unwrap();
        assert_eq!(body, b"aGVsbG8=");
    }
}
