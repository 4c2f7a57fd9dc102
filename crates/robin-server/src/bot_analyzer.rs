/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! The only [`BotAnalyzer`] this binary ships with: a diagnostic responder
//! that mails the original sender a plaintext summary of the envelope that
//! matched the bot binding (size, recipients, scan results so far). Useful
//! for probing a staging deploy's bot-dispatch wiring without standing up a
//! real automated mailbox.

use robin_common::envelope::{Envelope, Payload, Recipient};
use robin_common::Session;
use robin_working::processors::BotAnalyzer;

pub struct DiagnosticBotAnalyzer {
    hostname: String,
}

impl DiagnosticBotAnalyzer {
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    fn render(&self, session: &Session, envelope: &Envelope, bot_name: &str) -> String {
        let mut body = String::new();
        body.push_str(&format!("This is {} reporting on bot \"{bot_name}\".\r\n\r\n", self.hostname));
        body.push_str(&format!("Peer: {}\r\n", session.client_addr));
        body.push_str(&format!(
            "Original sender: {}\r\n",
            envelope
                .reverse_path
                .as_ref()
                .map_or_else(|| "<>".to_owned(), ToString::to_string)
        ));
        body.push_str(&format!("Envelope size: {} bytes\r\n", envelope.size));
        body.push_str(&format!("Recipients remaining: {}\r\n", envelope.recipients.len()));
        if envelope.scan_results.is_empty() {
            body.push_str("Scan results: none recorded\r\n");
        } else {
            for result in &envelope.scan_results {
                body.push_str(&format!("Scan result: {result:?}\r\n"));
            }
        }
        body
    }
}

impl BotAnalyzer for DiagnosticBotAnalyzer {
    fn analyze(&self, session: &Session, envelope: &Envelope, bot_name: &str) -> Envelope {
        #[allow(clippy::unwrap_used)]
        let sender: robin_protocol::Address = format!("{bot_name}@{}", self.hostname).parse().unwrap();
        let mut reply = Envelope::new(Some(sender));

        if let Some(original_sender) = &envelope.reverse_path {
            reply.add_recipient(Recipient::new(original_sender.clone()));
        }

        let body = self.render(session, envelope, bot_name);
        reply.payload = Some(Payload::Memory(std::sync::Arc::new(body.into_bytes())));
        reply.message_id = None;
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::DiagnosticBotAnalyzer;
    use robin_common::envelope::{Envelope, Recipient};
    use robin_common::session::Direction;
    use robin_common::Session;
    use robin_protocol::{Address, ConnectionKind};
    use robin_working::processors::BotAnalyzer;
    use std::str::FromStr;

    fn session() -> Session {
        Session::new(
            Direction::Inbound,
            ConnectionKind::Smtp,
            "127.0.0.1:25".parse().unwrap(),
            "127.0.0.1:25000".parse().unwrap(),
        )
    }

    #[test]
    fn replies_to_the_original_sender_and_is_complete() {
        let analyzer = DiagnosticBotAnalyzer::new("mail.example.com");
        let sender = Address::from_str("human@example.com").unwrap();
        let mut envelope = Envelope::new(Some(sender.clone()));
        envelope
            .recipients
            .push(Recipient::new(Address::from_str("diag+tok@example.com").unwrap()));

        let reply = analyzer.analyze(&session(), &envelope, "diag");

        assert_eq!(reply.recipients.len(), 1);
        assert_eq!(reply.recipients[0].forward_path, sender);
        assert!(reply.is_complete());
        assert_eq!(reply.reverse_path.unwrap().full(), "diag@mail.example.com");
    }

    #[test]
    fn null_reverse_path_yields_no_recipient() {
        let analyzer = DiagnosticBotAnalyzer::new("mail.example.com");
        let envelope = Envelope::new(None);

        let reply = analyzer.analyze(&session(), &envelope, "diag");

        assert!(reply.recipients.is_empty());
        assert!(reply.is_complete());
    }
}
