/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::cron::FailedRecipient;
use robin_common::envelope::{Envelope, Payload};
use robin_common::relay_job::Protocol;
use robin_common::{RelayJob, RelayProtocol};
use robin_protocol::Address;

/// Builds RFC 3464 delivery-status-notification bounce messages, one
/// multipart message per exhausted relay job.
pub struct BounceBuilder {
    hostname: String,
}

impl BounceBuilder {
    #[must_use]
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
        }
    }

    /// Build a top-priority relay job carrying a DSN bounce for every
    /// recipient still failing on `envelope` when its parent job's
    /// retries were exhausted.
    ///
    /// # Panics
    ///
    /// Never on a well-formed envelope; `mailer-daemon@<hostname>` is
    /// always a syntactically valid address.
    #[must_use]
    pub fn build(
        &self,
        envelope: &Envelope,
        failures: &[FailedRecipient],
        now: time::OffsetDateTime,
    ) -> RelayJob {
        #[allow(clippy::unwrap_used)]
        let sender: Address = format!("mailer-daemon@{}", self.hostname).parse().unwrap();
        let Some(original_sender) = &envelope.reverse_path else {
            // A null reverse-path (the original message was itself a bounce)
            // must not generate a secondary bounce per RFC 3834; the caller
            // is expected to have filtered this case out already, but we
            // still need to return *something* sane if it slips through.
            return RelayJob::new(Vec::new(), Protocol::Remote(RelayProtocol::Esmtp));
        };

        let body = self.render(envelope, failures, now);

        let mut bounce_envelope = Envelope::new(Some(sender));
        bounce_envelope.add_recipient(robin_common::envelope::Recipient::new(
            original_sender.clone(),
        ));
        bounce_envelope.payload = Some(Payload::Memory(std::sync::Arc::new(body.into_bytes())));
        bounce_envelope.message_id = None;

        RelayJob::new(vec![bounce_envelope], Protocol::Remote(RelayProtocol::Esmtp))
    }

    fn render(
        &self,
        envelope: &Envelope,
        failures: &[FailedRecipient],
        now: time::OffsetDateTime,
    ) -> String {
        let boundary = format!("robin-dsn-{}", uuid::Uuid::new_v4());
        let arrival_date = Self::rfc2822(envelope.created_at);
        let last_attempt_date = Self::rfc2822(now);

        let mut text = String::new();
        text.push_str("This is an automatically generated Delivery Status Notification.\r\n\r\n");
        text.push_str(&format!("Original message received: {arrival_date}\r\n\r\n"));
        text.push_str("Delivery has failed permanently for the following recipients:\r\n\r\n");
        for failure in failures {
            text.push_str(&format!(
                "  {} -- {}\r\n",
                failure.recipient.forward_path,
                failure.diagnostic_code.as_deref().unwrap_or("no further details")
            ));
        }

        let mut status_parts = String::new();
        status_parts.push_str(&format!("Reporting-MTA: dns;{}\r\n", self.hostname));
        status_parts.push_str(&format!("Arrival-Date: {arrival_date}\r\n"));
        for failure in failures {
            status_parts.push_str("\r\n");
            status_parts.push_str(&format!(
                "Final-Recipient: rfc822;{}\r\n",
                failure.recipient.forward_path
            ));
            status_parts.push_str("Action: failed\r\n");
            status_parts.push_str(&format!("Status: {}\r\n", failure.status));
            if let Some(remote_mta) = &failure.remote_mta {
                status_parts.push_str(&format!("Remote-MTA: dns;{remote_mta}\r\n"));
            }
            if let Some(diagnostic_code) = &failure.diagnostic_code {
                status_parts.push_str(&format!("Diagnostic-Code: smtp;{diagnostic_code}\r\n"));
            }
            status_parts.push_str(&format!("Last-Attempt-Date: {last_attempt_date}\r\n"));
        }

        format!(
            "From: Mail Delivery Subsystem <mailer-daemon@{hostname}>\r\n\
             To: {to}\r\n\
             Subject: Delivery Status Notification (Failure)\r\n\
             MIME-Version: 1.0\r\n\
             Content-Type: multipart/report; report-type=delivery-status; boundary=\"{boundary}\"\r\n\
             \r\n\
             --{boundary}\r\n\
             Content-Type: text/plain; charset=utf-8\r\n\
             \r\n\
             {text}\r\n\
             --{boundary}\r\n\
             Content-Type: message/delivery-status\r\n\
             \r\n\
             {status_parts}\r\n\
             --{boundary}--\r\n",
            hostname = self.hostname,
            to = envelope
                .reverse_path
                .as_ref()
                .map_or_else(String::new, ToString::to_string),
        )
    }

    fn rfc2822(at: time::OffsetDateTime) -> String {
        const FORMAT: &[time::format_description::FormatItem<'_>] = time::macros::format_description!(
            "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] +0000"
        );
        at.to_offset(time::UtcOffset::UTC)
            .format(FORMAT)
            .unwrap_or_else(|_| at.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::BounceBuilder;
    use crate::cron::FailedRecipient;
    use pretty_assertions::assert_eq;
    use robin_common::envelope::Recipient;
    use robin_common::Envelope;

    #[test]
    fn bounce_targets_the_original_sender() {
        let builder = BounceBuilder::new("mx.example.test");
        let sender: robin_protocol::Address = "alice@example.test".parse().unwrap();
        let recipient: robin_protocol::Address = "bob@example.test".parse().unwrap();
        let mut envelope = Envelope::new(Some(sender.clone()));
        envelope.add_recipient(Recipient::new(recipient.clone()));

        let failures = vec![FailedRecipient {
            recipient: Recipient::new(recipient),
            status: "5.0.0".to_owned(),
            diagnostic_code: Some("550 no such user".to_owned()),
            remote_mta: Some("mx.remote.test".to_owned()),
        }];

        let job = builder.build(&envelope, &failures, time::OffsetDateTime::now_utc());
        assert_eq!(job.envelopes.len(), 1);
        let bounce = &job.envelopes[0];
        assert_eq!(bounce.reverse_path.as_ref().unwrap().full(), "mailer-daemon@mx.example.test");
        assert_eq!(bounce.recipients[0].forward_path, sender);
        assert!(bounce.payload.is_some());
    }
}
