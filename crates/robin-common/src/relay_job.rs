/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::envelope::Envelope;
use crate::proxy_rule::RelayProtocol;

/// A unit of outbound work dequeued and driven by `QueueCron`: an envelope
/// list plus the protocol to use and, for LDA jobs, a target mailbox
/// override. Carries its own UID independent of the originating session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RelayJob {
    pub uid: uuid::Uuid,
    pub envelopes: Vec<Envelope>,
    pub protocol: Protocol,
    pub retry_count: u32,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::iso8601::option")]
    pub last_retry_at: Option<time::OffsetDateTime>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Protocol {
    Remote(RelayProtocol),
    Lda { target_mailbox: Option<String> },
}

impl RelayJob {
    #[must_use]
    pub fn new(envelopes: Vec<Envelope>, protocol: Protocol) -> Self {
        Self {
            uid: uuid::Uuid::new_v4(),
            envelopes,
            protocol,
            retry_count: 0,
            created_at: time::OffsetDateTime::now_utc(),
            last_retry_at: None,
        }
    }

    /// Per invariant (3): a job with zero remaining envelopes (all recipient
    /// lists empty) is never re-enqueued.
    #[must_use]
    pub fn has_remaining_work(&self) -> bool {
        self.envelopes.iter().any(|e| !e.recipients.is_empty())
    }

    /// `backoff(n) = round(first_wait_minutes * growth_factor^n) * 60`.
    #[must_use]
    pub fn backoff_seconds(retry_count: u32, first_wait_minutes: f64, growth_factor: f64) -> u64 {
        (first_wait_minutes * growth_factor.powi(retry_count as i32)).round() as u64 * 60
    }

    /// Whether this job is eligible for another delivery attempt right now.
    #[must_use]
    pub fn is_due(&self, now: time::OffsetDateTime, first_wait_minutes: f64, growth_factor: f64) -> bool {
        let Some(last) = self.last_retry_at else {
            return true;
        };
        let backoff = Self::backoff_seconds(self.retry_count, first_wait_minutes, growth_factor);
        now >= last + time::Duration::seconds(backoff as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_matches_spec_examples() {
        assert_eq!(RelayJob::backoff_seconds(0, 1.0, 1.2), 60);
        assert_eq!(RelayJob::backoff_seconds(1, 1.0, 1.2), 72);
        assert_eq!(RelayJob::backoff_seconds(4, 1.0, 1.2), 124);
    }
}
