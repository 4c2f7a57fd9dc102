/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::scan_result::ScanResult;
use robin_protocol::{Address, DsnReturn, OriginalRecipient};

/// A mailbox address, wire-parsed.
pub type Mailbox = Address;

/// RFC 3461 DSN notification preference for a single recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NotifyOn {
    Never,
    Some {
        success: bool,
        failure: bool,
        delay: bool,
    },
}

impl Default for NotifyOn {
    fn default() -> Self {
        Self::Some {
            success: false,
            failure: true,
            delay: false,
        }
    }
}

/// A single forward-path on an envelope, with its ORCPT/NOTIFY metadata
/// carried through for relay and bounce generation.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Recipient {
    pub forward_path: Mailbox,
    pub original_forward_path: Option<OriginalRecipient>,
    pub notify_on: NotifyOn,
}

impl Recipient {
    #[must_use]
    pub fn new(forward_path: Mailbox) -> Self {
        Self {
            forward_path,
            original_forward_path: None,
            notify_on: NotifyOn::default(),
        }
    }
}

/// Where an accepted message's body currently lives. Exclusive: a body is
/// either spilled to disk or held in memory, never both.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Payload {
    Path(std::path::PathBuf),
    Memory(#[serde(with = "crate::serde_helper::arc_bytes")] std::sync::Arc<Vec<u8>>),
}

/// Whether header additions are emitted before or after the stored/proxied
/// body when the header-prefix buffer is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum HeaderPlacement {
    Prepend,
    Append,
}

/// One MAIL transaction within a [`crate::session::Session`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Envelope {
    pub reverse_path: Option<Mailbox>,
    pub recipients: Vec<Recipient>,
    pub size: usize,
    pub payload: Option<Payload>,
    pub message_id: Option<String>,
    pub header_placement: HeaderPlacement,
    /// `(name, value)` pairs appended by storage processors, rendered ahead
    /// of (or after) the stored/proxied body as RFC 5322 header lines.
    pub header_prefix: Vec<(String, String)>,
    pub matched_proxy_rule: Option<usize>,
    pub matched_bots: Vec<String>,
    pub scan_results: Vec<ScanResult>,
    pub envelope_id: Option<String>,
    pub dsn_ret: Option<DsnReturn>,
    pub retry_count: u32,
    #[serde(with = "time::serde::iso8601")]
    pub created_at: time::OffsetDateTime,
    #[serde(with = "time::serde::iso8601::option")]
    pub last_attempt_at: Option<time::OffsetDateTime>,
}

impl Envelope {
    #[must_use]
    pub fn new(reverse_path: Option<Mailbox>) -> Self {
        Self {
            reverse_path,
            recipients: Vec::new(),
            size: 0,
            payload: None,
            message_id: None,
            header_placement: HeaderPlacement::Prepend,
            header_prefix: Vec::new(),
            matched_proxy_rule: None,
            matched_bots: Vec::new(),
            scan_results: Vec::new(),
            envelope_id: None,
            dsn_ret: None,
            retry_count: 0,
            created_at: time::OffsetDateTime::now_utc(),
            last_attempt_at: None,
        }
    }

    /// Add a unique recipient; returns `false` if the forward-path is
    /// already present (per the unique-recipient-list invariant).
    pub fn add_recipient(&mut self, recipient: Recipient) -> bool {
        if self
            .recipients
            .iter()
            .any(|r| r.forward_path == recipient.forward_path)
        {
            return false;
        }
        self.recipients.push(recipient);
        true
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.payload.is_some()
    }

    /// Render the header-prefix buffer as RFC 5322 header lines.
    #[must_use]
    pub fn render_header_prefix(&self) -> String {
        self.header_prefix
            .iter()
            .map(|(name, value)| format!("{name}: {value}\r\n"))
            .collect()
    }
}
