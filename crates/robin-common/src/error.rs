/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_protocol::{Domain, ReplyCode};

/// The envelope to use for an SMTP exchange is invalid.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    #[error("the envelope does not contain any recipient")]
    NoRecipient,
}

/// Error produced by a local delivery method (Maildir / LDA subprocess).
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalDelivery {
    #[error("mailbox `{mailbox}` does not exist")]
    MailboxDoesNotExist { mailbox: String },
    #[error("lda exited with a transient status: {0}")]
    Transient(i32),
    #[error("lda exited with a terminal status: {0}")]
    Terminal(i32),
    #[error("lda timed out")]
    TimedOut,
    #[error("io error: {0}")]
    Io(String),
}

/// Error produced by the MX/DANE/MTA-STS lookup of a delivery target.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lookup {
    #[error("record not found")]
    NoRecords,
    #[error("null MX record found for '{domain}'")]
    ContainsNullMx { domain: Domain },
    #[error("timed out")]
    TimedOut,
    #[error("no connections available")]
    NoConnections,
    #[error("io error: {0}")]
    Io(String),
    #[error("dns-proto error: {0}")]
    Proto(String),
    #[error("message: {0}")]
    Message(String),
    #[error("not implemented")]
    NotImplemented,
}

impl From<trust_dns_resolver::error::ResolveError> for Lookup {
    #[inline]
    fn from(error: trust_dns_resolver::error::ResolveError) -> Self {
        match error.kind() {
            trust_dns_resolver::error::ResolveErrorKind::Message(e) => {
                Self::Message((*e).to_owned())
            }
            trust_dns_resolver::error::ResolveErrorKind::Msg(e) => Self::Message(e.to_string()),
            trust_dns_resolver::error::ResolveErrorKind::NoConnections => Self::NoConnections,
            trust_dns_resolver::error::ResolveErrorKind::NoRecordsFound { .. } => Self::NoRecords,
            trust_dns_resolver::error::ResolveErrorKind::Io(io) => Self::Io(io.to_string()),
            trust_dns_resolver::error::ResolveErrorKind::Proto(proto) => {
                Self::Proto(proto.to_string())
            }
            trust_dns_resolver::error::ResolveErrorKind::Timeout => Self::TimedOut,
            _ => Self::NotImplemented,
        }
    }
}

/// Error produced by the retry queue manager.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queuer {
    #[error("recipient is still in status waiting")]
    StillWaiting,
    #[error("max retry count reached")]
    MaxRetriesReached,
}

/// Errors produced by an outbound SMTP/LMTP exchange.
#[derive(Debug, Clone, thiserror::Error, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    #[error("failed to parse the reply of the server: {}", with_source.as_deref().unwrap_or("null"))]
    ReplyParsing { with_source: Option<String> },

    #[error("permanent error: {reply}: {}", with_source.as_deref().unwrap_or("null"))]
    Permanent {
        reply: ReplyCode,
        with_source: Option<String>,
    },

    #[error("transient error: {reply}: {}", with_source.as_deref().unwrap_or("null"))]
    Transient {
        reply: ReplyCode,
        with_source: Option<String>,
    },

    #[error("policy violation ({status}): {}", with_source.as_deref().unwrap_or("null"))]
    Policy {
        status: String,
        with_source: Option<String>,
    },

    #[error("tls: {}", with_source.as_deref().unwrap_or("null"))]
    Tls { with_source: Option<String> },

    #[error("client: {}", with_source.as_deref().unwrap_or("null"))]
    Client { with_source: Option<String> },

    #[error("connection: {}", with_source.as_deref().unwrap_or("null"))]
    Connection { with_source: Option<String> },
}

impl From<std::io::Error> for Delivery {
    #[inline]
    fn from(err: std::io::Error) -> Self {
        Self::Connection {
            with_source: Some(err.to_string()),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to (de)serialize: {0}")]
pub struct DeserializeError(#[from] pub serde_json::Error);

#[derive(Debug, thiserror::Error)]
#[error("failed to (de)serialize: {0}")]
pub struct SerializeError(#[from] pub serde_json::Error);
