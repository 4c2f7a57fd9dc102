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
use crate::tls::TlsProps;
use robin_protocol::{ClientName, ConnectionKind, Stage};

#[derive(Debug, thiserror::Error)]
#[error("invalid state, operation valid at {expected:?}, but got {got:?}")]
pub struct StateError {
    expected: Vec<Stage>,
    got: Stage,
}

impl StateError {
    #[must_use]
    pub fn new(expected: Vec<Stage>, got: Stage) -> Self {
        debug_assert!(!expected.contains(&got));
        Self { expected, got }
    }
}

/// Direction of the connection this session was created for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
}

/// One command/response pair in a session's transaction log.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub command: String,
    pub response_code: u16,
    #[serde(with = "time::serde::iso8601")]
    pub at: time::OffsetDateTime,
}

/// Negotiated TLS state of a session.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum TlsState {
    NotSecured,
    Secured(TlsProps),
}

/// One accepted connection. Owns the state machine described by
/// [`Stage`], the running envelope list, and the transaction/error
/// bookkeeping used to enforce session-fatal limits.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Session {
    pub uid: uuid::Uuid,
    pub direction: Direction,
    pub kind: ConnectionKind,
    pub client_addr: std::net::SocketAddr,
    pub server_addr: std::net::SocketAddr,
    pub reverse_dns: Option<String>,
    pub client_name: Option<ClientName>,
    pub tls: TlsState,
    pub authenticated_as: Option<String>,
    pub transaction_log: Vec<Transaction>,
    pub transaction_count: u32,
    pub error_count: u32,
    pub envelopes: Vec<Envelope>,
    stage: Stage,
    #[serde(with = "time::serde::iso8601")]
    pub connected_at: time::OffsetDateTime,
}

impl Session {
    #[must_use]
    pub fn new(
        direction: Direction,
        kind: ConnectionKind,
        client_addr: std::net::SocketAddr,
        server_addr: std::net::SocketAddr,
    ) -> Self {
        Self {
            uid: uuid::Uuid::new_v4(),
            direction,
            kind,
            client_addr,
            server_addr,
            reverse_dns: None,
            client_name: None,
            tls: TlsState::NotSecured,
            authenticated_as: None,
            transaction_log: Vec::new(),
            transaction_count: 0,
            error_count: 0,
            envelopes: Vec::new(),
            stage: Stage::Connect,
            connected_at: time::OffsetDateTime::now_utc(),
        }
    }

    #[must_use]
    pub const fn stage(&self) -> Stage {
        self.stage
    }

    /// Record HELO/EHLO/LHLO, moving to [`Stage::Helloed`].
    pub fn set_helloed(&mut self, client_name: ClientName) {
        self.client_name = Some(client_name);
        self.stage = Stage::Helloed;
    }

    /// Upgrade the session to TLS. Invariant: exactly one TLS upgrade per
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if the session is already secured.
    pub fn set_secured(&mut self, props: TlsProps) -> Result<(), StateError> {
        if matches!(self.tls, TlsState::Secured(_)) {
            return Err(StateError::new(vec![], self.stage));
        }
        self.tls = TlsState::Secured(props);
        Ok(())
    }

    /// Record a successful AUTH exchange. Invariant: once authenticated,
    /// the principal does not change.
    pub fn set_authenticated(&mut self, principal: String) {
        if self.authenticated_as.is_none() {
            self.authenticated_as = Some(principal);
        }
    }

    /// Start a new transaction on MAIL FROM, moving to [`Stage::MailSet`].
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if MAIL FROM is not valid from the current
    /// stage.
    pub fn start_envelope(&mut self, envelope: Envelope) -> Result<(), StateError> {
        if !self.stage.accepts_mail_from() {
            return Err(StateError::new(
                vec![Stage::Helloed, Stage::Complete],
                self.stage,
            ));
        }
        self.envelopes.push(envelope);
        self.stage = Stage::MailSet;
        Ok(())
    }

    /// The envelope currently being built, if any.
    pub fn current_envelope_mut(&mut self) -> Option<&mut Envelope> {
        self.envelopes.last_mut()
    }

    /// Accept a RCPT TO, moving to [`Stage::RcptSet`].
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if RCPT TO is not valid from the current
    /// stage.
    pub fn accept_rcpt(&mut self) -> Result<(), StateError> {
        if !self.stage.accepts_rcpt_to() {
            return Err(StateError::new(
                vec![Stage::MailSet, Stage::RcptSet],
                self.stage,
            ));
        }
        self.stage = Stage::RcptSet;
        Ok(())
    }

    /// Begin streaming the message body, moving to [`Stage::DataActive`]
    /// or [`Stage::BdatActive`].
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] if content is not acceptable from the
    /// current stage.
    pub fn begin_content(&mut self, via_bdat: bool) -> Result<(), StateError> {
        if !self.stage.accepts_content() {
            return Err(StateError::new(
                vec![Stage::RcptSet, Stage::BdatActive],
                self.stage,
            ));
        }
        self.stage = if via_bdat {
            Stage::BdatActive
        } else {
            Stage::DataActive
        };
        Ok(())
    }

    /// Mark the current envelope complete, returning to [`Stage::Helloed`].
    pub fn complete_envelope(&mut self) {
        self.stage = Stage::Helloed;
    }

    /// RSET: drop the in-progress envelope and return to [`Stage::Helloed`].
    pub fn reset(&mut self) {
        if !matches!(self.stage, Stage::Connect) {
            self.envelopes.pop_if_incomplete();
            self.stage = Stage::Helloed;
        }
    }

    pub fn record_transaction(&mut self, command: String, response_code: u16, limit: u32) {
        self.transaction_log.push(Transaction {
            command,
            response_code,
            at: time::OffsetDateTime::now_utc(),
        });
        self.transaction_count += 1;
        if (400..500).contains(&response_code) || response_code >= 500 {
            self.error_count += 1;
        }
        let _ = limit;
    }

    #[must_use]
    pub fn transaction_limit_exceeded(&self, limit: u32) -> bool {
        self.transaction_count > limit
    }

    #[must_use]
    pub fn error_limit_exceeded(&self, limit: u32) -> bool {
        self.error_count > limit
    }

    /// Deep-copy the session for a background task, except raw in-memory
    /// payload buffers which are reference-counted and shared.
    #[must_use]
    pub fn clone_for_background(&self) -> Self {
        self.clone()
    }
}

trait PopIncomplete {
    fn pop_if_incomplete(&mut self);
}

impl PopIncomplete for Vec<Envelope> {
    fn pop_if_incomplete(&mut self) {
        if matches!(self.last(), Some(e) if !e.is_complete()) {
            self.pop();
        }
    }
}
