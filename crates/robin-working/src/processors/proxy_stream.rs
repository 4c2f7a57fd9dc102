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
use robin_common::{Envelope, Session};

/// An upstream proxy connection opened at RCPT time (per §4.2's "open an
/// upstream proxy connection now" instruction), kept alive until the
/// storage chain streams the payload over it.
pub trait ProxyConnection: Send {
    /// Stream the payload (DATA or BDAT) and return the upstream's final
    /// reply code/text.
    fn stream_data(&mut self, bytes: &[u8]) -> Result<(u16, String), std::io::Error>;
}

/// Registry of open proxy connections keyed by session UID; the receiver
/// inserts one when a RCPT matches a proxy rule, this processor removes
/// and drives it when the envelope completes.
pub struct ProxyConnections<C> {
    open: std::sync::Mutex<std::collections::HashMap<uuid::Uuid, C>>,
}

impl<C> Default for ProxyConnections<C> {
    fn default() -> Self {
        Self {
            open: std::sync::Mutex::new(std::collections::HashMap::new()),
        }
    }
}

impl<C> ProxyConnections<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session_uid: uuid::Uuid, connection: C) {
        self.open
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(session_uid, connection);
    }

    fn take(&self, session_uid: uuid::Uuid) -> Option<C> {
        self.open.lock().unwrap_or_else(|e| e.into_inner()).remove(&session_uid)
    }
}

/// §4.3's ProxyStream stage: streams the payload over the already-open
/// upstream connection and surfaces its final response verbatim, closing
/// the connection afterward regardless of outcome.
pub struct ProxyStreamProcessor<C> {
    connections: std::sync::Arc<ProxyConnections<C>>,
}

impl<C: ProxyConnection> ProxyStreamProcessor<C> {
    #[must_use]
    pub fn new(connections: std::sync::Arc<ProxyConnections<C>>) -> Self {
        Self { connections }
    }
}

#[async_trait::async_trait]
impl<C: ProxyConnection> StorageProcessor for ProxyStreamProcessor<C> {
    fn name(&self) -> &'static str {
        "proxy-stream"
    }

    async fn run(&self, session: &Session, envelope: &mut Envelope) -> StorageOutcome {
        if envelope.matched_proxy_rule.is_none() {
            return StorageOutcome::Continue;
        }

        let Some(mut connection) = self.connections.take(session.uid) else {
            tracing::error!(session = %session.uid, "no open proxy connection for a proxy-matched envelope");
            return StorageOutcome::StopReject(451, "4.3.2 proxy connection lost".to_owned());
        };

        let bytes = match payload::read(envelope) {
            Ok(bytes) => bytes,
            Err(error) => {
                tracing::warn!(%error, "failed to read payload for proxy stream");
                return StorageOutcome::StopReject(451, "4.3.2 local I/O error".to_owned());
            }
        };
        let full_message = [envelope.render_header_prefix().into_bytes(), bytes].concat();

        match connection.stream_data(&full_message) {
            Ok((code, _text)) if (200..300).contains(&code) => StorageOutcome::StopOk,
            Ok((code, text)) => StorageOutcome::StopReject(code, text),
            Err(error) => {
                tracing::warn!(%error, "proxy stream I/O error");
                StorageOutcome::StopReject(451, "4.3.2 proxy stream error".to_owned())
            }
        }
    }
}
