/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Synchronous outbound SMTP/ESMTP/LMTP client exchange described in §4.7:
//! EHLO, optional STARTTLS under the host's [`TlsPolicy`], MAIL/RCPT, and
//! DATA. Blocking, mirroring the receiver's own `proxy_client` idiom so it
//! can be driven straight from [`robin_queue::Deliverer::deliver`] without
//! an async-runtime bridge.

use crate::mx::MxHost;
use crate::tls::Requirement;
use crate::tls_policy::{self, TlsPolicy};
use robin_common::proxy_rule::RelayProtocol;
use robin_protocol::rustls;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpStream;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("network error talking to {host}: {source}")]
    Network { host: String, source: std::io::Error },
    #[error("TLS policy violation talking to {host}: {reason}")]
    Policy { host: String, reason: String },
}

enum Conn {
    Plain(TcpStream),
    Tls(Box<rustls::StreamOwned<rustls::ClientConnection, TcpStream>>),
}

impl Read for Conn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(s) => s.read(buf),
            Self::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Conn {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Plain(s) => s.write(buf),
            Self::Tls(s) => s.write(buf),
        }
    }
    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Plain(s) => s.flush(),
            Self::Tls(s) => s.flush(),
        }
    }
}

/// Outcome of a MAIL/RCPT/DATA exchange against one recipient of one MX
/// host: the final reply observed for that recipient, either at RCPT time
/// (rejected before DATA) or at DATA time (shared by every accepted
/// recipient on non-LMTP hosts, or per-recipient under LMTP).
#[derive(Debug, Clone)]
pub struct RecipientReply {
    pub code: u16,
    pub text: String,
}

pub struct HostExchange {
    reader: BufReader<Conn>,
    host: String,
    ehlo_capabilities: Vec<String>,
}

fn read_reply_lines(reader: &mut BufReader<Conn>) -> std::io::Result<(u16, Vec<String>)> {
    let mut code = 0_u16;
    let mut lines = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "peer closed connection"));
        }
        let line = line.trim_end();
        let (head, rest) = line.split_at(line.len().min(3));
        code = head.parse().unwrap_or(code);
        lines.push(rest.trim_start_matches(['-', ' ']).to_owned());
        if line.as_bytes().get(3) != Some(&b'-') {
            break;
        }
    }
    Ok((code, lines))
}

fn read_reply(reader: &mut BufReader<Conn>) -> std::io::Result<(u16, String)> {
    let (code, mut lines) = read_reply_lines(reader)?;
    Ok((code, lines.pop().unwrap_or_default()))
}

fn dot_stuff(bytes: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bytes.len());
    for line in bytes.split_inclusive(|&b| b == b'\n') {
        if line.first() == Some(&b'.') {
            out.push(b'.');
        }
        out.extend_from_slice(line);
    }
    out
}

impl HostExchange {
    /// Connect, drain the banner, issue EHLO, and upgrade to TLS per
    /// `policy` if mandatory or advertised. On a mandatory policy whose
    /// peer does not advertise STARTTLS, returns
    /// [`ExchangeError::Policy`] (no cleartext fallback, per §4.7).
    ///
    /// `requirement` is the operator's global override of that per-host
    /// policy: `Required` raises every policy to mandatory, `Disabled`
    /// never attempts STARTTLS at all (a deliberate downgrade, for driving
    /// a staging deployment against a plaintext test MX), `Optional`
    /// passes `policy` through unchanged.
    pub fn open(
        host: &MxHost,
        port: u16,
        ehlo_name: &str,
        policy: &TlsPolicy,
        requirement: Requirement,
        connect_timeout: Duration,
    ) -> Result<Self, ExchangeError> {
        let addr = host.addrs.first().copied().ok_or_else(|| ExchangeError::Network {
            host: host.hostname.clone(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no address for MX host"),
        })?;

        let net_err = |source: std::io::Error| ExchangeError::Network { host: host.hostname.clone(), source };

        let stream = TcpStream::connect_timeout(&std::net::SocketAddr::new(addr, port), connect_timeout).map_err(net_err)?;
        stream.set_read_timeout(Some(connect_timeout)).map_err(net_err)?;
        stream.set_write_timeout(Some(connect_timeout)).map_err(net_err)?;

        let mut reader = BufReader::new(Conn::Plain(stream));
        read_reply(&mut reader).map_err(net_err)?;

        let mut exchange = Self { reader, host: host.hostname.clone(), ehlo_capabilities: Vec::new() };
        exchange.ehlo(ehlo_name)?;

        if matches!(requirement, Requirement::Disabled) {
            if policy.tls_mandatory() {
                tracing::warn!(host = %exchange.host, "tls.starttls = disabled overrides a policy that required TLS");
            }
            return Ok(exchange);
        }

        let mandatory = policy.tls_mandatory() || matches!(requirement, Requirement::Required);

        if mandatory && !exchange.supports("STARTTLS") {
            return Err(ExchangeError::Policy {
                host: exchange.host.clone(),
                reason: "policy requires TLS but peer did not advertise STARTTLS".to_owned(),
            });
        }

        if exchange.supports("STARTTLS") {
            exchange.starttls(policy)?;
            exchange.ehlo(ehlo_name)?;
        } else if mandatory {
            unreachable!("checked above");
        }

        Ok(exchange)
    }

    fn net_err(&self, source: std::io::Error) -> ExchangeError {
        ExchangeError::Network { host: self.host.clone(), source }
    }

    fn command(&mut self, line: &str) -> Result<(u16, String), ExchangeError> {
        self.reader.get_mut().write_all(line.as_bytes()).map_err(|e| self.net_err(e))?;
        read_reply(&mut self.reader).map_err(|e| self.net_err(e))
    }

    fn ehlo(&mut self, ehlo_name: &str) -> Result<(), ExchangeError> {
        self.reader.get_mut().write_all(format!("EHLO {ehlo_name}\r\n").as_bytes()).map_err(|e| self.net_err(e))?;
        let (_, lines) = read_reply_lines(&mut self.reader).map_err(|e| self.net_err(e))?;
        self.ehlo_capabilities = lines.into_iter().skip(1).map(|l| l.split_whitespace().next().unwrap_or("").to_owned()).collect();
        Ok(())
    }

    fn supports(&self, capability: &str) -> bool {
        self.ehlo_capabilities.iter().any(|c| c.eq_ignore_ascii_case(capability))
    }

    fn starttls(&mut self, policy: &TlsPolicy) -> Result<(), ExchangeError> {
        let (code, text) = self.command("STARTTLS\r\n")?;
        if code != 220 {
            return Err(ExchangeError::Policy { host: self.host.clone(), reason: format!("STARTTLS refused: {text}") });
        }

        let config = tls_policy::client_config(policy);
        let server_name: rustls::ServerName = self
            .host
            .as_str()
            .try_into()
            .unwrap_or_else(|_| rustls::ServerName::IpAddress(std::net::Ipv4Addr::UNSPECIFIED.into()));
        let connection = rustls::ClientConnection::new(std::sync::Arc::new(config), server_name)
            .map_err(|e| ExchangeError::Policy { host: self.host.clone(), reason: e.to_string() })?;

        let Conn::Plain(tcp) = self.reader.get_ref() else {
            return Err(ExchangeError::Policy { host: self.host.clone(), reason: "already secured".to_owned() });
        };
        let tcp = tcp.try_clone().map_err(|e| self.net_err(e))?;

        let mut tls_stream = rustls::StreamOwned::new(connection, tcp);
        tls_stream.conn.complete_io(&mut tls_stream.sock).map_err(|e| self.net_err(e))?;

        self.reader = BufReader::new(Conn::Tls(Box::new(tls_stream)));
        Ok(())
    }

    /// Issue `MAIL FROM`, a `RCPT TO` for each recipient, and `DATA` in
    /// sequence, returning the RCPT-time reply for every rejected
    /// recipient and the DATA-time reply shared by every accepted one
    /// (LMTP gives one reply per recipient instead; the caller maps that
    /// case separately via [`Self::is_lmtp_like`]).
    pub fn deliver(
        &mut self,
        reverse_path: &str,
        recipients: &[String],
        body: &[u8],
        protocol: RelayProtocol,
    ) -> Result<DeliverResult, ExchangeError> {
        let (code, text) = self.command(&format!("MAIL FROM:<{reverse_path}>\r\n"))?;
        if code / 100 != 2 {
            return Ok(DeliverResult {
                accepted: Vec::new(),
                rejected: recipients.iter().map(|r| (r.clone(), RecipientReply { code, text: text.clone() })).collect(),
                data_reply: None,
            });
        }

        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        for recipient in recipients {
            let (code, text) = self.command(&format!("RCPT TO:<{recipient}>\r\n"))?;
            if code / 100 == 2 {
                accepted.push(recipient.clone());
            } else {
                rejected.push((recipient.clone(), RecipientReply { code, text }));
            }
        }

        if accepted.is_empty() {
            return Ok(DeliverResult { accepted, rejected, data_reply: None });
        }

        let (code, text) = self.command("DATA\r\n")?;
        if code != 354 {
            for recipient in accepted.drain(..) {
                rejected.push((recipient, RecipientReply { code, text: text.clone() }));
            }
            return Ok(DeliverResult { accepted: Vec::new(), rejected, data_reply: None });
        }

        self.reader.get_mut().write_all(&dot_stuff(body)).map_err(|e| self.net_err(e))?;
        self.reader.get_mut().write_all(b".\r\n").map_err(|e| self.net_err(e))?;

        if protocol == RelayProtocol::Lmtp {
            let mut per_recipient = Vec::with_capacity(accepted.len());
            for recipient in &accepted {
                let (code, text) = read_reply(&mut self.reader).map_err(|e| self.net_err(e))?;
                per_recipient.push((recipient.clone(), RecipientReply { code, text }));
            }
            let (still_accepted, newly_rejected): (Vec<_>, Vec<_>) = per_recipient.into_iter().partition(|(_, r)| r.code / 100 == 2);
            rejected.extend(newly_rejected);
            return Ok(DeliverResult {
                accepted: still_accepted.into_iter().map(|(r, _)| r).collect(),
                rejected,
                data_reply: None,
            });
        }

        let (code, text) = read_reply(&mut self.reader).map_err(|e| self.net_err(e))?;
        if code / 100 != 2 {
            for recipient in accepted.drain(..) {
                rejected.push((recipient, RecipientReply { code, text: text.clone() }));
            }
            return Ok(DeliverResult { accepted: Vec::new(), rejected, data_reply: Some(RecipientReply { code, text }) });
        }

        Ok(DeliverResult { accepted, rejected, data_reply: Some(RecipientReply { code, text }) })
    }

    pub fn quit(&mut self) {
        let _ = self.command("QUIT\r\n");
    }
}

pub struct DeliverResult {
    pub accepted: Vec<String>,
    pub rejected: Vec<(String, RecipientReply)>,
    pub data_reply: Option<RecipientReply>,
}
