/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! §4.2's command loop: one call to [`handle_connection`] per accepted
//! socket, running until `QUIT`, a session-fatal limit, or a socket error.

use crate::smtp::config::ReceiverConfig;
use crate::smtp::proxy_client::TcpProxyConnection;
use robin_auth::Authenticator;
use robin_common::bot_binding::BotBinding;
use robin_common::envelope::{Envelope, HeaderPlacement, NotifyOn, Payload, Recipient};
use robin_common::proxy_rule::ProxyRule;
use robin_common::session::{Direction, Session, TlsState};
use robin_common::tls::{CipherSuite, ProtocolVersion, TlsProps};
use robin_protocol::auth::{Credentials, Mechanism};
use robin_protocol::rustls;
use robin_protocol::{ConnectionKind, EhloArgs, MailFromArgs, ParseVerbError, RcptToArgs, Reply, ReplyCode, Verb};
use robin_working::processors::ProxyConnections;
use robin_working::{Chain, StorageOutcome};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

const MAX_LINE_LEN: usize = 8 * 1024;

/// Everything a session needs beyond its own socket: configuration, shared
/// rule tables, pluggable auth, and the in-process storage chain.
pub struct SessionContext {
    pub hostname: String,
    pub product: String,
    pub config: ReceiverConfig,
    pub tls_config: Option<Arc<rustls::ServerConfig>>,
    pub authenticator: Option<Arc<dyn Authenticator>>,
    pub chain: Arc<Chain>,
    pub proxy_rules: Vec<ProxyRule>,
    pub bot_bindings: Vec<BotBinding>,
    pub proxy_connections: Arc<ProxyConnections<TcpProxyConnection>>,
}

/// A socket that may or may not have completed a TLS handshake.
enum Conn {
    Plain(tokio::net::TcpStream),
    Tls(Box<tokio_rustls::server::TlsStream<tokio::net::TcpStream>>),
}

impl tokio::io::AsyncRead for Conn {
    fn poll_read(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_read(cx, buf),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl tokio::io::AsyncWrite for Conn {
    fn poll_write(
        self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
        buf: &[u8],
    ) -> std::task::Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_write(cx, buf),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_flush(cx),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: std::pin::Pin<&mut Self>, cx: &mut std::task::Context<'_>) -> std::task::Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Plain(s) => std::pin::Pin::new(s).poll_shutdown(cx),
            Self::Tls(s) => std::pin::Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

fn tls_props_from(conn: &rustls::ServerConnection) -> Option<TlsProps> {
    Some(TlsProps {
        protocol_version: ProtocolVersion(conn.protocol_version()?),
        cipher_suite: CipherSuite(conn.negotiated_cipher_suite()?.suite()),
        peer_certificates: conn.peer_certificates().map(<[_]>::to_vec),
        alpn_protocol: conn.alpn_protocol().map(<[u8]>::to_vec),
    })
}

fn simple(code: u16, text: impl Into<String>) -> Reply {
    Reply::new(ReplyCode::Code { code }, vec![text.into()])
}

fn status(code: u16, enhanced: &str, text: impl Into<String>) -> Reply {
    Reply::new(
        ReplyCode::Enhanced {
            code,
            enhanced: enhanced.to_owned(),
        },
        vec![text.into()],
    )
}

async fn send<W: tokio::io::AsyncWrite + Unpin>(writer: &mut W, reply: &Reply) -> std::io::Result<()> {
    writer.write_all(reply.as_crlf_string().as_bytes()).await?;
    writer.flush().await
}

/// Outcome of dispatching one command: a plain reply, a reply followed by
/// closing the connection, or `QUIT`'s `221` + close.
enum Dispatched {
    Reply(Reply),
    CloseWith(Reply),
    Quit,
}

/// Run the §4.2 command loop for one accepted connection. If `kind` is
/// [`ConnectionKind::Tunneled`], the TLS handshake happens before the
/// greeting banner is sent.
pub async fn handle_connection(
    stream: tokio::net::TcpStream,
    peer: std::net::SocketAddr,
    local: std::net::SocketAddr,
    kind: ConnectionKind,
    ctx: Arc<SessionContext>,
) {
    let _ = stream.set_nodelay(true);
    let mut session = Session::new(Direction::Inbound, kind, peer, local);

    let conn = if matches!(kind, ConnectionKind::Tunneled) {
        let Some(tls_config) = ctx.tls_config.clone() else {
            tracing::error!(%peer, "implicit-TLS listener has no TLS keystore configured");
            return;
        };
        match tokio_rustls::TlsAcceptor::from(tls_config).accept(stream).await {
            Ok(tls_stream) => {
                if let Some(props) = tls_props_from(tls_stream.get_ref().1) {
                    let _ = session.set_secured(props);
                }
                Conn::Tls(Box::new(tls_stream))
            }
            Err(error) => {
                tracing::warn!(%peer, %error, "implicit TLS handshake failed");
                return;
            }
        }
    } else {
        Conn::Plain(stream)
    };

    let mut reader = BufReader::new(conn);
    let banner = simple(220, format!("{} ESMTP {}", ctx.hostname, ctx.product));
    if send(&mut reader, &banner).await.is_err() {
        return;
    }

    let mut open_proxy: Option<TcpProxyConnection> = None;

    loop {
        let mut raw = String::new();
        let n = match reader.read_line(&mut raw).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        if n > MAX_LINE_LEN {
            let _ = send(&mut reader, &status(500, "5.2.3", "line too long")).await;
            break;
        }
        let line = raw.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        let (command_name, outcome) = match Verb::parse(line) {
            Ok(verb) => {
                let pending_tls = matches!(verb, Verb::StartTls);
                let name = command_word(&verb);
                let outcome = dispatch(verb, &mut session, &mut reader, &ctx, &mut open_proxy).await;
                if pending_tls {
                    if let Dispatched::Reply(reply) = &outcome {
                        if reply.code().value() == 220 {
                            if send(&mut reader, reply).await.is_err() {
                                break;
                            }
                            reader = match upgrade_to_tls(reader, &mut session, &ctx).await {
                                Some(upgraded) => upgraded,
                                None => break,
                            };
                            session.record_transaction(name.to_owned(), 220, ctx.config.errors.transaction_count_max);
                            continue;
                        }
                    }
                }
                (name, outcome)
            }
            Err(ParseVerbError::UnknownCommand) => ("unknown", Dispatched::Reply(status(500, "5.5.1", "command not recognized"))),
            Err(ParseVerbError::Syntax | ParseVerbError::InvalidParameter(_)) => {
                ("malformed", Dispatched::Reply(status(501, "5.5.4", "syntax error in parameters")))
            }
        };

        let quit = matches!(outcome, Dispatched::Quit);
        let reply = match outcome {
            Dispatched::Reply(reply) | Dispatched::CloseWith(reply) => reply,
            Dispatched::Quit => simple(221, "bye"),
        };
        let close_after = matches!(reply.code().value(), 421) || matches!(command_name, "quit-internal");

        if send(&mut reader, &reply).await.is_err() {
            break;
        }
        session.record_transaction(command_name.to_owned(), reply.code().value(), ctx.config.errors.transaction_count_max);

        if quit || close_after {
            break;
        }
        if session.transaction_limit_exceeded(ctx.config.errors.transaction_count_max) {
            let _ = send(&mut reader, &status(421, "4.3.2", "too many commands, closing transmission channel")).await;
            break;
        }
        if session.error_limit_exceeded(ctx.config.errors.error_count_max) {
            let _ = send(&mut reader, &status(421, "4.3.2", "too many errors, closing transmission channel")).await;
            break;
        }
    }
}

/// Take the plaintext socket back out of `reader`, perform the server-side
/// TLS handshake, and rebuild the buffered reader over the encrypted
/// stream. `None` means the handshake failed and the connection should
/// close; per RFC 3207 the session cannot continue in either state.
async fn upgrade_to_tls(reader: BufReader<Conn>, session: &mut Session, ctx: &Arc<SessionContext>) -> Option<BufReader<Conn>> {
    let Conn::Plain(tcp) = reader.into_inner() else {
        return None;
    };
    let tls_config = ctx.tls_config.clone()?;
    let tls_stream = match tokio_rustls::TlsAcceptor::from(tls_config).accept(tcp).await {
        Ok(tls_stream) => tls_stream,
        Err(error) => {
            tracing::warn!(%error, "STARTTLS handshake failed");
            return None;
        }
    };
    if let Some(props) = tls_props_from(tls_stream.get_ref().1) {
        if session.set_secured(props).is_err() {
            tracing::error!("session already secured before STARTTLS handshake completed");
            return None;
        }
    }
    // RFC 3207 requires discarding any prior EHLO state; the client must
    // re-identify before MAIL FROM is accepted again.
    session.client_name = None;
    Some(BufReader::new(Conn::Tls(Box::new(tls_stream))))
}

fn command_word(verb: &Verb) -> &'static str {
    match verb {
        Verb::Helo(_) => "helo",
        Verb::Ehlo(_) => "ehlo",
        Verb::Lhlo(_) => "lhlo",
        Verb::StartTls => "starttls",
        Verb::Auth(_) => "auth",
        Verb::MailFrom(_) => "mail",
        Verb::RcptTo(_) => "rcpt",
        Verb::Data => "data",
        Verb::Bdat { .. } => "bdat",
        Verb::Rset => "rset",
        Verb::Vrfy(_) => "vrfy",
        Verb::Help => "help",
        Verb::Noop => "noop",
        Verb::Quit => "quit",
    }
}

async fn dispatch<RW>(
    verb: Verb,
    session: &mut Session,
    reader: &mut BufReader<RW>,
    ctx: &Arc<SessionContext>,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Dispatched
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    match verb {
        Verb::Helo(args) => handle_hello(args, false, false, session, ctx),
        Verb::Ehlo(args) => handle_hello(args, true, false, session, ctx),
        Verb::Lhlo(args) => handle_hello(args, true, true, session, ctx),
        Verb::StartTls => handle_starttls(session, ctx),
        Verb::Auth(args) => handle_auth(args, session, reader, ctx).await,
        Verb::MailFrom(args) => handle_mail_from(args, session),
        Verb::RcptTo(args) => handle_rcpt_to(args, session, ctx, open_proxy).await,
        Verb::Data => handle_data(session, reader, ctx, open_proxy).await,
        Verb::Bdat { chunk_size, is_last } => handle_bdat(chunk_size, is_last, session, reader, ctx, open_proxy).await,
        Verb::Rset => {
            session.reset();
            Dispatched::Reply(simple(250, "Ok"))
        }
        Verb::Vrfy(_) => Dispatched::Reply(status(252, "2.5.2", "cannot verify user, but will accept message")),
        Verb::Help => Dispatched::Reply(simple(214, "see RFC 5321")),
        Verb::Noop => Dispatched::Reply(simple(250, "Ok")),
        Verb::Quit => Dispatched::Quit,
    }
}

fn parse_client_name(raw: &str) -> Option<robin_protocol::ClientName> {
    if let Ok(ip) = raw.parse::<std::net::IpAddr>() {
        return Some(match ip {
            std::net::IpAddr::V4(v4) => robin_protocol::ClientName::Ip4(v4),
            std::net::IpAddr::V6(v6) => robin_protocol::ClientName::Ip6(v6),
        });
    }
    raw.parse::<robin_protocol::Domain>().ok().map(robin_protocol::ClientName::Domain)
}

fn handle_hello(args: EhloArgs, extended: bool, is_lhlo: bool, session: &mut Session, ctx: &Arc<SessionContext>) -> Dispatched {
    let Some(client_name) = parse_client_name(&args.client_name) else {
        return Dispatched::Reply(status(501, "5.5.2", "invalid client identifier"));
    };
    session.set_helloed(client_name);

    if !extended {
        return Dispatched::Reply(simple(250, ctx.hostname.clone()));
    }

    let secured = matches!(session.tls, TlsState::Secured(_));
    let mut lines = vec![ctx.hostname.clone()];
    if !is_lhlo && ctx.config.esmtp.starttls && ctx.tls_config.is_some() && !secured {
        lines.push("STARTTLS".to_owned());
    }
    if let Some(auth) = &ctx.config.esmtp.auth {
        if !auth.mechanisms.is_empty() && (!auth.auth_requires_tls || secured) {
            let mechs = auth.mechanisms.iter().map(ToString::to_string).collect::<Vec<_>>().join(" ");
            lines.push(format!("AUTH {mechs}"));
        }
    }
    if ctx.config.esmtp.pipelining {
        lines.push("PIPELINING".to_owned());
    }
    lines.push(format!("SIZE {}", ctx.config.esmtp.size));
    if ctx.config.esmtp.chunking {
        lines.push("CHUNKING".to_owned());
    }
    lines.push("8BITMIME".to_owned());
    lines.push("ENHANCEDSTATUSCODES".to_owned());
    if ctx.config.esmtp.dsn {
        lines.push("DSN".to_owned());
    }
    Dispatched::Reply(Reply::new(ReplyCode::Code { code: 250 }, lines))
}

fn handle_starttls(session: &mut Session, ctx: &Arc<SessionContext>) -> Dispatched {
    if ctx.tls_config.is_none() || matches!(session.tls, TlsState::Secured(_)) {
        return Dispatched::Reply(status(503, "5.5.1", "STARTTLS not available"));
    }
    Dispatched::Reply(simple(220, "go ahead"))
}

async fn prompt_continuation<RW>(reader: &mut BufReader<RW>, challenge: &str) -> Option<String>
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let prompt = Reply::new(ReplyCode::Code { code: 334 }, vec![challenge.to_owned()]);
    send(reader, &prompt).await.ok()?;
    let mut line = String::new();
    let n = reader.read_line(&mut line).await.ok()?;
    if n == 0 || n > MAX_LINE_LEN {
        return None;
    }
    Some(line.trim_end_matches(['\r', '\n']).to_owned())
}

async fn handle_auth<RW>(
    args: robin_protocol::AuthArgs,
    session: &mut Session,
    reader: &mut BufReader<RW>,
    ctx: &Arc<SessionContext>,
) -> Dispatched
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let Some(auth_config) = &ctx.config.esmtp.auth else {
        return Dispatched::Reply(status(503, "5.5.1", "AUTH not enabled"));
    };
    let secured = matches!(session.tls, TlsState::Secured(_));
    if auth_config.auth_requires_tls && !secured {
        return Dispatched::Reply(status(538, "5.7.11", "encryption required for requested authentication mechanism"));
    }
    if !auth_config.mechanisms.contains(&args.mechanism) {
        return Dispatched::Reply(status(504, "5.5.4", "unrecognized authentication mechanism"));
    }
    let Some(authenticator) = &ctx.authenticator else {
        return Dispatched::Reply(status(503, "5.5.1", "AUTH not enabled"));
    };

    let credentials = match args.mechanism {
        Mechanism::Plain => {
            let payload = match args.initial_response {
                Some(payload) => payload,
                None => match prompt_continuation(reader, "").await {
                    Some(line) => line,
                    None => return Dispatched::CloseWith(status(421, "4.3.0", "connection lost during authentication")),
                },
            };
            Credentials::from_plain(&payload)
        }
        Mechanism::Login => {
            let username = match prompt_continuation(reader, "VXNlcm5hbWU6").await {
                Some(line) => line,
                None => return Dispatched::CloseWith(status(421, "4.3.0", "connection lost during authentication")),
            };
            let password = match prompt_continuation(reader, "UGFzc3dvcmQ6").await {
                Some(line) => line,
                None => return Dispatched::CloseWith(status(421, "4.3.0", "connection lost during authentication")),
            };
            Credentials::decode_login_field(&username).and_then(|authid| {
                Credentials::decode_login_field(&password).map(|authpass| Credentials::Verify { authid, authpass })
            })
        }
    };

    let Ok(credentials) = credentials else {
        return Dispatched::Reply(status(535, "5.7.8", "authentication failed"));
    };

    match authenticator.authenticate(&credentials) {
        Ok(principal) => {
            session.set_authenticated(principal);
            Dispatched::Reply(status(235, "2.7.0", "authentication successful"))
        }
        Err(_) => Dispatched::Reply(status(535, "5.7.8", "authentication failed")),
    }
}

fn handle_mail_from(args: MailFromArgs, session: &mut Session) -> Dispatched {
    if session.client_name.is_none() {
        return Dispatched::Reply(status(503, "5.5.1", "send HELO/EHLO first"));
    }
    let mut envelope = Envelope::new(args.reverse_path);
    envelope.dsn_ret = args.dsn_ret;
    envelope.envelope_id = args.envelope_id;
    envelope.header_placement = HeaderPlacement::Prepend;
    match session.start_envelope(envelope) {
        Ok(()) => Dispatched::Reply(simple(250, "Ok")),
        Err(_) => Dispatched::Reply(status(503, "5.5.1", "MAIL FROM not allowed in this state")),
    }
}

fn recipient_from(args: RcptToArgs) -> Recipient {
    let mut recipient = Recipient::new(args.forward_path);
    recipient.original_forward_path = args.original_recipient;
    if let Some(notify) = args.notify_on {
        recipient.notify_on = if notify.on_success || notify.on_failure || notify.on_delay {
            NotifyOn::Some {
                success: notify.on_success,
                failure: notify.on_failure,
                delay: notify.on_delay,
            }
        } else {
            NotifyOn::Never
        };
    }
    recipient
}

async fn dial_or_forward_proxy(
    rule: ProxyRule,
    hostname: String,
    mail_from: Option<String>,
    forward_path: String,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Result<std::io::Result<(u16, String)>, tokio::task::JoinError> {
    if let Some(mut connection) = open_proxy.take() {
        let outcome = tokio::task::spawn_blocking(move || {
            let outcome = connection.forward_rcpt(&forward_path);
            (connection, outcome)
        })
        .await?;
        *open_proxy = Some(outcome.0);
        Ok(outcome.1)
    } else {
        let (connection, outcome) = tokio::task::spawn_blocking(move || -> std::io::Result<_> {
            let mut connection = TcpProxyConnection::dial(&rule, &hostname, mail_from.as_deref())?;
            let outcome = connection.forward_rcpt(&forward_path)?;
            Ok((connection, outcome))
        })
        .await?
        .map_or_else(|error| (None, Err(error)), |(c, o)| (Some(c), Ok(o)));
        if let Some(connection) = connection {
            *open_proxy = Some(connection);
        }
        Ok(outcome)
    }
}

async fn handle_rcpt_to(
    args: RcptToArgs,
    session: &mut Session,
    ctx: &Arc<SessionContext>,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Dispatched {
    if session.accept_rcpt().is_err() {
        return Dispatched::Reply(status(503, "5.5.1", "RCPT TO not allowed in this state"));
    }

    let forward_path = args.forward_path.full().to_owned();
    let local_part = args.forward_path.local_part().to_owned();
    let peer = session.client_addr.ip();
    let mail_from = session
        .envelopes
        .last()
        .and_then(|e| e.reverse_path.as_ref())
        .map(|a| a.full().to_owned());
    let ehlo = session.client_name.as_ref().map(ToString::to_string);

    let proxy_match = ProxyRule::find_match(&ctx.proxy_rules, &forward_path, mail_from.as_deref(), ehlo.as_deref(), peer)
        .map(|(idx, rule)| (idx, rule.clone()));

    if let Some((idx, rule)) = proxy_match {
        return match dial_or_forward_proxy(rule, ctx.hostname.clone(), mail_from, forward_path.clone(), open_proxy).await {
            Ok(Ok((code, text))) if (200..300).contains(&code) => {
                if let Some(envelope) = session.current_envelope_mut() {
                    envelope.matched_proxy_rule = Some(idx);
                    envelope.add_recipient(recipient_from(args));
                }
                Dispatched::Reply(simple(code, text))
            }
            Ok(Ok((code, text))) => Dispatched::Reply(simple(code, text)),
            Ok(Err(error)) => {
                tracing::warn!(%error, "upstream proxy connection failed");
                Dispatched::Reply(status(451, "4.3.0", "upstream proxy connection failed"))
            }
            Err(error) => {
                tracing::error!(%error, "proxy dial task panicked");
                Dispatched::Reply(status(451, "4.3.0", "local error in processing"))
            }
        };
    }

    let bot_name = BotBinding::find_match(&ctx.bot_bindings, &local_part, peer).map(|b| b.bot_name.clone());
    if let Some(envelope) = session.current_envelope_mut() {
        if let Some(bot_name) = bot_name {
            envelope.matched_bots.push(bot_name);
        }
        if !envelope.add_recipient(recipient_from(args)) {
            return Dispatched::Reply(status(250, "2.1.5", "duplicate recipient ignored"));
        }
    }
    Dispatched::Reply(simple(250, "Ok"))
}

fn has_recipients(session: &mut Session) -> bool {
    session.current_envelope_mut().map_or(false, |e| !e.recipients.is_empty())
}

async fn read_dot_terminated_body<RW>(reader: &mut BufReader<RW>, size_limit: usize) -> Result<Vec<u8>, Reply>
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut body = Vec::new();
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line).await {
            Ok(0) | Err(_) => return Err(status(421, "4.3.0", "connection lost while receiving data")),
            Ok(_) => {}
        }
        if line == ".\r\n" || line == ".\n" {
            break;
        }
        let unstuffed = line.strip_prefix('.').unwrap_or(&line);
        if body.len() + unstuffed.len() > size_limit {
            return Err(status(552, "5.3.4", "message size exceeds fixed maximum message size"));
        }
        body.extend_from_slice(unstuffed.as_bytes());
    }
    Ok(body)
}

async fn finalize_envelope(
    body: Vec<u8>,
    session: &mut Session,
    ctx: &Arc<SessionContext>,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Reply {
    if let Some(connection) = open_proxy.take() {
        ctx.proxy_connections.insert(session.uid, connection);
    }

    let Some(envelope) = session.current_envelope_mut() else {
        return status(503, "5.5.1", "no envelope in progress");
    };
    envelope.payload = Some(Payload::Memory(Arc::new(body)));
    envelope.size = envelope.payload.as_ref().map_or(0, |p| match p {
        Payload::Memory(bytes) => bytes.len(),
        Payload::Path(_) => 0,
    });

    let mut envelope = envelope.clone();
    let outcome = ctx.chain.run(session, &mut envelope).await;
    if let Some(slot) = session.envelopes.last_mut() {
        *slot = envelope;
    }
    session.complete_envelope();

    match outcome {
        StorageOutcome::StopOk | StorageOutcome::Continue => status(250, "2.6.0", "message accepted for delivery"),
        StorageOutcome::StopReject(code, text) => simple(code, text),
    }
}

async fn handle_data<RW>(
    session: &mut Session,
    reader: &mut BufReader<RW>,
    ctx: &Arc<SessionContext>,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Dispatched
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    if !has_recipients(session) {
        return Dispatched::Reply(status(554, "5.5.1", "no valid recipients"));
    }
    if session.begin_content(false).is_err() {
        return Dispatched::Reply(status(503, "5.5.1", "DATA not allowed in this state"));
    }
    if send(reader, &simple(354, "Start mail input; end with <CRLF>.<CRLF>")).await.is_err() {
        return Dispatched::CloseWith(status(421, "4.3.0", "connection lost"));
    }

    match read_dot_terminated_body(reader, ctx.config.esmtp.size).await {
        Ok(body) => Dispatched::Reply(finalize_envelope(body, session, ctx, open_proxy).await),
        Err(reply) => Dispatched::Reply(reply),
    }
}

async fn handle_bdat<RW>(
    chunk_size: usize,
    is_last: bool,
    session: &mut Session,
    reader: &mut BufReader<RW>,
    ctx: &Arc<SessionContext>,
    open_proxy: &mut Option<TcpProxyConnection>,
) -> Dispatched
where
    RW: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    if !has_recipients(session) {
        return Dispatched::Reply(status(554, "5.5.1", "no valid recipients"));
    }
    if session.begin_content(true).is_err() {
        return Dispatched::Reply(status(503, "5.5.1", "BDAT not allowed in this state"));
    }

    let mut chunk = vec![0_u8; chunk_size];
    if reader.read_exact(&mut chunk).await.is_err() {
        return Dispatched::CloseWith(status(421, "4.3.0", "connection lost while receiving data"));
    }

    let size_limit = ctx.config.esmtp.size;
    let mut buffer = match session.current_envelope_mut().and_then(|e| e.payload.clone()) {
        Some(Payload::Memory(existing)) => existing.as_ref().clone(),
        _ => Vec::new(),
    };
    if buffer.len() + chunk.len() > size_limit {
        return Dispatched::Reply(status(552, "5.3.4", "message size exceeds fixed maximum message size"));
    }
    buffer.extend_from_slice(&chunk);

    if !is_last {
        if let Some(envelope) = session.current_envelope_mut() {
            envelope.size = buffer.len();
            envelope.payload = Some(Payload::Memory(Arc::new(buffer)));
        }
        return Dispatched::Reply(status(250, "2.6.0", "chunk accepted"));
    }

    Dispatched::Reply(finalize_envelope(buffer, session, ctx, open_proxy).await)
}
