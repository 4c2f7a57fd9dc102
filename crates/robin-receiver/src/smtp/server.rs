/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Bounded-pool TCP acceptor described in §4.1: separate pools for
//! cleartext (port 25/587) and implicit-TLS (port 465) connections, `421`
//! + close when a pool's backlog is also full.

use crate::smtp::config::{Pool as PoolConfig, ReceiverConfig};
use crate::smtp::session::SessionContext;
use robin_protocol::ConnectionKind;
use std::sync::Arc;

/// A bounded worker pool: `max` concurrent sessions served from a permit
/// semaphore, with a software backlog absorbing the next `backlog` accepts
/// while every permit is in use.
#[derive(Clone)]
struct Pool {
    semaphore: Arc<tokio::sync::Semaphore>,
    backlog: Arc<std::sync::atomic::AtomicUsize>,
    backlog_limit: usize,
}

impl Pool {
    fn new(config: &PoolConfig) -> Self {
        Self {
            semaphore: Arc::new(tokio::sync::Semaphore::new(config.max)),
            backlog: Arc::new(std::sync::atomic::AtomicUsize::new(0)),
            backlog_limit: config.backlog,
        }
    }

    /// Obtain a worker, waiting in the software backlog if every permit is
    /// taken. Returns `None` once the backlog itself is full, the `421`
    /// case from §4.1.
    async fn acquire(&self) -> Option<tokio::sync::OwnedSemaphorePermit> {
        use std::sync::atomic::Ordering;

        if let Ok(permit) = Arc::clone(&self.semaphore).try_acquire_owned() {
            return Some(permit);
        }
        if self.backlog.fetch_add(1, Ordering::SeqCst) >= self.backlog_limit {
            self.backlog.fetch_sub(1, Ordering::SeqCst);
            return None;
        }
        let permit = Arc::clone(&self.semaphore).acquire_owned().await.ok();
        self.backlog.fetch_sub(1, Ordering::SeqCst);
        permit
    }
}

/// Owns every listening socket and routes accepted connections to the
/// cleartext or implicit-TLS pool.
pub struct Listener {
    relay: Vec<tokio::net::TcpListener>,
    submission: Vec<tokio::net::TcpListener>,
    submissions: Vec<tokio::net::TcpListener>,
    cleartext_pool: Pool,
    tls_pool: Pool,
    ctx: Arc<SessionContext>,
}

async fn bind_all(addrs: &[std::net::SocketAddr]) -> std::io::Result<Vec<tokio::net::TcpListener>> {
    let mut listeners = Vec::with_capacity(addrs.len());
    for addr in addrs {
        listeners.push(tokio::net::TcpListener::bind(addr).await?);
    }
    Ok(listeners)
}

impl Listener {
    /// Bind every interface named in `config.interfaces`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if any configured address cannot be bound.
    pub async fn bind(config: &ReceiverConfig, ctx: Arc<SessionContext>) -> std::io::Result<Self> {
        Ok(Self {
            relay: bind_all(&config.interfaces.addr).await?,
            submission: bind_all(&config.interfaces.addr_submission).await?,
            submissions: bind_all(&config.interfaces.addr_submissions).await?,
            cleartext_pool: Pool::new(&config.pool),
            tls_pool: Pool::new(&config.pool),
            ctx,
        })
    }

    async fn accept_loop(listener: tokio::net::TcpListener, kind: ConnectionKind, pool: Pool, ctx: Arc<SessionContext>) {
        loop {
            let (stream, peer) = match listener.accept().await {
                Ok(accepted) => accepted,
                Err(error) => {
                    tracing::warn!(%error, "accept failed");
                    continue;
                }
            };
            let local = stream.local_addr().unwrap_or(peer);
            let pool = pool.clone();
            let ctx = Arc::clone(&ctx);
            tokio::spawn(async move {
                let Some(permit) = pool.acquire().await else {
                    tracing::warn!(%peer, %kind, "pool and backlog exhausted, rejecting with 421");
                    let mut stream = stream;
                    let _ = tokio::io::AsyncWriteExt::write_all(
                        &mut stream,
                        b"421 4.3.2 too many connections, try again later\r\n",
                    )
                    .await;
                    return;
                };
                crate::smtp::session::handle_connection(stream, peer, local, kind, ctx).await;
                drop(permit);
            });
        }
    }

    /// Run every acceptor until cancelled.
    pub async fn serve(self) {
        let mut tasks = tokio::task::JoinSet::new();
        for listener in self.relay {
            tasks.spawn(Self::accept_loop(listener, ConnectionKind::Relay, self.cleartext_pool.clone(), Arc::clone(&self.ctx)));
        }
        for listener in self.submission {
            tasks.spawn(Self::accept_loop(
                listener,
                ConnectionKind::Submission,
                self.cleartext_pool.clone(),
                Arc::clone(&self.ctx),
            ));
        }
        for listener in self.submissions {
            tasks.spawn(Self::accept_loop(listener, ConnectionKind::Tunneled, self.tls_pool.clone(), Arc::clone(&self.ctx)));
        }
        while tasks.join_next().await.is_some() {}
    }
}
