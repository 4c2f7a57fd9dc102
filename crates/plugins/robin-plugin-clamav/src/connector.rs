/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use r2d2::{ManageConnection, PooledConnection};
use robin_antivirus::{Antivirus, AntivirusResult};
use std::io::prelude::*;
use thiserror::Error;

const FOOTER: &[u8] = &[0; 4];
const SESSION_CMD: &[u8] = b"zIDSESSION\0";
const INSTREAM_CMD: &[u8] = b"zINSTREAM\0";
const SAFE_TOKEN: &[u8] = b"OK";
const PING_CMD: &[u8] = b"zPING\0";
const PING_ANSWER: &[u8] = b"PONG";

/// Connection parameters for a `clamd` daemon.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct Parameters {
    /// URL of the clamd service, e.g. `tcp://clamav:3310`.
    pub url: String,
    /// Maximum number of simultaneous connections to clamd.
    #[serde(default = "Parameters::default_max_connections")]
    pub max_connections: u32,
}

impl Parameters {
    const fn default_max_connections() -> u32 {
        4
    }
}

#[derive(Error, Debug)]
pub enum ClamavError {
    #[error("no pong answer received")]
    NoPong,
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("could not resolve an address from `{0}`")]
    UnresolvedUrl(String),
    #[error("invalid clamd url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("failed to build the connection pool: {0}")]
    Pool(#[from] r2d2::Error),
}

/// Connection pool to a `ClamAV` daemon (clamd), scanning over the INSTREAM
/// protocol.
#[derive(Clone)]
pub struct Plugin {
    pool: r2d2::Pool<ClamavConnector>,
}

impl Plugin {
    /// # Errors
    ///
    /// Returns [`ClamavError`] if the url cannot be resolved or the
    /// connection pool cannot be built.
    pub fn connect(params: &Parameters) -> Result<Self, ClamavError> {
        let mut sockets = url::Url::parse(&params.url)?
            .socket_addrs(|| None)
            .map_err(|_| ClamavError::UnresolvedUrl(params.url.clone()))?;
        let address = sockets
            .pop()
            .ok_or_else(|| ClamavError::UnresolvedUrl(params.url.clone()))?;

        let pool = r2d2::Pool::builder()
            .max_size(params.max_connections)
            .idle_timeout(Some(std::time::Duration::from_secs(30)))
            .max_lifetime(Some(std::time::Duration::from_secs(30)))
            .min_idle(Some(1))
            .build(ClamavConnector { address })?;

        Ok(Self { pool })
    }

    fn inner_scan(
        conn: &mut PooledConnection<ClamavConnector>,
        raw_data: &[u8],
    ) -> Result<AntivirusResult, std::io::Error> {
        conn.stream.write_all(INSTREAM_CMD)?;
        for data_chunk in raw_data.chunks(u32::MAX as usize) {
            #[allow(clippy::cast_possible_truncation)]
            let size = data_chunk.len() as u32;
            let msg = [size.to_be_bytes().as_slice(), data_chunk].concat();
            conn.stream.write_all(&msg)?;
        }
        conn.stream.write_all(FOOTER)?;
        let full_buf: Vec<u8> = read_all_buffer(&mut conn.stream, 64)?;
        let safe = full_buf
            .windows(SAFE_TOKEN.len())
            .any(|window| window == SAFE_TOKEN);
        Ok(AntivirusResult {
            infected: !safe,
            viruses: Vec::new(),
        })
    }
}

impl Antivirus for Plugin {
    fn scan(&self, raw_data: &[u8]) -> Result<AntivirusResult, std::io::Error> {
        let mut stream = self.pool.get().map_err(|_err| {
            std::io::Error::new(
                std::io::ErrorKind::Other,
                "failed to retrieve a clamav connection",
            )
        })?;
        let scan_res = Self::inner_scan(&mut stream, raw_data);
        if let Err(error) = &scan_res {
            stream.last_error = Some(std::io::Error::new(error.kind(), error.to_string()));
        }
        scan_res
    }
}

/// Wraps a `TcpStream` with the last I/O error seen, so `r2d2` can detect a
/// broken connection via [`ManageConnection::has_broken`].
struct TcpStreamWrapper {
    stream: std::net::TcpStream,
    last_error: Option<std::io::Error>,
}

struct ClamavConnector {
    address: std::net::SocketAddr,
}

impl ManageConnection for ClamavConnector {
    type Connection = TcpStreamWrapper;
    type Error = ClamavError;

    fn connect(&self) -> Result<Self::Connection, Self::Error> {
        let mut conn = TcpStreamWrapper {
            stream: std::net::TcpStream::connect(self.address)?,
            last_error: None,
        };
        conn.stream.write_all(SESSION_CMD)?;
        Ok(conn)
    }

    fn has_broken(&self, conn: &mut Self::Connection) -> bool {
        conn.last_error.is_some()
    }

    fn is_valid(&self, conn: &mut Self::Connection) -> Result<(), Self::Error> {
        conn.stream.write_all(PING_CMD)?;
        let full_buf: Vec<u8> = read_all_buffer(&mut conn.stream, 12)?;
        if full_buf
            .windows(PING_ANSWER.len())
            .any(|window| window == PING_ANSWER)
        {
            Ok(())
        } else {
            Err(ClamavError::NoPong)
        }
    }
}

/// Reads a clamd reply until a NUL byte terminator is seen.
fn read_all_buffer(
    stream: &mut std::net::TcpStream,
    buffer_size: usize,
) -> Result<Vec<u8>, std::io::Error> {
    let mut full_buf: Vec<u8> = Vec::new();
    loop {
        let mut buf = vec![0_u8; buffer_size];
        let _ = stream.read(&mut buf)?;
        full_buf.append(&mut buf.clone());
        if buf.contains(&b'\0') {
            break;
        }
    }
    Ok(full_buf)
}

#[cfg(test)]
mod tests {
    use super::{ClamavConnector, Plugin};
    use robin_antivirus::Antivirus;
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    fn test_pool() -> Plugin {
        let manager = ClamavConnector {
            address: SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 13310),
        };
        Plugin {
            pool: r2d2::Pool::builder()
                .idle_timeout(Some(std::time::Duration::from_secs(1)))
                .max_lifetime(Some(std::time::Duration::from_secs(1)))
                .max_size(1)
                .build(manager)
                .unwrap(),
        }
    }

    #[test]
    #[ignore = "requires a running clamd on 127.0.0.1:13310"]
    fn detects_eicar_test_string() {
        let plugin = test_pool();
        let result = plugin
            .scan(b"X5O!P%@AP[4\\PZX54(P^)7CC)7}$EICAR-STANDARD-ANTIVIRUS-TEST-FILE!$H+H*")
            .unwrap();
        assert!(result.infected);
    }

    #[test]
    #[ignore = "requires a running clamd on 127.0.0.1:13310"]
    fn clean_payload_is_not_flagged() {
        let plugin = test_pool();
        let result = plugin.scan(b"this is a test").unwrap();
        assert!(!result.infected);
    }
}
