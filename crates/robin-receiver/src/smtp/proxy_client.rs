/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Blocking upstream client opened at RCPT time per §4.4: EHLO/MAIL now,
//! RCPT forwarded as it arrives, DATA streamed once the storage chain
//! reaches the `ProxyStream` stage. Blocking because
//! [`robin_working::processors::ProxyConnection`] is a synchronous trait;
//! callers dial it from [`tokio::task::spawn_blocking`].

use robin_common::proxy_rule::ProxyRule;
use robin_working::processors::ProxyConnection;
use std::io::{BufRead, BufReader, Write};

pub struct TcpProxyConnection {
    stream: std::net::TcpStream,
}

fn read_reply(stream: &mut std::net::TcpStream) -> std::io::Result<(u16, String)> {
    let mut reader = BufReader::new(stream.try_clone()?);
    let mut code = 0_u16;
    let mut last_line = String::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "upstream closed"));
        }
        let line = line.trim_end();
        let (head, rest) = line.split_at(line.len().min(3));
        code = head.parse().unwrap_or(code);
        last_line = rest.trim_start_matches(['-', ' ']).to_owned();
        if line.as_bytes().get(3) != Some(&b'-') {
            break;
        }
    }
    Ok((code, last_line))
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

impl TcpProxyConnection {
    /// Dial the upstream, issue EHLO and MAIL FROM, and return the
    /// connection ready to accept forwarded RCPT TOs.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the connection, EHLO, or MAIL FROM fails.
    pub fn dial(rule: &ProxyRule, ehlo_name: &str, mail_from: Option<&str>) -> std::io::Result<Self> {
        let stream = std::net::TcpStream::connect((rule.host.as_str(), rule.port))?;
        stream.set_read_timeout(Some(std::time::Duration::from_secs(30)))?;
        stream.set_write_timeout(Some(std::time::Duration::from_secs(30)))?;
        let mut conn = Self { stream };
        // Drain the upstream's own greeting banner.
        read_reply(&mut conn.stream)?;
        conn.command(&format!("EHLO {ehlo_name}\r\n"))?;
        let path = mail_from.map_or_else(String::new, str::to_owned);
        conn.command(&format!("MAIL FROM:<{path}>\r\n"))?;
        Ok(conn)
    }

    fn command(&mut self, line: &str) -> std::io::Result<(u16, String)> {
        self.stream.write_all(line.as_bytes())?;
        read_reply(&mut self.stream)
    }

    /// Forward one RCPT TO and relay the upstream's verbatim reply.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the write or the upstream reply fails.
    pub fn forward_rcpt(&mut self, forward_path: &str) -> std::io::Result<(u16, String)> {
        self.command(&format!("RCPT TO:<{forward_path}>\r\n"))
    }
}

impl ProxyConnection for TcpProxyConnection {
    fn stream_data(&mut self, bytes: &[u8]) -> Result<(u16, String), std::io::Error> {
        let (code, text) = self.command("DATA\r\n")?;
        if code != 354 {
            return Ok((code, text));
        }
        self.stream.write_all(&dot_stuff(bytes))?;
        self.stream.write_all(b".\r\n")?;
        read_reply(&mut self.stream)
    }
}

#[cfg(test)]
mod tests {
    use super::dot_stuff;

    #[test]
    fn stuffs_leading_dots() {
        assert_eq!(dot_stuff(b".hidden\r\nok\r\n"), b"..hidden\r\nok\r\n");
    }

    #[test]
    fn leaves_other_lines_untouched() {
        assert_eq!(dot_stuff(b"hello\r\nworld\r\n"), b"hello\r\nworld\r\n");
    }
}
