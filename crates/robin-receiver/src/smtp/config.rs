/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use robin_common::tls::{secret::Secret, CipherSuite, ProtocolVersion};
use robin_protocol::Domain;

/// Configuration for the SMTP/ESMTP/LMTP receiver, loaded as a `receiver`
/// table inside the process-wide configuration document.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ReceiverConfig {
    pub interfaces: Interfaces,
    pub pool: Pool,
    pub esmtp: Esmtp,
    pub errors: Errors,
    pub tls: Tls,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            interfaces: Interfaces::default(),
            pool: Pool::default(),
            esmtp: Esmtp::default(),
            errors: Errors::default(),
            tls: Tls::default(),
        }
    }
}

/// Listening sockets per §4.1: cleartext relay (25), cleartext submission
/// requiring STARTTLS (587), implicit-TLS submission (465).
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Interfaces {
    pub addr: Vec<std::net::SocketAddr>,
    pub addr_submission: Vec<std::net::SocketAddr>,
    pub addr_submissions: Vec<std::net::SocketAddr>,
}

/// Bounded worker pool sizing, one instance per interface group (cleartext
/// vs. implicit-TLS, per §4.1).
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Pool {
    pub min: usize,
    pub max: usize,
    #[serde(with = "humantime_serde")]
    pub idle_keep_alive: std::time::Duration,
    pub backlog: usize,
}

impl Default for Pool {
    fn default() -> Self {
        Self {
            min: 1,
            max: 64,
            idle_keep_alive: std::time::Duration::from_secs(30),
            backlog: 128,
        }
    }
}

/// Session-fatal limits per §4.1 step 4.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Errors {
    pub transaction_count_max: u32,
    pub error_count_max: u32,
}

impl Default for Errors {
    fn default() -> Self {
        Self {
            transaction_count_max: 100,
            error_count_max: 10,
        }
    }
}

/// TLS parameters, shaped to feed `robin_common::tls::get_rustls_config`
/// directly.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Tls {
    pub preempt_cipherlist: bool,
    #[serde(with = "humantime_serde")]
    pub handshake_timeout: std::time::Duration,
    pub protocol_version: Vec<ProtocolVersion>,
    pub cipher_suite: Vec<CipherSuite>,
    pub root: Option<Secret>,
    pub r#virtual: std::collections::BTreeMap<Domain, Secret>,
}

impl Default for Tls {
    fn default() -> Self {
        Self {
            preempt_cipherlist: false,
            handshake_timeout: std::time::Duration::from_secs(5),
            protocol_version: vec![],
            cipher_suite: default_cipher_suite(),
            root: None,
            r#virtual: std::collections::BTreeMap::new(),
        }
    }
}

fn default_cipher_suite() -> Vec<CipherSuite> {
    [
        robin_protocol::rustls::CipherSuite::TLS13_AES_256_GCM_SHA384,
        robin_protocol::rustls::CipherSuite::TLS13_AES_128_GCM_SHA256,
        robin_protocol::rustls::CipherSuite::TLS13_CHACHA20_POLY1305_SHA256,
        robin_protocol::rustls::CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_256_GCM_SHA384,
        robin_protocol::rustls::CipherSuite::TLS_ECDHE_ECDSA_WITH_AES_128_GCM_SHA256,
        robin_protocol::rustls::CipherSuite::TLS_ECDHE_RSA_WITH_AES_256_GCM_SHA384,
        robin_protocol::rustls::CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
    ]
    .into_iter()
    .map(CipherSuite)
    .collect()
}

/// Extended SMTP options advertised on EHLO, per §4.2.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Esmtp {
    pub auth: Option<Auth>,
    pub starttls: bool,
    pub pipelining: bool,
    pub chunking: bool,
    pub size: usize,
    pub dsn: bool,
}

impl Default for Esmtp {
    fn default() -> Self {
        Self {
            auth: None,
            starttls: true,
            pipelining: true,
            chunking: true,
            size: 20_000_000,
            dsn: true,
        }
    }
}

/// AUTH policy: which mechanisms are offered and whether EHLO advertises
/// `AUTH` only after TLS is active.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Auth {
    pub mechanisms: Vec<robin_protocol::auth::Mechanism>,
    pub auth_requires_tls: bool,
    pub attempt_count_max: u32,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            mechanisms: vec![robin_protocol::auth::Mechanism::Plain, robin_protocol::auth::Mechanism::Login],
            auth_requires_tls: true,
            attempt_count_max: 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReceiverConfig;

    #[test]
    fn defaults_deny_unknown_fields_but_accept_empty_document() {
        let parsed: ReceiverConfig = toml::from_str("").unwrap();
        assert_eq!(parsed.pool.max, 64);
        assert!(parsed.esmtp.starttls);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = toml::from_str::<ReceiverConfig>("typo = true").unwrap_err();
        assert!(err.message().contains("unknown field"));
    }
}
