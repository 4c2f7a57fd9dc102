/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! RFC 8461 MTA-STS policy fetch plus the §4.7 per-host policy decision
//! (`DANE` > `MtaSts` > `Opportunistic`) and the matching `rustls` client
//! configurations: a custom verifier for DANE, Web PKI via `webpki-roots`
//! otherwise.

use crate::mx::{MxHost, MxSecurity, TlsaRecord};
use robin_protocol::rustls;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyMode {
    Enforce,
    Testing,
}

#[derive(Debug, Clone)]
pub struct MtaStsPolicy {
    pub mode: PolicyMode,
    pub mx_patterns: Vec<String>,
}

#[derive(Debug, Clone)]
pub enum TlsPolicy {
    Dane(Vec<TlsaRecord>),
    MtaSts(MtaStsPolicy),
    Opportunistic,
}

impl TlsPolicy {
    #[must_use]
    pub const fn tls_mandatory(&self) -> bool {
        matches!(self, Self::Dane(_) | Self::MtaSts(MtaStsPolicy { mode: PolicyMode::Enforce, .. }))
    }
}

pub struct TlsPolicyEnforcer {
    http: reqwest::blocking::Client,
    enabled: bool,
}

impl TlsPolicyEnforcer {
    #[must_use]
    pub fn new(enabled: bool, fetch_timeout: std::time::Duration) -> Self {
        Self {
            http: reqwest::blocking::Client::builder().timeout(fetch_timeout).build().unwrap_or_default(),
            enabled,
        }
    }

    /// Decide the enforcement policy for one MX host of `domain`, per
    /// §4.7: DANE wins outright; otherwise a valid, host-matching MTA-STS
    /// policy applies; otherwise opportunistic.
    #[must_use]
    pub fn decide(&self, domain: &str, host: &MxHost) -> TlsPolicy {
        match &host.security {
            MxSecurity::Dane(records) => TlsPolicy::Dane(records.clone()),
            MxSecurity::OpportunisticOrSts => self
                .fetch_policy(domain)
                .filter(|policy| policy.mx_patterns.iter().any(|pattern| host_matches(pattern, &host.hostname)))
                .map_or(TlsPolicy::Opportunistic, TlsPolicy::MtaSts),
        }
    }

    fn fetch_policy(&self, domain: &str) -> Option<MtaStsPolicy> {
        if !self.enabled {
            return None;
        }
        let url = format!("https://mta-sts.{domain}/.well-known/mta-sts.txt");
        let body = self.http.get(&url).send().ok()?.error_for_status().ok()?.text().ok()?;
        parse_policy(&body)
    }
}

fn parse_policy(body: &str) -> Option<MtaStsPolicy> {
    let mut mode = None;
    let mut mx_patterns = Vec::new();
    let mut version_ok = false;

    for line in body.lines() {
        let (key, value) = line.split_once(':')?;
        let (key, value) = (key.trim(), value.trim());
        match key {
            "version" if value == "STSv1" => version_ok = true,
            "mode" => {
                mode = match value {
                    "enforce" => Some(PolicyMode::Enforce),
                    "testing" => Some(PolicyMode::Testing),
                    _ => None,
                }
            }
            "mx" => mx_patterns.push(value.to_lowercase()),
            _ => {}
        }
    }

    if version_ok && !mx_patterns.is_empty() {
        mode.map(|mode| MtaStsPolicy { mode, mx_patterns })
    } else {
        None
    }
}

/// RFC 8461 §4.1: `*.example.com` matches exactly one leftmost label, it
/// never matches the bare domain itself.
fn host_matches(pattern: &str, hostname: &str) -> bool {
    pattern.strip_prefix("*.").map_or_else(
        || pattern == hostname,
        |suffix| {
            hostname
                .strip_suffix(suffix)
                .is_some_and(|prefix| prefix.ends_with('.') && prefix.len() > 1 && !prefix[..prefix.len() - 1].contains('.'))
        },
    )
}

struct DaneVerifier {
    records: Vec<TlsaRecord>,
}

impl rustls::client::ServerCertVerifier for DaneVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &rustls::Certificate,
        _intermediates: &[rustls::Certificate],
        _server_name: &rustls::ServerName,
        _scts: &mut dyn Iterator<Item = &[u8]>,
        _ocsp_response: &[u8],
        _now: std::time::SystemTime,
    ) -> Result<rustls::client::ServerCertVerified, rustls::Error> {
        if self.records.iter().any(|record| record.matches_der(&end_entity.0)) {
            Ok(rustls::client::ServerCertVerified::assertion())
        } else {
            Err(rustls::Error::General("no TLSA record matched the presented certificate".to_owned()))
        }
    }
}

fn webpki_roots() -> rustls::RootCertStore {
    let mut roots = rustls::RootCertStore::empty();
    roots.add_trust_anchors(webpki_roots::TLS_SERVER_ROOTS.iter().map(|ta| {
        rustls::OwnedTrustAnchor::from_subject_spki_name_constraints(ta.subject, ta.spki, ta.name_constraints)
    }));
    roots
}

/// Build the `rustls` client configuration matching `policy`: a DANE
/// trust-on-TLSA verifier, or ordinary Web PKI for everything else.
#[must_use]
pub fn client_config(policy: &TlsPolicy) -> rustls::ClientConfig {
    match policy {
        TlsPolicy::Dane(records) => rustls::ClientConfig::builder()
            .with_safe_defaults()
            .with_custom_certificate_verifier(Arc::new(DaneVerifier { records: records.clone() }))
            .with_no_client_auth(),
        TlsPolicy::MtaSts(_) | TlsPolicy::Opportunistic => {
            rustls::ClientConfig::builder().with_safe_defaults().with_root_certificates(webpki_roots()).with_no_client_auth()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{host_matches, parse_policy, PolicyMode};

    #[test]
    fn wildcard_matches_one_label_only() {
        assert!(host_matches("*.mail.example.com", "mx1.mail.example.com"));
        assert!(!host_matches("*.mail.example.com", "mx1.sub.mail.example.com"));
        assert!(!host_matches("*.mail.example.com", "mail.example.com"));
    }

    #[test]
    fn exact_pattern_requires_exact_host() {
        assert!(host_matches("mail.example.com", "mail.example.com"));
        assert!(!host_matches("mail.example.com", "mx1.mail.example.com"));
    }

    #[test]
    fn parses_minimal_policy() {
        let policy = parse_policy("version: STSv1\nmode: enforce\nmx: mail.example.com\nmax_age: 604800\n").unwrap();
        assert_eq!(policy.mode, PolicyMode::Enforce);
        assert_eq!(policy.mx_patterns, vec!["mail.example.com".to_owned()]);
    }

    #[test]
    fn rejects_missing_version() {
        assert!(parse_policy("mode: enforce\nmx: mail.example.com\n").is_none());
    }
}
