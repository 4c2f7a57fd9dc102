/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! MX resolution and per-host TLSA lookup described in §4.7: the MX set is
//! ordered by preference then lowercased hostname, and the ordered list is
//! fingerprinted so the cron can tell whether a route changed between
//! attempts.

use sha2::Digest;
use std::net::IpAddr;
use trust_dns_proto::rr::rdata::tlsa::{Matching, Selector, TLSA};
use trust_dns_proto::rr::{RData, RecordType};
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::Resolver;

#[derive(Debug, thiserror::Error)]
pub enum MxError {
    #[error("DNS resolution failed: {0}")]
    Resolve(#[from] trust_dns_resolver::error::ResolveError),
    #[error("{domain} has no usable MX or fallback A/AAAA record")]
    NoRoute { domain: String },
}

/// One usable TLSA association for a host, restricted to full-certificate
/// matching (selector `Full`); SPKI-selector records are not verifiable
/// without a full X.509 parser and are skipped with a warning.
#[derive(Debug, Clone)]
pub struct TlsaRecord {
    pub usage: u8,
    pub matching: Matching,
    pub cert_data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum MxSecurity {
    Dane(Vec<TlsaRecord>),
    OpportunisticOrSts,
}

#[derive(Debug, Clone)]
pub struct MxHost {
    pub hostname: String,
    pub preference: u16,
    pub addrs: Vec<IpAddr>,
    pub security: MxSecurity,
}

#[derive(Debug, Clone)]
pub struct Route {
    pub domain: String,
    pub hosts: Vec<MxHost>,
    /// Stable SHA-256 fingerprint of the canonical (ordered) host list, so
    /// the cron can detect that a retried route no longer matches what the
    /// previous attempt observed.
    pub fingerprint: String,
}

pub struct SecureMxResolver {
    resolver: Resolver,
}

impl SecureMxResolver {
    /// # Errors
    ///
    /// Returns [`MxError::Resolve`] if the system resolver configuration
    /// cannot be read or the resolver cannot be built.
    pub fn system() -> Result<Self, MxError> {
        Ok(Self {
            resolver: Resolver::from_system_conf()?,
        })
    }

    /// # Errors
    ///
    /// Returns [`MxError::Resolve`] if the resolver cannot be built from
    /// the given configuration.
    pub fn with_config(config: ResolverConfig, options: ResolverOpts) -> Result<Self, MxError> {
        Ok(Self { resolver: Resolver::new(config, options)? })
    }

    /// Resolve the ordered, TLSA-annotated MX set for `domain` per §4.7:
    /// sorted by preference ascending, ties broken by lowercased hostname
    /// ascending; falls back to the bare domain (an implicit MX 0) when no
    /// MX record exists but an A/AAAA does.
    ///
    /// # Errors
    ///
    /// Returns [`MxError`] if DNS resolution fails outright or the domain
    /// has no usable destination at all.
    pub fn resolve(&self, domain: &str) -> Result<Route, MxError> {
        let mut exchanges = match self.resolver.mx_lookup(domain) {
            Ok(lookup) => lookup
                .iter()
                .map(|mx| (mx.preference(), mx.exchange().to_utf8().trim_end_matches('.').to_lowercase()))
                .collect::<Vec<_>>(),
            Err(error) if matches!(error.kind(), trust_dns_resolver::error::ResolveErrorKind::NoRecordsFound { .. }) => {
                Vec::new()
            }
            Err(error) => return Err(MxError::from(error)),
        };

        if exchanges.is_empty() {
            if self.resolver.lookup_ip(domain).is_ok() {
                exchanges.push((0, domain.to_lowercase()));
            } else {
                return Err(MxError::NoRoute { domain: domain.to_owned() });
            }
        }

        exchanges.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        exchanges.dedup();

        let mut hosts = Vec::with_capacity(exchanges.len());
        for (preference, hostname) in exchanges {
            let addrs = self
                .resolver
                .lookup_ip(&hostname)
                .map(|lookup| lookup.iter().collect())
                .unwrap_or_default();
            let security = self.tlsa_security(&hostname);
            hosts.push(MxHost { hostname, preference, addrs, security });
        }

        let fingerprint = fingerprint(&hosts);
        Ok(Route { domain: domain.to_owned(), hosts, fingerprint })
    }

    fn tlsa_security(&self, hostname: &str) -> MxSecurity {
        let name = format!("_25._tcp.{hostname}.");
        let records = match self.resolver.lookup(name, RecordType::TLSA) {
            Ok(lookup) => lookup
                .record_iter()
                .filter_map(|record| match record.data() {
                    Some(RData::TLSA(tlsa)) => Some(tlsa.clone()),
                    _ => None,
                })
                .filter_map(tlsa_to_record)
                .collect::<Vec<_>>(),
            Err(_) => Vec::new(),
        };

        if records.is_empty() {
            MxSecurity::OpportunisticOrSts
        } else {
            MxSecurity::Dane(records)
        }
    }
}

fn tlsa_to_record(tlsa: TLSA) -> Option<TlsaRecord> {
    if *tlsa.selector() != Selector::Full {
        tracing::warn!("skipping TLSA record with unsupported selector (SPKI matching requires X.509 parsing)");
        return None;
    }
    Some(TlsaRecord {
        usage: u8::from(*tlsa.cert_usage()),
        matching: *tlsa.matching(),
        cert_data: tlsa.cert_data().to_vec(),
    })
}

fn fingerprint(hosts: &[MxHost]) -> String {
    let mut hasher = sha2::Sha256::new();
    for host in hosts {
        hasher.update(host.preference.to_be_bytes());
        hasher.update(host.hostname.as_bytes());
        hasher.update([0u8]);
    }
    hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect()
}

impl TlsaRecord {
    /// Whether the peer's end-entity certificate (DER-encoded) satisfies
    /// this association, per RFC 6698 §2.1.1/§2.1.2 full-certificate
    /// matching.
    #[must_use]
    pub fn matches_der(&self, cert_der: &[u8]) -> bool {
        match self.matching {
            Matching::Raw => self.cert_data == cert_der,
            Matching::Sha256 => sha2::Sha256::digest(cert_der).as_slice() == self.cert_data.as_slice(),
            Matching::Sha512 => sha2::Sha512::digest(cert_der).as_slice() == self.cert_data.as_slice(),
            _ => false,
        }
    }
}
