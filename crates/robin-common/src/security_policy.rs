/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// A single DANE TLSA record constraint.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TlsaRecord {
    pub usage: u8,
    pub selector: u8,
    pub matching_type: u8,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum MtaStsMode {
    Enforce,
    Testing,
}

/// Security policy chosen for one outbound delivery attempt to a given MX
/// host, derived from DNS+HTTPS at MX-resolution time.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum SecurityPolicy {
    Dane {
        records: Vec<TlsaRecord>,
    },
    MtaSts {
        mode: MtaStsMode,
        mx_patterns: Vec<String>,
        max_age: std::time::Duration,
    },
    Opportunistic,
}

impl SecurityPolicy {
    /// Whether this policy requires a TLS handshake to succeed at all.
    #[must_use]
    pub const fn tls_mandatory(&self) -> bool {
        !matches!(self, Self::Opportunistic)
    }

    /// Whether a hostname is permitted by an enforce-mode MTA-STS policy's
    /// MX patterns (`*.example.com` style wildcard prefix).
    #[must_use]
    pub fn mx_hostname_allowed(&self, hostname: &str) -> bool {
        match self {
            Self::MtaSts { mx_patterns, .. } => mx_patterns.iter().any(|pattern| {
                pattern.strip_prefix("*.").map_or_else(
                    || pattern.eq_ignore_ascii_case(hostname),
                    |suffix| {
                        hostname.eq_ignore_ascii_case(suffix)
                            || hostname
                                .to_ascii_lowercase()
                                .ends_with(&format!(".{}", suffix.to_ascii_lowercase()))
                    },
                )
            }),
            Self::Dane { .. } | Self::Opportunistic => true,
        }
    }
}
