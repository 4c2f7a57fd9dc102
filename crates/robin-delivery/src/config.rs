/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::tls::{Requirement, Tls};

/// Configuration for the outbound delivery path, loaded as a `delivery`
/// table inside the process-wide configuration document.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct DeliveryConfig {
    /// Name used in the EHLO sent to remote MX hosts.
    pub ehlo_name: String,
    /// Global override of the per-host DANE/MTA-STS/opportunistic policy
    /// decided per §4.7. `Optional` (the default) passes that decision
    /// through unchanged; `Required` raises every host to mandatory TLS;
    /// `Disabled` never attempts STARTTLS, for driving a staging
    /// deployment against a plaintext test MX.
    pub tls: Tls,
    pub mta_sts: MtaSts,
    #[serde(with = "humantime_serde")]
    pub connect_timeout: std::time::Duration,
    #[serde(with = "humantime_serde")]
    pub command_timeout: std::time::Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            ehlo_name: "robin.example.com".to_owned(),
            tls: Tls { starttls: Requirement::Optional },
            mta_sts: MtaSts::default(),
            connect_timeout: std::time::Duration::from_secs(30),
            command_timeout: std::time::Duration::from_secs(300),
        }
    }
}

/// Policy knobs for the RFC 8461 MTA-STS lookup done per §4.7.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MtaSts {
    pub enabled: bool,
    #[serde(with = "humantime_serde")]
    pub fetch_timeout: std::time::Duration,
}

impl Default for MtaSts {
    fn default() -> Self {
        Self {
            enabled: true,
            fetch_timeout: std::time::Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::DeliveryConfig;

    #[test]
    fn defaults_deny_unknown_fields_but_accept_empty_document() {
        let parsed: DeliveryConfig = toml::from_str("").unwrap();
        assert!(parsed.mta_sts.enabled);
        assert_eq!(parsed.connect_timeout, std::time::Duration::from_secs(30));
        assert!(matches!(parsed.tls.starttls, crate::tls::Requirement::Optional));
    }
}
