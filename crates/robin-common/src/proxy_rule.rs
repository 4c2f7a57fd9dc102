/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelayProtocol {
    Smtp,
    Esmtp,
    Lmtp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NonMatchAction {
    /// Fall through to other storage processors.
    None,
    /// Reply `250` locally without relaying.
    Accept,
    /// Reply `550` and stop processing the recipient.
    Reject,
}

/// A single rule deciding whether a RCPT TO address should be relayed
/// inline to an upstream host. Rules are an ordered list; only the first
/// whose patterns all match (AND) is used.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProxyRule {
    pub rcpt_pattern: String,
    pub mail_pattern: Option<String>,
    pub ehlo_pattern: Option<String>,
    pub ip_pattern: Option<ipnet::IpNet>,
    pub host: String,
    pub port: u16,
    pub protocol: RelayProtocol,
    pub tls: bool,
    pub non_match_action: NonMatchAction,
}

impl ProxyRule {
    /// Whether this rule matches a given recipient/sender/ehlo/peer tuple.
    /// All present patterns must match; absent patterns are vacuously true.
    #[must_use]
    pub fn matches(
        &self,
        rcpt: &str,
        mail: Option<&str>,
        ehlo: Option<&str>,
        peer: std::net::IpAddr,
    ) -> bool {
        let regex_matches = |pattern: &str, value: &str| {
            regex_lite::Regex::new(pattern)
                .map(|re| re.is_match(value))
                .unwrap_or(false)
        };

        let mail_ok = match (&self.mail_pattern, mail) {
            (Some(pattern), Some(mail)) => regex_matches(pattern, mail),
            (Some(_), None) => false,
            (None, _) => true,
        };
        let ehlo_ok = match (&self.ehlo_pattern, ehlo) {
            (Some(pattern), Some(ehlo)) => regex_matches(pattern, ehlo),
            (Some(_), None) => false,
            (None, _) => true,
        };
        let ip_ok = self.ip_pattern.as_ref().map_or(true, |net| net.contains(&peer));

        regex_matches(&self.rcpt_pattern, rcpt) && mail_ok && ehlo_ok && ip_ok
    }

    /// Find the first matching rule in an ordered rule list.
    #[must_use]
    pub fn find_match<'a>(
        rules: &'a [Self],
        rcpt: &str,
        mail: Option<&str>,
        ehlo: Option<&str>,
        peer: std::net::IpAddr,
    ) -> Option<(usize, &'a Self)> {
        rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(rcpt, mail, ehlo, peer))
    }
}
