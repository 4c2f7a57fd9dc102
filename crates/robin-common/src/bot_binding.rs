/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

/// Authorization rule for a bot (sieve-addressed automated reply sender).
/// An empty `allowed_ips` and empty `allowed_tokens` means unrestricted.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct BotBinding {
    pub address_pattern: String,
    pub allowed_ips: Vec<ipnet::IpNet>,
    pub allowed_tokens: Vec<String>,
    pub bot_name: String,
}

impl BotBinding {
    /// Authorization succeeds when the source IP matches any allowed entry,
    /// or the recipient local-part carries a matching `+token` suffix.
    #[must_use]
    pub fn authorizes(&self, peer: std::net::IpAddr, local_part_token: Option<&str>) -> bool {
        if self.allowed_ips.is_empty() && self.allowed_tokens.is_empty() {
            return true;
        }
        if self.allowed_ips.iter().any(|net| net.contains(&peer)) {
            return true;
        }
        local_part_token.is_some_and(|token| self.allowed_tokens.iter().any(|t| t == token))
    }

    /// Extract the sieve `+token` segment from a local-part, e.g.
    /// `bot+tok+user` → `Some("tok")` (the first `+`-delimited segment).
    #[must_use]
    pub fn sieve_token(local_part: &str) -> Option<&str> {
        local_part.split_once('+').map(|(_, rest)| {
            rest.split_once('+').map_or(rest, |(token, _)| token)
        })
    }

    #[must_use]
    pub fn find_match<'a>(
        bindings: &'a [Self],
        address_local_part: &str,
        peer: std::net::IpAddr,
    ) -> Option<&'a Self> {
        let token = Self::sieve_token(address_local_part);
        bindings.iter().find(|binding| {
            regex_lite::Regex::new(&binding.address_pattern)
                .map(|re| re.is_match(address_local_part))
                .unwrap_or(false)
                && binding.authorizes(peer, token)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_sieve_token() {
        assert_eq!(BotBinding::sieve_token("bot+tok+user+dom.com"), Some("tok"));
        assert_eq!(BotBinding::sieve_token("bot"), None);
    }

    #[test]
    fn unrestricted_when_empty() {
        let binding = BotBinding {
            address_pattern: "^bot".to_owned(),
            allowed_ips: vec![],
            allowed_tokens: vec![],
            bot_name: "diag".to_owned(),
        };
        assert!(binding.authorizes("203.0.113.1".parse().unwrap(), None));
    }
}
