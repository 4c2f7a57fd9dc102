/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! A flat address-to-delivery table, the only [`LocalUserResolver`] this
//! binary ships with (an external directory lookup would implement the
//! same trait but live outside this crate).

use crate::config::{LocalDeliveryKind, LocalUserEntry};
use robin_protocol::Address;
use robin_working::processors::{LocalDelivery, LocalUserResolver};
use std::collections::HashMap;

pub struct TableLocalUserResolver {
    table: HashMap<String, LocalDelivery>,
}

impl TableLocalUserResolver {
    #[must_use]
    pub fn from_entries(entries: &[LocalUserEntry]) -> Self {
        let table = entries
            .iter()
            .map(|entry| (entry.address.to_lowercase(), LocalDelivery::from(&entry.delivery)))
            .collect();
        Self { table }
    }
}

impl From<&LocalDeliveryKind> for LocalDelivery {
    fn from(kind: &LocalDeliveryKind) -> Self {
        match kind {
            LocalDeliveryKind::Maildir { path } => Self::Maildir(path.clone()),
            LocalDeliveryKind::Lda { binary, args, timeout } => Self::Lda {
                binary: binary.clone(),
                args: args.clone(),
                timeout: *timeout,
            },
        }
    }
}

impl LocalUserResolver for TableLocalUserResolver {
    fn resolve(&self, mailbox: &Address) -> Option<LocalDelivery> {
        self.table.get(&mailbox.full().to_lowercase()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::TableLocalUserResolver;
    use crate::config::{LocalDeliveryKind, LocalUserEntry};
    use robin_working::processors::{LocalDelivery, LocalUserResolver};
    use std::str::FromStr;

    #[test]
    fn matches_are_case_insensitive() {
        let resolver = TableLocalUserResolver::from_entries(&[LocalUserEntry {
            address: "Alice@Example.com".to_owned(),
            delivery: LocalDeliveryKind::Maildir { path: "/var/mail/alice".into() },
        }]);
        let mailbox = robin_protocol::Address::from_str("alice@example.com").unwrap();
        assert!(matches!(resolver.resolve(&mailbox), Some(LocalDelivery::Maildir(_))));
    }

    #[test]
    fn unknown_address_falls_through() {
        let resolver = TableLocalUserResolver::from_entries(&[]);
        let mailbox = robin_protocol::Address::from_str("nobody@example.com").unwrap();
        assert!(resolver.resolve(&mailbox).is_none());
    }
}
