/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Wires [`SecureMxResolver`] + [`TlsPolicyEnforcer`] + [`HostExchange`]
//! into a [`robin_queue::Deliverer`] handling
//! [`robin_common::relay_job::Protocol::Remote`] jobs. `Lda` jobs are not
//! this crate's concern: `robin_working::processors::local_delivery`
//! already handles maildir/LDA delivery in-session, at DATA time.

use crate::config::DeliveryConfig;
use crate::mx::SecureMxResolver;
use crate::smtp_client::{ExchangeError, HostExchange};
use crate::tls_policy::TlsPolicyEnforcer;
use robin_common::envelope::{Envelope, Payload, Recipient};
use robin_common::proxy_rule::RelayProtocol;
use robin_common::relay_job::Protocol;
use robin_common::RelayJob;
use robin_queue::{DeliveryOutcome, FailedRecipient};
use std::collections::BTreeMap;

const DEFAULT_SMTP_PORT: u16 = 25;
const DEFAULT_LMTP_PORT: u16 = 24;

fn read_payload(envelope: &Envelope) -> std::io::Result<Vec<u8>> {
    match &envelope.payload {
        Some(Payload::Path(path)) => std::fs::read(path),
        Some(Payload::Memory(bytes)) => Ok(bytes.as_ref().clone()),
        None => Ok(Vec::new()),
    }
}

pub struct RemoteDeliverer {
    resolver: SecureMxResolver,
    tls: TlsPolicyEnforcer,
    config: DeliveryConfig,
}

impl RemoteDeliverer {
    #[must_use]
    pub fn new(resolver: SecureMxResolver, config: DeliveryConfig) -> Self {
        let tls = TlsPolicyEnforcer::new(config.mta_sts.enabled, config.mta_sts.fetch_timeout);
        Self { resolver, tls, config }
    }

    fn deliver_envelope(&self, envelope: &Envelope, protocol: RelayProtocol) -> DeliveryOutcome {
        let Some(reverse_path) = &envelope.reverse_path else {
            return DeliveryOutcome::Delivered;
        };

        let body = read_payload(envelope).unwrap_or_default();
        let mut by_domain: BTreeMap<String, Vec<&Recipient>> = BTreeMap::new();
        for recipient in &envelope.recipients {
            by_domain.entry(recipient.forward_path.domain().to_utf8().to_lowercase()).or_default().push(recipient);
        }

        let mut failed = Vec::new();
        for (domain, recipients) in by_domain {
            failed.extend(self.deliver_to_domain(&domain, reverse_path.full(), &recipients, &body, protocol));
        }

        if failed.is_empty() {
            DeliveryOutcome::Delivered
        } else {
            DeliveryOutcome::Failed(failed)
        }
    }

    fn deliver_to_domain(
        &self,
        domain: &str,
        reverse_path: &str,
        recipients: &[&Recipient],
        body: &[u8],
        protocol: RelayProtocol,
    ) -> Vec<FailedRecipient> {
        let route = match self.resolver.resolve(domain) {
            Ok(route) => route,
            Err(error) => {
                return recipients
                    .iter()
                    .map(|r| FailedRecipient {
                        recipient: (*r).clone(),
                        status: "4.4.4".to_owned(),
                        diagnostic_code: Some(error.to_string()),
                        remote_mta: None,
                    })
                    .collect();
            }
        };

        let port = if protocol == RelayProtocol::Lmtp { DEFAULT_LMTP_PORT } else { DEFAULT_SMTP_PORT };
        let mut pending: Vec<String> = recipients.iter().map(|r| r.forward_path.full().to_owned()).collect();
        let mut failures: Vec<(String, String, Option<String>, Option<String>)> = Vec::new();

        for host in &route.hosts {
            if pending.is_empty() {
                break;
            }
            if host.addrs.is_empty() {
                continue;
            }

            let policy = self.tls.decide(domain, host);
            let exchange = HostExchange::open(
                host,
                port,
                &self.config.ehlo_name,
                &policy,
                self.config.tls.starttls.clone(),
                self.config.connect_timeout,
            );

            let mut exchange = match exchange {
                Ok(exchange) => exchange,
                Err(ExchangeError::Network { .. }) => continue,
                Err(ExchangeError::Policy { reason, .. }) => {
                    tracing::warn!(host = %host.hostname, %reason, "TLS policy violation, not retrying this host");
                    continue;
                }
            };

            let result = match exchange.deliver(reverse_path, &pending, body, protocol) {
                Ok(result) => result,
                Err(ExchangeError::Network { .. }) => continue,
                Err(ExchangeError::Policy { reason, .. }) => {
                    tracing::warn!(host = %host.hostname, %reason, "TLS policy violation during delivery");
                    continue;
                }
            };
            exchange.quit();

            for (recipient, reply) in result.rejected {
                if reply.code / 100 == 5 {
                    pending.retain(|p| p != &recipient);
                    failures.push((recipient, "5.0.0".to_owned(), Some(reply.text), Some(host.hostname.clone())));
                }
                // 4xx (transient) recipients stay pending and are retried against the next MX.
            }
            pending.retain(|p| !result.accepted.contains(p));
        }

        for recipient in pending {
            failures.push((recipient, "4.4.7".to_owned(), Some("delivery timed out across all MX hosts".to_owned()), None));
        }

        failures
            .into_iter()
            .filter_map(|(address, status, diagnostic_code, remote_mta)| {
                recipients.iter().find(|r| r.forward_path.full() == address).map(|r| FailedRecipient {
                    recipient: (*r).clone(),
                    status,
                    diagnostic_code,
                    remote_mta,
                })
            })
            .collect()
    }
}

impl robin_queue::Deliverer for RemoteDeliverer {
    fn deliver(&self, job: &RelayJob) -> Vec<DeliveryOutcome> {
        let Protocol::Remote(protocol) = &job.protocol else {
            return job.envelopes.iter().map(|_| DeliveryOutcome::Delivered).collect();
        };
        job.envelopes.iter().map(|envelope| self.deliver_envelope(envelope, *protocol)).collect()
    }
}
