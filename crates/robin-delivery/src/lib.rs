/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Secure outbound delivery (§4.7): MX resolution with per-host DANE/MTA-STS
//! classification ([`mx`]), the matching `rustls` policy decisions
//! ([`tls_policy`]), the synchronous SMTP/LMTP client exchange
//! ([`smtp_client`]), and the [`robin_queue::Deliverer`] impl that drives
//! them from the retry cron ([`deliverer`]).

pub mod config;
pub mod deliverer;
mod frequency;
pub mod mx;
pub mod smtp_client;
pub mod tls;
pub mod tls_policy;

pub use config::DeliveryConfig;
pub use deliverer::RemoteDeliverer;
pub use frequency::Frequency;
