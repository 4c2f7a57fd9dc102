/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

pub mod bot_binding;
pub mod delivery_attempt;
pub mod dns_resolver;
pub mod envelope;
pub mod error;
pub mod extensions;
pub mod libc;
pub mod proxy_rule;
pub mod relay_job;
pub mod response;
pub mod scan_result;
pub mod security_policy;
pub mod serde_helper;
pub mod session;
pub mod tls;

pub use time;
pub use trust_dns_resolver;
pub use uuid;

pub use bot_binding::BotBinding;
pub use envelope::{Envelope, HeaderPlacement, Mailbox, NotifyOn, Payload, Recipient};
pub use proxy_rule::{NonMatchAction, ProxyRule, RelayProtocol};
pub use relay_job::RelayJob;
pub use scan_result::ScanResult;
pub use security_policy::SecurityPolicy;
pub use session::Session;

/// Configure the global [`tracing`] subscriber from a per-target level map
/// plus a default level, and install a panic hook that logs through it.
pub fn init_logs(
    levels: std::collections::BTreeMap<String, tracing::level_filters::LevelFilter>,
    default_level: tracing::level_filters::LevelFilter,
) {
    use tracing_subscriber::prelude::*;

    let filter = tracing_subscriber::filter::Targets::new()
        .with_targets(levels)
        .with_default(default_level);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(filter))
        .init();

    std::panic::set_hook(Box::new(|e| {
        tracing::error!(?e, "panic occurred");
    }));
}
