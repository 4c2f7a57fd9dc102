/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

pub mod av;
pub mod bot_dispatch;
pub mod local_delivery;
pub mod proxy_stream;
pub mod queue_decision;
pub mod spam;
pub mod webhook;

pub use av::AvProcessor;
pub use bot_dispatch::{BotAnalyzer, BotDispatchProcessor};
pub use local_delivery::{LocalDelivery, LocalDeliveryProcessor, LocalUserResolver};
pub use proxy_stream::{ProxyConnection, ProxyConnections, ProxyStreamProcessor};
pub use queue_decision::QueueDecisionProcessor;
pub use spam::{RspamdClient, SpamProcessor};
pub use webhook::{WebhookConfig, WebhookRawProcessor};
