/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! The durable retry queue: a pluggable `QueueBackend`, the retry/bounce
//! scheduler (`QueueCron`), and the DSN bounce message builder.

mod backend;
mod bounce;
mod cron;
mod file_backend;
mod memory_backend;
mod spool;

pub use backend::{validate_table_name, QueueBackend, QueueError};
pub use bounce::BounceBuilder;
pub use cron::{CronConfig, Deliverer, DeliveryOutcome, FailedRecipient, QueueCron};
pub use file_backend::FileBackend;
pub use memory_backend::MemoryBackend;
pub use spool::{persist_payload, queue_payload_path};
