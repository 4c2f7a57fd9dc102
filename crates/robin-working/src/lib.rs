/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! The post-DATA storage-processor chain described in §4.3: antivirus,
//! spam scoring, the raw webhook, bot dispatch, local delivery, proxy
//! streaming, and the final queue-or-relay decision. Invoked in-process by
//! whatever owns the SMTP/LMTP session once DATA/BDAT completes.

pub mod chain;
pub mod message_id;
pub mod payload;
pub mod policy;
pub mod processors;

pub use chain::{Chain, StorageOutcome, StorageProcessor};
pub use policy::ScanPolicy;
