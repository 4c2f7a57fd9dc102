/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! The Listener + Session (§4.1) and the per-command protocol state machine
//! (§4.2): bounded accept pools, the command loop, STARTTLS, AUTH, and the
//! RCPT ordering that feeds the storage-processor chain on DATA/BDAT.

pub mod smtp {
    pub mod config;
    pub mod proxy_client;
    pub mod server;
    pub mod session;
}
