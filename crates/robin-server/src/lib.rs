/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! Process wiring for the Robin mail transfer agent: loads `robin.toml`,
//! assembles the storage-processor chain, and runs the SMTP listener
//! alongside the queue-retry cron until shutdown.

pub mod backend;
pub mod bot_analyzer;
pub mod cli;
pub mod config;
pub mod local_users;
