/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

//! The top-level `robin.toml` configuration aggregating every other
//! crate's config table, following `robin_config::FileConfig`'s shape and
//! `#[serde(deny_unknown_fields, default)]` convention.

use robin_common::bot_binding::BotBinding;
use robin_common::proxy_rule::ProxyRule;
use robin_config::{Config, Logs, Queues};
use robin_delivery::config::DeliveryConfig;
use robin_receiver::smtp::config::ReceiverConfig;
use robin_working::policy::ScanPolicy;

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct ServerConfig {
    #[serde(default = "ServerConfig::default_hostname")]
    pub hostname: String,
    #[serde(default = "ServerConfig::default_storage")]
    pub storage: std::path::PathBuf,
    pub logs: Logs,
    pub queues: Queues,
    pub receiver: ReceiverConfig,
    pub delivery: DeliveryConfig,
    pub queue_backend: QueueBackendConfig,
    pub cron: CronSettings,
    pub users: Vec<UserEntry>,
    pub local_users: Vec<LocalUserEntry>,
    pub antivirus: Option<AntivirusSettings>,
    pub spam: Option<SpamSettings>,
    pub webhook: Option<WebhookSettings>,
    pub bot_bindings: Vec<BotBinding>,
    pub proxy_rules: Vec<ProxyRule>,
    #[serde(skip)]
    path: std::path::PathBuf,
}

impl ServerConfig {
    fn default_hostname() -> String {
        hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_owned())
    }

    fn default_storage() -> std::path::PathBuf {
        std::path::PathBuf::from("/var/spool/robin")
    }

    /// Resolve a spool-relative path against [`Self::storage`], mirroring
    /// `robin_config::FileConfig::spool_path`.
    #[must_use]
    pub fn spool_path(&self, name: &str) -> std::path::PathBuf {
        self.storage.join(name)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: Self::default_hostname(),
            storage: Self::default_storage(),
            logs: Logs::default(),
            queues: Queues::default(),
            receiver: ReceiverConfig::default(),
            delivery: DeliveryConfig::default(),
            queue_backend: QueueBackendConfig::default(),
            cron: CronSettings::default(),
            users: Vec::new(),
            local_users: Vec::new(),
            antivirus: None,
            spam: None,
            webhook: None,
            bot_bindings: Vec::new(),
            proxy_rules: Vec::new(),
            path: std::path::PathBuf::new(),
        }
    }
}

impl Config for ServerConfig {
    fn with_path(&mut self, path: &impl AsRef<std::path::Path>) {
        self.path = path.as_ref().to_path_buf();
    }

    fn hostname(&self) -> &str {
        &self.hostname
    }

    fn logs(&self) -> &Logs {
        &self.logs
    }

    fn queues(&self) -> &Queues {
        &self.queues
    }

    fn path(&self) -> &std::path::Path {
        &self.path
    }
}

/// Which of `robin-queue`'s backends to use; only one is active per
/// process, per §4.5's file → SQL → Redis → in-memory precedence.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum QueueBackendConfig {
    /// Testing/staging only: nothing survives a process restart.
    Memory,
    File { dir: std::path::PathBuf },
    Redis {
        url: String,
        #[serde(with = "humantime_serde")]
        timeout: std::time::Duration,
        connections: u32,
        key: String,
    },
    Sqlite {
        path: std::path::PathBuf,
        #[serde(with = "humantime_serde")]
        timeout: std::time::Duration,
        connections: u32,
        table: String,
    },
}

impl Default for QueueBackendConfig {
    fn default() -> Self {
        Self::Memory
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct CronSettings {
    pub period_seconds: u64,
    pub initial_delay_seconds: u64,
    pub max_dequeue_per_tick: usize,
    pub first_wait_minutes: f64,
    pub growth_factor: f64,
    pub max_retries: u32,
    /// Relative to [`ServerConfig::storage`] unless absolute; empty means
    /// `storage/queue`.
    pub queue_dir: std::path::PathBuf,
}

impl Default for CronSettings {
    fn default() -> Self {
        let defaults = robin_queue::CronConfig::default();
        Self {
            period_seconds: defaults.period_seconds,
            initial_delay_seconds: defaults.initial_delay_seconds,
            max_dequeue_per_tick: defaults.max_dequeue_per_tick,
            first_wait_minutes: defaults.first_wait_minutes,
            growth_factor: defaults.growth_factor,
            max_retries: defaults.max_retries,
            queue_dir: std::path::PathBuf::new(),
        }
    }
}

impl CronSettings {
    #[must_use]
    pub fn to_cron_config(&self, default_dir: &std::path::Path) -> robin_queue::CronConfig {
        let queue_dir = if self.queue_dir.as_os_str().is_empty() {
            default_dir.to_path_buf()
        } else {
            self.queue_dir.clone()
        };
        robin_queue::CronConfig {
            period_seconds: self.period_seconds,
            initial_delay_seconds: self.initial_delay_seconds,
            max_dequeue_per_tick: self.max_dequeue_per_tick,
            first_wait_minutes: self.first_wait_minutes,
            growth_factor: self.growth_factor,
            max_retries: self.max_retries,
            queue_dir,
        }
    }
}

/// A plaintext username/password pair loaded into `robin_auth::UserTable`
/// at startup. Hashed and salted in memory immediately; never logged.
#[derive(serde::Serialize, serde::Deserialize)]
pub struct UserEntry {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry").field("username", &self.username).finish_non_exhaustive()
    }
}

/// One entry of the local-user table consulted by
/// `robin_working::processors::local_delivery::LocalDeliveryProcessor`.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
pub struct LocalUserEntry {
    /// Matched against a recipient's full mailbox address, case-insensitively.
    pub address: String,
    pub delivery: LocalDeliveryKind,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocalDeliveryKind {
    Maildir { path: std::path::PathBuf },
    Lda {
        binary: String,
        #[serde(default)]
        args: Vec<String>,
        #[serde(with = "humantime_serde")]
        timeout: std::time::Duration,
    },
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AntivirusSettings {
    pub url: String,
    #[serde(default = "AntivirusSettings::default_max_connections")]
    pub max_connections: u32,
    pub policy: ScanPolicy,
}

impl AntivirusSettings {
    const fn default_max_connections() -> u32 {
        4
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpamSettings {
    pub url: String,
    pub threshold: f64,
    pub policy: ScanPolicy,
}

#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct WebhookSettings {
    pub url: String,
    pub base64: bool,
    pub wait_for_response: bool,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            base64: false,
            wait_for_response: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, QueueBackendConfig, ServerConfig};

    #[test]
    fn defaults_deny_unknown_fields_but_accept_empty_document() {
        let parsed: ServerConfig = toml::from_str("").unwrap();
        assert!(matches!(parsed.queue_backend, QueueBackendConfig::Memory));
        assert_eq!(parsed.cron.max_retries, 30);
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = toml::from_str::<ServerConfig>("typo = true").unwrap_err();
        assert!(err.message().contains("unknown field"));
    }

    #[test]
    fn with_path_records_the_loaded_path() {
        let mut cfg = ServerConfig::default();
        cfg.with_path(&"/etc/robin/robin.toml");
        assert_eq!(cfg.path(), std::path::Path::new("/etc/robin/robin.toml"));
    }

    #[test]
    fn file_backend_parses_from_a_tagged_table() {
        let parsed: ServerConfig = toml::from_str(
            r#"
            [queue_backend]
            kind = "file"
            dir = "/var/spool/robin/queue"
            "#,
        )
        .unwrap();
        assert!(matches!(parsed.queue_backend, QueueBackendConfig::File { .. }));
    }
}
