/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

use crate::{logs::Logs, queues::Queues, Config};

/// TOML-backed [`Config`] implementation shared by the receiver, working and
/// delivery binaries.
#[derive(Debug, serde::Deserialize, serde::Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Name the server identifies itself with.
    #[serde(default = "FileConfig::default_hostname")]
    pub hostname: String,
    /// Application data location on disk (spool directories, quarantine,
    /// context dumps).
    #[serde(default = "FileConfig::default_storage")]
    pub storage: std::path::PathBuf,
    #[serde(default)]
    pub logs: Logs,
    #[serde(default)]
    pub queues: Queues,
    #[serde(skip)]
    path: std::path::PathBuf,
}

impl FileConfig {
    fn default_hostname() -> String {
        hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string())
    }

    fn default_storage() -> std::path::PathBuf {
        std::path::PathBuf::from("/var/spool/robin")
    }

    /// Resolve a spool-relative path against [`Self::storage`].
    #[must_use]
    pub fn spool_path(&self, name: &str) -> std::path::PathBuf {
        self.storage.join(name)
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            hostname: Self::default_hostname(),
            storage: Self::default_storage(),
            logs: Logs::default(),
            queues: Queues::default(),
            path: std::path::PathBuf::new(),
        }
    }
}

impl Config for FileConfig {
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

#[cfg(test)]
mod tests {
    use super::{Config, FileConfig};

    #[test]
    fn defaults_deny_unknown_fields_but_accept_empty_document() {
        let cfg: FileConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, FileConfig::default());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = toml::from_str::<FileConfig>("typo = true").unwrap_err();
        assert!(err.message().contains("unknown field"));
    }

    #[test]
    fn with_path_records_the_loaded_path() {
        let mut cfg = FileConfig::default();
        cfg.with_path(&"/etc/robin/robin.toml");
        assert_eq!(cfg.path(), std::path::Path::new("/etc/robin/robin.toml"));
    }
}
