/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

pub mod error;
pub mod file_config;
pub mod logs;
pub mod queues;

pub use error::ConfigError;
pub use file_config::FileConfig;
pub use logs::Logs;
pub use queues::Queues;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, error::ConfigError>;

/// Getters for base configuration structures, implemented by every
/// top-level `*Config` struct in the workspace.
pub trait Config: Default + serde::Serialize + serde::de::DeserializeOwned + Sized {
    /// Called after deserialization with the path the configuration was
    /// loaded from. Implementors can use this to resolve relative storage
    /// paths; the default is a no-op.
    fn with_path(&mut self, _path: &impl AsRef<std::path::Path>) {}

    /// Load and parse a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or does not
    /// deserialize into `Self`.
    fn from_toml_file(path: &impl AsRef<std::path::Path>) -> ConfigResult<Self> {
        let path_ref = path.as_ref();

        let raw = std::fs::read_to_string(path_ref)
            .map_err(|error| error::ConfigError::FileOpen(path_ref.into(), error))?;

        let mut cfg: Self = toml::from_str(&raw)?;
        cfg.with_path(path);
        Ok(cfg)
    }

    /// Name the server identifies itself with (HELO/EHLO response, `Received:`
    /// headers).
    fn hostname(&self) -> &str;

    /// Log configuration for this service.
    fn logs(&self) -> &logs::Logs;

    /// Names of the on-disk spool queues this service reads from or writes
    /// to.
    fn queues(&self) -> &queues::Queues;

    /// Path on disk of the configuration file this was loaded from.
    fn path(&self) -> &std::path::Path;
}
