/*
 * Robin mail transfer agent
 *
 * Licensed under the Elastic License 2.0
 *
 * You should have received a copy of the Elastic License 2.0 along with
 * this program. If not, see https://www.elastic.co/licensing/elastic-license.
 *
 */

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("file `{0}` does not have a valid parent directory")]
    InvalidParentDirectory(std::path::PathBuf),
    #[error("failed to open configuration file at `{0}`: {1}")]
    FileOpen(std::path::PathBuf, std::io::Error),
    #[error("failed to parse configuration: `{0}`")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize configuration: `{0}`")]
    Serialize(#[from] toml::ser::Error),
}
