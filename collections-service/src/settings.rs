use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load database properties from {path}: {source}")]
    Load {
        path: String,
        #[source]
        source: config::ConfigError,
    },
}

/// Connection-string components read from the properties file.
#[derive(Clone, Deserialize)]
pub struct DbSettings {
    pub prefix: String,
    pub user: String,
    pub password: String,
    pub host: String,
    pub name: String,
    #[serde(default)]
    pub params: String,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("prefix", &self.prefix)
            .field("user", &self.user)
            .field("password", &"***")
            .field("host", &self.host)
            .field("name", &self.name)
            .field("params", &self.params)
            .finish()
    }
}

impl DbSettings {
    /// Reads `key=value` lines from `path`, then lets `DB_*` environment
    /// variables override individual keys.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from(path, Environment::with_prefix("DB"))
    }

    fn load_from(path: &Path, environment: Environment) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let to_error = |source| ConfigError::Load {
            path: display.clone(),
            source,
        };

        Config::builder()
            .add_source(File::from(path).format(FileFormat::Ini))
            .add_source(environment)
            .build()
            .and_then(Config::try_deserialize)
            .map_err(to_error)
    }

    pub fn connection_uri(&self) -> String {
        format!(
            "{}{}:{}@{}/{}{}",
            self.prefix, self.user, self.password, self.host, self.name, self.params
        )
    }
}
