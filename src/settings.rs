// src/settings.rs

use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use config::{builder::DefaultState, ConfigBuilder, ConfigError, Environment, File, Map};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::conversation::DEFAULT_EXIT_KEYWORD;

const DEFAULT_ADDR: &str = "127.0.0.1:8000";
const ENV_PREFIX: &str = "VEHICLE_ASSISTANT";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantSettings {
    pub ollama_url: String,
    pub ollama_port: u16,
    pub model: String,
    pub exit_keyword: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GatewaySettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl GatewaySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(deserialize_with = "deserialize_socket_addr")]
    pub address: SocketAddr,
    pub db_path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Settings {
    pub assistant: AssistantSettings,
    pub gateway: GatewaySettings,
    pub server: ServerSettings,
}

impl Settings {
    /// Loads settings from an optional TOML file, then from
    /// `VEHICLE_ASSISTANT__<SECTION>__<KEY>` environment variables, with sane
    /// defaults for everything.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// `env` replaces the process environment as the override source when set.
    fn load_with_env(
        path: Option<&Path>,
        env: Option<Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::<DefaultState>::default()
            .set_default("assistant.ollama_url", "http://127.0.0.1")?
            .set_default("assistant.ollama_port", 11434)?
            .set_default("assistant.model", "phi3:mini")?
            .set_default("assistant.exit_keyword", DEFAULT_EXIT_KEYWORD)?
            .set_default("gateway.base_url", "http://localhost:8000")?
            .set_default("gateway.timeout_secs", 10)?
            .set_default("server.address", DEFAULT_ADDR)?
            .set_default("server.db_path", "vehicle-inventory")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let cfg = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?;

        cfg.try_deserialize()
    }

    /// Loads settings from the user's config directory, if a file exists there.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let path = default_config_path().filter(|path| path.exists());
        Self::load(path.as_deref())
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", env!("CARGO_PKG_NAME"))
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

fn deserialize_socket_addr<'de, D>(deserializer: D) -> Result<SocketAddr, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    s.parse().map_err(serde::de::Error::custom)
}
