mod endpoint;
mod helper;
mod language;
mod network;
mod page;
mod store;

use std::path::{Path, PathBuf};

use serde::Deserialize;
use anyhow::Context;
use tokio::fs;
use validator::Validate;

pub use endpoint::{ApiType, Endpoint, EndpointDraft, Settings, preset_template};
pub use language::Language;
pub use network::Network;
pub use page::Page;
pub use store::{FileStore, MemoryStore, SettingsStore, Store};

const DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.default.toml"));

#[derive(Debug, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub network: Network,
    #[validate(nested)]
    pub language: Language,
    #[validate(nested)]
    pub page: Page,
    pub storage: Storage,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub path: PathBuf,
}

impl Config {
    /// Reads and validates `path`. A missing file is replaced by the commented
    /// default and reported as an error so the user can review it first.
    pub async fn load(path: &Path) -> anyhow::Result<Config> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            let generated = Config::write_default(path).await?;

            anyhow::bail!(
                "no config at {0}, wrote a default one there; endpoint settings will be kept in {1}. \
                 Review {0} and run again",
                path.display(),
                generated.storage.path.display()
            );
        }
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("read config {}", path.display()))?;
        let mut config = Config::parse(&content)?;
        config.fix(path);

        Ok(config)
    }

    fn parse(content: &str) -> anyhow::Result<Config> {
        let config: Config =
            toml::from_str(content).map_err(|err| anyhow::anyhow!("config ->\n\n{err}"))?;
        config
            .validate()
            .map_err(|err| anyhow::anyhow!("config -> {err}"))?;

        Ok(config)
    }

    fn fix(&mut self, path: &Path) {
        self.language.source = self.language.source.trim().to_string();
        self.language.target = self.language.target.trim().to_string();
        if self.storage.path.is_relative() {
            if let Some(dir) = path.parent() {
                self.storage.path = dir.join(&self.storage.path);
            }
        }
    }

    async fn write_default(path: &Path) -> anyhow::Result<Config> {
        fs::write(path, DEFAULT_CONFIG)
            .await
            .with_context(|| format!("write default config {}", path.display()))?;
        let mut config = Config::parse(DEFAULT_CONFIG)?;
        config.fix(path);

        Ok(config)
    }
}
