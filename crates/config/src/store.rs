use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info, warn};
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex as AsyncMutex;

use super::endpoint::{Endpoint, Settings};

const SETTINGS_KEY: &str = "settings";

/// Key-value persistence. Values are replaced whole, there are no partial updates.
#[async_trait]
pub trait Store: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    async fn set(&self, key: &str, value: Value) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;

        Ok(items.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let mut items = self
            .items
            .lock()
            .map_err(|_| anyhow!("memory store poisoned"))?;
        items.insert(key.to_string(), value);

        Ok(())
    }
}

/// A JSON object on disk, one top-level field per key.
pub struct FileStore {
    path: PathBuf,
    lock: AsyncMutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> FileStore {
        FileStore {
            path: path.into(),
            lock: AsyncMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");

        self.path.with_file_name(name)
    }

    async fn read_all(&self) -> Result<Map<String, Value>> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            debug!("store {} not found, start empty", self.path.display());
            return Ok(Map::new());
        }

        let content = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("read {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).with_context(|| format!("parse {}", self.path.display()))
    }
}

#[async_trait]
impl Store for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self.lock.lock().await;
        let mut items = self.read_all().await?;

        Ok(items.remove(key))
    }

    async fn set(&self, key: &str, value: Value) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut items = match self.read_all().await {
            Ok(items) => items,
            Err(err) => {
                warn!("{err:#}, overwriting with a fresh store");
                Map::new()
            }
        };
        items.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("create dir {}", parent.display()))?;
            }
        }
        let content = serde_json::to_string_pretty(&items).with_context(|| "serialize store")?;
        // readers only ever see a complete file
        let tmp = self.tmp_path();
        fs::write(&tmp, content)
            .await
            .with_context(|| format!("write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("replace {}", self.path.display()))?;

        Ok(())
    }
}

/// Typed access to the `settings` entry. Settings are read on every call, never cached.
#[derive(Clone)]
pub struct SettingsStore {
    store: Arc<dyn Store>,
}

impl SettingsStore {
    pub fn new(store: Arc<dyn Store>) -> SettingsStore {
        SettingsStore { store }
    }

    /// Persisted settings, or the built-in presets when nothing is stored yet.
    pub async fn get_settings(&self) -> Result<Settings> {
        let Some(value) = self
            .store
            .get(SETTINGS_KEY)
            .await
            .with_context(|| "load settings")?
        else {
            return Ok(Settings::default());
        };

        serde_json::from_value(value).with_context(|| "decode settings")
    }

    /// Persists verbatim, without checking ids or the active reference.
    pub async fn save_settings(&self, settings: &Settings) -> Result<()> {
        let value = serde_json::to_value(settings).with_context(|| "encode settings")?;
        self.store
            .set(SETTINGS_KEY, value)
            .await
            .with_context(|| "save settings")?;
        info!("settings saved, {} endpoints", settings.endpoints.len());

        Ok(())
    }

    pub async fn get_active_endpoint(&self) -> Result<Option<Endpoint>> {
        let settings = self.get_settings().await?;

        Ok(settings.active_endpoint().cloned())
    }

    pub async fn set_active_endpoint(&self, id: &str) -> Result<()> {
        let mut settings = self.get_settings().await?;
        settings.active_endpoint_id = Some(id.to_string());

        self.save_settings(&settings).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoint::ApiType;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn memory() -> (Arc<MemoryStore>, SettingsStore) {
        let memory = Arc::new(MemoryStore::new());
        let store = SettingsStore::new(memory.clone());

        (memory, store)
    }

    fn endpoint(id: &str, is_default: bool) -> Value {
        json!({
            "id": id,
            "name": id.to_uppercase(),
            "url": format!("http://{id}"),
            "model": id,
            "promptTemplate": "{{text}}",
            "apiType": "completions",
            "isDefault": is_default,
        })
    }

    #[tokio::test]
    async fn test_default_when_empty() -> Result<()> {
        let (_, store) = memory();
        let settings = store.get_settings().await?;
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.endpoints[0].name, "TranslateGemma");

        Ok(())
    }

    #[tokio::test]
    async fn test_saved_settings() -> Result<()> {
        let (memory, store) = memory();
        memory
            .set(
                "settings",
                json!({"endpoints": [endpoint("test", true)], "activeEndpointId": "test"}),
            )
            .await?;

        let settings = store.get_settings().await?;
        assert_eq!(settings.endpoints.len(), 1);
        assert_eq!(settings.endpoints[0].id, "test");
        assert_eq!(settings.endpoints[0].api_type, ApiType::Completions);

        Ok(())
    }

    #[tokio::test]
    async fn test_save_settings_verbatim() -> Result<()> {
        let (memory, store) = memory();
        let raw = json!({"endpoints": [endpoint("new", true)], "activeEndpointId": "new"});
        let settings: Settings = serde_json::from_value(raw.clone())?;

        store.save_settings(&settings).await?;
        assert_eq!(memory.get("settings").await?, Some(raw));

        Ok(())
    }

    #[tokio::test]
    async fn test_get_active_endpoint() -> Result<()> {
        let (memory, store) = memory();
        memory
            .set(
                "settings",
                json!({
                    "endpoints": [endpoint("a", false), endpoint("b", true)],
                    "activeEndpointId": "b",
                }),
            )
            .await?;

        let active = store.get_active_endpoint().await?;
        assert_eq!(active.map(|endpoint| endpoint.id), Some("b".to_string()));

        Ok(())
    }

    #[tokio::test]
    async fn test_no_active_endpoint() -> Result<()> {
        let (memory, store) = memory();
        memory
            .set("settings", json!({"endpoints": [], "activeEndpointId": null}))
            .await?;
        assert_eq!(store.get_active_endpoint().await?, None);

        memory
            .set(
                "settings",
                json!({"endpoints": [endpoint("a", true)], "activeEndpointId": "missing"}),
            )
            .await?;
        assert_eq!(store.get_active_endpoint().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_set_active_endpoint() -> Result<()> {
        let (memory, store) = memory();
        memory
            .set(
                "settings",
                json!({
                    "endpoints": [endpoint("a", false), endpoint("b", true)],
                    "activeEndpointId": "a",
                }),
            )
            .await?;

        store.set_active_endpoint("b").await?;

        let saved = memory.get("settings").await?.unwrap_or_default();
        assert_eq!(saved["activeEndpointId"], "b");
        assert_eq!(saved["endpoints"].as_array().map(Vec::len), Some(2));

        Ok(())
    }

    #[tokio::test]
    async fn test_set_active_on_defaults() -> Result<()> {
        let (_, store) = memory();
        store.set_active_endpoint("default-plamo").await?;

        let active = store.get_active_endpoint().await?;
        assert_eq!(active.map(|endpoint| endpoint.api_type), Some(ApiType::Plamo));

        Ok(())
    }

    #[tokio::test]
    async fn test_file_store() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("nested").join("storage.json");
        let file = FileStore::new(&path);
        assert_eq!(file.get("settings").await?, None);

        file.set("settings", json!({"endpoints": []})).await?;
        file.set("other", json!(1)).await?;

        let reopened = FileStore::new(&path);
        assert_eq!(reopened.get("settings").await?, Some(json!({"endpoints": []})));
        assert_eq!(reopened.get("other").await?, Some(json!(1)));

        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_settings_roundtrip() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let store = SettingsStore::new(Arc::new(FileStore::new(dir.path().join("settings.json"))));
        let mut settings = store.get_settings().await?;
        settings.active_endpoint_id = None;
        store.save_settings(&settings).await?;

        assert_eq!(store.get_settings().await?, settings);
        assert_eq!(store.get_active_endpoint().await?, None);

        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_corrupted() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").await?;

        let store = SettingsStore::new(Arc::new(FileStore::new(&path)));
        assert!(store.get_settings().await.is_err());

        Ok(())
    }

    #[tokio::test]
    async fn test_file_store_recovers_from_truncated_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("settings.json");
        fs::write(&path, "{\"settings\": {\"endpoints\": [").await?;

        let store = SettingsStore::new(Arc::new(FileStore::new(&path)));
        store.save_settings(&Settings::default()).await?;

        assert_eq!(store.get_settings().await?, Settings::default());
        assert!(!fs::try_exists(dir.path().join("settings.json.tmp")).await?);

        Ok(())
    }
}
