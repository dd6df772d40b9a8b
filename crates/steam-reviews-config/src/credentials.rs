use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

const STEAM_API_KEY: &str = "steam_api_key";

/// Environment variable that takes precedence over the stored key
pub const STEAM_API_KEY_ENV: &str = "STEAM_API_KEY";

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    pub fn get_steam_api_key(&self) -> Option<&String> {
        self.get(STEAM_API_KEY).filter(|key| !key.trim().is_empty())
    }

    pub fn set_steam_api_key(&mut self, key: String) {
        self.set(STEAM_API_KEY.to_string(), key);
    }

    /// Stored key, overridden by `STEAM_API_KEY` when that is set and non-empty
    pub fn resolve_steam_api_key(&self) -> Option<String> {
        std::env::var(STEAM_API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| self.get_steam_api_key().cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_steam_api_key("ABCDEF0123456789".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        assert_eq!(loaded_store.get_steam_api_key(), Some(&"ABCDEF0123456789".to_string()));
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set_steam_api_key("   ".to_string());
        assert_eq!(store.get_steam_api_key(), None);
    }

    #[test]
    fn test_credential_store_remove() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/test"));
        store.set("key1".to_string(), "value1".to_string());
        store.set("key2".to_string(), "value2".to_string());

        assert_eq!(store.get("key1"), Some(&"value1".to_string()));
        store.remove("key1");
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), Some(&"value2".to_string()));
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CredentialStore::new(dir.path().join("credentials.toml"));
        store.load().unwrap();
        assert_eq!(store.get_steam_api_key(), None);
    }
}
