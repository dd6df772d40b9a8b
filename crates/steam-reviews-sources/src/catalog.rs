use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

use crate::error::SourceError;

/// Search results are capped so the picker list stays short
pub const DEFAULT_SEARCH_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub name: String,
    pub app_id: u64,
}

/// Static game name -> app id table, loaded from a JSON object
pub struct GameCatalog {
    entries: Vec<CatalogEntry>, // Sorted by lowercase name
    by_name: HashMap<String, u64>, // Lowercase name -> app id
}

impl GameCatalog {
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        if !path.exists() {
            return Err(SourceError::Catalog(format!(
                "Game catalog not found at {}",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&content)?;
        debug!("Loaded {} games from catalog {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// App ids may be numbers or numeric strings; other values are skipped
    pub fn from_json_str(content: &str) -> Result<Self, SourceError> {
        let raw: HashMap<String, Value> = serde_json::from_str(content)
            .map_err(|e| SourceError::Catalog(format!("Catalog must be a JSON object of name -> app id: {}", e)))?;

        let mut skipped = 0;
        let mut entries: Vec<CatalogEntry> = raw
            .into_iter()
            .filter_map(|(name, value)| {
                let app_id = match &value {
                    Value::Number(n) => n.as_u64(),
                    Value::String(s) => s.trim().parse().ok(),
                    _ => None,
                };
                if app_id.is_none() {
                    skipped += 1;
                }
                app_id.map(|app_id| CatalogEntry { name, app_id })
            })
            .collect();

        if skipped > 0 {
            warn!("Skipped {} catalog entries without a usable app id", skipped);
        }

        entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        let by_name = entries
            .iter()
            .map(|e| (e.name.to_lowercase(), e.app_id))
            .collect();

        Ok(Self { entries, by_name })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact, case-insensitive name match
    pub fn resolve(&self, name: &str) -> Option<u64> {
        self.by_name.get(&name.trim().to_lowercase()).copied()
    }

    /// Case-insensitive substring search; an empty query lists the first `limit` games
    pub fn search(&self, query: &str, limit: usize) -> Vec<&CatalogEntry> {
        let query = query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|e| query.is_empty() || e.name.to_lowercase().contains(&query))
            .take(limit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const CATALOG: &str = r#"{
        "Portal 2": 620,
        "Portal": "400",
        "Half-Life 2": 220,
        "broken": null,
        "Counter-Strike 2": 730
    }"#;

    #[test]
    fn test_from_json_skips_bad_ids() {
        let catalog = GameCatalog::from_json_str(CATALOG).unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(catalog.resolve("portal"), Some(400));
        assert_eq!(catalog.resolve("  PORTAL 2 "), Some(620));
        assert_eq!(catalog.resolve("broken"), None);
    }

    #[test]
    fn test_search_is_sorted_and_limited() {
        let catalog = GameCatalog::from_json_str(CATALOG).unwrap();
        let names: Vec<&str> = catalog.search("portal", 10).iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Portal", "Portal 2"]);

        let all = catalog.search("", 2);
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Counter-Strike 2");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", CATALOG).unwrap();
        let catalog = GameCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.resolve("Half-Life 2"), Some(220));
    }

    #[test]
    fn test_load_missing_file() {
        let result = GameCatalog::load(Path::new("/nonexistent/steam_games.json"));
        assert!(matches!(result, Err(SourceError::Catalog(_))));
    }

    #[test]
    fn test_rejects_non_object() {
        assert!(GameCatalog::from_json_str("[1, 2, 3]").is_err());
    }
}
