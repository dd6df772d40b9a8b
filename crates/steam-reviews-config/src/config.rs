use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use steam_reviews_models::{ReviewFilters, ReviewType};

/// Largest page the review endpoint will serve
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Which web surface reviews are read from
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Paginated JSON review endpoint
    #[default]
    Api,
    /// HTML review listing on the community site
    Community,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default)]
    pub review_type: ReviewType,
    #[serde(default = "default_count")]
    pub count: usize,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub source: SourceKind,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IdentityConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
    #[serde(default = "default_identity_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Overrides the catalog location inside the config directory
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_language() -> String {
    "english".to_string()
}

fn default_count() -> usize {
    200
}

fn default_page_size() -> u32 {
    MAX_PAGE_SIZE
}

fn default_page_delay_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_batch_size() -> usize {
    100
}

fn default_batch_delay_ms() -> u64 {
    1000
}

fn default_identity_timeout_secs() -> u64 {
    10
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            language: default_language(),
            review_type: ReviewType::default(),
            count: default_count(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            source: SourceKind::default(),
        }
    }
}

impl FetchConfig {
    pub fn filters(&self) -> ReviewFilters {
        ReviewFilters::new(self.language.clone(), self.review_type.clone())
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
            timeout_secs: default_identity_timeout_secs(),
        }
    }
}

impl IdentityConfig {
    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &PathBuf) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &PathBuf) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.fetch.page_size == 0 {
            return Err(anyhow::anyhow!("fetch.page_size must be greater than zero"));
        }
        if self.fetch.page_size > MAX_PAGE_SIZE {
            return Err(anyhow::anyhow!(
                "fetch.page_size must be at most {} (got {})",
                MAX_PAGE_SIZE,
                self.fetch.page_size
            ));
        }
        if self.fetch.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("fetch.request_timeout_secs must be greater than zero"));
        }
        if self.identity.batch_size == 0 {
            return Err(anyhow::anyhow!("identity.batch_size must be greater than zero"));
        }
        if self.identity.timeout_secs == 0 {
            return Err(anyhow::anyhow!("identity.timeout_secs must be greater than zero"));
        }

        Ok(())
    }

    /// Catalog path from config, or the default file inside `config_dir`
    pub fn catalog_path(&self, default_path: PathBuf) -> PathBuf {
        self.catalog.path.clone().unwrap_or(default_path)
    }
}
