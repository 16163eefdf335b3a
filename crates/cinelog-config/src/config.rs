use cinelog_models::WatchlistStatus;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub catalog: CatalogOptions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CatalogOptions {
    /// Status used when a movie is toggled onto the watchlist
    #[serde(default)]
    pub default_watchlist_status: WatchlistStatus,
    /// Fetch server stats alongside partial watchlist pages
    #[serde(default = "default_true")]
    pub refresh_stats_on_partial_page: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_json_logging")]
    pub json: bool,
    pub file: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

fn default_base_url() -> String {
    "http://localhost:5000/api".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("cinelog/{}", env!("CARGO_PKG_VERSION"))
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_json_logging() -> bool {
    use std::io::IsTerminal;
    !std::io::stdout().is_terminal()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CatalogOptions {
    fn default() -> Self {
        Self {
            default_watchlist_status: WatchlistStatus::default(),
            refresh_stats_on_partial_page: default_true(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: default_json_logging(),
            file: None,
        }
    }
}

impl Config {
    pub fn load_from_file(path: &PathBuf) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config if the file exists, otherwise fall back to defaults
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
        let base_url = self.api.base_url.trim();
        if base_url.is_empty() {
            return Err(anyhow::anyhow!("api.base_url is required and cannot be empty"));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(anyhow::anyhow!("api.base_url must start with http:// or https://: {}", base_url));
        }
        if self.api.timeout_seconds == 0 {
            return Err(anyhow::anyhow!("api.timeout_seconds must be greater than zero"));
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(anyhow::anyhow!("Invalid logging.level: {}", self.logging.level));
        }

        Ok(())
    }

    /// Set a single value by dotted key, as used by `cinelog config set`
    pub fn set_value(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "api.base_url" => self.api.base_url = value.trim_end_matches('/').to_string(),
            "api.timeout_seconds" => {
                self.api.timeout_seconds = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("api.timeout_seconds must be a number: {}", value))?;
            }
            "api.user_agent" => self.api.user_agent = value.to_string(),
            "catalog.default_watchlist_status" => {
                self.catalog.default_watchlist_status = value.parse().map_err(|e: String| anyhow::anyhow!(e))?;
            }
            "catalog.refresh_stats_on_partial_page" => {
                self.catalog.refresh_stats_on_partial_page = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("catalog.refresh_stats_on_partial_page must be true or false"))?;
            }
            "logging.level" => self.logging.level = value.to_lowercase(),
            "logging.json" => {
                self.logging.json = value
                    .parse()
                    .map_err(|_| anyhow::anyhow!("logging.json must be true or false"))?;
            }
            "logging.file" => self.logging.file = Some(PathBuf::from(value)),
            _ => return Err(anyhow::anyhow!("Unknown config key: {}", key)),
        }
        Ok(())
    }
}
