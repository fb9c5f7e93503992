//! Configuration for the TNTVillage provider
//!
//! Settings are plain serde structs with defaults matching the live site.
//! They can be loaded from a TOML file with `TNTVILLAGE_` environment
//! overrides, or from a TOML string.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::client::ClientConfig;
use crate::names::ShowEntry;
use crate::types::Category;

/// Placeholder substituted with the attachment id in the download template
pub const DOWNLOAD_ID_PLACEHOLDER: &str = "{id}";

const DEFAULT_SEARCH_PAGE: &str = "http://tntvillage.scambioetico.org/src/releaselist.php";
const DEFAULT_DOWNLOAD_TEMPLATE: &str =
    "http://forum.tntvillage.scambioetico.org/index.php?act=Attach&type=post&id={id}";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse config: {0}")]
    ParseError(String),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Site endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteUrls {
    /// Release list endpoint receiving the search form
    pub search_page: String,
    /// Download URL with `{id}` where the attachment id goes
    pub download_template: String,
}

impl Default for SiteUrls {
    fn default() -> Self {
        Self {
            search_page: DEFAULT_SEARCH_PAGE.to_string(),
            download_template: DEFAULT_DOWNLOAD_TEMPLATE.to_string(),
        }
    }
}

impl SiteUrls {
    /// Resolve a download token into a full URL
    pub fn download_url(&self, token: &str) -> String {
        self.download_template.replace(DOWNLOAD_ID_PLACEHOLDER, token)
    }
}

/// Filtering and paging behaviour of the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub category: Category,
    /// First page requested for every search string (1-based)
    pub start_page: u32,
    pub min_seeders: u32,
    pub min_leechers: u32,
    /// Keep releases that are only subtitled in Italian
    pub subtitle: bool,
    /// Keep only releases advertising English audio
    pub english_release: bool,
    pub urls: SiteUrls,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            category: Category::SerieTv,
            start_page: 1,
            min_seeders: 0,
            min_leechers: 0,
            subtitle: false,
            english_release: false,
            urls: SiteUrls::default(),
        }
    }
}

/// Local library used by the season-pack check
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    /// SQLite database with a `tv_episodes` table
    pub database: Option<PathBuf>,
    /// Shows release names are resolved against
    pub shows: Vec<ShowEntry>,
}

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub client: ClientConfig,
    pub provider: ProviderConfig,
    pub library: LibraryConfig,
}

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("TNTVILLAGE_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    validate_config(&config)?;
    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    let config: Config =
        toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Check values serde cannot reject on its own
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let provider = &config.provider;

    if provider.start_page == 0 {
        return Err(ConfigError::Invalid("provider.start_page must be at least 1".into()));
    }

    reqwest::Url::parse(&provider.urls.search_page).map_err(|e| {
        ConfigError::Invalid(format!("provider.urls.search_page: {}", e))
    })?;

    if !provider.urls.download_template.contains(DOWNLOAD_ID_PLACEHOLDER) {
        return Err(ConfigError::Invalid(format!(
            "provider.urls.download_template must contain {}",
            DOWNLOAD_ID_PLACEHOLDER
        )));
    }

    if config.client.requests_per_second <= 0.0 {
        return Err(ConfigError::Invalid(
            "client.requests_per_second must be positive".into(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.provider.category, Category::SerieTv);
        assert_eq!(config.provider.start_page, 1);
        assert!(!config.provider.subtitle);
        assert!(config.library.shows.is_empty());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_download_url() {
        let urls = SiteUrls::default();
        assert_eq!(
            urls.download_url("12345678"),
            "http://forum.tntvillage.scambioetico.org/index.php?act=Attach&type=post&id=12345678"
        );
    }

    #[test]
    fn test_load_config_from_str_valid() {
        let toml = r#"
[provider]
category = "anime"
min_seeders = 5
subtitle = true

[[library.shows]]
id = 42
name = "Show"
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.provider.category, Category::Anime);
        assert_eq!(config.provider.min_seeders, 5);
        assert_eq!(config.provider.min_leechers, 0);
        assert!(config.provider.subtitle);
        assert_eq!(config.library.shows, vec![ShowEntry::new(42, "Show")]);
    }

    #[test]
    fn test_load_config_from_str_bad_category() {
        let result = load_config_from_str("[provider]\ncategory = \"sport\"\n");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validate_zero_start_page() {
        let result = load_config_from_str("[provider]\nstart_page = 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_validate_template_without_placeholder() {
        let toml = r#"
[provider.urls]
download_template = "http://example.invalid/download"
"#;
        let result = load_config_from_str(toml);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/tntvillage.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[client]
requests_per_second = 0.5

[provider]
min_leechers = 2
english_release = true
"#
        )
        .unwrap();

        let config = load_config(temp_file.path()).unwrap();
        assert_eq!(config.client.requests_per_second, 0.5);
        assert_eq!(config.client.timeout_secs, 30);
        assert_eq!(config.provider.min_leechers, 2);
        assert!(config.provider.english_release);
    }
}
