use config::{Config, Environment, File as ConfigFile};
use serde::Deserialize;

use crate::drive::{DEFAULT_BASE_URL, DEFAULT_PAGE_SIZE};
use crate::error::{OrganizerError, Result};
use crate::types::Folder;

/// Runtime settings, read from `Organizer.toml` and the environment
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// OAuth bearer token for the Drive API
    #[serde(default)]
    pub access_token: String,
    /// Root of the pool of loose files
    #[serde(default)]
    pub source_folder_id: String,
    #[serde(default)]
    pub source_folder_name: String,
    /// Parent of the destination folders
    #[serde(default)]
    pub target_parent_folder_id: String,
    #[serde(default)]
    pub target_parent_folder_name: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub dry_run: bool,
}

fn default_page_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

fn default_api_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl AppConfig {
    /// Read and validate the settings
    pub fn load() -> Result<AppConfig> {
        let config = Self::read()?;
        config.validate()?;
        Ok(config)
    }

    /// Read the settings without validating them
    ///
    /// Missing keys come back empty, so an incomplete setup can still be inspected.
    pub fn read() -> Result<AppConfig> {
        let settings = Config::builder()
            .add_source(ConfigFile::with_name("Organizer").required(false))
            .add_source(Environment::default().try_parsing(true))
            .build()?;
        Self::from_settings(settings)
    }

    fn from_settings(settings: Config) -> Result<AppConfig> {
        Ok(settings.try_deserialize()?)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("access_token", &self.access_token),
            ("source_folder_id", &self.source_folder_id),
            ("target_parent_folder_id", &self.target_parent_folder_id),
        ];
        if let Some((key, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(OrganizerError::InvalidConfig {
                message: format!("{} must not be empty", key),
            });
        }
        if self.page_size == 0 {
            return Err(OrganizerError::InvalidConfig {
                message: "page_size must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn source_root(&self) -> Folder {
        Folder::new(&self.source_folder_id, &self.source_folder_name)
    }

    pub fn destination_parent(&self) -> Folder {
        Folder::new(&self.target_parent_folder_id, &self.target_parent_folder_name)
    }
}
