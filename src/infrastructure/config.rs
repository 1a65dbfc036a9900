//! Panel configuration.
//!
//! Loaded from `<config dir>/sheetpanel/secrets.toml` (e.g.
//! `~/.config/sheetpanel/secrets.toml`).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::sheets::DEFAULT_API_BASE;
use crate::domain::PanelLayout;

pub const DEFAULT_SHEET_NAME: &str = "PAINEL";
pub const DEFAULT_TOKEN_ENV: &str = "SHEETPANEL_ACCESS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Missing configuration value: {0}")]
    Missing(String),
}

/// Service account identity, shown as "connected as".
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServiceAccount {
    pub client_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Sharing URL (or bare id) of the spreadsheet
    pub sheet_url: Option<String>,
    /// Worksheet holding the panel
    pub sheet_name: String,
    pub api_base: String,
    /// Bearer token; takes precedence over `access_token_env`
    pub access_token: Option<String>,
    /// Environment variable consulted when no token is configured inline
    pub access_token_env: String,
    pub service_account: ServiceAccount,
    pub layout: PanelLayout,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            sheet_url: None,
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            access_token: None,
            access_token_env: DEFAULT_TOKEN_ENV.to_string(),
            service_account: ServiceAccount::default(),
            layout: PanelLayout::default(),
        }
    }
}

impl PanelConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|c| c.join("sheetpanel").join("secrets.toml"))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` if given, else the default location when it exists,
    /// else built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => Self::load(&path),
                None => Ok(Self::default()),
            },
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn sheet_url(&self) -> Result<&str, ConfigError> {
        self.sheet_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ConfigError::Missing("sheet_url".to_string()))
    }

    pub fn access_token(&self) -> Result<String, ConfigError> {
        self.access_token_with(|name| std::env::var(name).ok())
    }

    /// Token lookup with an injectable environment.
    pub fn access_token_with(&self, env: impl Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        self.access_token
            .clone()
            .or_else(|| env(&self.access_token_env))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ConfigError::Missing(format!("access_token (or environment variable {})", self.access_token_env))
            })
    }

    pub fn connected_as(&self) -> Option<&str> {
        self.service_account.client_email.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::from_toml_str("").unwrap();
        assert_eq!(config.sheet_name, "PAINEL");
        assert_eq!(config.api_base, "https://sheets.googleapis.com");
        assert_eq!(config.layout, PanelLayout::default());
        assert!(matches!(config.sheet_url(), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_full_config() {
        let config = PanelConfig::from_toml_str(
            r#"
            sheet_url = "https://docs.google.com/spreadsheets/d/abc/edit"
            sheet_name = "Inputs"
            access_token = " ya29.token "

            [service_account]
            client_email = "panel@project.iam.gserviceaccount.com"

            [layout]
            result_range = "H1:I5"
            choice_column = 0
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet_url().unwrap(), "https://docs.google.com/spreadsheets/d/abc/edit");
        assert_eq!(config.sheet_name, "Inputs");
        assert_eq!(config.access_token_with(|_| None).unwrap(), "ya29.token");
        assert_eq!(config.connected_as(), Some("panel@project.iam.gserviceaccount.com"));
        assert_eq!(config.layout.result_range.a1(), "H1:I5");
        assert_eq!(config.layout.choice_column, Some(0));
        assert_eq!(config.layout.input_range.a1(), "A1:E31");
    }

    #[test]
    fn test_token_from_environment() {
        let config = PanelConfig::from_toml_str(r#"access_token_env = "MY_TOKEN""#).unwrap();
        let token = config.access_token_with(|name| (name == "MY_TOKEN").then(|| "from-env".to_string()));
        assert_eq!(token.unwrap(), "from-env");
        assert!(matches!(config.access_token_with(|_| None), Err(ConfigError::Missing(_))));
    }

    #[test]
    fn test_invalid_range_is_parse_error() {
        let result = PanelConfig::from_toml_str("[layout]\ninput_range = \"nonsense\"");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sheet_name = \"Other\"").unwrap();
        let config = PanelConfig::load_or_default(Some(file.path())).unwrap();
        assert_eq!(config.sheet_name, "Other");

        let missing = PanelConfig::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(missing, Err(ConfigError::Io { .. })));
    }
}
