//! Application configuration loaded from environment variables.
//!
//! Everything the jobs need (CRM OAuth credentials, spreadsheet id, file
//! locations) is read once at startup and validated so a misconfigured
//! deployment fails before the first request.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- CRM ---
    /// Account subdomain, e.g. `example` in `example.amocrm.ru`
    pub crm_subdomain: String,
    /// CRM domain the subdomain lives under
    pub crm_domain: String,
    /// Full origin override (tests, proxies)
    pub crm_base_url: Option<String>,
    pub crm_client_id: String,
    pub crm_client_secret: String,
    /// One-time authorization code, used only when no token is stored
    pub crm_auth_code: String,
    pub crm_redirect_uri: String,
    /// Where the CRM token set is persisted between runs
    pub token_file: PathBuf,

    // --- Spreadsheet ---
    pub sheet_id: String,
    pub sheet_name: String,
    /// Service-account key file for the Sheets API
    pub google_credentials_file: PathBuf,
    pub sheets_base_url: String,

    // --- Runtime ---
    /// Server port
    pub port: u16,
    pub http_timeout: Duration,
    /// Pause before each page after the first in bulk listings
    pub page_delay: Duration,
    /// Upper bound on pages fetched by a single bulk listing
    pub max_pages: u32,
    /// Directory for diagnostic channel dumps (None disables them)
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Default config for tests: no I/O, no delays.
    pub fn test_default() -> Self {
        Self {
            crm_subdomain: "test".to_string(),
            crm_domain: "amocrm.ru".to_string(),
            crm_base_url: None,
            crm_client_id: "test_client_id".to_string(),
            crm_client_secret: "test_secret".to_string(),
            crm_auth_code: "test_auth_code".to_string(),
            crm_redirect_uri: "https://example.com/oauth".to_string(),
            token_file: PathBuf::from("token.json"),
            sheet_id: "test-sheet".to_string(),
            sheet_name: "Sheet1".to_string(),
            google_credentials_file: PathBuf::from("sheets_api.json"),
            sheets_base_url: "https://sheets.googleapis.com/v4".to_string(),
            port: 8080,
            http_timeout: Duration::from_secs(5),
            page_delay: Duration::ZERO,
            max_pages: 1000,
            log_dir: None,
        }
    }

    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let config = Self {
            crm_subdomain: required("CRM_SUBDOMAIN")?,
            crm_domain: optional("CRM_DOMAIN").unwrap_or_else(|| "amocrm.ru".to_string()),
            crm_base_url: optional("CRM_BASE_URL"),
            crm_client_id: required("CRM_CLIENT_ID")?,
            crm_client_secret: required("CRM_CLIENT_SECRET")?,
            crm_auth_code: required("CRM_AUTH_CODE")?,
            crm_redirect_uri: required("CRM_REDIRECT_URI")?,
            token_file: optional("TOKEN_FILE")
                .unwrap_or_else(|| "token.json".to_string())
                .into(),

            sheet_id: required("SHEET_ID")?,
            sheet_name: optional("SHEET_NAME").unwrap_or_else(|| "Лист1".to_string()),
            google_credentials_file: optional("GOOGLE_CREDENTIALS_FILE")
                .unwrap_or_else(|| "sheets_api.json".to_string())
                .into(),
            sheets_base_url: optional("SHEETS_BASE_URL")
                .unwrap_or_else(|| "https://sheets.googleapis.com/v4".to_string()),

            port: parsed("PORT", 8080)?,
            http_timeout: Duration::from_secs(parsed("HTTP_TIMEOUT_SECS", 30)?),
            page_delay: Duration::from_millis(parsed("PAGE_DELAY_MS", 250)?),
            max_pages: parsed("MAX_PAGES", 1000)?,
            log_dir: match env::var("LOG_DIR") {
                Ok(dir) if dir.trim().is_empty() => None,
                Ok(dir) => Some(PathBuf::from(dir.trim())),
                Err(_) => Some(PathBuf::from("logs")),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject values that would only fail later, mid-job.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet_name.trim().is_empty() {
            return Err(ConfigError::Empty("SHEET_NAME"));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid {
                name: "MAX_PAGES",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    /// Origin of the CRM account, e.g. `https://example.amocrm.ru`.
    pub fn crm_origin(&self) -> String {
        match &self.crm_base_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => format!("https://{}.{}", self.crm_subdomain, self.crm_domain),
        }
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    let value = env::var(name).map_err(|_| ConfigError::Missing(name))?;
    let value = value.trim();
    if value.is_empty() {
        return Err(ConfigError::Empty(name));
    }
    Ok(value.to_string())
}

fn parsed<T: FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value: raw }),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Environment variable must not be empty: {0}")]
    Empty(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required env vars for test
        env::set_var("CRM_SUBDOMAIN", "acme");
        env::set_var("CRM_CLIENT_ID", "test_id");
        env::set_var("CRM_CLIENT_SECRET", " test_secret ");
        env::set_var("CRM_AUTH_CODE", "def502");
        env::set_var("CRM_REDIRECT_URI", "https://example.com/oauth");
        env::set_var("SHEET_ID", "sheet-123");
        env::set_var("PAGE_DELAY_MS", "10");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.crm_client_id, "test_id");
        assert_eq!(config.crm_client_secret, "test_secret");
        assert_eq!(config.crm_origin(), "https://acme.amocrm.ru");
        assert_eq!(config.page_delay, Duration::from_millis(10));
        assert_eq!(config.max_pages, 1000);
    }

    #[test]
    fn test_base_url_override() {
        let config = Config {
            crm_base_url: Some("http://127.0.0.1:9999/".to_string()),
            ..Config::test_default()
        };
        assert_eq!(config.crm_origin(), "http://127.0.0.1:9999");
    }

    #[test]
    fn test_validate_rejects_zero_page_cap() {
        let config = Config {
            max_pages: 0,
            ..Config::test_default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                name: "MAX_PAGES",
                ..
            })
        ));
    }
}
