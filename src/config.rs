use crate::constants::*;
use crate::errors::{AppError, AppResult};
use crate::models::ServiceKind;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

/// Resolved configuration with all values filled in.
///
/// Deserialized from an optional TOML file; every key has a default, unknown
/// keys are rejected to catch typos.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolvedConfig {
    /// Scheme + host of the NFS-e portal (paths are fixed)
    pub portal_base_url: String,
    /// Timeout applied to every portal request, in seconds
    pub request_timeout_secs: u64,
    /// `User-Agent` header sent to the portal
    pub user_agent: String,
    /// Address the HTTP server listens on
    pub bind_addr: String,
    /// Which endpoints to expose: `full`, `paginated` or `all`
    pub service: String,
    /// Parent directory for per-request certificate files.
    /// Defaults to the system temp directory.
    pub credentials_dir: Option<PathBuf>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            portal_base_url: DEFAULT_PORTAL_BASE_URL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            service: "all".to_string(),
            credentials_dir: None,
        }
    }
}

impl ResolvedConfig {
    /// Loads and validates configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `IoError` if the file cannot be read and `InvalidInput` if the TOML
    /// is malformed, unknown keys are present, or a value fails [`validate`](Self::validate).
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let contents = fs::read_to_string(path)?;
        let config: ResolvedConfig = toml::from_str(&contents)
            .map_err(|e| AppError::InvalidInput(format!("Failed to parse config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Checks that the timeout is positive and that the URL and bind address parse.
    pub fn validate(&self) -> AppResult<()> {
        if self.request_timeout_secs == 0 {
            return Err(AppError::InvalidInput(
                "Request timeout must be greater than 0".into(),
            ));
        }
        self.portal_url()?;
        self.socket_addr()?;
        Ok(())
    }

    pub fn portal_url(&self) -> AppResult<Url> {
        Ok(Url::parse(&self.portal_base_url)?)
    }

    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        self.bind_addr.parse().map_err(|e| {
            AppError::InvalidInput(format!("Invalid bind address '{}': {e}", self.bind_addr))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn service_kind(&self) -> ServiceKind {
        ServiceKind::from(self.service.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn default_config_values() {
        let config = ResolvedConfig::default();
        assert_eq!(config.portal_base_url, "https://www.nfse.gov.br");
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
        assert_eq!(config.service_kind(), ServiceKind::All);
        assert!(config.credentials_dir.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_is_parsed_and_defaults_apply() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            bind_addr = "127.0.0.1:9000"
            service = "paginated"
            "#,
        )
        .unwrap();

        let config = ResolvedConfig::from_toml_file(tmp.path()).unwrap();
        assert_eq!(config.socket_addr().unwrap().port(), 9000);
        assert_eq!(config.service_kind(), ServiceKind::Paginated);
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn zero_timeout_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(tmp, "request_timeout_secs = 0").unwrap();

        assert!(ResolvedConfig::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn unknown_key_errors() {
        let mut tmp = NamedTempFile::new().unwrap();
        write!(
            tmp,
            r#"
            portal_base_url = "https://example.com"
            retries = 3
            "#,
        )
        .unwrap();

        assert!(ResolvedConfig::from_toml_file(tmp.path()).is_err());
    }

    #[test]
    fn invalid_bind_addr_errors() {
        let config = ResolvedConfig {
            bind_addr: "localhost".into(),
            ..ResolvedConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AppError::InvalidInput(msg)) if msg.contains("localhost")
        ));
    }
}
