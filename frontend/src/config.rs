use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, sync::OnceLock, time::Duration};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_RESET_REQUEST_PATH: &str = "/password-reset-request/";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    pub api_base_url: String,
    pub reset_request_path: String,
    pub request_timeout_secs: u64,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            reset_request_path: DEFAULT_RESET_REQUEST_PATH.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Partial view of `config.json`; missing keys keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    #[serde(alias = "API_BASE_URL")]
    api_base_url: Option<String>,
    reset_request_path: Option<String>,
    request_timeout_secs: Option<u64>,
}

static RUNTIME_CONFIG: OnceLock<RuntimeConfig> = OnceLock::new();

impl RuntimeConfig {
    /// Loads defaults, then the JSON file named by `FORGOT_PASSWORD_CONFIG`,
    /// then environment variables (including `.env`).
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let file_contents = match env::var("FORGOT_PASSWORD_CONFIG") {
            Ok(path) => Some(read_config_file(Path::new(&path))?),
            Err(_) => None,
        };

        Self::from_sources(file_contents.as_deref(), |key| env::var(key).ok())
    }

    pub fn from_sources(
        file_contents: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = file_contents {
            let file: FileConfig =
                serde_json::from_str(raw).context("Failed to parse runtime config file")?;
            if let Some(url) = file.api_base_url {
                config.api_base_url = url;
            }
            if let Some(path) = file.reset_request_path {
                config.reset_request_path = path;
            }
            if let Some(secs) = file.request_timeout_secs {
                config.request_timeout_secs = secs;
            }
        }

        if let Some(url) = lookup("API_BASE_URL") {
            config.api_base_url = url;
        }
        if let Some(path) = lookup("RESET_REQUEST_PATH") {
            config.reset_request_path = path;
        }
        if let Some(raw) = lookup("API_TIMEOUT_SECS") {
            config.request_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|_| anyhow!("Invalid API_TIMEOUT_SECS value: {}", raw))?;
        }

        config.api_base_url = config.api_base_url.trim_end_matches('/').to_string();
        if !config.reset_request_path.starts_with('/') {
            config.reset_request_path = format!("/{}", config.reset_request_path);
        }

        Ok(config)
    }

    pub fn reset_request_url(&self) -> String {
        format!("{}{}", self.api_base_url, self.reset_request_path)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn read_config_file(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read runtime config {}", path.display()))
}

/// Loads and caches the process-wide config. Later calls return the cached value.
pub fn init() -> anyhow::Result<&'static RuntimeConfig> {
    if let Some(cached) = RUNTIME_CONFIG.get() {
        return Ok(cached);
    }
    let loaded = RuntimeConfig::load()?;
    Ok(RUNTIME_CONFIG.get_or_init(|| loaded))
}

/// Cached config, falling back to defaults when `init` has not run or failed.
pub fn current() -> RuntimeConfig {
    RUNTIME_CONFIG.get().cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_without_sources() {
        let config = RuntimeConfig::from_sources(None, lookup_from(&[])).unwrap();
        assert_eq!(config, RuntimeConfig::default());
        assert_eq!(
            config.reset_request_url(),
            "http://localhost:8000/api/password-reset-request/"
        );
    }

    #[test]
    fn file_values_override_defaults() {
        let raw = r#"{ "api_base_url": "https://example.test/api/", "request_timeout_secs": 3 }"#;
        let config = RuntimeConfig::from_sources(Some(raw), lookup_from(&[])).unwrap();
        assert_eq!(config.api_base_url, "https://example.test/api");
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.reset_request_path, DEFAULT_RESET_REQUEST_PATH);
    }

    #[test]
    fn environment_overrides_file() {
        let raw = r#"{ "API_BASE_URL": "https://file.test/api" }"#;
        let config = RuntimeConfig::from_sources(
            Some(raw),
            lookup_from(&[
                ("API_BASE_URL", "https://env.test/api"),
                ("RESET_REQUEST_PATH", "v2/accounts/reset/"),
            ]),
        )
        .unwrap();
        assert_eq!(
            config.reset_request_url(),
            "https://env.test/api/v2/accounts/reset/"
        );
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = RuntimeConfig::from_sources(None, lookup_from(&[("API_TIMEOUT_SECS", "soon")]))
            .expect_err("should fail");
        assert!(err.to_string().contains("API_TIMEOUT_SECS"));
    }

    #[test]
    fn malformed_file_is_rejected() {
        assert!(RuntimeConfig::from_sources(Some("{ not json"), lookup_from(&[])).is_err());
    }

    #[test]
    fn reads_config_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "reset_request_path": "/auth/request-password-reset" }}"#).unwrap();

        let raw = read_config_file(file.path()).unwrap();
        let config = RuntimeConfig::from_sources(Some(&raw), lookup_from(&[])).unwrap();
        assert_eq!(config.reset_request_path, "/auth/request-password-reset");
    }

    #[test]
    fn missing_config_file_reports_path() {
        let err = read_config_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
