use crate::core::access::{AccessPolicy, AccessRule};
use crate::core::ConfigProvider;
use crate::utils::error::{MarketError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_path_prefix, validate_positive_number, validate_url,
    Validate,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const BACKEND_URL_VARS: [&str; 2] = ["BACKEND_URL", "NEXT_PUBLIC_BACKEND_URL"];
pub const PORT_VAR: &str = "TOURMARKET_PORT";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_url")]
    pub url: String,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_login_path")]
    pub login_path: String,
    pub rules: Option<Vec<AccessRule>>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_backend_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_login_path() -> String {
    "/login".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_seconds: None,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_path: default_login_path(),
            rules: None,
        }
    }
}

impl AppConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MarketError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MarketError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BACKEND_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MarketError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// Environment wins over the file: `BACKEND_URL`, then
    /// `NEXT_PUBLIC_BACKEND_URL`, and `TOURMARKET_PORT`.
    pub fn apply_env_overrides(&mut self) {
        if let Some(url) = BACKEND_URL_VARS
            .iter()
            .find_map(|key| std::env::var(key).ok().filter(|v| !v.trim().is_empty()))
        {
            tracing::info!("Backend URL taken from environment: {}", url);
            self.backend.url = url;
        }

        if let Ok(port) = std::env::var(PORT_VAR) {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => tracing::warn!("Invalid {} value '{}': {}", PORT_VAR, port, e),
            }
        }
    }

    pub fn access_policy(&self) -> AccessPolicy {
        match &self.auth.rules {
            Some(rules) => AccessPolicy::new(rules.clone(), &self.auth.login_path),
            None => {
                let defaults = AccessPolicy::default();
                AccessPolicy::new(defaults.rules().to_vec(), &self.auth.login_path)
            }
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_url("backend.url", &self.backend.url)?;
        validate_non_empty_string("server.host", &self.server.host)?;
        validate_positive_number("server.port", self.server.port as u64, 1)?;

        if let Some(timeout) = self.backend.timeout_seconds {
            validate_positive_number("backend.timeout_seconds", timeout, 1)?;
        }

        validate_path_prefix("auth.login_path", &self.auth.login_path)?;
        for rule in self.auth.rules.iter().flatten() {
            validate_path_prefix("auth.rules.prefix", &rule.prefix)?;
        }

        for origin in &self.server.cors_origins {
            validate_url("server.cors_origins", origin)?;
        }

        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn backend_url(&self) -> &str {
        &self.backend.url
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_seconds.unwrap_or(30))
    }

    fn login_path(&self) -> &str {
        &self.auth.login_path
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
