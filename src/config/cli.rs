use crate::config::toml_config::AppConfig;
use crate::utils::error::Result;
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "tourmarket")]
#[command(about = "Travel marketplace gateway: wrapper routes, wallet and itinerary APIs")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "tourmarket.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    /// Override the listening port
    #[arg(long)]
    pub port: Option<u16>,

    /// Override the backend base URL
    #[arg(long)]
    pub backend_url: Option<String>,

    /// Validate the configuration, print a summary and exit
    #[arg(long)]
    pub check: bool,
}

impl CliArgs {
    /// Loads the config file (defaults when it does not exist), then applies
    /// environment and command-line overrides in that order.
    pub fn load_config(&self) -> Result<AppConfig> {
        let mut config = if std::path::Path::new(&self.config).exists() {
            AppConfig::from_file(&self.config)?
        } else {
            tracing::warn!("Config file '{}' not found, using defaults", self.config);
            AppConfig::default()
        };

        config.apply_env_overrides();

        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(url) = &self.backend_url {
            config.backend.url = url.clone();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_cli_overrides_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[server]\nport = 9000\n")
            .unwrap();
        let path = temp_file.path().to_str().unwrap().to_string();

        let args = CliArgs::parse_from([
            "tourmarket",
            "--config",
            path.as_str(),
            "--port",
            "7000",
            "--backend-url",
            "https://cli.example.com",
        ]);
        let config = args.load_config().unwrap();

        assert_eq!(config.server.port, 7000);
        assert_eq!(config.backend.url, "https://cli.example.com");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let args = CliArgs::parse_from(["tourmarket", "--config", "/nonexistent/tourmarket.toml"]);
        let config = args.load_config().unwrap();
        assert_eq!(config.auth.login_path, "/login");
    }
}
