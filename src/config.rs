use anyhow::Result;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

pub const DEFAULT_UPLOAD_DIR: &str = "./uploaded_files";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    /// Request body cap for uploads. `None` means no limit.
    pub max_upload_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub log_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                port: env::var("PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()?,
                host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            },
            storage: StorageConfig {
                upload_dir: env::var("UPLOAD_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_UPLOAD_DIR)),
                max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                    .ok()
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.trim().parse::<usize>())
                    .transpose()?,
            },
            logging: LoggingConfig {
                log_dir: env::var("LOG_DIR").ok().map(PathBuf::from),
            },
        })
    }

    /// Configuration rooted at `upload_dir` with defaults for everything else.
    pub fn with_upload_dir(upload_dir: impl Into<PathBuf>) -> Self {
        Self {
            server: ServerConfig {
                port: 8000,
                host: "0.0.0.0".to_string(),
            },
            storage: StorageConfig {
                upload_dir: upload_dir.into(),
                max_upload_bytes: None,
            },
            logging: LoggingConfig { log_dir: None },
        }
    }

    /// Apply command-line overrides on top of the environment.
    pub fn apply_overrides(
        &mut self,
        host: Option<String>,
        port: Option<u16>,
        upload_dir: Option<PathBuf>,
    ) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
        if let Some(dir) = upload_dir {
            self.storage.upload_dir = dir;
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_replace_only_given_values() {
        let mut config = Config::with_upload_dir(DEFAULT_UPLOAD_DIR);
        config.apply_overrides(None, Some(9100), Some(PathBuf::from("/srv/drop")));

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.storage.upload_dir, PathBuf::from("/srv/drop"));
        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn test_defaults_have_no_upload_cap() {
        let config = Config::with_upload_dir("files");
        assert!(config.storage.max_upload_bytes.is_none());
        assert!(config.logging.log_dir.is_none());
    }
}
