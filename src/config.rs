use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Development fallback when nothing else is configured. Includes the path
/// prefix the stock backend serves under; deployments with a different
/// prefix just configure a different base URL.
pub const DEV_BASE_URL: &str = "http://localhost:5000/api";

/// Environment variable overriding the configured base URL.
pub const BASE_URL_ENV: &str = "INVOGEN_API_URL";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub api: ApiConfig,
  /// Where downloaded PDFs land (defaults to the current directory).
  pub download_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
  /// Base URL of the service, including any path prefix (e.g. `/api`).
  pub base_url: String,
}

impl Default for ApiConfig {
  fn default() -> Self {
    Self {
      base_url: DEV_BASE_URL.to_string(),
    }
  }
}

impl Config {
  /// Load configuration.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./invogen.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/invogen/config.yaml
  ///
  /// A missing config file is not an error; defaults apply. The
  /// INVOGEN_API_URL environment variable overrides the base URL either way.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    let mut config = match path {
      Some(p) => Self::load_from_path(&p)?,
      None => Config::default(),
    };

    if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
      config.api.base_url = base_url;
    }
    config.api.base_url = config.api.base_url.trim_end_matches('/').to_string();

    // Catch malformed URLs before the first request does.
    url::Url::parse(&config.api.base_url)
      .map_err(|e| eyre!("Invalid base URL '{}': {}", config.api.base_url, e))?;

    Ok(config)
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("invogen.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("invogen").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }
}
