use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use directories::ProjectDirs;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Credentials;
use crate::error::HubError;
use crate::query::{DEFAULT_API_URL, parse_base_url};

pub const CONFIG_FILE_NAME: &str = "scihub-fetch.json";
pub const USERNAME_ENV: &str = "SCIHUB_USERNAME";
pub const PASSWORD_ENV: &str = "SCIHUB_PASSWORD";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub download_dir: Option<String>,
    #[serde(default)]
    pub data_dirs: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct EnvCredentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EnvCredentials {
    pub fn from_env() -> Self {
        Self {
            username: env::var(USERNAME_ENV).ok().filter(|value| !value.is_empty()),
            password: env::var(PASSWORD_ENV).ok().filter(|value| !value.is_empty()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub credentials: Credentials,
    pub api_url: Url,
    pub download_dir: Utf8PathBuf,
    pub data_dirs: Vec<Utf8PathBuf>,
    pub source: Option<PathBuf>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Otherwise `./scihub-fetch.json`, then the
    /// per-user config directory; neither means defaults.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HubError> {
        let source = match path {
            Some(path) => Some(PathBuf::from(path)),
            None => Self::discover(),
        };
        let config = match &source {
            Some(path) => Self::read(path)?,
            None => ConfigFile::default(),
        };
        let mut resolved = Self::resolve_config(config, EnvCredentials::from_env())?;
        resolved.source = source;
        Ok(resolved)
    }

    pub fn read(path: &Path) -> Result<ConfigFile, HubError> {
        let content =
            fs::read_to_string(path).map_err(|_| HubError::ConfigRead(path.to_path_buf()))?;
        serde_json::from_str(&content).map_err(|err| HubError::ConfigParse(err.to_string()))
    }

    pub fn resolve_config(
        config: ConfigFile,
        env: EnvCredentials,
    ) -> Result<ResolvedConfig, HubError> {
        let username = env.username.or(config.username);
        let password = env.password.or(config.password);
        let credentials = match (username, password) {
            (Some(username), Some(password)) if !username.is_empty() => {
                Credentials::new(username, password)
            }
            _ => return Err(HubError::MissingCredentials),
        };

        let api_url = parse_base_url(config.api_url.as_deref().unwrap_or(DEFAULT_API_URL))?;
        let download_dir = config
            .download_dir
            .map(Utf8PathBuf::from)
            .unwrap_or_else(|| Utf8PathBuf::from("."));
        let data_dirs = config.data_dirs.into_iter().map(Utf8PathBuf::from).collect();

        Ok(ResolvedConfig {
            credentials,
            api_url,
            download_dir,
            data_dirs,
            source: None,
        })
    }

    fn discover() -> Option<PathBuf> {
        let local = PathBuf::from(CONFIG_FILE_NAME);
        if local.is_file() {
            return Some(local);
        }
        let dirs = ProjectDirs::from("org", "scihub-fetch", "scihub-fetch")?;
        let user = dirs.config_dir().join("config.json");
        debug!("looking for config at {}", user.display());
        user.is_file().then_some(user)
    }
}
