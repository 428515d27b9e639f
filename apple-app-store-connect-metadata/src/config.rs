use std::{env, io::Error as IoError, path::PathBuf};

use apple_app_store_connect_api_client::apple_app_store_connect_api_token::{
    CreateError, Credentials,
};

use crate::content::MetadataContent;

pub const ENV_ISSUER_ID: &str = "ASC_ISSUER_ID";
pub const ENV_KEY_ID: &str = "ASC_KEY_ID";
pub const ENV_PRIVATE_KEY_PATH: &str = "ASC_PRIVATE_KEY_PATH";
pub const ENV_APP_ID: &str = "ASC_APP_ID";
pub const ENV_METADATA_PATH: &str = "ASC_METADATA_PATH";

//
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub issuer_id: String,
    pub key_id: String,
    pub private_key_path: PathBuf,
    pub app_id: String,
    pub metadata_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &'static str| get(name).ok_or(ConfigError::MissingEnv(name));

        Ok(Self {
            issuer_id: require(ENV_ISSUER_ID)?,
            key_id: require(ENV_KEY_ID)?,
            private_key_path: require(ENV_PRIVATE_KEY_PATH)?.into(),
            app_id: require(ENV_APP_ID)?,
            metadata_path: get(ENV_METADATA_PATH).map(Into::into),
        })
    }

    pub fn credentials(&self) -> Result<Credentials, CreateError> {
        Credentials::from_key_file(&self.issuer_id, &self.key_id, &self.private_key_path)
    }

    pub fn content(&self) -> Result<MetadataContent, ConfigError> {
        match &self.metadata_path {
            Some(path) => MetadataContent::load(path),
            None => Ok(MetadataContent::default()),
        }
    }
}

//
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("read {path:?}: {source}")]
    ReadContent { path: PathBuf, source: IoError },

    #[error("parse {path:?}: {source}")]
    ParseContent {
        path: PathBuf,
        source: toml::de::Error,
    },
}
