// Client configuration, resolved once from flags and environment and handed to the service.
use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://language.googleapis.com/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credentials configured, pass --api-key or --token-file")]
    MissingCredentials,

    #[error("both an API key and a token file were given, pick one")]
    ConflictingCredentials,

    #[error("could not read token file {path}: {source}")]
    TokenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {0} is empty")]
    EmptyToken(PathBuf),
}

#[derive(Debug, Clone)]
pub enum Credentials {
    /// Sent as the `key` query parameter.
    ApiKey(SecretString),
    /// OAuth access token for a service account, sent as a bearer token.
    AccessToken(SecretString),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub credentials: Credentials,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, credentials: Credentials) -> Self {
        let endpoint: String = endpoint.into();
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            credentials,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct AuthOpts {
    /// Cloud Natural Language API key
    #[arg(long, env = "TEXTLENS_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// File holding a service-account access token (e.g. from `gcloud auth print-access-token`)
    #[arg(long, env = "TEXTLENS_TOKEN_FILE")]
    pub token_file: Option<PathBuf>,

    /// Base URL of the language service
    #[arg(long, env = "TEXTLENS_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

impl AuthOpts {
    pub fn resolve(&self) -> Result<ClientConfig, ConfigError> {
        let api_key = self.api_key.as_deref().filter(|k| !k.trim().is_empty());
        let credentials = match (api_key, &self.token_file) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingCredentials),
            (Some(key), None) => Credentials::ApiKey(SecretString::from(key.trim().to_string())),
            (None, Some(path)) => Credentials::AccessToken(read_token(path)?),
            (None, None) => return Err(ConfigError::MissingCredentials),
        };
        Ok(ClientConfig::new(&self.endpoint, credentials))
    }
}

fn read_token(path: &Path) -> Result<SecretString, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::TokenFile {
        path: path.to_path_buf(),
        source,
    })?;
    let token = SecretString::from(raw.trim().to_string());
    if token.expose_secret().is_empty() {
        return Err(ConfigError::EmptyToken(path.to_path_buf()));
    }
    Ok(token)
}
