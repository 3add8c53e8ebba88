// src/cfg/client_secrets.rs
//
// OAuth client descriptor as downloaded from Google Cloud Console.

use log::debug;
use secure_string::SecureString;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::cfg::secure;
use crate::error::ProbeError;

const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,

    #[serde(deserialize_with = "secure::deserialize")]
    pub client_secret: SecureString,

    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,

    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

/// The file wraps the descriptor in `installed` (desktop app) or `web`.
#[derive(Debug, Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ClientSecrets {
    pub fn parse(content: &str) -> Result<Self, ProbeError> {
        let file: ClientSecretsFile = serde_json::from_str(content)
            .map_err(|e| ProbeError::Auth(format!("invalid client secrets: {}", e)))?;

        file.installed
            .or(file.web)
            .ok_or_else(|| ProbeError::Auth("client secrets have neither `installed` nor `web` section".to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        debug!("Loading OAuth client secrets from {:?}", path);

        let content = fs::read_to_string(path).map_err(|e| {
            ProbeError::Auth(format!("failed to read client secrets {}: {}", path.display(), e))
        })?;

        Self::parse(&content)
    }
}
