//! Environment and credential loading.
//
// Credentials are read once at startup. Token refresh is not handled here;
// an expired Google token surfaces as a backend error on the first call.

use crate::config::ConfigError;
use log::{debug, info};
use secrecy::SecretString;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const GROQ_API_KEY_VAR: &str = "GROQ_API_KEY";
pub const GOOGLE_TOKEN_VAR: &str = "GOOGLE_CALENDAR_TOKEN";
pub const GOOGLE_TOKEN_PATH_VAR: &str = "GOOGLE_TOKEN_PATH";

const DEFAULT_TOKEN_PATH: &str = "token.json";

/// Secrets needed to reach the oracle and the calendar
#[derive(Debug)]
pub struct Credentials {
    pub oracle_api_key: SecretString,
    pub calendar_token: SecretString,
}

/// Authorized-user token file; older tooling writes `token`, newer writes `access_token`
#[derive(Debug, Deserialize)]
struct TokenFile {
    token: Option<String>,
    access_token: Option<String>,
}

/// Load a `.env` file from the working directory if one exists
pub fn load_env_file() {
    match dotenvy::dotenv() {
        Ok(path) => info!("Loaded environment from {:?}", path),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let oracle_api_key: SecretString = non_empty_var(GROQ_API_KEY_VAR)
            .ok_or_else(|| {
                ConfigError::MissingCredential(format!(
                    "{} environment variable not set",
                    GROQ_API_KEY_VAR
                ))
            })?
            .into();

        let calendar_token: SecretString = match non_empty_var(GOOGLE_TOKEN_VAR) {
            Some(token) => token,
            None => {
                let path = non_empty_var(GOOGLE_TOKEN_PATH_VAR)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH));
                read_token_file(&path)?
            }
        }
        .into();

        Ok(Self { oracle_api_key, calendar_token })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

/// Read the bearer token out of an authorized-user token file
pub fn read_token_file(path: &Path) -> Result<String, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingCredential(format!(
            "{} not set and token file {:?} not found",
            GOOGLE_TOKEN_VAR, path
        )));
    }
    let content = fs::read_to_string(path).map_err(|e| ConfigError::InvalidCredential {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    let token_file: TokenFile =
        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidCredential {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let non_empty = |token: Option<String>| token.filter(|t| !t.trim().is_empty());
    non_empty(token_file.access_token)
        .or_else(|| non_empty(token_file.token))
        .ok_or_else(|| ConfigError::InvalidCredential {
            path: path.to_path_buf(),
            reason: "no 'token' or 'access_token' field".to_string(),
        })
}
