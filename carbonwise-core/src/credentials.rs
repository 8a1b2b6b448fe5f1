//! Access-token loading from the `codecarbon login` credentials file.
//!
//! The file is JSON with the token nested under `tokens.access_token`:
//!
//! ```json
//! { "tokens": { "access_token": "eyJ...", "refresh_token": "..." } }
//! ```

use serde::Deserialize;
use std::path::Path;

use crate::error::CredentialError;

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    tokens: Option<Tokens>,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    #[serde(default)]
    access_token: Option<String>,
}

/// Read the OAuth access token from the credentials file at `path`.
pub fn load_access_token(path: &Path) -> Result<String, CredentialError> {
    if !path.exists() {
        return Err(CredentialError::NotFound {
            path: path.to_path_buf(),
        });
    }

    let raw = std::fs::read_to_string(path).map_err(|source| CredentialError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: CredentialsFile =
        serde_json::from_str(&raw).map_err(|e| CredentialError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    parsed
        .tokens
        .and_then(|tokens| tokens.access_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| CredentialError::MissingAccessToken {
            path: path.to_path_buf(),
        })
}
