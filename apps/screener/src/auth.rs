//! Analyst authentication: HTTP Basic credentials checked against the
//! configured analyst list.

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::errors::AppError;
use crate::state::AppState;

/// Known analysts and their passwords.
#[derive(Debug, Clone, Default)]
pub struct AnalystDirectory {
    credentials: HashMap<String, String>,
}

impl AnalystDirectory {
    pub fn new(analysts: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            credentials: analysts.into_iter().collect(),
        }
    }

    pub fn is_authenticated(&self, username: &str, password: &str) -> bool {
        self.credentials
            .get(username)
            .is_some_and(|expected| expected == password)
    }

    pub fn count(&self) -> usize {
        self.credentials.len()
    }
}

/// The authenticated analyst making the request.
#[derive(Debug, Clone, PartialEq)]
pub struct Analyst {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for Analyst {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let (username, password) = decode_basic(header).ok_or(AppError::Unauthorized)?;

        if !state.analysts.is_authenticated(&username, &password) {
            tracing::warn!("Rejected credentials for '{username}'");
            return Err(AppError::Unauthorized);
        }
        Ok(Analyst { username })
    }
}

/// Decodes an `Authorization: Basic <base64(user:password)>` header value.
fn decode_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}
