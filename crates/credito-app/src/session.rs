// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use thiserror::Error;
use time::OffsetDateTime;

use crate::model::CurrentUser;

/// Reasons an authenticated request cannot proceed. Callers branch on these
/// to route the user back to the login prompt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("not signed in -- log in and retry")]
    SignedOut,
    #[error("session expired -- log in again")]
    Expired,
    #[error("invalid access token: {0}")]
    InvalidToken(String),
}

/// Finds a [`SessionError`] anywhere in an error chain, however much
/// context was layered on top of it.
pub fn session_error(error: &anyhow::Error) -> Option<&SessionError> {
    error
        .chain()
        .find_map(|cause| cause.downcast_ref::<SessionError>())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    raw: String,
    expires_at: Option<OffsetDateTime>,
}

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

impl AccessToken {
    /// Three-segment tokens are treated as JWTs and must carry a decodable
    /// payload; anything else is kept as an opaque bearer token with no
    /// known expiry.
    pub fn parse(raw: &str) -> Result<Self, SessionError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(SessionError::InvalidToken("token is empty".to_owned()));
        }

        let segments: Vec<&str> = raw.split('.').collect();
        if segments.len() != 3 {
            return Ok(Self {
                raw: raw.to_owned(),
                expires_at: None,
            });
        }

        let payload = URL_SAFE_NO_PAD
            .decode(segments[1].trim_end_matches('='))
            .map_err(|error| SessionError::InvalidToken(format!("payload base64: {error}")))?;
        let claims: Claims = serde_json::from_slice(&payload)
            .map_err(|error| SessionError::InvalidToken(format!("payload json: {error}")))?;
        let expires_at = claims
            .exp
            .map(OffsetDateTime::from_unix_timestamp)
            .transpose()
            .map_err(|error| SessionError::InvalidToken(format!("exp claim: {error}")))?;

        Ok(Self {
            raw: raw.to_owned(),
            expires_at,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn expires_at(&self) -> Option<OffsetDateTime> {
        self.expires_at
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// The authenticated identity for one console instance. Owned by the API
/// client; never global.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<AccessToken>,
    user: Option<CurrentUser>,
}

impl Session {
    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, token: AccessToken) {
        self.token = Some(token);
        self.user = None;
    }

    pub fn set_user(&mut self, user: CurrentUser) {
        self.user = Some(user);
    }

    pub fn sign_out(&mut self) {
        self.token = None;
        self.user = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn user(&self) -> Option<&CurrentUser> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Option<&AccessToken> {
        self.token.as_ref()
    }

    /// Yields the bearer credential for a request. An expired token signs
    /// the session out before reporting the error.
    pub fn authorize(&mut self, now: OffsetDateTime) -> Result<String, SessionError> {
        let token = self.token.as_ref().ok_or(SessionError::SignedOut)?;
        if token.is_expired(now) {
            self.sign_out();
            return Err(SessionError::Expired);
        }
        Ok(format!("Bearer {}", token.as_str()))
    }

    /// The server rejected the credential.
    pub fn reject(&mut self) -> SessionError {
        let was_authenticated = self.is_authenticated();
        self.sign_out();
        if was_authenticated {
            SessionError::Expired
        } else {
            SessionError::SignedOut
        }
    }
}

/// Builds an unsigned JWT with the given expiry. Signature verification is
/// the server's concern; the console only reads `exp`.
pub fn unsigned_token(subject: &str, exp: OffsetDateTime) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(
        serde_json::json!({ "sub": subject, "exp": exp.unix_timestamp() }).to_string(),
    );
    format!("{header}.{payload}.")
}
