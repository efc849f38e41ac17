//! Credential gate for guarded routes.
//!
//! Each guarded route owns a [`CredentialGate`] holding exactly one
//! user/password pair. The gate reads HTTP Basic credentials from the
//! `Authorization` header and compares both halves in constant time:
//!
//! ```text
//! Authorization: Basic base64(user ":" pass)
//!     → Credentials::from_headers()     // MissingCredentials if absent/unparseable
//!         → CredentialGate::verify()    // InvalidCredentials on mismatch
//! ```
//!
//! The gate does not require a secure transport; terminating TLS is the
//! deployment's job.
//!
//! Password material is held in [`Zeroizing`] buffers and never appears in
//! `Debug` output.

use std::fmt;

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

use jobgate_config::FeatureSettings;

/// Realm advertised in the `WWW-Authenticate` challenge.
pub const DEFAULT_REALM: &str = "Protected";

/// Why a request was turned away by the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("no credentials supplied")]
    MissingCredentials,

    #[error("credentials do not match")]
    InvalidCredentials,
}

/// A username/password pair presented by a client.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    password: Zeroizing<String>,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Zeroizing::new(password.into()),
        }
    }

    /// Extract Basic credentials from request headers.
    ///
    /// A missing header, a scheme other than `Basic`, bad base64, non-UTF-8
    /// content or a missing `:` all count as no credentials.
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AuthError> {
        let value = headers
            .get(AUTHORIZATION)
            .ok_or(AuthError::MissingCredentials)?;
        Self::parse_authorization(value.as_bytes()).ok_or(AuthError::MissingCredentials)
    }

    /// Parse the raw value of an `Authorization` header.
    pub fn parse_authorization(value: &[u8]) -> Option<Self> {
        let value = std::str::from_utf8(value).ok()?.trim();
        let (scheme, encoded) = value.split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("basic") {
            return None;
        }

        let decoded = Zeroizing::new(STANDARD.decode(encoded.trim()).ok()?);
        let decoded = std::str::from_utf8(&decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self::new(username, password))
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Render as an `Authorization` header value.
    pub fn to_authorization(&self) -> String {
        let raw = Zeroizing::new(format!("{}:{}", self.username, self.password.as_str()));
        format!("Basic {}", STANDARD.encode(raw.as_bytes()))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Authentication check run before a guarded route's handler.
///
/// Stateless apart from the configured pair, so one gate can be shared by
/// any number of concurrent requests.
pub struct CredentialGate {
    username: Zeroizing<Vec<u8>>,
    password: Zeroizing<Vec<u8>>,
    realm: String,
}

impl CredentialGate {
    /// A gate admitting only `username` / `password`.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Zeroizing::new(username.into().into_bytes()),
            password: Zeroizing::new(password.into().into_bytes()),
            realm: DEFAULT_REALM.to_string(),
        }
    }

    /// A gate for the pair held in feature settings.
    pub fn from_settings(settings: &FeatureSettings) -> Self {
        Self::new(settings.user.as_str(), settings.pass.as_str())
    }

    pub fn with_realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }

    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// Authenticate a request from its headers.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        let credentials = Credentials::from_headers(headers)?;
        self.verify(&credentials)
    }

    /// Compare presented credentials against the configured pair.
    ///
    /// Both halves are always compared so the response time does not reveal
    /// which one matched.
    pub fn verify(&self, credentials: &Credentials) -> Result<(), AuthError> {
        let user_ok = credentials.username.as_bytes().ct_eq(self.username.as_slice());
        let pass_ok = credentials.password.as_bytes().ct_eq(self.password.as_slice());
        if bool::from(user_ok & pass_ok) {
            Ok(())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    /// Value for the `WWW-Authenticate` header sent with a 401.
    pub fn challenge(&self) -> String {
        format!("Basic realm=\"{}\"", self.realm)
    }

    /// Whether two gates admit exactly the same pair.
    pub fn same_credentials(&self, other: &CredentialGate) -> bool {
        let user_eq = self.username.as_slice().ct_eq(other.username.as_slice());
        let pass_eq = self.password.as_slice().ct_eq(other.password.as_slice());
        bool::from(user_eq & pass_eq)
    }
}

impl fmt::Debug for CredentialGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialGate")
            .field("username", &String::from_utf8_lossy(&self.username))
            .field("password", &"[REDACTED]")
            .field("realm", &self.realm)
            .finish()
    }
}
