//! Secure credential handling for oracle providers.
//!
//! Credentials are wrapped so they cannot appear in Debug output, are
//! zeroed on drop, and must be explicitly exposed at the single point of
//! use.

use secrecy::{ExposeSecret, SecretString};
use std::fmt;

use super::OracleError;

/// Where a credential was loaded from. Useful for debugging configuration
/// issues without exposing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Loaded from an environment variable
    Environment,
    /// Provided programmatically
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely-stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    /// Wrap a credential value. After this point the value cannot be
    /// accidentally logged.
    pub fn new(
        value: impl Into<String>,
        source: CredentialSource,
        name: &'static str,
    ) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a credential from an environment variable.
    pub fn from_env(env_var: &str, name: &'static str) -> Result<Self, OracleError> {
        std::env::var(env_var)
            .map(|v| Self::new(v, CredentialSource::Environment, name))
            .map_err(|_| {
                OracleError::NotConfigured(format!(
                    "{name} not set: configure '{env_var}' environment variable"
                ))
            })
    }

    /// Expose the secret value. Call this only at the point of use
    /// (e.g. an HTTP header).
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    /// Whether the credential is empty.
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    /// The source this credential was loaded from.
    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("name", &self.name)
            .field("source", &self.source)
            .field("value", &"[REDACTED]")
            .finish()
    }
}
