//! Configuration types for site auth

use std::time::Duration;

use crate::key::{KeyError, SigningKey};

/// Default path prefix under which private files are served
pub const DEFAULT_PRIVATE_FILES_PREFIX: &str = "/private/files/";

/// Whether a bearer token must be presented from the address it was issued to.
///
/// Disabled by default: a client's address legitimately changes mid-session
/// (Wi-Fi to cellular, for instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AddressBinding {
    /// The `ip` claim is carried but never compared
    #[default]
    Disabled,
    /// The `ip` claim must equal the request's source address
    Enforced,
}

/// Site auth configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Deployment encryption key, reused as the token signing secret
    pub encryption_key: String,
    /// Site name reported in the `X-Client-Site` response header
    pub site_name: String,
    /// Path prefix where the `token` query parameter is honored
    pub private_files_prefix: String,
    /// Source address binding policy for bearer tokens
    pub address_binding: AddressBinding,
    /// Clock skew tolerated when checking `exp`
    pub token_leeway: Duration,
}

impl AuthConfig {
    /// Create a new auth config
    pub fn new(encryption_key: impl Into<String>, site_name: impl Into<String>) -> Self {
        Self {
            encryption_key: encryption_key.into(),
            site_name: site_name.into(),
            private_files_prefix: DEFAULT_PRIVATE_FILES_PREFIX.to_string(),
            address_binding: AddressBinding::Disabled,
            token_leeway: Duration::ZERO,
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let encryption_key =
            std::env::var("ENCRYPTION_KEY").map_err(|_| ConfigError::Missing("ENCRYPTION_KEY"))?;

        let site_name = std::env::var("SITE_NAME").map_err(|_| ConfigError::Missing("SITE_NAME"))?;

        let private_files_prefix = std::env::var("PRIVATE_FILES_PREFIX")
            .unwrap_or_else(|_| DEFAULT_PRIVATE_FILES_PREFIX.to_string());

        let bind_address: bool = std::env::var("TOKEN_BIND_ADDRESS")
            .unwrap_or_else(|_| "false".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("TOKEN_BIND_ADDRESS"))?;

        let leeway_secs: u64 = std::env::var("TOKEN_LEEWAY_SECS")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("TOKEN_LEEWAY_SECS"))?;

        let config = Self::new(encryption_key, site_name)
            .with_private_files_prefix(private_files_prefix)
            .with_address_binding(if bind_address {
                AddressBinding::Enforced
            } else {
                AddressBinding::Disabled
            })
            .with_token_leeway(Duration::from_secs(leeway_secs));

        // Fail at startup rather than on the first token
        config.signing_key()?;
        Ok(config)
    }

    /// Derive the token signing key from the encryption key
    pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
        SigningKey::new(self.encryption_key.as_bytes()).map_err(ConfigError::Key)
    }

    /// Set the private files prefix
    pub fn with_private_files_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.private_files_prefix = prefix.into();
        self
    }

    /// Set the address binding policy
    pub fn with_address_binding(mut self, binding: AddressBinding) -> Self {
        self.address_binding = binding;
        self
    }

    /// Set the expiry leeway
    pub fn with_token_leeway(mut self, leeway: Duration) -> Self {
        self.token_leeway = leeway;
        self
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),

    #[error("Invalid encryption key: {0}")]
    Key(#[from] KeyError),
}
