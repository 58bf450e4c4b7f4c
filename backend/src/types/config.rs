//! Process configuration read from environment variables

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use aws_config::{retry::RetryConfig, timeout::TimeoutConfig, BehaviorVersion, Region};
use aws_sdk_s3::config::{Credentials, RequestChecksumCalculation};
use thiserror::Error;

use super::Environment;
use crate::{
    middleware::{AccessGate, GatePolicy},
    photos::{DEFAULT_DOWNLOAD_URL_EXPIRY_SECS, DEFAULT_UPLOAD_URL_EXPIRY_SECS},
};

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_PAGES_DIR: &str = "pages";
const DEFAULT_PUBLIC_DIR: &str = "public";

/// Errors raised while reading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("{0} must be set")]
    Missing(&'static str),

    /// A variable is set to something unusable
    #[error("{name}={value:?} is invalid: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Connection settings for the R2 bucket
#[derive(Clone)]
pub struct R2Settings {
    pub endpoint: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
}

impl fmt::Debug for R2Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("R2Settings")
            .field("endpoint", &self.endpoint)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("bucket_name", &self.bucket_name)
            .finish()
    }
}

impl R2Settings {
    /// Reads `R2_ENDPOINT`, `R2_ACCESS_KEY_ID`, `R2_SECRET_ACCESS_KEY` and `R2_BUCKET_NAME`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for the first unset variable
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: required("R2_ENDPOINT")?,
            access_key_id: required("R2_ACCESS_KEY_ID")?,
            secret_access_key: required("R2_SECRET_ACCESS_KEY")?,
            bucket_name: required("R2_BUCKET_NAME")?,
        })
    }

    /// S3 client configuration for the R2 endpoint, with retry and timeout settings
    #[must_use]
    pub fn s3_client_config(&self) -> aws_sdk_s3::Config {
        let retry_config = RetryConfig::standard()
            .with_max_attempts(3)
            .with_initial_backoff(Duration::from_millis(50));

        let timeout_config = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(30))
            .build();

        let credentials = Credentials::new(
            &self.access_key_id,
            &self.secret_access_key,
            None,
            None,
            "r2-static",
        );

        aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("auto"))
            .endpoint_url(&self.endpoint)
            .credentials_provider(credentials)
            .force_path_style(true)
            // R2 rejects the default CRC32 checksum headers on presigned PUTs
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .retry_config(retry_config)
            .timeout_config(timeout_config)
            .build()
    }
}

/// Access gate settings
#[derive(Debug, Clone)]
pub struct AccessSettings {
    pub policy: GatePolicy,
    /// Present whenever `policy` guards at least one route
    pub gate: Option<AccessGate>,
}

impl AccessSettings {
    /// Reads `ACCESS_GATE` and `ADMIN_PASSWORD`.
    ///
    /// There is no fallback password: an enabled gate without `ADMIN_PASSWORD`
    /// is a configuration error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for an unknown policy or a missing password
    pub fn from_env() -> Result<Self, ConfigError> {
        let policy: GatePolicy = optional("ACCESS_GATE")
            .map(|value| parse_var("ACCESS_GATE", &value))
            .transpose()?
            .unwrap_or_default();

        if !policy.is_enabled() {
            return Ok(Self { policy, gate: None });
        }

        let password = required("ADMIN_PASSWORD")?;
        Ok(Self {
            policy,
            gate: Some(AccessGate::new(password)),
        })
    }
}

/// Directories the server reads files from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDirs {
    /// HTML pages, reachable only through their own routes
    pub pages: PathBuf,
    /// Assets served as-is for any path no route claims
    pub public: PathBuf,
}

impl SiteDirs {
    /// Reads `PAGES_DIR` and `PUBLIC_DIR`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            pages: optional("PAGES_DIR").map_or_else(|| DEFAULT_PAGES_DIR.into(), PathBuf::from),
            public: optional("PUBLIC_DIR").map_or_else(|| DEFAULT_PUBLIC_DIR.into(), PathBuf::from),
        }
    }
}

/// Everything the server reads from its environment
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    pub r2: R2Settings,
    pub access: AccessSettings,
    pub port: u16,
    pub site: SiteDirs,
    pub upload_url_expiry_secs: u64,
    pub download_url_expiry_secs: u64,
}

impl Config {
    /// Loads the full server configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` encountered
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            environment: Environment::from_env()?,
            r2: R2Settings::from_env()?,
            access: AccessSettings::from_env()?,
            port: parsed_or("PORT", DEFAULT_PORT)?,
            site: SiteDirs::from_env(),
            upload_url_expiry_secs: parsed_or(
                "UPLOAD_URL_EXPIRY_SECS",
                DEFAULT_UPLOAD_URL_EXPIRY_SECS,
            )?,
            download_url_expiry_secs: parsed_or(
                "DOWNLOAD_URL_EXPIRY_SECS",
                DEFAULT_DOWNLOAD_URL_EXPIRY_SECS,
            )?,
        })
    }
}

fn optional(name: &'static str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    optional(name).ok_or(ConfigError::Missing(name))
}

fn parse_var<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.parse().map_err(|e: T::Err| ConfigError::Invalid {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parsed_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    optional(name).map_or(Ok(default), |value| parse_var(name, &value))
}
