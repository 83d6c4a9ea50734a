//! # Sync Configuration Module
//!
//! Provides configuration management for catalog synchronization.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a `SyncConfig`
//! instance holding every setting the reconciliation run needs. Validation is
//! fail-fast: a malformed path, identity or retry bound is reported as
//! [`Error::Config`] before any catalog is listed.
//!
//! Configuration can also be loaded from a TOML file:
//!
//! ```toml
//! [source]
//! root = "/home/ann/Pictures"
//!
//! [destination]
//! root = "/srv/albums"
//! identity = "ann"
//!
//! [sync]
//! dry_run = false
//! staging_dir = "/tmp/catalog-sync"
//!
//! [sync.retry]
//! max_attempts = 3
//! delay_ms = 1000
//!
//! [media]
//! allowed_mime_types = ["image/jpeg", "image/png"]
//! max_item_size_bytes = 10485760
//!
//! [logging]
//! level = "info"
//! format = "compact"
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SyncConfig;
//!
//! let config = SyncConfig::builder()
//!     .source_root("/home/ann/Pictures")
//!     .destination_root("/srv/albums")
//!     .identity("ann")
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::{LogFormat, LogLevel, LoggingConfig};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration file looked up when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "catalog-sync.toml";

/// Largest item accepted for transfer (10 MiB)
pub const DEFAULT_MAX_ITEM_SIZE_BYTES: u64 = 10_485_760;

/// Raster image types accepted for transfer
pub const DEFAULT_ALLOWED_MIME_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/gif", "image/x-ms-bmp"];

/// Default number of upload attempts (initial try included)
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between upload attempts
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1000;

/// Upper bound for the retry delay (10 minutes)
const MAX_RETRY_DELAY_MS: u64 = 600_000;

/// Retry settings for the upload step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    /// Total tries, initial attempt included
    pub max_attempts: u32,
    /// Fixed delay between attempts in milliseconds
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay_ms: DEFAULT_RETRY_DELAY_MS,
        }
    }
}

/// Which source entries count as transferable media
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MediaSettings {
    pub allowed_mime_types: Vec<String>,
    pub max_item_size_bytes: u64,
}

impl Default for MediaSettings {
    fn default() -> Self {
        Self {
            allowed_mime_types: DEFAULT_ALLOWED_MIME_TYPES
                .iter()
                .map(|mime| mime.to_string())
                .collect(),
            max_item_size_bytes: DEFAULT_MAX_ITEM_SIZE_BYTES,
        }
    }
}

/// Configuration for one reconciliation run.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    /// Root of the source folder tree
    pub source_root: PathBuf,

    /// Root of the destination album store
    pub destination_root: PathBuf,

    /// Destination credential identity; keys the staging area
    pub identity: String,

    /// Staging directory override (platform cache directory when unset)
    pub staging_dir: Option<PathBuf>,

    /// Largest upload the destination accepts, if it enforces a quota
    pub destination_quota_bytes: Option<u64>,

    /// Upload retry settings
    pub retry: RetrySettings,

    /// Media eligibility settings
    pub media: MediaSettings,

    /// Compute diffs without transferring anything
    pub dry_run: bool,

    /// Logging settings
    pub logging: LoggingConfig,
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncConfig")
            .field("source_root", &self.source_root)
            .field("destination_root", &self.destination_root)
            .field("identity", &"[REDACTED]")
            .field("staging_dir", &self.staging_dir)
            .field("destination_quota_bytes", &self.destination_quota_bytes)
            .field("retry", &self.retry)
            .field("media", &self.media)
            .field("dry_run", &self.dry_run)
            .field("logging", &self.logging)
            .finish()
    }
}

impl SyncConfig {
    /// Creates a new builder for constructing a `SyncConfig`.
    pub fn builder() -> SyncConfigBuilder {
        SyncConfigBuilder::default()
    }

    /// Load configuration from a TOML file.
    ///
    /// Relative paths inside the file are resolved against the directory
    /// containing the file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&contents, Some(base))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Self::parse(contents, None)
    }

    fn parse(contents: &str, base: Option<&Path>) -> Result<Self> {
        let file: FileConfig = toml::from_str(contents)
            .map_err(|e| Error::Config(format!("Invalid configuration file: {}", e)))?;

        let resolve = |p: PathBuf| match base {
            Some(base) if p.is_relative() => base.join(p),
            _ => p,
        };

        let mut logging = LoggingConfig::default();
        if let Some(level) = file.logging.level {
            logging = logging.with_level(level);
        }
        if let Some(format) = file.logging.format {
            logging = logging.with_format(format);
        }
        if let Some(filter) = file.logging.filter {
            logging = logging.with_filter(filter);
        }

        let mut builder = Self::builder()
            .retry(file.sync.retry)
            .media(file.media)
            .dry_run(file.sync.dry_run)
            .logging(logging);

        if let Some(root) = file.source.root {
            builder = builder.source_root(resolve(root));
        }
        if let Some(root) = file.destination.root {
            builder = builder.destination_root(resolve(root));
        }
        if let Some(identity) = file.destination.identity {
            builder = builder.identity(identity);
        }
        if let Some(quota) = file.destination.quota_bytes {
            builder = builder.destination_quota_bytes(quota);
        }
        if let Some(dir) = file.sync.staging_dir {
            builder = builder.staging_dir(resolve(dir));
        }

        builder.build()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Source and destination roots are not empty
    /// - The identity is usable as a single directory name
    /// - Retry bound is at least one attempt and the delay is reasonable
    /// - At least one MIME type is allowed and the size ceiling is non-zero
    pub fn validate(&self) -> Result<()> {
        if self.source_root.as_os_str().is_empty() {
            return Err(Error::Config("Source root cannot be empty".to_string()));
        }

        if self.destination_root.as_os_str().is_empty() {
            return Err(Error::Config(
                "Destination root cannot be empty".to_string(),
            ));
        }

        if self.identity.trim().is_empty() {
            return Err(Error::Config("Identity cannot be empty".to_string()));
        }

        if self.identity.contains(['/', '\\', '\0']) || self.identity == "." || self.identity == ".."
        {
            return Err(Error::Config(
                "Identity must be usable as a single directory name".to_string(),
            ));
        }

        if let Some(dir) = &self.staging_dir {
            if dir.as_os_str().is_empty() {
                return Err(Error::Config(
                    "Staging directory cannot be empty".to_string(),
                ));
            }
        }

        if self.destination_quota_bytes == Some(0) {
            return Err(Error::Config(
                "Destination quota must be greater than 0 bytes".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "Retry max_attempts must be at least 1".to_string(),
            ));
        }

        if self.retry.delay_ms > MAX_RETRY_DELAY_MS {
            return Err(Error::Config(
                "Retry delay exceeds maximum of 10 minutes (600,000ms)".to_string(),
            ));
        }

        if self.media.allowed_mime_types.is_empty() {
            return Err(Error::Config(
                "At least one MIME type must be allowed".to_string(),
            ));
        }

        if self.media.max_item_size_bytes == 0 {
            return Err(Error::Config(
                "Maximum item size must be greater than 0 bytes".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for constructing [`SyncConfig`] instances.
#[derive(Default)]
pub struct SyncConfigBuilder {
    source_root: Option<PathBuf>,
    destination_root: Option<PathBuf>,
    identity: Option<String>,
    staging_dir: Option<PathBuf>,
    destination_quota_bytes: Option<u64>,
    retry: RetrySettings,
    media: MediaSettings,
    dry_run: bool,
    logging: LoggingConfig,
}

impl SyncConfigBuilder {
    /// Sets the source root directory.
    pub fn source_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.source_root = Some(path.into());
        self
    }

    /// Sets the destination root directory.
    pub fn destination_root<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.destination_root = Some(path.into());
        self
    }

    /// Sets the destination credential identity.
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    /// Overrides the staging directory.
    pub fn staging_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.staging_dir = Some(path.into());
        self
    }

    /// Sets the largest upload the destination accepts.
    pub fn destination_quota_bytes(mut self, bytes: u64) -> Self {
        self.destination_quota_bytes = Some(bytes);
        self
    }

    /// Sets upload retry settings.
    pub fn retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// Sets media eligibility settings.
    pub fn media(mut self, media: MediaSettings) -> Self {
        self.media = media;
        self
    }

    /// Enables or disables dry-run mode.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Sets logging settings.
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = logging;
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when a required setting is missing or
    /// [`SyncConfig::validate`] rejects the result.
    pub fn build(self) -> Result<SyncConfig> {
        let source_root = self.source_root.ok_or_else(|| {
            Error::Config("Source root is required ([source] root)".to_string())
        })?;
        let destination_root = self.destination_root.ok_or_else(|| {
            Error::Config("Destination root is required ([destination] root)".to_string())
        })?;
        let identity = self.identity.ok_or_else(|| {
            Error::Config("Identity is required ([destination] identity)".to_string())
        })?;

        let config = SyncConfig {
            source_root,
            destination_root,
            identity,
            staging_dir: self.staging_dir,
            destination_quota_bytes: self.destination_quota_bytes,
            retry: self.retry,
            media: self.media,
            dry_run: self.dry_run,
            logging: self.logging,
        };

        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    source: SourceSection,
    destination: DestinationSection,
    sync: SyncSection,
    media: MediaSettings,
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SourceSection {
    root: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct DestinationSection {
    root: Option<PathBuf>,
    identity: Option<String>,
    quota_bytes: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SyncSection {
    staging_dir: Option<PathBuf>,
    dry_run: bool,
    retry: RetrySettings,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct LoggingSection {
    level: Option<LogLevel>,
    format: Option<LogFormat>,
    filter: Option<String>,
}
