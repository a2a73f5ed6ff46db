//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    /// SECURITY: When enabled, ensure this endpoint is network-restricted
    /// to authorized Prometheus scraper IPs only at the infrastructure level.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Where content bytes are resolved from. Fixed for the process lifetime.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    /// Read from the local scripts/bin directories on every request.
    #[default]
    Local,
    /// Fetch from the remote raw-content origin, with a TTL cache in front.
    Remote,
}

/// Content source configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContentConfig {
    /// Backend selection.
    #[serde(default)]
    pub mode: ContentMode,
    /// Local root for scripts.
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: PathBuf,
    /// Local root for binaries.
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,
    /// Base URL of the remote raw-content origin (no trailing slash needed).
    #[serde(default = "default_remote_base_url")]
    pub remote_base_url: String,
    /// Time-to-live for cached remote lookups, including misses.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Per-request timeout for remote fetches.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// In remote mode, retry a remote miss against the local directories.
    /// Off by default: a remote miss is a miss.
    #[serde(default)]
    pub fallback_to_local: bool,
}

fn default_scripts_dir() -> PathBuf {
    PathBuf::from("./scripts")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("./bin")
}

fn default_remote_base_url() -> String {
    "https://raw.githubusercontent.com/huntbase-io/scout-content/main".to_string()
}

fn default_cache_ttl_secs() -> u64 {
    crate::DEFAULT_CACHE_TTL_SECS
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            mode: ContentMode::default(),
            scripts_dir: default_scripts_dir(),
            bin_dir: default_bin_dir(),
            remote_base_url: default_remote_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            fallback_to_local: false,
        }
    }
}

impl ContentConfig {
    /// Get the cache TTL as a Duration.
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Get the remote request timeout as a Duration.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Apply the legacy `USE_GITHUB` flag: `"1"` selects remote mode, any
    /// other value selects local mode, and an unset flag leaves the
    /// configured mode alone.
    pub fn apply_legacy_mode_flag(&mut self, value: Option<&str>) {
        match value {
            Some("1") => self.mode = ContentMode::Remote,
            Some(_) => self.mode = ContentMode::Local,
            None => {}
        }
    }

    /// Validate the content configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.mode == ContentMode::Remote {
            let url = url::Url::parse(&self.remote_base_url).map_err(|e| {
                format!(
                    "content.remote_base_url is not a valid URL ({}): {e}",
                    self.remote_base_url
                )
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!(
                    "content.remote_base_url must use http or https, got {}",
                    url.scheme()
                ));
            }
        }

        if self.cache_ttl_secs == 0 {
            return Err("content.cache_ttl_secs cannot be 0".to_string());
        }

        if self.request_timeout_secs == 0 {
            return Err("content.request_timeout_secs cannot be 0".to_string());
        }

        Ok(())
    }
}

/// Signing configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SigningConfig {
    /// Private key source.
    #[serde(default)]
    pub private_key: PrivateKeyConfig,
}

/// Private key source configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PrivateKeyConfig {
    /// PEM key stored in a file.
    File {
        /// Path to the PEM private key file.
        path: PathBuf,
    },
    /// PEM key stored in environment variable.
    Env {
        /// Environment variable name.
        var: String,
    },
    /// PEM key provided directly as a value (NOT recommended for production).
    Value {
        /// The PEM-encoded private key.
        key: String,
    },
    /// Generate a new key (for development only).
    Generate {
        /// Modulus size in bits.
        #[serde(default = "default_generated_key_bits")]
        bits: usize,
    },
}

fn default_generated_key_bits() -> usize {
    2048
}

impl Default for PrivateKeyConfig {
    fn default() -> Self {
        Self::File {
            path: PathBuf::from("private_key.pem"),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Content source configuration.
    #[serde(default)]
    pub content: ContentConfig,
    /// Signing configuration.
    #[serde(default)]
    pub signing: SigningConfig,
}

impl AppConfig {
    /// Create a test configuration rooted at the given directory.
    ///
    /// **For testing only.** Uses local mode with `scripts/` and `bin/`
    /// under `root`.
    pub fn for_testing(root: &std::path::Path) -> Self {
        Self {
            server: ServerConfig::default(),
            content: ContentConfig {
                scripts_dir: root.join("scripts"),
                bin_dir: root.join("bin"),
                ..Default::default()
            },
            signing: SigningConfig::default(),
        }
    }

    /// Validate the whole configuration.
    pub fn validate(&self) -> Result<(), String> {
        self.content.validate()
    }
}
