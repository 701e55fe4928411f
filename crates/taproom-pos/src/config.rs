//! # POS Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     TAPROOM_DB_PATH=/srv/taproom.db                                    │
//! │     TAPROOM_VENUE_NAME="The Tap Room"                                  │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     $TAPROOM_CONFIG, or                                                │
//! │     ~/.config/taproom-pos/taproom.toml (Linux)                         │
//! │     ~/Library/Application Support/com.taproom.pos/taproom.toml (macOS) │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "/srv/taproom/taproom.db"
//! max_connections = 5
//!
//! [pricing]
//! service_fee_bps = 1000      # 10%
//! service_fee_role = "waitress"
//! vat_bps = 1500              # 15%, already inside shelf prices
//!
//! [receipt]
//! venue_name = "The Tap Room"
//! currency_prefix = "K"
//! walk_in_name = "Walk-in"
//!
//! [tabs]
//! shared = false              # true: every staff member sees every tab
//!
//! [scanner]
//! debounce_ms = 1000
//! burst_gap_ms = 50
//! min_code_len = 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

use taproom_core::{PricingPolicy, Rate, Role};

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "taproom.toml";

/// Name of the database file inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "taproom.db";

// =============================================================================
// Errors
// =============================================================================

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to write config file: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine the platform {0} directory")]
    NoPlatformDir(&'static str),
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Database file. `None` means the platform data directory.
    pub path: Option<PathBuf>,
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: None,
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingSettings {
    /// Service fee in basis points (1000 = 10%).
    pub service_fee_bps: u32,

    /// The only role that is charged the service fee.
    pub service_fee_role: Role,

    /// VAT already contained in shelf prices, in basis points.
    pub vat_bps: u32,
}

impl Default for PricingSettings {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        PricingSettings {
            service_fee_bps: policy.service_fee_rate.bps(),
            service_fee_role: policy.service_fee_role,
            vat_bps: policy.vat_rate.bps(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptSettings {
    pub venue_name: String,

    /// Printed in front of every amount.
    pub currency_prefix: String,

    /// Tab name used when a walk-in customer pays without naming the order.
    pub walk_in_name: String,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            venue_name: "Taproom".to_string(),
            currency_prefix: "K".to_string(),
            walk_in_name: "Walk-in".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabSettings {
    /// List every open tab to every staff member instead of only their own.
    pub shared: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerSettings {
    /// Identical codes inside this window count as one scan.
    pub debounce_ms: u64,

    /// Keystrokes further apart than this are typing, not a scanner burst.
    pub burst_gap_ms: u64,

    /// Shorter bursts are dropped.
    pub min_code_len: usize,
}

impl Default for ScannerSettings {
    fn default() -> Self {
        ScannerSettings {
            debounce_ms: taproom_core::scanner::DEFAULT_DEBOUNCE.as_millis() as u64,
            burst_gap_ms: taproom_core::scanner::DEFAULT_BURST_GAP.as_millis() as u64,
            min_code_len: taproom_core::scanner::DEFAULT_MIN_CODE_LEN,
        }
    }
}

impl ScannerSettings {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn burst_gap(&self) -> Duration {
        Duration::from_millis(self.burst_gap_ms)
    }
}

// =============================================================================
// PosConfig
// =============================================================================

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PosConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub pricing: PricingSettings,

    #[serde(default)]
    pub receipt: ReceiptSettings,

    #[serde(default)]
    pub tabs: TabSettings,

    #[serde(default)]
    pub scanner: ScannerSettings,
}

impl PosConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`config_path`, `TAPROOM_CONFIG`, or the platform default)
    /// 3. Environment variables
    ///
    /// A missing file is not an error. A file that does not parse is, and so
    /// is an unknown role name.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = PosConfig::default();

        let path = config_path
            .or_else(|| std::env::var("TAPROOM_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = Self::from_toml(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides()?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections and keys take defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pricing.service_fee_bps > 10_000 {
            return Err(ConfigError::invalid(
                "pricing.service_fee_bps",
                "must be at most 10000 (100%)",
            ));
        }

        if self.pricing.vat_bps > 10_000 {
            return Err(ConfigError::invalid(
                "pricing.vat_bps",
                "must be at most 10000 (100%)",
            ));
        }

        if self.receipt.walk_in_name.trim().is_empty() {
            return Err(ConfigError::invalid("receipt.walk_in_name", "must not be blank"));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::invalid(
                "database.max_connections",
                "must be greater than 0",
            ));
        }

        if self.scanner.min_code_len == 0 {
            return Err(ConfigError::invalid(
                "scanner.min_code_len",
                "must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Pricing policy for the live cart and for persisted orders alike.
    pub fn pricing_policy(&self) -> PricingPolicy {
        PricingPolicy {
            service_fee_rate: Rate::from_bps(self.pricing.service_fee_bps),
            service_fee_role: self.pricing.service_fee_role,
            vat_rate: Rate::from_bps(self.pricing.vat_bps),
        }
    }

    /// Resolves the database file, creating the platform data directory
    /// when no explicit path is configured.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database.path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoPlatformDir("data"))?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;

        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(path) = std::env::var("TAPROOM_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = Some(PathBuf::from(path));
        }

        if let Ok(name) = std::env::var("TAPROOM_VENUE_NAME") {
            self.receipt.venue_name = name;
        }

        if let Ok(prefix) = std::env::var("TAPROOM_CURRENCY_PREFIX") {
            self.receipt.currency_prefix = prefix;
        }

        if let Ok(bps) = std::env::var("TAPROOM_SERVICE_FEE_BPS") {
            self.pricing.service_fee_bps = bps
                .parse()
                .map_err(|_| ConfigError::invalid("TAPROOM_SERVICE_FEE_BPS", bps.clone()))?;
        }

        if let Ok(role) = std::env::var("TAPROOM_SERVICE_FEE_ROLE") {
            self.pricing.service_fee_role = role
                .parse()
                .map_err(|e: taproom_core::ValidationError| {
                    ConfigError::invalid("TAPROOM_SERVICE_FEE_ROLE", e.to_string())
                })?;
        }

        if let Ok(bps) = std::env::var("TAPROOM_VAT_BPS") {
            self.pricing.vat_bps = bps
                .parse()
                .map_err(|_| ConfigError::invalid("TAPROOM_VAT_BPS", bps.clone()))?;
        }

        if let Ok(shared) = std::env::var("TAPROOM_SHARED_TABS") {
            match shared.to_lowercase().as_str() {
                "1" | "true" | "yes" => self.tabs.shared = true,
                "0" | "false" | "no" => self.tabs.shared = false,
                _ => warn!(value = %shared, "Unknown TAPROOM_SHARED_TABS value, ignoring"),
            }
        }

        Ok(())
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("com", "taproom", "pos")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PosConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pricing.service_fee_bps, 1000);
        assert_eq!(config.pricing.service_fee_role, Role::Waitress);
        assert_eq!(config.pricing.vat_bps, 1500);
        assert_eq!(config.receipt.currency_prefix, "K");
        assert!(!config.tabs.shared);
        assert_eq!(config.scanner.debounce(), Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = PosConfig::from_toml(
            r#"
            [receipt]
            venue_name = "The Tap Room"

            [tabs]
            shared = true
            "#,
        )
        .unwrap();

        assert_eq!(config.receipt.venue_name, "The Tap Room");
        assert_eq!(config.receipt.walk_in_name, "Walk-in");
        assert!(config.tabs.shared);
        assert_eq!(config.pricing.service_fee_bps, 1000);
        assert_eq!(config.database.max_connections, 5);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result = PosConfig::from_toml(
            r#"
            [pricing]
            service_fee_role = "bouncer"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = PosConfig::default();
        config.pricing.service_fee_bps = 20_000;
        assert!(config.validate().is_err());

        let mut config = PosConfig::default();
        config.receipt.walk_in_name = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = PosConfig::default();
        config.database.max_connections = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pricing_policy_from_config() {
        let mut config = PosConfig::default();
        config.pricing.service_fee_bps = 1250;
        config.pricing.service_fee_role = Role::Cashier;

        let policy = config.pricing_policy();
        assert_eq!(policy.service_fee_rate.bps(), 1250);
        assert_eq!(policy.service_fee_role, Role::Cashier);
        assert_eq!(policy.vat_rate.bps(), 1500);
    }

    #[test]
    fn test_explicit_database_path() {
        let mut config = PosConfig::default();
        config.database.path = Some(PathBuf::from("/tmp/taproom-config-test.db"));
        assert_eq!(
            config.database_path().unwrap(),
            PathBuf::from("/tmp/taproom-config-test.db")
        );
    }

    #[test]
    fn test_toml_serialization() {
        let toml_str = PosConfig::default().to_toml().unwrap();
        assert!(toml_str.contains("[pricing]"));
        assert!(toml_str.contains("[receipt]"));
        assert!(toml_str.contains("service_fee_role = \"waitress\""));
    }
}
