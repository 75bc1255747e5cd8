//! # Terminal Configuration
//!
//! Store identity, service settings and printer setup for one counter.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     WASHFOLD_STORE_NAME="Wash & Fold Costa del Este"                   │
//! │     WASHFOLD_TAX_RATE=7          (percent)                             │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/washfold-pos/terminal.toml (Linux)                       │
//! │     ~/Library/Application Support/com.washfold.pos/terminal.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     7% ITBMS, Panama time, 48-column paper                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # terminal.toml
//! currency_prefix = "B/"
//! utc_offset_minutes = -300
//!
//! [store]
//! id = "store-001"
//! name = "WASH & FOLD"
//! address = "Calle 50, Ciudad de Panamá"
//! phone = "6000-0000"
//! ruc = "155-1234-56789"
//! dv = "12"
//!
//! [service]
//! tax_rate = 700                # basis points
//! default_completion_days = 1
//! express_completion_days = 0
//!
//! [printer]
//! name = "Counter"
//! paper_width = 48
//!
//! [cash]
//! default_opening_balance = 50.0
//! ```

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, info, warn};
use washfold_core::layout::offset_from_minutes;
use washfold_core::validation::{validate_opening_balance, validate_tax_rate};
use washfold_core::{
    Money, PrintFormat, ServiceSettings, StoreInfo, TaxRate, DEFAULT_CURRENCY_PREFIX, PAPER_WIDTH,
};

use crate::error::ConfigError;

/// Narrowest paper a receipt still fits on (58mm rolls).
const MIN_PAPER_WIDTH: usize = 32;
const MAX_PAPER_WIDTH: usize = 80;

/// UTC-14:00 to UTC+14:00.
const MAX_OFFSET_MINUTES: i32 = 14 * 60;

// =============================================================================
// Sections
// =============================================================================

fn default_store_id() -> String {
    "store-001".to_string()
}

fn default_store_name() -> String {
    StoreInfo::default().name
}

/// `[store]`: identity printed on receipts and reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_store_id")]
    pub id: String,
    #[serde(default = "default_store_name")]
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub ruc: Option<String>,
    #[serde(default)]
    pub dv: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            id: default_store_id(),
            name: default_store_name(),
            address: None,
            phone: None,
            ruc: None,
            dv: None,
        }
    }
}

fn default_printer_name() -> String {
    "Counter".to_string()
}

fn default_paper_width() -> usize {
    PAPER_WIDTH
}

/// `[printer]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrinterConfig {
    #[serde(default = "default_printer_name")]
    pub name: String,

    /// Characters per line.
    #[serde(default = "default_paper_width")]
    pub paper_width: usize,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        PrinterConfig {
            name: default_printer_name(),
            paper_width: default_paper_width(),
        }
    }
}

/// `[cash]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CashConfig {
    /// Float left in the drawer each morning, used when the closing
    /// command is not given one.
    #[serde(default)]
    pub default_opening_balance: Money,
}

// =============================================================================
// Terminal Config
// =============================================================================

fn default_currency_prefix() -> String {
    DEFAULT_CURRENCY_PREFIX.to_string()
}

fn default_utc_offset_minutes() -> i32 {
    washfold_core::layout::DEFAULT_UTC_OFFSET_MINUTES
}

/// Complete terminal configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,

    /// Store offset from UTC in minutes. Day bounds and printed times use it.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,

    #[serde(default)]
    pub store: StoreConfig,

    /// Fallback when the data store has no saved settings.
    #[serde(default)]
    pub service: ServiceSettings,

    #[serde(default)]
    pub printer: PrinterConfig,

    #[serde(default)]
    pub cash: CashConfig,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            currency_prefix: default_currency_prefix(),
            utc_offset_minutes: default_utc_offset_minutes(),
            store: StoreConfig::default(),
            service: ServiceSettings::default(),
            printer: PrinterConfig::default(),
            cash: CashConfig::default(),
        }
    }
}

impl TerminalConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (terminal.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading terminal config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load terminal config: {}. Using defaults.", e);
            Self::default()
        })
    }

    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::Invalid("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Terminal config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tax_rate(self.service.tax_rate)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }

        if !(MIN_PAPER_WIDTH..=MAX_PAPER_WIDTH).contains(&self.printer.paper_width) {
            return Err(ConfigError::Invalid(format!(
                "paper_width must be between {} and {}, got {}",
                MIN_PAPER_WIDTH, MAX_PAPER_WIDTH, self.printer.paper_width
            )));
        }

        if self.store.name.trim().is_empty() {
            return Err(ConfigError::Invalid("store name cannot be empty".into()));
        }

        validate_opening_balance(self.cash.default_opening_balance)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies `WASHFOLD_*` overrides from `lookup`. Unparseable values are
    /// logged and ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(name) = lookup("WASHFOLD_STORE_NAME") {
            debug!(store = %name, "Overriding store name from environment");
            self.store.name = name;
        }

        if let Some(rate) = lookup("WASHFOLD_TAX_RATE") {
            match Decimal::from_str(rate.trim())
                .ok()
                .and_then(TaxRate::from_percentage)
            {
                Some(parsed) => {
                    debug!(bps = parsed.bps(), "Overriding tax rate from environment");
                    self.service.tax_rate = parsed;
                }
                None => warn!(rate = %rate, "Invalid tax rate in environment"),
            }
        }

        if let Some(offset) = lookup("WASHFOLD_UTC_OFFSET_MINUTES") {
            match offset.trim().parse::<i32>() {
                Ok(minutes) => {
                    debug!(minutes, "Overriding UTC offset from environment");
                    self.utc_offset_minutes = minutes;
                }
                Err(_) => warn!(offset = %offset, "Invalid UTC offset in environment"),
            }
        }

        if let Some(printer) = lookup("WASHFOLD_PRINTER") {
            debug!(printer = %printer, "Overriding printer from environment");
            self.printer.name = printer;
        }

        if let Some(prefix) = lookup("WASHFOLD_CURRENCY_PREFIX") {
            self.currency_prefix = prefix;
        }
    }

    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "washfold", "pos")
            .map(|dirs| dirs.config_dir().join("terminal.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Receipt and report header.
    pub fn store_info(&self) -> StoreInfo {
        StoreInfo {
            name: self.store.name.clone(),
            address: self.store.address.clone(),
            phone: self.store.phone.clone(),
            ruc: self.store.ruc.clone(),
            dv: self.store.dv.clone(),
        }
    }

    pub fn print_format(&self) -> PrintFormat {
        PrintFormat::new(
            self.printer.paper_width,
            self.currency_prefix.clone(),
            self.utc_offset_minutes,
        )
    }

    pub fn utc_offset(&self) -> FixedOffset {
        offset_from_minutes(self.utc_offset_minutes)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = TerminalConfig::default();
        assert_eq!(config.currency_prefix, "B/");
        assert_eq!(config.utc_offset_minutes, -300);
        assert_eq!(config.service.tax_rate, TaxRate::ITBMS);
        assert_eq!(config.printer.paper_width, 48);
        assert!(config.validate().is_ok());
        assert_eq!(config.utc_offset(), FixedOffset::west_opt(5 * 3600).unwrap());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: TerminalConfig = toml::from_str(
            r#"
            [store]
            name = "Lavandería Central"
            ruc = "155-1234-56789"
            dv = "12"

            [service]
            tax_rate = 1000
            "#,
        )
        .unwrap();

        assert_eq!(config.store.id, "store-001");
        assert_eq!(config.service.tax_rate.bps(), 1000);
        assert_eq!(config.service.default_completion_days, 1);
        assert_eq!(config.printer.name, "Counter");
        assert_eq!(
            config.store_info().tax_id().as_deref(),
            Some("155-1234-56789-12")
        );
    }

    #[test]
    fn test_config_validation() {
        let mut config = TerminalConfig::default();
        config.utc_offset_minutes = 15 * 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = TerminalConfig::default();
        config.printer.paper_width = 20;
        assert!(config.validate().is_err());

        let mut config = TerminalConfig::default();
        config.service.tax_rate = TaxRate::from_bps(10_001);
        assert!(config.validate().is_err());

        let mut config = TerminalConfig::default();
        config.cash.default_opening_balance = Money::new(dec!(-1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("WASHFOLD_STORE_NAME", "Sucursal Norte"),
            ("WASHFOLD_TAX_RATE", "10"),
            ("WASHFOLD_UTC_OFFSET_MINUTES", "-240"),
            ("WASHFOLD_PRINTER", "EPSON TM-T20"),
            ("WASHFOLD_CURRENCY_PREFIX", "$"),
        ]
        .into_iter()
        .collect();

        let mut config = TerminalConfig::default();
        config.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.name, "Sucursal Norte");
        assert_eq!(config.service.tax_rate.bps(), 1000);
        assert_eq!(config.utc_offset_minutes, -240);
        assert_eq!(config.printer.name, "EPSON TM-T20");
        assert_eq!(config.print_format().money(Money::new(dec!(5))), "$5.00");
    }

    #[test]
    fn test_invalid_overrides_are_ignored() {
        let mut config = TerminalConfig::default();
        config.apply_overrides(|key| match key {
            "WASHFOLD_TAX_RATE" => Some("seven".to_string()),
            "WASHFOLD_UTC_OFFSET_MINUTES" => Some("-5h".to_string()),
            _ => None,
        });
        assert_eq!(config.service.tax_rate, TaxRate::ITBMS);
        assert_eq!(config.utc_offset_minutes, -300);
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "washfold-terminal-{}-config.toml",
            std::process::id()
        ));
        let mut config = TerminalConfig::default();
        config.store.name = "Lavandería Central".into();
        config.cash.default_opening_balance = Money::new(dec!(50));
        config.save(Some(path.clone())).unwrap();

        let loaded = TerminalConfig::load(Some(path.clone())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded.store.name, config.store.name);
        assert_eq!(loaded.cash.default_opening_balance, Money::new(dec!(50)));
        assert_eq!(loaded.service, config.service);
    }
}
