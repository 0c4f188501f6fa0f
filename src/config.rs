// src/config.rs
//! Configuration: JSON file, `GPS_*` environment overrides and the
//! acceptance policy derived from them

use crate::error::{GpsError, Result};
use crate::gps::FixQuality;
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

/// Everything needed to build a handler. Fields mirror the `GPS_*`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GpsConfig {
    pub enabled: bool,
    pub port: String,
    pub baud: u32,
    pub timeout_secs: f64,
    pub max_retries: u32,
    pub min_satellites: u8,
    pub min_quality: u8,
    pub use_cached_if_no_fix: bool,
    pub fallback_to_ip: bool,
}

impl Default for GpsConfig {
    fn default() -> Self {
        Self::platform_default()
    }
}

/// Acceptance thresholds and read budget. Immutable once a handler holds it.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptancePolicy {
    pub min_satellites: u8,
    pub min_quality: FixQuality,
    pub read_timeout: Duration,
    pub max_retries: u32,
    pub use_cached_if_no_fix: bool,
    pub fallback_to_ip: bool,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            min_satellites: 4,
            min_quality: FixQuality::Gps,
            read_timeout: Duration::from_secs(1),
            max_retries: 20,
            use_cached_if_no_fix: true,
            fallback_to_ip: true,
        }
    }
}

impl AcceptancePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.read_timeout.is_zero() {
            return Err(GpsError::Config("read timeout must be greater than zero".to_string()));
        }
        if self.max_retries == 0 {
            return Err(GpsError::Config("max retries must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Longest a single `get_coordinates()` call can wait on the device
    pub fn worst_case_wait(&self) -> Duration {
        self.read_timeout.saturating_mul(self.max_retries)
    }
}

impl GpsConfig {
    /// Get platform-specific default configuration
    pub fn platform_default() -> Self {
        #[cfg(windows)]
        let port = "COM3".to_string();
        #[cfg(not(windows))]
        let port = "/dev/serial0".to_string();

        Self {
            enabled: false,
            port,
            baud: 9600,
            timeout_secs: 1.0,
            max_retries: 20,
            min_satellites: 4,
            min_quality: 1,
            use_cached_if_no_fix: true,
            fallback_to_ip: true,
        }
    }

    /// Config file (if any) with environment overrides applied, validated
    pub fn load() -> Result<Self> {
        let mut config = match Self::get_config_path() {
            Ok(path) if path.exists() => Self::load_from(&path)?,
            _ => Self::platform_default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| GpsError::Config(format!("Failed to read {}: {}", path.display(), e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| GpsError::Config(format!("Failed to parse {}: {}", path.display(), e)))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get config file path
    pub fn get_config_path() -> Result<PathBuf> {
        #[cfg(windows)]
        let base = std::env::var("APPDATA")
            .map_err(|_| GpsError::Config("APPDATA environment variable not set".to_string()))?;
        #[cfg(not(windows))]
        let base = std::env::var("HOME")
            .map(|home| format!("{}/.config", home))
            .map_err(|_| GpsError::Config("HOME environment variable not set".to_string()))?;

        Ok(PathBuf::from(base).join("roadscan-gps").join("config.json"))
    }

    /// Override fields from `GPS_*` variables. `lookup` returns the raw value
    /// of a variable if it is set.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("GPS_ENABLED") {
            self.enabled = parse_bool("GPS_ENABLED", &v)?;
        }
        if let Some(v) = lookup("GPS_PORT") {
            self.port = v.trim().to_string();
        }
        if let Some(v) = lookup("GPS_BAUD") {
            self.baud = parse_number("GPS_BAUD", &v)?;
        }
        if let Some(v) = lookup("GPS_TIMEOUT") {
            self.timeout_secs = parse_number("GPS_TIMEOUT", &v)?;
        }
        if let Some(v) = lookup("GPS_MAX_RETRIES") {
            self.max_retries = parse_number("GPS_MAX_RETRIES", &v)?;
        }
        if let Some(v) = lookup("GPS_MIN_SATS") {
            self.min_satellites = parse_number("GPS_MIN_SATS", &v)?;
        }
        if let Some(v) = lookup("GPS_MIN_QUALITY") {
            self.min_quality = parse_number("GPS_MIN_QUALITY", &v)?;
        }
        if let Some(v) = lookup("GPS_USE_CACHED_IF_NO_FIX") {
            self.use_cached_if_no_fix = parse_bool("GPS_USE_CACHED_IF_NO_FIX", &v)?;
        }
        if let Some(v) = lookup("GPS_FALLBACK_TO_IP") {
            self.fallback_to_ip = parse_bool("GPS_FALLBACK_TO_IP", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.port.trim().is_empty() {
            return Err(GpsError::Config("serial port must not be empty".to_string()));
        }
        if self.baud == 0 {
            return Err(GpsError::Config("baud rate must be greater than zero".to_string()));
        }
        self.policy().map(|_| ())
    }

    pub fn policy(&self) -> Result<AcceptancePolicy> {
        if !self.timeout_secs.is_finite() || self.timeout_secs <= 0.0 {
            return Err(GpsError::Config(format!(
                "timeout must be a positive number of seconds, got {}",
                self.timeout_secs
            )));
        }
        let min_quality = FixQuality::from_u8(self.min_quality).ok_or_else(|| {
            GpsError::Config(format!("min quality must be 0-8, got {}", self.min_quality))
        })?;

        let policy = AcceptancePolicy {
            min_satellites: self.min_satellites,
            min_quality,
            read_timeout: Duration::try_from_secs_f64(self.timeout_secs)
                .map_err(|e| GpsError::Config(format!("timeout out of range: {}", e)))?,
            max_retries: self.max_retries,
            use_cached_if_no_fix: self.use_cached_if_no_fix,
            fallback_to_ip: self.fallback_to_ip,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Update serial port settings
    pub fn update_serial(&mut self, port: String, baud: u32) {
        self.enabled = true;
        self.port = port;
        self.baud = baud;
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(GpsError::Config(format!("{} must be a boolean, got {:?}", key, other))),
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| GpsError::Config(format!("{} has invalid value {:?}", key, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GpsConfig::default();
        assert!(!config.enabled);
        assert_eq!(config.baud, 9600);
        assert_eq!(config.min_satellites, 4);
        assert_eq!(config.min_quality, 1);
        assert!(config.use_cached_if_no_fix);
        assert!(config.validate().is_ok());

        let policy = config.policy().unwrap();
        assert_eq!(policy, AcceptancePolicy::default());
        assert_eq!(policy.worst_case_wait(), Duration::from_secs(20));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = GpsConfig::default();
        config
            .apply_env(env(&[
                ("GPS_ENABLED", "True"),
                ("GPS_PORT", "/dev/ttyACM0"),
                ("GPS_BAUD", "38400"),
                ("GPS_TIMEOUT", "0.5"),
                ("GPS_MAX_RETRIES", "5"),
                ("GPS_MIN_SATS", "6"),
                ("GPS_MIN_QUALITY", "2"),
                ("GPS_USE_CACHED_IF_NO_FIX", "0"),
                ("GPS_FALLBACK_TO_IP", "no"),
            ]))
            .unwrap();

        assert!(config.enabled);
        assert_eq!(config.port, "/dev/ttyACM0");
        assert_eq!(config.baud, 38400);
        assert_eq!(config.max_retries, 5);

        let policy = config.policy().unwrap();
        assert_eq!(policy.read_timeout, Duration::from_millis(500));
        assert_eq!(policy.min_satellites, 6);
        assert_eq!(policy.min_quality, FixQuality::Dgps);
        assert!(!policy.use_cached_if_no_fix);
        assert!(!policy.fallback_to_ip);
    }

    #[test]
    fn test_env_garbage_is_an_error() {
        let mut config = GpsConfig::default();
        let err = config.apply_env(env(&[("GPS_BAUD", "fast")])).unwrap_err();
        assert!(matches!(err, GpsError::Config(_)));

        let err = config.apply_env(env(&[("GPS_ENABLED", "maybe")])).unwrap_err();
        assert!(err.to_string().contains("GPS_ENABLED"));
    }

    #[test]
    fn test_invalid_values_fail_fast() {
        let negative = GpsConfig { timeout_secs: -1.0, ..GpsConfig::default() };
        assert!(matches!(negative.validate(), Err(GpsError::Config(_))));

        let nan = GpsConfig { timeout_secs: f64::NAN, ..GpsConfig::default() };
        assert!(nan.policy().is_err());

        let no_retries = GpsConfig { max_retries: 0, ..GpsConfig::default() };
        assert!(no_retries.validate().is_err());

        let bad_quality = GpsConfig { min_quality: 9, ..GpsConfig::default() };
        assert!(bad_quality.validate().is_err());

        let no_port = GpsConfig { port: " ".to_string(), ..GpsConfig::default() };
        assert!(no_port.validate().is_err());

        let no_baud = GpsConfig { baud: 0, ..GpsConfig::default() };
        assert!(no_baud.validate().is_err());
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = GpsConfig::default();
        config.update_serial("/dev/ttyUSB0".to_string(), 115200);
        config.save_to(&path).unwrap();

        let loaded = GpsConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(loaded.enabled);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"port": "/dev/ttyAMA0", "min_satellites": 3}"#).unwrap();

        let loaded = GpsConfig::load_from(&path).unwrap();
        assert_eq!(loaded.port, "/dev/ttyAMA0");
        assert_eq!(loaded.min_satellites, 3);
        assert_eq!(loaded.baud, 9600);
    }
}
