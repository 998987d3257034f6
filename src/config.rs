//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration for an Xbox 360 style gamepad and a VISCA camera at
//! address 1 on `/dev/ttyUSB0`.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::{PtzBridgeError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub controller: ControllerConfig,
    #[serde(default)]
    pub motion: MotionConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub journal: JournalConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// `COMn` on Windows or a device path such as `/dev/ttyUSB0`
    #[serde(default = "default_serial_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// VISCA camera address (1-7)
    #[serde(default = "default_address")]
    pub address: u8,

    /// Reply timeout for inquiries
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Delay before the supervisor restarts a session after a link failure
    #[serde(default = "default_reconnect_backoff_ms")]
    pub reconnect_backoff_ms: u64,
}

/// How held discrete inputs are turned into commands
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DebounceStrategy {
    /// One command per press; re-armed on release
    Latched,
    /// One command per eligible cycle while held
    Repeat,
}

/// Controller configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ControllerConfig {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_rest_threshold")]
    pub rest_threshold_pan: f32,

    #[serde(default = "default_rest_threshold")]
    pub rest_threshold_tilt: f32,

    #[serde(default = "default_rest_threshold")]
    pub rest_threshold_zoom: f32,

    #[serde(default = "default_debounce")]
    pub debounce: DebounceStrategy,
}

/// Pan-tilt motion style
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    /// Directional drive on state entry, explicit stop on rest
    Continuous,
    /// Relative steps every eligible cycle while deflected
    Relative,
}

/// Motion configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MotionConfig {
    #[serde(default = "default_motion_mode")]
    pub mode: MotionMode,

    /// Pan-tilt speed for no shoulder, L1, L2
    #[serde(default = "default_pan_tilt_speeds")]
    pub pan_tilt_speeds: [u8; 3],

    /// Zoom speed for no shoulder, R1, R2
    #[serde(default = "default_zoom_speeds")]
    pub zoom_speeds: [u8; 3],

    #[serde(default = "default_min_step")]
    pub min_step: u16,

    #[serde(default = "default_max_step")]
    pub max_step: u16,
}

/// Timing configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TimingConfig {
    #[serde(default = "default_cycle_period_ms")]
    pub cycle_period_ms: u64,

    #[serde(default = "default_min_command_interval_ms")]
    pub min_command_interval_ms: u64,

    #[serde(default = "default_power_on_settle_ms")]
    pub power_on_settle_ms: u64,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; empty logs to the console only
    #[serde(default)]
    pub log_dir: String,
}

/// Command journal configuration
#[derive(Debug, Deserialize, Clone)]
pub struct JournalConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_journal_path")]
    pub path: String,
}

// Default value functions
fn default_serial_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 9600 }
fn default_address() -> u8 { 1 }
fn default_timeout_ms() -> u64 { 500 }
fn default_reconnect_backoff_ms() -> u64 { 1000 }

fn default_poll_interval_ms() -> u64 { 10 }
fn default_rest_threshold() -> f32 { 0.004 }
fn default_debounce() -> DebounceStrategy { DebounceStrategy::Latched }

fn default_motion_mode() -> MotionMode { MotionMode::Continuous }
fn default_pan_tilt_speeds() -> [u8; 3] { [1, 7, 14] }
fn default_zoom_speeds() -> [u8; 3] { [1, 3, 7] }
fn default_min_step() -> u16 { 5 }
fn default_max_step() -> u16 { 10 }

fn default_cycle_period_ms() -> u64 { 20 }
fn default_min_command_interval_ms() -> u64 { 50 }
fn default_power_on_settle_ms() -> u64 { 29_500 }

fn default_log_level() -> String { "info".to_string() }
fn default_journal_path() -> String { "./logs/commands.jsonl".to_string() }

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_serial_port(),
            baud_rate: default_baud_rate(),
            address: default_address(),
            timeout_ms: default_timeout_ms(),
            reconnect_backoff_ms: default_reconnect_backoff_ms(),
        }
    }
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            rest_threshold_pan: default_rest_threshold(),
            rest_threshold_tilt: default_rest_threshold(),
            rest_threshold_zoom: default_rest_threshold(),
            debounce: default_debounce(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            mode: default_motion_mode(),
            pan_tilt_speeds: default_pan_tilt_speeds(),
            zoom_speeds: default_zoom_speeds(),
            min_step: default_min_step(),
            max_step: default_max_step(),
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            cycle_period_ms: default_cycle_period_ms(),
            min_command_interval_ms: default_min_command_interval_ms(),
            power_on_settle_ms: default_power_on_settle_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_dir: String::new(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_journal_path(),
        }
    }
}

impl TimingConfig {
    /// Dispatch loop period
    #[must_use]
    pub fn cycle_period(&self) -> Duration {
        Duration::from_millis(self.cycle_period_ms)
    }

    /// Minimum gap between two commands of the same category
    #[must_use]
    pub fn min_command_interval(&self) -> Duration {
        Duration::from_millis(self.min_command_interval_ms)
    }

    /// Camera boot time after power-on during which nothing is sent
    #[must_use]
    pub fn power_on_settle(&self) -> Duration {
        Duration::from_millis(self.power_on_settle_ms)
    }
}

fn invalid(msg: impl std::fmt::Display) -> PtzBridgeError {
    PtzBridgeError::Config(toml::de::Error::custom(msg))
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ptz_bridge::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if self.serial.port.trim().is_empty() {
            return Err(invalid("serial port cannot be empty"));
        }

        if ![2400, 4800, 9600, 19200, 38400, 115200].contains(&self.serial.baud_rate) {
            return Err(invalid(
                "baud_rate must be one of: 2400, 4800, 9600, 19200, 38400, 115200",
            ));
        }

        if !(1..=7).contains(&self.serial.address) {
            return Err(invalid("address must be between 1 and 7"));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(invalid("timeout_ms must be between 1 and 10000"));
        }

        if self.serial.reconnect_backoff_ms == 0 || self.serial.reconnect_backoff_ms > 60000 {
            return Err(invalid("reconnect_backoff_ms must be between 1 and 60000"));
        }

        if self.controller.poll_interval_ms == 0 || self.controller.poll_interval_ms > 1000 {
            return Err(invalid("poll_interval_ms must be between 1 and 1000"));
        }

        for (name, value) in [
            ("rest_threshold_pan", self.controller.rest_threshold_pan),
            ("rest_threshold_tilt", self.controller.rest_threshold_tilt),
            ("rest_threshold_zoom", self.controller.rest_threshold_zoom),
        ] {
            if !(0.0..=0.5).contains(&value) {
                return Err(invalid(format!("{} must be between 0.0 and 0.5", name)));
            }
        }

        // VISCA pan speed tops out at 0x18, tilt at 0x14
        for &speed in &self.motion.pan_tilt_speeds {
            if !(1..=20).contains(&speed) {
                return Err(invalid("pan_tilt_speeds entries must be between 1 and 20"));
            }
        }

        for &speed in &self.motion.zoom_speeds {
            if !(1..=7).contains(&speed) {
                return Err(invalid("zoom_speeds entries must be between 1 and 7"));
            }
        }

        if self.motion.min_step == 0 {
            return Err(invalid("min_step must be greater than 0"));
        }

        if self.motion.min_step > self.motion.max_step {
            return Err(invalid("min_step must not exceed max_step"));
        }

        if self.timing.cycle_period_ms == 0 || self.timing.cycle_period_ms > 1000 {
            return Err(invalid("cycle_period_ms must be between 1 and 1000"));
        }

        if self.timing.min_command_interval_ms > 10000 {
            return Err(invalid("min_command_interval_ms must be at most 10000"));
        }

        if self.timing.power_on_settle_ms > 120_000 {
            return Err(invalid("power_on_settle_ms must be at most 120000"));
        }

        if self.logging.level.trim().is_empty() {
            return Err(invalid("logging level cannot be empty"));
        }

        if self.journal.enabled && self.journal.path.trim().is_empty() {
            return Err(invalid("journal path cannot be empty when enabled"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[serial]
port = "COM7"
address = 2

[controller]
rest_threshold_pan = 0.0
debounce = "repeat"

[motion]
mode = "relative"
pan_tilt_speeds = [2, 4, 8]

[timing]
power_on_settle_ms = 1000
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.serial.port, "COM7");
        assert_eq!(config.serial.address, 2);
        assert_eq!(config.serial.baud_rate, 9600);
        assert_eq!(config.controller.rest_threshold_pan, 0.0);
        assert_eq!(config.controller.rest_threshold_tilt, 0.004);
        assert_eq!(config.controller.debounce, DebounceStrategy::Repeat);
        assert_eq!(config.motion.mode, MotionMode::Relative);
        assert_eq!(config.motion.pan_tilt_speeds, [2, 4, 8]);
        assert_eq!(config.motion.zoom_speeds, [1, 3, 7]);
        assert_eq!(config.timing.power_on_settle(), Duration::from_secs(1));
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let config = Config::from_toml(include_str!("../config/default.toml")).unwrap();
        let defaults = Config::default();
        assert_eq!(config.serial.port, defaults.serial.port);
        assert_eq!(config.motion.pan_tilt_speeds, defaults.motion.pan_tilt_speeds);
        assert_eq!(config.timing.power_on_settle_ms, defaults.timing.power_on_settle_ms);
        assert_eq!(config.controller.debounce, defaults.controller.debounce);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.motion.mode, MotionMode::Continuous);
        assert!(!config.journal.enabled);
    }

    #[test]
    fn test_unknown_debounce_rejected() {
        assert!(Config::from_toml("[controller]\ndebounce = \"sometimes\"\n").is_err());
    }

    #[test]
    fn test_missing_file_is_io_error() {
        match Config::load("/nonexistent/ptz-bridge.toml") {
            Err(PtzBridgeError::Io(_)) => {}
            other => panic!("Expected Io error, got: {:?}", other),
        }
    }

    #[test]
    fn test_empty_serial_port() {
        let mut config = Config::default();
        config.serial.port = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_baud_rate() {
        let mut config = Config::default();
        config.serial.baud_rate = 420_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_baud_rates() {
        for &baud in &[2400, 4800, 9600, 19200, 38400, 115200] {
            let mut config = Config::default();
            config.serial.baud_rate = baud;
            assert!(config.validate().is_ok(), "Baud rate {} should be valid", baud);
        }
    }

    #[test]
    fn test_address_out_of_range() {
        let mut config = Config::default();
        config.serial.address = 0;
        assert!(config.validate().is_err());
        config.serial.address = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_ms_zero() {
        let mut config = Config::default();
        config.serial.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reconnect_backoff_too_high() {
        let mut config = Config::default();
        config.serial.reconnect_backoff_ms = 60001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rest_threshold_negative() {
        let mut config = Config::default();
        config.controller.rest_threshold_tilt = -0.01;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rest_threshold_too_high() {
        let mut config = Config::default();
        config.controller.rest_threshold_zoom = 0.6;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_pan_tilt_speed_out_of_range() {
        let mut config = Config::default();
        config.motion.pan_tilt_speeds = [0, 7, 14];
        assert!(config.validate().is_err());
        config.motion.pan_tilt_speeds = [1, 7, 21];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zoom_speed_out_of_range() {
        let mut config = Config::default();
        config.motion.zoom_speeds = [1, 3, 8];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_step_greater_than_max() {
        let mut config = Config::default();
        config.motion.min_step = 12;
        config.motion.max_step = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cycle_period_zero() {
        let mut config = Config::default();
        config.timing.cycle_period_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_settle_too_long() {
        let mut config = Config::default();
        config.timing.power_on_settle_ms = 120_001;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_journal_path_when_enabled() {
        let mut config = Config::default();
        config.journal.enabled = true;
        config.journal.path = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_empty_journal_path_when_disabled() {
        let mut config = Config::default();
        config.journal.path = String::new();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_serial_port(), "/dev/ttyUSB0");
        assert_eq!(default_baud_rate(), 9600);
        assert_eq!(default_address(), 1);
        assert_eq!(default_rest_threshold(), 0.004);
        assert_eq!(default_pan_tilt_speeds(), [1, 7, 14]);
        assert_eq!(default_zoom_speeds(), [1, 3, 7]);
        assert_eq!(default_min_step(), 5);
        assert_eq!(default_max_step(), 10);
        assert_eq!(default_min_command_interval_ms(), 50);
        assert_eq!(default_power_on_settle_ms(), 29_500);
    }
}
