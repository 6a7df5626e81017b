use serde::{Deserialize, Serialize};

use crate::registers::REG_TIMER_REVISED;

/// Firmware revisions encode the active register differently and expect
/// different refresh payloads. Selected once at startup, never branched on
/// per-call by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareProfile {
    Revised,
    Legacy,
}

impl Default for FirmwareProfile {
    fn default() -> Self {
        Self::Revised
    }
}

impl FirmwareProfile {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Revised => "revised",
            Self::Legacy => "legacy",
        }
    }

    /// Register value written for "on". Legacy firmware wants the high
    /// speed code, revised firmware a plain 1. Off is 0 on both.
    pub fn active_write_value(self, on: bool) -> i64 {
        match (self, on) {
            (_, false) => 0,
            (Self::Revised, true) => 1,
            (Self::Legacy, true) => 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    /// Host or IP of the ventilation unit.
    pub host: String,
    #[serde(default)]
    pub profile: FirmwareProfile,
    #[serde(default = "default_timer_register")]
    pub timer_register: String,
    #[serde(default = "default_timer_minutes")]
    pub default_timer_minutes: u8,
}

fn default_timer_register() -> String {
    REG_TIMER_REVISED.to_string()
}

fn default_timer_minutes() -> u8 {
    20
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "Ventilator".to_string(),
            host: "192.168.1.50".to_string(),
            profile: FirmwareProfile::default(),
            timer_register: default_timer_register(),
            default_timer_minutes: default_timer_minutes(),
        }
    }
}

impl DeviceConfig {
    pub fn sanitize(&mut self) {
        self.default_timer_minutes = self.default_timer_minutes.clamp(1, 100);
        if self.timer_register.trim().is_empty() {
            self.timer_register = default_timer_register();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub attempt_timeout_ms: u64,
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout_ms: 10_000,
            retry_delay_ms: 500,
        }
    }
}

impl RetryConfig {
    pub fn sanitize(&mut self) {
        self.max_attempts = self.max_attempts.clamp(1, 10);
        self.attempt_timeout_ms = self.attempt_timeout_ms.clamp(1_000, 60_000);
        self.retry_delay_ms = self.retry_delay_ms.clamp(100, 5_000);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub device: DeviceConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

fn default_http_port() -> u16 {
    8080
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            retry: RetryConfig::default(),
            http_port: default_http_port(),
        }
    }
}

impl BridgeConfig {
    pub fn sanitize(&mut self) {
        self.device.sanitize();
        self.retry.sanitize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn sanitize_clamps_timer_minutes() {
        let mut device = DeviceConfig {
            default_timer_minutes: 0,
            ..DeviceConfig::default()
        };
        device.sanitize();
        assert_eq!(device.default_timer_minutes, 1);

        device.default_timer_minutes = 200;
        device.sanitize();
        assert_eq!(device.default_timer_minutes, 100);
    }

    #[test]
    fn sanitize_restores_empty_timer_register() {
        let mut device = DeviceConfig {
            timer_register: "  ".to_string(),
            ..DeviceConfig::default()
        };
        device.sanitize();
        assert_eq!(device.timer_register, REG_TIMER_REVISED);
    }

    #[test]
    fn sanitize_keeps_retry_bounds_usable() {
        let mut retry = RetryConfig {
            max_attempts: 0,
            attempt_timeout_ms: 10,
            retry_delay_ms: 60_000,
        };
        retry.sanitize();
        assert_eq!(retry.max_attempts, 1);
        assert_eq!(retry.attempt_timeout_ms, 1_000);
        assert_eq!(retry.retry_delay_ms, 5_000);
    }

    #[test]
    fn config_file_defaults_apply_to_missing_sections() {
        let config: BridgeConfig =
            serde_json::from_str(r#"{"device":{"name":"Attic","host":"10.0.0.9"}}"#).unwrap();

        assert_eq!(config.device.name, "Attic");
        assert_eq!(config.device.profile, FirmwareProfile::Revised);
        assert_eq!(config.device.timer_register, REG_TIMER_REVISED);
        assert_eq!(config.device.default_timer_minutes, 20);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.http_port, 8080);
    }

    #[test]
    fn legacy_profile_parses_from_config() {
        let device: DeviceConfig =
            serde_json::from_str(r#"{"name":"Old unit","host":"10.0.0.8","profile":"legacy"}"#)
                .unwrap();
        assert_eq!(device.profile, FirmwareProfile::Legacy);
        assert_eq!(device.profile.active_write_value(true), 4);
        assert_eq!(device.profile.active_write_value(false), 0);
    }
}
