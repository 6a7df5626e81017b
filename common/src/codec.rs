//! Pure mapping between host-facing values and device register codes.
//!
//! The device quantizes the host's continuous 0-100% speed into four
//! discrete codes, so percent -> level -> percent is deliberately lossy:
//! every read reports the bucket's representative percent, not whatever
//! the host last wrote.

use std::fmt::Write as _;

use crate::config::FirmwareProfile;
use crate::error::BridgeError;
use crate::registers::{
    REG_REFRESH_AUX, REG_REFRESH_MODE, REG_REFRESH_PRESET, REG_REFRESH_RUNTIME, REG_SPEED,
};

/// Discrete fan speed code stored in register 1130.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedLevel {
    Off,
    Low,
    Normal,
    High,
}

impl SpeedLevel {
    pub fn register_value(self) -> i64 {
        match self {
            Self::Off => 0,
            Self::Low => 2,
            Self::Normal => 3,
            Self::High => 4,
        }
    }

    /// Unknown codes decode to Off rather than erroring; a fan reporting a
    /// code we don't know is safest treated as not running.
    pub fn from_register_value(value: i64) -> Self {
        match value {
            2 => Self::Low,
            3 => Self::Normal,
            4 => Self::High,
            _ => Self::Off,
        }
    }

    /// Breakpoints: 0 off, 1-16 low, 17-50 normal, 51-100 high.
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            0 => Self::Off,
            1..=16 => Self::Low,
            17..=50 => Self::Normal,
            _ => Self::High,
        }
    }

    /// Representative percent reported back for each level.
    pub fn as_percent(self) -> u8 {
        match self {
            Self::Off => 0,
            Self::Low => 16,
            Self::Normal => 50,
            Self::High => 83,
        }
    }
}

pub fn register_value_to_active(value: i64) -> bool {
    value > 0
}

/// `http://<host>/mread?{"<id>":<count>}`. The device expects the map
/// literal verbatim in the query string, so no percent-encoding here.
pub fn build_read_url(host: &str, register: &str, count: u32) -> String {
    format!("http://{host}/mread?{{\"{register}\":{count}}}")
}

/// `http://<host>/mwrite?{"<id>":<value>,...}`, same unescaped format.
/// Write order is preserved; the device applies the batch atomically.
pub fn build_write_url(host: &str, writes: &[(&str, i64)]) -> String {
    let mut map = String::new();
    for (index, (register, value)) in writes.iter().enumerate() {
        if index > 0 {
            map.push(',');
        }
        let _ = write!(map, "\"{register}\":{value}");
    }
    format!("http://{host}/mwrite?{{{map}}}")
}

/// Register batch sent when the refresh pulse is armed. Legacy firmware
/// takes a fixed five-register program; revised firmware takes the low
/// speed code plus the configured timer register loaded with the duration.
pub fn refresh_writes<'a>(
    profile: FirmwareProfile,
    timer_register: &'a str,
    duration_minutes: u8,
) -> Vec<(&'a str, i64)> {
    match profile {
        FirmwareProfile::Legacy => vec![
            (REG_SPEED, SpeedLevel::Low.register_value()),
            (REG_REFRESH_MODE, 4),
            (REG_REFRESH_RUNTIME, 180),
            (REG_REFRESH_PRESET, 0),
            (REG_REFRESH_AUX, 0),
        ],
        FirmwareProfile::Revised => vec![
            (REG_SPEED, SpeedLevel::Low.register_value()),
            (timer_register, i64::from(duration_minutes)),
        ],
    }
}

/// Pull one register out of a read response body.
pub fn decode_register(body: &str, register: &str) -> Result<i64, BridgeError> {
    let parsed: serde_json::Value = serde_json::from_str(body)
        .map_err(|err| BridgeError::Decode(format!("invalid response body: {err}")))?;

    parsed
        .get(register)
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| BridgeError::Decode(format!("register {register} missing from response")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn percent_buckets_match_breakpoints() {
        assert_eq!(SpeedLevel::from_percent(0), SpeedLevel::Off);
        for percent in 1..=16 {
            assert_eq!(SpeedLevel::from_percent(percent), SpeedLevel::Low);
        }
        for percent in 17..=50 {
            assert_eq!(SpeedLevel::from_percent(percent), SpeedLevel::Normal);
        }
        for percent in 51..=100 {
            assert_eq!(SpeedLevel::from_percent(percent), SpeedLevel::High);
        }
    }

    #[test]
    fn round_trip_lands_on_bucket_representative() {
        // Quantization is lossy: a round-trip always yields one of the
        // four representatives, never a non-breakpoint input.
        for percent in 0..=100u8 {
            let reported = SpeedLevel::from_percent(percent).as_percent();
            assert!([0, 16, 50, 83].contains(&reported));
            assert_eq!(
                SpeedLevel::from_percent(reported),
                SpeedLevel::from_percent(percent)
            );
        }
        assert_eq!(SpeedLevel::from_percent(30).as_percent(), 50);
    }

    #[test]
    fn unknown_register_codes_decode_to_off() {
        assert_eq!(SpeedLevel::from_register_value(1), SpeedLevel::Off);
        assert_eq!(SpeedLevel::from_register_value(7), SpeedLevel::Off);
        assert_eq!(SpeedLevel::from_register_value(-3), SpeedLevel::Off);
        assert_eq!(SpeedLevel::from_register_value(2), SpeedLevel::Low);
    }

    #[test]
    fn any_positive_value_reads_as_active() {
        assert!(!register_value_to_active(0));
        assert!(!register_value_to_active(-1));
        for value in [1, 2, 3, 4, 99] {
            assert!(register_value_to_active(value));
        }
    }

    #[test]
    fn read_url_embeds_unescaped_map() {
        assert_eq!(
            build_read_url("192.168.1.50", REG_SPEED, 1),
            "http://192.168.1.50/mread?{\"1130\":1}"
        );
    }

    #[test]
    fn write_url_preserves_register_order() {
        let url = build_write_url("device", &[(REG_SPEED, 2), ("2000", 180)]);
        assert_eq!(url, "http://device/mwrite?{\"1130\":2,\"2000\":180}");
    }

    #[test]
    fn legacy_refresh_payload_is_the_fixed_five_register_program() {
        let url = build_write_url(
            "device",
            &refresh_writes(FirmwareProfile::Legacy, "1103", 20),
        );
        assert_eq!(
            url,
            "http://device/mwrite?{\"1130\":2,\"1161\":4,\"2000\":180,\"2504\":0,\"16100\":0}"
        );
    }

    #[test]
    fn revised_refresh_payload_carries_configured_duration() {
        let writes = refresh_writes(FirmwareProfile::Revised, "1110", 45);
        assert_eq!(writes, vec![(REG_SPEED, 2), ("1110", 45)]);
    }

    #[test]
    fn decode_reads_requested_register() {
        assert_eq!(decode_register(r#"{"1130":3}"#, "1130").unwrap(), 3);
    }

    #[test]
    fn decode_fails_on_missing_register() {
        let err = decode_register(r#"{"1103":20}"#, "1130").unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
    }

    #[test]
    fn decode_fails_on_malformed_body() {
        let err = decode_register("not json", "1130").unwrap_err();
        assert!(matches!(err, BridgeError::Decode(_)));
    }
}
