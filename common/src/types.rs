use serde::{Deserialize, Serialize};

/// The controls the bridge exposes to the home-automation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CapabilityKind {
    Active,
    RotationSpeed,
    Refresh,
    Timer,
    TimerDuration,
}

impl CapabilityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::RotationSpeed => "rotationSpeed",
            Self::Refresh => "refresh",
            Self::Timer => "timer",
            Self::TimerDuration => "timerDuration",
        }
    }
}

/// Value pushed back to the host when a control updates itself (as the
/// refresh switch does when its pulse resets).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityValue {
    Switch(bool),
    Percent(u8),
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeStatus {
    pub name: String,
    #[serde(rename = "deviceHost")]
    pub device_host: String,
    pub profile: &'static str,
    #[serde(rename = "refreshOn")]
    pub refresh_on: bool,
    #[serde(rename = "timerDurationMin")]
    pub timer_duration_min: u8,
}
