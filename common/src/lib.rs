pub mod codec;
pub mod config;
pub mod error;
pub mod registers;
pub mod types;

pub use codec::SpeedLevel;
pub use config::{BridgeConfig, DeviceConfig, FirmwareProfile, RetryConfig};
pub use error::BridgeError;
pub use registers::*;
pub use types::{BridgeStatus, CapabilityKind, CapabilityValue};
