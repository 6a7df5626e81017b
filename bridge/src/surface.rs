use std::{sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tracing::{info, warn};

use ventilator_common::{
    codec::{self, SpeedLevel},
    BridgeError, CapabilityKind, CapabilityValue, DeviceConfig, REG_SPEED,
};

use crate::transport::RetryingClient;

/// How long the refresh switch stays visibly on after arming.
const REFRESH_RESET_DELAY: Duration = Duration::from_millis(1_000);

/// Host-side sink for unsolicited control updates. The surface never sees
/// the host framework's concrete types, only this.
pub trait CapabilityRegistry: Send + Sync {
    fn update_observed_value(&self, kind: CapabilityKind, value: CapabilityValue);
}

/// One surface per configured device. Owns the in-memory timer duration;
/// everything else lives in the device's registers.
pub struct ControlSurface {
    device: DeviceConfig,
    client: RetryingClient,
    registry: Arc<dyn CapabilityRegistry>,
    timer_minutes: Mutex<u8>,
}

impl ControlSurface {
    pub fn new(
        device: DeviceConfig,
        client: RetryingClient,
        registry: Arc<dyn CapabilityRegistry>,
    ) -> Self {
        let timer_minutes = Mutex::new(device.default_timer_minutes.clamp(1, 100));
        Self {
            device,
            client,
            registry,
            timer_minutes,
        }
    }

    pub async fn set_active(&self, on: bool) -> Result<(), BridgeError> {
        let value = self.device.profile.active_write_value(on);
        let url = codec::build_write_url(&self.device.host, &[(REG_SPEED, value)]);
        info!("set active {}: {url}", if on { "on" } else { "off" });
        self.client.fetch(&url).await?;
        Ok(())
    }

    pub async fn get_active(&self) -> Result<bool, BridgeError> {
        let value = self.read_register(REG_SPEED).await?;
        Ok(codec::register_value_to_active(value))
    }

    /// Always issues the write, even when the quantized level matches
    /// whatever was last sent; resends are harmless to the device.
    pub async fn set_rotation_speed(&self, percent: u8) -> Result<(), BridgeError> {
        let level = SpeedLevel::from_percent(percent.min(100));
        let url =
            codec::build_write_url(&self.device.host, &[(REG_SPEED, level.register_value())]);
        info!(
            "set rotation speed {percent}% -> code {}: {url}",
            level.register_value()
        );
        self.client.fetch(&url).await?;
        Ok(())
    }

    pub async fn get_rotation_speed(&self) -> Result<u8, BridgeError> {
        let value = self.read_register(REG_SPEED).await?;
        Ok(SpeedLevel::from_register_value(value).as_percent())
    }

    /// Pulse control: arming issues one write, then the switch reports
    /// itself off a second later without another request. The reset task is
    /// never cancelled; if the switch is toggled again before it fires, the
    /// later update wins on the observed value.
    pub async fn set_refresh(&self, on: bool) -> Result<(), BridgeError> {
        if !on {
            info!("refresh turned off manually");
            return Ok(());
        }

        let minutes = *self.timer_minutes.lock().await;
        let writes =
            codec::refresh_writes(self.device.profile, &self.device.timer_register, minutes);
        let url = codec::build_write_url(&self.device.host, &writes);
        info!("refresh: sending request to {url}");
        self.client.fetch(&url).await?;

        let registry = Arc::clone(&self.registry);
        tokio::spawn(async move {
            tokio::time::sleep(REFRESH_RESET_DELAY).await;
            registry
                .update_observed_value(CapabilityKind::Refresh, CapabilityValue::Switch(false));
        });
        Ok(())
    }

    pub async fn set_timer_duration(&self, minutes: u16) -> u8 {
        let clamped = minutes.clamp(1, 100) as u8;
        *self.timer_minutes.lock().await = clamped;
        info!("timer duration set to {clamped} minutes");
        clamped
    }

    pub async fn get_timer_duration(&self) -> u8 {
        *self.timer_minutes.lock().await
    }

    /// Remaining refresh minutes. Any failure reads as 0 so a flaky unit
    /// shows an idle timer instead of a broken sensor.
    pub async fn get_timer(&self) -> u8 {
        match self.read_register(&self.device.timer_register).await {
            Ok(value) => value.clamp(0, 100) as u8,
            Err(err) => {
                warn!("timer read failed, reporting 0: {err}");
                0
            }
        }
    }

    async fn read_register(&self, register: &str) -> Result<i64, BridgeError> {
        let url = codec::build_read_url(&self.device.host, register, 1);
        let body = self.client.fetch(&url).await?;
        codec::decode_register(&body, register)
    }
}
