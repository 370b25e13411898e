use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

pub const DEFAULT_SEND_RATE: u32 = 15;
pub const DEFAULT_BUFFER_CAPACITY: usize = 10;
/// One send interval at the default rate.
pub const DEFAULT_BASE_SYNC_DELAY_MS: i64 = 67;
pub const DEFAULT_GOSSIP_INTERVAL_SECS: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct EntityLayout {
    pub position_channels: usize,
    pub rotation_channels: usize,
}

impl EntityLayout {
    pub fn new(position_channels: usize, rotation_channels: usize) -> Self {
        Self {
            position_channels,
            rotation_channels,
        }
    }

    /// One position and one rotation, the common "whole transform" case.
    pub fn transform() -> Self {
        Self::new(1, 1)
    }

    pub fn matches(&self, positions: usize, rotations: usize) -> bool {
        self.position_channels == positions && self.rotation_channels == rotations
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReplicationConfig {
    pub send_rate_hz: u32,
    pub buffer_capacity: usize,
    pub base_sync_delay_ms: i64,
    pub extrapolate_position: bool,
    pub extrapolate_rotation: bool,
    pub latency_gossip_interval_secs: f32,
    pub default_layout: EntityLayout,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            send_rate_hz: DEFAULT_SEND_RATE,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            base_sync_delay_ms: DEFAULT_BASE_SYNC_DELAY_MS,
            extrapolate_position: true,
            extrapolate_rotation: true,
            latency_gossip_interval_secs: DEFAULT_GOSSIP_INTERVAL_SECS,
            default_layout: EntityLayout::transform(),
        }
    }
}

impl ReplicationConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.send_rate_hz == 0 {
            return Err(ConfigError::ZeroSendRate);
        }
        if self.buffer_capacity == 0 {
            return Err(ConfigError::ZeroBufferCapacity);
        }
        if self.base_sync_delay_ms < 0 {
            return Err(ConfigError::NegativeSyncDelay(self.base_sync_delay_ms));
        }
        if !(self.latency_gossip_interval_secs > 0.0) {
            return Err(ConfigError::InvalidGossipInterval(
                self.latency_gossip_interval_secs,
            ));
        }
        Ok(())
    }

    pub fn send_interval_ms(&self) -> f64 {
        1000.0 / self.send_rate_hz as f64
    }
}
