use crate::config::EntityLayout;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReplicationError {
    #[error(
        "channel layout mismatch: expected {expected_positions} positions and \
         {expected_rotations} rotations, got {got_positions} and {got_rotations}"
    )]
    ChannelMismatch {
        expected_positions: usize,
        expected_rotations: usize,
        got_positions: usize,
        got_rotations: usize,
    },
    #[error("entity {0} is not registered")]
    UnknownEntity(u32),
    #[error("entity {0} is already registered")]
    DuplicateEntity(u32),
    #[error("entity {0} is not owned by this participant")]
    NotOwner(u32),
    #[error("entity {0} is owned by this participant and cannot receive snapshots")]
    NotObserver(u32),
}

impl ReplicationError {
    pub fn channel_mismatch(layout: &EntityLayout, positions: usize, rotations: usize) -> Self {
        ReplicationError::ChannelMismatch {
            expected_positions: layout.position_channels,
            expected_rotations: layout.rotation_channels,
            got_positions: positions,
            got_rotations: rotations,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("send rate must be greater than zero")]
    ZeroSendRate,
    #[error("buffer capacity must be greater than zero")]
    ZeroBufferCapacity,
    #[error("base sync delay must not be negative, got {0} ms")]
    NegativeSyncDelay(i64),
    #[error("latency gossip interval must be positive, got {0} s")]
    InvalidGossipInterval(f32),
}
