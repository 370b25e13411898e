use glam::{Quat, Vec3};

use super::cadence::SendCadence;
use crate::config::EntityLayout;
use crate::error::ReplicationError;
use crate::net::SnapshotMessage;

/// Current authoritative values of an owned entity's channels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChannelValues {
    pub positions: Vec<Vec3>,
    pub rotations: Vec<Quat>,
}

impl ChannelValues {
    pub fn new(positions: Vec<Vec3>, rotations: Vec<Quat>) -> Self {
        Self {
            positions,
            rotations,
        }
    }

    pub fn transform(position: Vec3, rotation: Quat) -> Self {
        Self::new(vec![position], vec![rotation])
    }
}

/// Owner side: stamps every channel of one entity with a shared sequence and time.
#[derive(Debug, Clone)]
pub struct Sender {
    entity_id: u32,
    layout: EntityLayout,
    next_sequence: u32,
    cadence: SendCadence,
}

impl Sender {
    pub fn new(entity_id: u32, layout: EntityLayout, send_rate: u32) -> Self {
        Self {
            entity_id,
            layout,
            next_sequence: 0,
            cadence: SendCadence::new(send_rate),
        }
    }

    pub fn entity_id(&self) -> u32 {
        self.entity_id
    }

    pub fn layout(&self) -> &EntityLayout {
        &self.layout
    }

    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// Builds the outbound snapshot and advances the sequence. A capture that
    /// does not match the layout is refused without consuming a sequence.
    pub fn capture(
        &mut self,
        now_ms: i64,
        values: &ChannelValues,
    ) -> Result<SnapshotMessage, ReplicationError> {
        if !self
            .layout
            .matches(values.positions.len(), values.rotations.len())
        {
            return Err(ReplicationError::channel_mismatch(
                &self.layout,
                values.positions.len(),
                values.rotations.len(),
            ));
        }

        let message = SnapshotMessage::new(self.entity_id, self.next_sequence, now_ms)
            .with_values(&values.positions, &values.rotations);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        Ok(message)
    }

    /// Advances the send timer; when a send is due, reads the channels and captures them.
    pub fn update(
        &mut self,
        delta_secs: f32,
        now_ms: i64,
        read: impl FnOnce() -> ChannelValues,
    ) -> Result<Option<SnapshotMessage>, ReplicationError> {
        if !self.cadence.advance(delta_secs) {
            return Ok(None);
        }
        self.capture(now_ms, &read()).map(Some)
    }
}
