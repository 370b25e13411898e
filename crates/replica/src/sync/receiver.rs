use glam::{Quat, Vec3};

use super::buffer::{Sample, SharedChannelBuffer};
use crate::config::EntityLayout;
use crate::error::ReplicationError;
use crate::net::{SnapshotMessage, sequence_greater_than};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Accepted,
    /// Sequence at or below the last accepted one; nothing was touched.
    Stale,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub accepted: u64,
    pub stale: u64,
    pub rejected: u64,
}

/// Observer side of one remote entity: filters snapshots and fills its buffers.
#[derive(Debug)]
pub struct Receiver {
    entity_id: u32,
    layout: EntityLayout,
    last_accepted: Option<u32>,
    positions: Vec<SharedChannelBuffer<Vec3>>,
    rotations: Vec<SharedChannelBuffer<Quat>>,
    stats: ReceiverStats,
}

impl Receiver {
    pub fn new(entity_id: u32, layout: EntityLayout, buffer_capacity: usize) -> Self {
        Self {
            entity_id,
            layout,
            last_accepted: None,
            positions: (0..layout.position_channels)
                .map(|_| SharedChannelBuffer::new(buffer_capacity))
                .collect(),
            rotations: (0..layout.rotation_channels)
                .map(|_| SharedChannelBuffer::new(buffer_capacity))
                .collect(),
            stats: ReceiverStats::default(),
        }
    }

    pub fn entity_id(&self) -> u32 {
        self.entity_id
    }

    pub fn layout(&self) -> &EntityLayout {
        &self.layout
    }

    pub fn last_accepted_sequence(&self) -> Option<u32> {
        self.last_accepted
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn position_buffers(&self) -> &[SharedChannelBuffer<Vec3>] {
        &self.positions
    }

    pub fn rotation_buffers(&self) -> &[SharedChannelBuffer<Quat>] {
        &self.rotations
    }

    pub fn is_stale(&self, sequence: u32) -> bool {
        self.last_accepted
            .is_some_and(|last| !sequence_greater_than(sequence, last))
    }

    pub fn on_message(&mut self, message: &SnapshotMessage) -> Result<Delivery, ReplicationError> {
        self.on_values(
            message.sequence,
            message.timestamp_ms,
            &message.decode_positions(),
            &message.decode_rotations(),
        )
    }

    pub fn on_values(
        &mut self,
        sequence: u32,
        timestamp_ms: i64,
        positions: &[Vec3],
        rotations: &[Quat],
    ) -> Result<Delivery, ReplicationError> {
        if self.is_stale(sequence) {
            self.stats.stale += 1;
            log::debug!(
                "Entity {}: dropped stale snapshot {} (last accepted {:?})",
                self.entity_id,
                sequence,
                self.last_accepted
            );
            return Ok(Delivery::Stale);
        }

        if !self.layout.matches(positions.len(), rotations.len()) {
            self.stats.rejected += 1;
            return Err(ReplicationError::channel_mismatch(
                &self.layout,
                positions.len(),
                rotations.len(),
            ));
        }

        self.last_accepted = Some(sequence);
        self.stats.accepted += 1;

        for (buffer, value) in self.positions.iter().zip(positions) {
            buffer.push(Sample::new(sequence, timestamp_ms, *value));
        }
        for (buffer, value) in self.rotations.iter().zip(rotations) {
            buffer.push(Sample::new(sequence, timestamp_ms, *value));
        }

        Ok(Delivery::Accepted)
    }

    /// Empties every buffer and forgets the last accepted sequence.
    pub fn clear(&mut self) {
        self.last_accepted = None;
        for buffer in &self.positions {
            buffer.clear();
        }
        for buffer in &self.rotations {
            buffer.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(sequence: u32, timestamp_ms: i64, x: f32) -> SnapshotMessage {
        SnapshotMessage::new(1, sequence, timestamp_ms)
            .with_values(&[Vec3::new(x, 0.0, 0.0)], &[Quat::IDENTITY])
    }

    fn sequences(receiver: &Receiver) -> Vec<u32> {
        receiver.position_buffers()[0].read(|buffer| buffer.iter().map(|s| s.sequence).collect())
    }

    #[test]
    fn first_message_is_accepted() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);

        assert_eq!(receiver.on_message(&message(5, 0, 0.0)), Ok(Delivery::Accepted));
        assert_eq!(receiver.last_accepted_sequence(), Some(5));
    }

    #[test]
    fn rejects_old_and_duplicate_sequences() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);

        receiver.on_message(&message(0, 0, 0.0)).unwrap();
        receiver.on_message(&message(2, 134, 2.0)).unwrap();

        assert_eq!(receiver.on_message(&message(1, 67, 1.0)), Ok(Delivery::Stale));
        assert_eq!(receiver.on_message(&message(2, 134, 2.0)), Ok(Delivery::Stale));
        assert_eq!(receiver.on_message(&message(3, 201, 3.0)), Ok(Delivery::Accepted));

        assert_eq!(sequences(&receiver), vec![0, 2, 3]);
        assert_eq!(receiver.rotation_buffers()[0].len(), 3);
        assert_eq!(
            receiver.stats(),
            ReceiverStats {
                accepted: 3,
                stale: 2,
                rejected: 0
            }
        );
    }

    #[test]
    fn mismatched_message_is_discarded() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);
        receiver.on_message(&message(0, 0, 0.0)).unwrap();

        let bad = SnapshotMessage::new(1, 1, 67).with_values(&[Vec3::ZERO, Vec3::ONE], &[]);
        let result = receiver.on_message(&bad);

        assert!(matches!(
            result,
            Err(ReplicationError::ChannelMismatch {
                expected_positions: 1,
                got_positions: 2,
                got_rotations: 0,
                ..
            })
        ));
        assert_eq!(receiver.last_accepted_sequence(), Some(0));
        assert_eq!(sequences(&receiver), vec![0]);
    }

    #[test]
    fn non_increasing_timestamp_still_appends() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);

        receiver.on_message(&message(0, 100, 0.0)).unwrap();
        receiver.on_message(&message(1, 100, 1.0)).unwrap();
        receiver.on_message(&message(2, 90, 2.0)).unwrap();

        assert_eq!(sequences(&receiver), vec![0, 1, 2]);
    }

    #[test]
    fn accepts_across_sequence_wrap() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);

        receiver.on_message(&message(u32::MAX, 0, 0.0)).unwrap();

        assert_eq!(receiver.on_message(&message(0, 67, 1.0)), Ok(Delivery::Accepted));
        assert_eq!(receiver.on_message(&message(u32::MAX, 0, 0.0)), Ok(Delivery::Stale));
    }

    #[test]
    fn clear_resets_acceptance() {
        let mut receiver = Receiver::new(1, EntityLayout::transform(), 10);
        receiver.on_message(&message(50, 3350, 5.0)).unwrap();

        receiver.clear();

        assert_eq!(receiver.last_accepted_sequence(), None);
        assert!(receiver.position_buffers()[0].is_empty());
        assert_eq!(receiver.on_message(&message(3, 201, 0.3)), Ok(Delivery::Accepted));
        assert_eq!(sequences(&receiver), vec![3]);
    }
}
