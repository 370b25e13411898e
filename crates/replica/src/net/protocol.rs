use glam::{Quat, Vec3};
use rkyv::{Archive, Deserialize, Serialize, rancor};

use super::latency::LatencyReport;

pub const MAX_PACKET_SIZE: usize = 1200;

const SEQUENCE_WRAP_THRESHOLD: u32 = u32::MAX / 2;

#[inline]
pub fn sequence_greater_than(s1: u32, s2: u32) -> bool {
    ((s1 > s2) && (s1 - s2 <= SEQUENCE_WRAP_THRESHOLD))
        || ((s1 < s2) && (s2 - s1 > SEQUENCE_WRAP_THRESHOLD))
}

/// All channel values of one entity captured at a single instant.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct SnapshotMessage {
    pub entity_id: u32,
    pub sequence: u32,
    pub timestamp_ms: i64,
    pub positions: Vec<[f32; 3]>,
    pub rotations: Vec<[f32; 4]>,
}

impl SnapshotMessage {
    pub fn new(entity_id: u32, sequence: u32, timestamp_ms: i64) -> Self {
        Self {
            entity_id,
            sequence,
            timestamp_ms,
            positions: Vec::new(),
            rotations: Vec::new(),
        }
    }

    pub fn with_values(mut self, positions: &[Vec3], rotations: &[Quat]) -> Self {
        self.positions = positions.iter().map(|p| (*p).into()).collect();
        self.rotations = rotations
            .iter()
            .map(|q| [q.x, q.y, q.z, q.w])
            .collect();
        self
    }

    pub fn decode_positions(&self) -> Vec<Vec3> {
        self.positions.iter().map(|p| Vec3::from(*p)).collect()
    }

    pub fn decode_rotations(&self) -> Vec<Quat> {
        self.rotations
            .iter()
            .map(|q| Quat::from_xyzw(q[0], q[1], q[2], q[3]).normalize())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub enum ReplicationPacket {
    Snapshot(SnapshotMessage),
    Latency(LatencyReport),
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("serialization failed: {0}")]
    Serialize(rancor::Error),
    #[error("deserialization failed: {0}")]
    Deserialize(rancor::Error),
    #[error("packet of {size} bytes exceeds the {MAX_PACKET_SIZE} byte limit")]
    TooLarge { size: usize },
}

impl ReplicationPacket {
    pub fn encode(&self) -> Result<Vec<u8>, PacketError> {
        let bytes = rkyv::to_bytes::<rancor::Error>(self)
            .map(|aligned| aligned.into_vec())
            .map_err(PacketError::Serialize)?;
        if bytes.len() > MAX_PACKET_SIZE {
            return Err(PacketError::TooLarge { size: bytes.len() });
        }
        Ok(bytes)
    }

    pub fn decode(data: &[u8]) -> Result<Self, PacketError> {
        rkyv::from_bytes::<Self, rancor::Error>(data).map_err(PacketError::Deserialize)
    }
}
