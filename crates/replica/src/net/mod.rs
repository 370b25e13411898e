mod latency;
mod protocol;
mod simulator;
mod stats;

pub use latency::{LatencyGossip, LatencyReport, LatencyTracker, ParticipantId};
pub use protocol::{
    ArchivedReplicationPacket, MAX_PACKET_SIZE, PacketError, ReplicationPacket, SnapshotMessage,
    sequence_greater_than,
};
pub use simulator::LinkSimulator;
pub use stats::{LinkSimulation, LinkStats};
