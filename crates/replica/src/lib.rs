pub mod clock;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod net;
pub mod sync;

pub use clock::{ManualClock, SharedClock, SystemClock};
pub use config::{EntityLayout, ReplicationConfig};
pub use context::{EntityId, ReplicatedEntity, ReplicationContext, Role};
pub use error::{ConfigError, ReplicationError};
pub use events::{ReplicationEvent, Subscribers, SubscriptionId};
pub use net::{
    LatencyGossip, LatencyReport, LatencyTracker, LinkSimulation, LinkSimulator, LinkStats,
    MAX_PACKET_SIZE, PacketError, ParticipantId, ReplicationPacket, SnapshotMessage,
    sequence_greater_than,
};
pub use sync::{
    ChannelBuffer, ChannelValues, Delivery, Interpolate, Receiver, ReceiverStats, Reconstructor,
    RenderedTransform, Sample, SendCadence, Sender, SharedChannelBuffer, render_timestamp,
    render_value,
};
