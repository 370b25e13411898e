use std::collections::BTreeMap;

use crate::clock::SharedClock;
use crate::config::{EntityLayout, ReplicationConfig};
use crate::error::{ConfigError, ReplicationError};
use crate::events::{ReplicationEvent, Subscribers, SubscriptionId};
use crate::net::{
    LatencyGossip, LatencyReport, LatencyTracker, ParticipantId, ReplicationPacket,
    SnapshotMessage,
};
use crate::sync::{
    ChannelValues, Delivery, Receiver, Reconstructor, RenderedTransform, Sender, render_timestamp,
};

pub type EntityId = u32;

/// Owners only send, observers only receive and render.
#[derive(Debug)]
pub enum Role {
    Owner(Sender),
    Observer {
        receiver: Receiver,
        reconstructor: Reconstructor,
    },
}

#[derive(Debug)]
pub struct ReplicatedEntity {
    pub id: EntityId,
    pub owner: ParticipantId,
    pub role: Role,
}

impl ReplicatedEntity {
    pub fn is_owned(&self) -> bool {
        matches!(self.role, Role::Owner(_))
    }

    pub fn sender(&self) -> Option<&Sender> {
        match &self.role {
            Role::Owner(sender) => Some(sender),
            Role::Observer { .. } => None,
        }
    }

    pub fn receiver(&self) -> Option<&Receiver> {
        match &self.role {
            Role::Owner(_) => None,
            Role::Observer { receiver, .. } => Some(receiver),
        }
    }

    pub fn rendered(&self) -> Option<&RenderedTransform> {
        match &self.role {
            Role::Owner(_) => None,
            Role::Observer { reconstructor, .. } => Some(reconstructor.rendered()),
        }
    }
}

/// Everything one participant needs to replicate entities, built once at startup.
#[derive(Debug)]
pub struct ReplicationContext {
    config: ReplicationConfig,
    local_participant: ParticipantId,
    latency: LatencyTracker,
    gossip: LatencyGossip,
    entities: BTreeMap<EntityId, ReplicatedEntity>,
    events: Subscribers<ReplicationEvent>,
}

impl ReplicationContext {
    pub fn new(
        config: ReplicationConfig,
        local_participant: ParticipantId,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let gossip = LatencyGossip::new(config.latency_gossip_interval_secs);
        Ok(Self {
            config,
            local_participant,
            latency: LatencyTracker::new(),
            gossip,
            entities: BTreeMap::new(),
            events: Subscribers::new(),
        })
    }

    pub fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    pub fn local_participant(&self) -> ParticipantId {
        self.local_participant
    }

    pub fn latency(&self) -> &LatencyTracker {
        &self.latency
    }

    pub fn subscribe(&mut self, handler: impl FnMut(&ReplicationEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub fn attach_owned(
        &mut self,
        entity_id: EntityId,
        layout: EntityLayout,
    ) -> Result<(), ReplicationError> {
        let sender = Sender::new(entity_id, layout, self.config.send_rate_hz);
        self.insert(ReplicatedEntity {
            id: entity_id,
            owner: self.local_participant,
            role: Role::Owner(sender),
        })
    }

    pub fn attach_remote(
        &mut self,
        entity_id: EntityId,
        owner: ParticipantId,
        layout: EntityLayout,
    ) -> Result<(), ReplicationError> {
        let receiver = Receiver::new(entity_id, layout, self.config.buffer_capacity);
        let reconstructor = Reconstructor::for_receiver(
            &receiver,
            self.config.extrapolate_position,
            self.config.extrapolate_rotation,
        );
        self.insert(ReplicatedEntity {
            id: entity_id,
            owner,
            role: Role::Observer {
                receiver,
                reconstructor,
            },
        })
    }

    /// Attaches an owned entity with the configured `default_layout`.
    pub fn attach_owned_default(&mut self, entity_id: EntityId) -> Result<(), ReplicationError> {
        self.attach_owned(entity_id, self.config.default_layout)
    }

    pub fn attach_remote_default(
        &mut self,
        entity_id: EntityId,
        owner: ParticipantId,
    ) -> Result<(), ReplicationError> {
        self.attach_remote(entity_id, owner, self.config.default_layout)
    }

    fn insert(&mut self, entity: ReplicatedEntity) -> Result<(), ReplicationError> {
        if self.entities.contains_key(&entity.id) {
            return Err(ReplicationError::DuplicateEntity(entity.id));
        }

        let event = ReplicationEvent::EntityAttached {
            entity_id: entity.id,
            owned: entity.is_owned(),
        };
        log::info!(
            "Attached entity {} ({})",
            entity.id,
            if entity.is_owned() { "owned" } else { "remote" }
        );
        self.entities.insert(entity.id, entity);
        self.events.publish(&event);
        Ok(())
    }

    /// Drops the entity and its buffers.
    pub fn despawn(&mut self, entity_id: EntityId) -> bool {
        if self.entities.remove(&entity_id).is_none() {
            return false;
        }
        log::info!("Despawned entity {}", entity_id);
        self.events
            .publish(&ReplicationEvent::EntityDespawned { entity_id });
        true
    }

    pub fn entity(&self, entity_id: EntityId) -> Option<&ReplicatedEntity> {
        self.entities.get(&entity_id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &ReplicatedEntity> {
        self.entities.values()
    }

    pub fn rendered(&self, entity_id: EntityId) -> Option<&RenderedTransform> {
        self.entities.get(&entity_id).and_then(|e| e.rendered())
    }

    /// Advances every owned entity's send timer and returns the snapshots due
    /// this frame. `read` supplies the authoritative channel values.
    pub fn update_senders(
        &mut self,
        delta_secs: f32,
        clock: &impl SharedClock,
        mut read: impl FnMut(EntityId) -> ChannelValues,
    ) -> Vec<SnapshotMessage> {
        let now_ms = clock.now_ms();
        let mut outbound = Vec::new();
        let mut failures = Vec::new();

        for entity in self.entities.values_mut() {
            let Role::Owner(sender) = &mut entity.role else {
                continue;
            };
            let entity_id = entity.id;
            let sequence = sender.next_sequence();
            match sender.update(delta_secs, now_ms, || read(entity_id)) {
                Ok(Some(message)) => outbound.push(message),
                Ok(None) => {}
                Err(error) => failures.push((entity_id, sequence, error)),
            }
        }

        for (entity_id, sequence, error) in failures {
            self.report_mismatch(entity_id, sequence, error);
        }

        outbound
    }

    /// Captures an owned entity immediately, outside its send cadence.
    pub fn send_now(
        &mut self,
        entity_id: EntityId,
        clock: &impl SharedClock,
        values: &ChannelValues,
    ) -> Result<SnapshotMessage, ReplicationError> {
        let entity = self
            .entities
            .get_mut(&entity_id)
            .ok_or(ReplicationError::UnknownEntity(entity_id))?;
        let Role::Owner(sender) = &mut entity.role else {
            return Err(ReplicationError::NotOwner(entity_id));
        };

        let sequence = sender.next_sequence();
        match sender.capture(clock.now_ms(), values) {
            Err(error @ ReplicationError::ChannelMismatch { .. }) => {
                self.report_mismatch(entity_id, sequence, error.clone());
                Err(error)
            }
            result => result,
        }
    }

    pub fn on_snapshot(&mut self, message: &SnapshotMessage) -> Result<Delivery, ReplicationError> {
        let entity = self
            .entities
            .get_mut(&message.entity_id)
            .ok_or(ReplicationError::UnknownEntity(message.entity_id))?;
        let Role::Observer { receiver, .. } = &mut entity.role else {
            return Err(ReplicationError::NotObserver(message.entity_id));
        };

        match receiver.on_message(message) {
            Err(error @ ReplicationError::ChannelMismatch { .. }) => {
                self.report_mismatch(message.entity_id, message.sequence, error.clone());
                Err(error)
            }
            result => result,
        }
    }

    /// Routes a decoded packet. Latency reports yield `Ok(None)`.
    pub fn handle_packet(
        &mut self,
        packet: &ReplicationPacket,
    ) -> Result<Option<Delivery>, ReplicationError> {
        match packet {
            ReplicationPacket::Snapshot(message) => self.on_snapshot(message).map(Some),
            ReplicationPacket::Latency(report) => {
                self.latency.apply(*report);
                Ok(None)
            }
        }
    }

    pub fn report_round_trip_ms(&mut self, participant: ParticipantId, rtt_ms: u32) {
        self.latency.report_round_trip_ms(participant, rtt_ms);
    }

    /// Advances the gossip timer; when due, records and returns the local report
    /// for broadcast.
    pub fn gossip_latency(&mut self, delta_secs: f32, measured_rtt_ms: u32) -> Option<LatencyReport> {
        let report = self
            .gossip
            .report(delta_secs, self.local_participant, measured_rtt_ms)?;
        self.latency.apply(report);
        Some(report)
    }

    pub fn disconnect(&mut self, participant: ParticipantId) {
        if self.latency.remove(participant) {
            log::info!("Participant {} disconnected", participant);
        }
        self.events
            .publish(&ReplicationEvent::ParticipantDisconnected { participant });
    }

    pub fn render_timestamp_for(&self, owner: ParticipantId, now_ms: i64) -> i64 {
        render_timestamp(
            now_ms,
            self.config.base_sync_delay_ms,
            self.latency.one_way_latency_ms(owner),
            self.latency.one_way_latency_ms(self.local_participant),
        )
    }

    /// Reconstructs every remote entity for this frame; returns the number of
    /// channels that produced a value.
    pub fn render(&mut self, clock: &impl SharedClock) -> usize {
        let now_ms = clock.now_ms();
        let mut updated = 0;

        for entity in self.entities.values_mut() {
            let Role::Observer { reconstructor, .. } = &mut entity.role else {
                continue;
            };
            let timestamp = render_timestamp(
                now_ms,
                self.config.base_sync_delay_ms,
                self.latency.one_way_latency_ms(entity.owner),
                self.latency.one_way_latency_ms(self.local_participant),
            );
            updated += reconstructor.update(timestamp);
        }

        updated
    }

    fn report_mismatch(&mut self, entity_id: EntityId, sequence: u32, error: ReplicationError) {
        log::warn!(
            "Entity {}: discarded snapshot {}: {}",
            entity_id,
            sequence,
            error
        );
        self.events.publish(&ReplicationEvent::ChannelMismatch {
            entity_id,
            sequence,
            error,
        });
    }
}
