use std::collections::HashMap;

use rkyv::{Archive, Deserialize, Serialize};

pub type ParticipantId = u32;

/// Gossip payload: a participant's latest measured round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Archive, Serialize, Deserialize)]
#[rkyv(derive(Debug))]
pub struct LatencyReport {
    pub participant: ParticipantId,
    pub rtt_ms: u32,
}

/// Last known round trip per participant. Last write wins.
#[derive(Debug, Default)]
pub struct LatencyTracker {
    round_trips: HashMap<ParticipantId, u32>,
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report_round_trip_ms(&mut self, participant: ParticipantId, rtt_ms: u32) {
        self.round_trips.insert(participant, rtt_ms);
    }

    pub fn apply(&mut self, report: LatencyReport) {
        self.report_round_trip_ms(report.participant, report.rtt_ms);
    }

    /// Half the last reported round trip, zero for unknown participants.
    pub fn one_way_latency_ms(&self, participant: ParticipantId) -> i64 {
        self.round_trips
            .get(&participant)
            .map_or(0, |rtt| i64::from(*rtt) / 2)
    }

    pub fn round_trip_ms(&self, participant: ParticipantId) -> Option<u32> {
        self.round_trips.get(&participant).copied()
    }

    pub fn remove(&mut self, participant: ParticipantId) -> bool {
        self.round_trips.remove(&participant).is_some()
    }

    pub fn len(&self) -> usize {
        self.round_trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.round_trips.is_empty()
    }
}

/// Periodic timer deciding when the local participant broadcasts its RTT.
#[derive(Debug, Clone)]
pub struct LatencyGossip {
    interval_secs: f32,
    elapsed_secs: f32,
}

impl LatencyGossip {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            interval_secs,
            // First report goes out on the first advance.
            elapsed_secs: interval_secs,
        }
    }

    pub fn interval_secs(&self) -> f32 {
        self.interval_secs
    }

    /// Returns true when a report is due. Missed intervals collapse into one.
    pub fn advance(&mut self, delta_secs: f32) -> bool {
        self.elapsed_secs += delta_secs.max(0.0);
        if self.elapsed_secs >= self.interval_secs {
            self.elapsed_secs = 0.0;
            true
        } else {
            false
        }
    }

    pub fn report(&mut self, delta_secs: f32, participant: ParticipantId, rtt_ms: u32) -> Option<LatencyReport> {
        self.advance(delta_secs)
            .then_some(LatencyReport { participant, rtt_ms })
    }
}
