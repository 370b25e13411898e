use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::stats::{LinkSimulation, LinkStats};

#[derive(Debug)]
struct DelayedPacket<T> {
    release_ms: i64,
    order: u64,
    payload: T,
}

impl<T> PartialEq for DelayedPacket<T> {
    fn eq(&self, other: &Self) -> bool {
        self.release_ms == other.release_ms && self.order == other.order
    }
}

impl<T> Eq for DelayedPacket<T> {}

impl<T> PartialOrd for DelayedPacket<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for DelayedPacket<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap
        other
            .release_ms
            .cmp(&self.release_ms)
            .then_with(|| other.order.cmp(&self.order))
    }
}

/// One-directional lossy link on a virtual millisecond clock.
#[derive(Debug)]
pub struct LinkSimulator<T> {
    config: LinkSimulation,
    queue: BinaryHeap<DelayedPacket<T>>,
    rng: StdRng,
    next_order: u64,
    stats: LinkStats,
}

impl<T> LinkSimulator<T> {
    pub fn new(config: LinkSimulation, seed: u64) -> Self {
        Self {
            config,
            queue: BinaryHeap::new(),
            rng: StdRng::seed_from_u64(seed),
            next_order: 0,
            stats: LinkStats::default(),
        }
    }

    pub fn config(&self) -> &LinkSimulation {
        &self.config
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn in_flight(&self) -> usize {
        self.queue.len()
    }

    /// Queues a payload sent at `now_ms`. Returns false when the link dropped it.
    pub fn send(&mut self, now_ms: i64, payload: T, size_bytes: usize) -> bool {
        self.stats.packets_sent += 1;
        self.stats.bytes_sent += size_bytes as u64;

        if self.config.is_lossy() && self.roll_percent() < self.config.loss_percent {
            self.stats.packets_dropped += 1;
            return false;
        }

        let mut delay = i64::from(self.config.latency_ms);
        if self.config.jitter_ms > 0 {
            delay += i64::from(self.rng.gen_range(0..=self.config.jitter_ms));
        }
        if self.config.reorder_percent > 0.0 && self.roll_percent() < self.config.reorder_percent {
            delay += i64::from(self.config.reorder_delay_ms);
            self.stats.packets_reordered += 1;
        }

        self.queue.push(DelayedPacket {
            release_ms: now_ms + delay,
            order: self.next_order,
            payload,
        });
        self.next_order += 1;
        true
    }

    /// Pops every payload whose release time has passed, in release order.
    pub fn deliver(&mut self, now_ms: i64) -> Vec<T> {
        let mut delivered = Vec::new();
        while self
            .queue
            .peek()
            .is_some_and(|delayed| delayed.release_ms <= now_ms)
        {
            if let Some(delayed) = self.queue.pop() {
                delivered.push(delayed.payload);
            }
        }
        self.stats.packets_delivered += delivered.len() as u64;
        delivered
    }

    fn roll_percent(&mut self) -> f32 {
        self.rng.gen_range(0.0..100.0)
    }
}
