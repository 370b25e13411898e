use replica::{LinkSimulation, ReplicationConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Linear,
    Orbit,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub replication: ReplicationConfig,
    pub link: LinkSimulation,
    pub path: Path,
    pub frame_rate: u32,
    pub duration_ms: i64,
    pub rtt_ms: u32,
    pub seed: u64,
    pub jump_tolerance: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            replication: ReplicationConfig::default(),
            link: LinkSimulation {
                latency_ms: 40,
                jitter_ms: 15,
                reorder_percent: 10.0,
                reorder_delay_ms: 90,
                loss_percent: 0.0,
            },
            path: Path::Linear,
            frame_rate: 60,
            duration_ms: 10_000,
            rtt_ms: 80,
            seed: 1,
            jump_tolerance: 1e-3,
        }
    }
}
