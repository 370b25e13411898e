use anyhow::{Context, Result};
use glam::{Quat, Vec3};

use replica::{
    ChannelValues, Delivery, EntityLayout, LinkSimulator, ManualClock, ReplicationContext,
    ReplicationError, ReplicationPacket, SharedClock,
};

use crate::config::{Path, SimConfig};

const OWNER: u32 = 1;
const OBSERVER: u32 = 2;
const ENTITY: u32 = 1;

const LINEAR_SPEED_PER_SEC: f32 = 3.0;
const ORBIT_RADIUS: f32 = 5.0;
const ORBIT_RATE_PER_SEC: f32 = 0.8;

#[derive(Debug, Default)]
pub struct SimReport {
    pub snapshots_sent: u64,
    pub accepted: u64,
    pub stale: u64,
    pub rejected: u64,
    pub lost: u64,
    pub reordered: u64,
    pub latency_reports: u64,
    pub frames_rendered: u64,
    pub max_backward_jump: f32,
    pub max_error: f32,
    pub mean_error: f32,
}

impl SimReport {
    pub fn has_backward_jump(&self, tolerance: f32) -> bool {
        self.max_backward_jump > tolerance
    }
}

fn truth(path: Path, time_ms: i64) -> (Vec3, Quat) {
    let secs = time_ms as f32 / 1000.0;
    match path {
        Path::Linear => (
            Vec3::new(secs * LINEAR_SPEED_PER_SEC, 0.0, 0.0),
            Quat::IDENTITY,
        ),
        Path::Orbit => {
            let angle = secs * ORBIT_RATE_PER_SEC;
            (
                Vec3::new(angle.cos() * ORBIT_RADIUS, 0.0, angle.sin() * ORBIT_RADIUS),
                Quat::from_rotation_y(-angle),
            )
        }
    }
}

/// Fills every channel of `layout` from the ground truth, spacing extra
/// position channels along Y.
fn channel_values(layout: EntityLayout, position: Vec3, rotation: Quat) -> ChannelValues {
    ChannelValues::new(
        (0..layout.position_channels)
            .map(|i| position + Vec3::Y * i as f32)
            .collect(),
        vec![rotation; layout.rotation_channels],
    )
}

/// Scalar that must never decrease along the path.
struct Progress {
    path: Path,
    last_angle: Option<f32>,
    unwrapped: f32,
}

impl Progress {
    fn new(path: Path) -> Self {
        Self {
            path,
            last_angle: None,
            unwrapped: 0.0,
        }
    }

    fn measure(&mut self, position: Vec3) -> f32 {
        match self.path {
            Path::Linear => position.x,
            Path::Orbit => {
                let angle = position.z.atan2(position.x);
                if let Some(last) = self.last_angle {
                    let mut delta = angle - last;
                    if delta > std::f32::consts::PI {
                        delta -= std::f32::consts::TAU;
                    } else if delta < -std::f32::consts::PI {
                        delta += std::f32::consts::TAU;
                    }
                    self.unwrapped += delta;
                } else {
                    self.unwrapped = angle;
                }
                self.last_angle = Some(angle);
                self.unwrapped
            }
        }
    }
}

pub fn run(config: &SimConfig) -> Result<SimReport> {
    let mut owner = ReplicationContext::new(config.replication.clone(), OWNER)
        .context("invalid replication config for owner")?;
    let mut observer = ReplicationContext::new(config.replication.clone(), OBSERVER)
        .context("invalid replication config for observer")?;

    let layout = config.replication.default_layout;
    owner.attach_owned_default(ENTITY)?;
    observer.attach_remote_default(ENTITY, OWNER)?;
    observer.subscribe(|event| log::warn!("Observer event: {}", event.as_str()));
    // Handshake estimate; gossip keeps it fresh afterwards.
    observer.report_round_trip_ms(OWNER, config.rtt_ms);
    observer.report_round_trip_ms(OBSERVER, config.rtt_ms);

    let clock = ManualClock::new(0);
    let mut wire: LinkSimulator<Vec<u8>> = LinkSimulator::new(config.link.clone(), config.seed);
    let frame_secs = 1.0 / config.frame_rate.max(1) as f32;
    let frame_ms = 1000 / i64::from(config.frame_rate.max(1));

    let mut report = SimReport::default();
    let mut progress = Progress::new(config.path);
    let mut last_progress: Option<f32> = None;
    let mut error_sum = 0.0;
    let mut measured = 0u64;
    let mut next_frame_ms = 0;

    for now in 0..=config.duration_ms {
        clock.set(now);

        for bytes in wire.deliver(now) {
            let packet = ReplicationPacket::decode(&bytes).context("corrupt packet on the wire")?;
            match observer.handle_packet(&packet) {
                Ok(Some(Delivery::Accepted)) => report.accepted += 1,
                Ok(Some(Delivery::Stale)) => report.stale += 1,
                Ok(None) => report.latency_reports += 1,
                Err(ReplicationError::ChannelMismatch { .. }) => report.rejected += 1,
                Err(error) => return Err(error.into()),
            }
        }

        if now < next_frame_ms {
            continue;
        }
        next_frame_ms += frame_ms;

        let outbound = owner.update_senders(frame_secs, &clock, |_| {
            let (position, rotation) = truth(config.path, now);
            channel_values(layout, position, rotation)
        });
        for message in outbound {
            let bytes = ReplicationPacket::Snapshot(message).encode()?;
            let size = bytes.len();
            wire.send(now, bytes, size);
            report.snapshots_sent += 1;
        }
        if let Some(gossip) = owner.gossip_latency(frame_secs, config.rtt_ms) {
            let bytes = ReplicationPacket::Latency(gossip).encode()?;
            let size = bytes.len();
            wire.send(now, bytes, size);
        }
        observer.gossip_latency(frame_secs, config.rtt_ms);

        if observer.render(&clock) == 0 {
            continue;
        }
        report.frames_rendered += 1;

        let Some(position) = observer.rendered(ENTITY).and_then(|r| r.position(0)) else {
            continue;
        };
        let value = progress.measure(position);
        if let Some(last) = last_progress {
            report.max_backward_jump = report.max_backward_jump.max(last - value);
        }
        last_progress = Some(value);

        let render_time = observer.render_timestamp_for(OWNER, clock.now_ms());
        if render_time > config.replication.send_interval_ms() as i64 * 3 {
            let (expected, _) = truth(config.path, render_time);
            let error = position.distance(expected);
            report.max_error = report.max_error.max(error);
            error_sum += error;
            measured += 1;
        }

        if now % 1000 < frame_ms {
            log::debug!(
                "t={}ms render_time={}ms position={:?} progress={:.3}",
                now,
                render_time,
                position,
                value
            );
        }
    }

    let stats = wire.stats();
    report.lost = stats.packets_dropped;
    report.reordered = stats.packets_reordered;
    if measured > 0 {
        report.mean_error = error_sum / measured as f32;
    }

    Ok(report)
}
