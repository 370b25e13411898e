use glam::{Quat, Vec3};

use super::buffer::SharedChannelBuffer;
use super::interpolate::render_value;
use super::receiver::Receiver;

/// Point on the sender's timeline to show at `now_ms`.
pub fn render_timestamp(
    now_ms: i64,
    base_sync_delay_ms: i64,
    sender_latency_ms: i64,
    local_latency_ms: i64,
) -> i64 {
    now_ms - (base_sync_delay_ms + sender_latency_ms + local_latency_ms)
}

/// Last rendered value per channel. `None` until the channel first receives data.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderedTransform {
    pub positions: Vec<Option<Vec3>>,
    pub rotations: Vec<Option<Quat>>,
}

impl RenderedTransform {
    pub fn position(&self, channel: usize) -> Option<Vec3> {
        self.positions.get(channel).copied().flatten()
    }

    pub fn rotation(&self, channel: usize) -> Option<Quat> {
        self.rotations.get(channel).copied().flatten()
    }
}

/// Render side of one remote entity, reading the receiver's buffers each frame.
#[derive(Debug, Clone)]
pub struct Reconstructor {
    positions: Vec<SharedChannelBuffer<Vec3>>,
    rotations: Vec<SharedChannelBuffer<Quat>>,
    extrapolate_position: bool,
    extrapolate_rotation: bool,
    rendered: RenderedTransform,
    last_render_timestamp_ms: Option<i64>,
}

impl Reconstructor {
    pub fn new(
        positions: Vec<SharedChannelBuffer<Vec3>>,
        rotations: Vec<SharedChannelBuffer<Quat>>,
        extrapolate_position: bool,
        extrapolate_rotation: bool,
    ) -> Self {
        let rendered = RenderedTransform {
            positions: vec![None; positions.len()],
            rotations: vec![None; rotations.len()],
        };
        Self {
            positions,
            rotations,
            extrapolate_position,
            extrapolate_rotation,
            rendered,
            last_render_timestamp_ms: None,
        }
    }

    pub fn for_receiver(
        receiver: &Receiver,
        extrapolate_position: bool,
        extrapolate_rotation: bool,
    ) -> Self {
        Self::new(
            receiver.position_buffers().to_vec(),
            receiver.rotation_buffers().to_vec(),
            extrapolate_position,
            extrapolate_rotation,
        )
    }

    /// Renders every channel at `render_timestamp_ms` and returns how many
    /// channels produced a value. Empty channels keep their previous value.
    pub fn update(&mut self, render_timestamp_ms: i64) -> usize {
        let mut updated = 0;

        for (buffer, slot) in self.positions.iter().zip(&mut self.rendered.positions) {
            let extrapolate = self.extrapolate_position;
            if let Some(value) =
                buffer.read(|samples| render_value(samples, render_timestamp_ms, extrapolate))
            {
                *slot = Some(value);
                updated += 1;
            }
        }

        for (buffer, slot) in self.rotations.iter().zip(&mut self.rendered.rotations) {
            let extrapolate = self.extrapolate_rotation;
            if let Some(value) =
                buffer.read(|samples| render_value(samples, render_timestamp_ms, extrapolate))
            {
                *slot = Some(value);
                updated += 1;
            }
        }

        self.last_render_timestamp_ms = Some(render_timestamp_ms);
        updated
    }

    pub fn rendered(&self) -> &RenderedTransform {
        &self.rendered
    }

    pub fn last_render_timestamp_ms(&self) -> Option<i64> {
        self.last_render_timestamp_ms
    }

    pub fn set_extrapolation(&mut self, position: bool, rotation: bool) {
        self.extrapolate_position = position;
        self.extrapolate_rotation = rotation;
    }
}
