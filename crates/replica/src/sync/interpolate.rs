use glam::{Quat, Vec3};

use super::buffer::ChannelBuffer;

/// Blending used to reconstruct a channel between and past its samples.
pub trait Interpolate: Copy {
    /// Blend with `t` clamped to `[0, 1]`.
    fn interpolate(self, to: Self, t: f32) -> Self;
    /// Blend with `t` left as-is, continuing the motion past `to` when `t > 1`.
    fn extrapolate(self, to: Self, t: f32) -> Self;
}

impl Interpolate for Vec3 {
    fn interpolate(self, to: Self, t: f32) -> Self {
        self.lerp(to, t.clamp(0.0, 1.0))
    }

    fn extrapolate(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for Quat {
    fn interpolate(self, to: Self, t: f32) -> Self {
        let to = shortest_arc(self, to);
        self.slerp(to, t.clamp(0.0, 1.0)).normalize()
    }

    fn extrapolate(self, to: Self, t: f32) -> Self {
        let to = shortest_arc(self, to);
        let delta = (self.conjugate() * to).normalize();
        let (axis, angle) = delta.to_axis_angle();
        if angle.abs() <= f32::EPSILON {
            return self.normalize();
        }
        (self * Quat::from_axis_angle(axis, angle * t)).normalize()
    }
}

fn shortest_arc(from: Quat, to: Quat) -> Quat {
    if from.dot(to) < 0.0 { -to } else { to }
}

/// Value of `buffer` at `render_timestamp_ms`, or `None` when the buffer is empty.
///
/// The pivot is the newest sample at or before the render time. With a newer
/// neighbour the result interpolates toward it; when the pivot is the newest
/// sample and `extrapolate` is set, the motion between the pivot and its older
/// neighbour is continued. Otherwise the pivot value is held. If the render
/// time precedes every sample the oldest one acts as pivot, which clamps to
/// its value.
pub fn render_value<V: Interpolate>(
    buffer: &ChannelBuffer<V>,
    render_timestamp_ms: i64,
    extrapolate: bool,
) -> Option<V> {
    let len = buffer.len();
    if len == 0 {
        return None;
    }

    let pivot_index = buffer
        .iter()
        .rposition(|sample| sample.timestamp_ms <= render_timestamp_ms)
        .unwrap_or(0);
    let pivot = buffer.get(pivot_index)?;

    if let Some(next) = buffer.get(pivot_index + 1) {
        let span = next.timestamp_ms - pivot.timestamp_ms;
        if span <= 0 {
            return Some(pivot.value);
        }
        let t = (render_timestamp_ms - pivot.timestamp_ms) as f64 / span as f64;
        return Some(pivot.value.interpolate(next.value, t as f32));
    }

    if extrapolate && pivot_index > 0 {
        let prev = buffer.get(pivot_index - 1)?;
        let span = pivot.timestamp_ms - prev.timestamp_ms;
        if span <= 0 {
            return Some(pivot.value);
        }
        let t = (render_timestamp_ms - prev.timestamp_ms) as f64 / span as f64;
        return Some(prev.value.extrapolate(pivot.value, t as f32));
    }

    Some(pivot.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::buffer::Sample;

    fn two_positions() -> ChannelBuffer<Vec3> {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(0, 100, Vec3::ZERO));
        buffer.push(Sample::new(1, 200, Vec3::new(10.0, 0.0, 0.0)));
        buffer
    }

    fn assert_vec(actual: Option<Vec3>, expected: Vec3) {
        let actual = actual.expect("expected a rendered value");
        assert!(
            actual.abs_diff_eq(expected, 1e-4),
            "expected {expected:?}, got {actual:?}"
        );
    }

    #[test]
    fn interpolates_between_samples() {
        let buffer = two_positions();

        assert_vec(render_value(&buffer, 150, true), Vec3::new(5.0, 0.0, 0.0));
        assert_vec(render_value(&buffer, 100, true), Vec3::ZERO);
        assert_vec(render_value(&buffer, 200, true), Vec3::new(10.0, 0.0, 0.0));
        assert_vec(render_value(&buffer, 200, false), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn extrapolates_past_newest_when_enabled() {
        let buffer = two_positions();

        assert_vec(render_value(&buffer, 250, true), Vec3::new(15.0, 0.0, 0.0));
        assert_vec(render_value(&buffer, 250, false), Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn render_time_before_history_clamps_to_oldest() {
        let buffer = two_positions();
        assert_vec(render_value(&buffer, 20, true), Vec3::ZERO);
    }

    #[test]
    fn single_sample_is_held() {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(4, 500, Vec3::new(1.0, 2.0, 3.0)));

        for render_time in [0, 500, 10_000] {
            assert_vec(render_value(&buffer, render_time, true), Vec3::new(1.0, 2.0, 3.0));
            assert_vec(render_value(&buffer, render_time, false), Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn empty_buffer_yields_nothing() {
        let buffer = ChannelBuffer::<Vec3>::new(10);
        assert_eq!(render_value(&buffer, 0, true), None);
    }

    #[test]
    fn coincident_timestamps_use_pivot() {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(0, 100, Vec3::ZERO));
        buffer.push(Sample::new(1, 100, Vec3::X));
        buffer.push(Sample::new(2, 100, Vec3::Y));

        let value = render_value(&buffer, 100, true).unwrap();
        assert!(value.is_finite());
        assert_vec(Some(value), Vec3::Y);

        // Newest at the same instant as its neighbour: no division by zero.
        let value = render_value(&buffer, 300, true).unwrap();
        assert!(value.is_finite());
    }

    #[test]
    fn backwards_timestamp_does_not_blow_up() {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(0, 200, Vec3::ZERO));
        buffer.push(Sample::new(1, 150, Vec3::X));

        for render_time in [100, 175, 250] {
            let value = render_value(&buffer, render_time, true).unwrap();
            assert!(value.is_finite());
        }
    }

    #[test]
    fn slerp_takes_shortest_arc() {
        let from = Quat::from_rotation_y(0.0);
        let to = -Quat::from_rotation_y(std::f32::consts::FRAC_PI_2);

        let mid = from.interpolate(to, 0.5);
        let expected = Quat::from_rotation_y(std::f32::consts::FRAC_PI_4);

        assert!(mid.dot(expected).abs() > 0.9999);
    }

    #[test]
    fn rotation_extrapolation_stays_unit_length() {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(0, 0, Quat::from_rotation_y(0.0)));
        buffer.push(Sample::new(1, 100, Quat::from_rotation_y(0.2)));

        let rotation = render_value(&buffer, 300, true).unwrap();
        let expected = Quat::from_rotation_y(0.6);

        assert!((rotation.length() - 1.0).abs() < 1e-5);
        assert!(rotation.dot(expected).abs() > 0.9999);

        let held = render_value(&buffer, 300, false).unwrap();
        assert!(held.dot(Quat::from_rotation_y(0.2)).abs() > 0.9999);
    }

    #[test]
    fn rotation_interpolates_midway() {
        let mut buffer = ChannelBuffer::new(10);
        buffer.push(Sample::new(0, 0, Quat::IDENTITY));
        buffer.push(Sample::new(1, 100, Quat::from_rotation_z(1.0)));

        let rotation = render_value(&buffer, 50, false).unwrap();
        assert!(rotation.dot(Quat::from_rotation_z(0.5)).abs() > 0.9999);
    }
}
