use glam::{Quat, Vec3};

use replica::{
    ChannelValues, Delivery, EntityLayout, LinkSimulation, LinkSimulator, ManualClock,
    ReplicationConfig, ReplicationContext, ReplicationPacket, SharedClock,
};

const OWNER: u32 = 1;
const OBSERVER: u32 = 2;
const ENTITY: u32 = 100;
const SEND_INTERVAL_MS: i64 = 67;
const SPEED_PER_MS: f32 = 0.003;
const YAW_PER_MS: f32 = 0.0005;
const DURATION_MS: i64 = 6_000;

fn truth_position(time_ms: i64) -> Vec3 {
    Vec3::new(time_ms as f32 * SPEED_PER_MS, 1.0, -2.0)
}

fn truth_rotation(time_ms: i64) -> Quat {
    Quat::from_rotation_y(time_ms as f32 * YAW_PER_MS)
}

struct Outcome {
    rendered_x: Vec<f32>,
    stale: u32,
    accepted: u32,
    max_position_error: f32,
    min_rotation_dot: f32,
}

fn run(link: LinkSimulation, extrapolate: bool, seed: u64) -> Outcome {
    let config = ReplicationConfig {
        extrapolate_position: extrapolate,
        extrapolate_rotation: extrapolate,
        ..Default::default()
    };
    let mut owner = ReplicationContext::new(config.clone(), OWNER).unwrap();
    let mut observer = ReplicationContext::new(config.clone(), OBSERVER).unwrap();
    owner.attach_owned(ENTITY, EntityLayout::transform()).unwrap();
    observer
        .attach_remote(ENTITY, OWNER, EntityLayout::transform())
        .unwrap();
    observer.report_round_trip_ms(OWNER, 40);
    observer.report_round_trip_ms(OBSERVER, 40);

    let clock = ManualClock::new(0);
    let mut wire = LinkSimulator::new(link, seed);
    let mut outcome = Outcome {
        rendered_x: Vec::new(),
        stale: 0,
        accepted: 0,
        max_position_error: 0.0,
        min_rotation_dot: 1.0,
    };
    let mut next_frame = 0;

    for now in 0..=DURATION_MS {
        clock.set(now);

        if now % SEND_INTERVAL_MS == 0 {
            let expected_sequence = (now / SEND_INTERVAL_MS) as u32;
            // A full send interval per call: exactly one snapshot each time.
            let sent = owner.update_senders(1.0 / 15.0, &clock, |_| {
                ChannelValues::transform(truth_position(now), truth_rotation(now))
            });
            assert_eq!(sent.len(), 1);
            assert_eq!(sent[0].sequence, expected_sequence);
            assert_eq!(sent[0].timestamp_ms, clock.now_ms());

            let bytes = ReplicationPacket::Snapshot(sent[0].clone()).encode().unwrap();
            let size = bytes.len();
            wire.send(now, bytes, size);
        }

        for bytes in wire.deliver(now) {
            let packet = ReplicationPacket::decode(&bytes).unwrap();
            match observer.handle_packet(&packet).unwrap() {
                Some(Delivery::Accepted) => outcome.accepted += 1,
                Some(Delivery::Stale) => outcome.stale += 1,
                None => {}
            }
        }

        if now >= next_frame * 1000 / 60 {
            next_frame += 1;
            if observer.render(&clock) == 0 {
                continue;
            }
            let rendered = observer.rendered(ENTITY).unwrap();
            let position = rendered.position(0).unwrap();
            let rotation = rendered.rotation(0).unwrap();
            outcome.rendered_x.push(position.x);

            let render_time = observer.render_timestamp_for(OWNER, now);
            if render_time > 300 {
                let error = position.distance(truth_position(render_time));
                outcome.max_position_error = outcome.max_position_error.max(error);
                let dot = rotation.dot(truth_rotation(render_time)).abs();
                outcome.min_rotation_dot = outcome.min_rotation_dot.min(dot);
            }
        }
    }

    outcome
}

fn reordering_link() -> LinkSimulation {
    LinkSimulation {
        latency_ms: 40,
        jitter_ms: 15,
        reorder_percent: 10.0,
        reorder_delay_ms: 90,
        loss_percent: 0.0,
    }
}

#[test]
fn test_smooth_signal_under_reordering() {
    let outcome = run(reordering_link(), true, 1234);

    assert!(outcome.accepted > 50);
    assert!(outcome.stale > 0, "reordering should produce stale snapshots");
    assert!(outcome.rendered_x.len() > 300);

    for pair in outcome.rendered_x.windows(2) {
        assert!(
            pair[1] >= pair[0] - 1e-3,
            "backward jump from {} to {}",
            pair[0],
            pair[1]
        );
    }
    let first = outcome.rendered_x[0];
    let last = *outcome.rendered_x.last().unwrap();
    assert!(last - first > 15.0, "signal did not progress: {first} -> {last}");

    assert!(
        outcome.max_position_error < 0.01,
        "max error {}",
        outcome.max_position_error
    );
    assert!(outcome.min_rotation_dot > 0.9999);
}

#[test]
fn test_holds_without_extrapolation_under_loss() {
    let link = LinkSimulation {
        loss_percent: 20.0,
        ..reordering_link()
    };
    let outcome = run(link, false, 77);

    for pair in outcome.rendered_x.windows(2) {
        assert!(pair[1] >= pair[0] - 1e-3);
    }
    assert!(*outcome.rendered_x.last().unwrap() > 15.0);
}
