//! One full synthesizer tick over a synthetic skeleton.
//!
//! Run: cargo bench -p vizij-motion-core --bench motion_tick

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::{UnitQuaternion, Vector3};

use vizij_motion_core::{
    AffineTransform, MemoryPoseLibrary, MotionConfig, MotionSynthesizer, PoseBuffer,
    SamplingTime, Segment, SegmentLink,
};

const FRAMES: usize = 60;

fn walk_library(joint_count: usize) -> MemoryPoseLibrary {
    let frames = (0..FRAMES)
        .map(|frame| {
            let phase = frame as f32 / (FRAMES - 1) as f32 * std::f32::consts::TAU;
            let mut pose = PoseBuffer::identity(joint_count);
            let z = frame as f32 * 0.05;
            pose[0] = AffineTransform::from_translation(Vector3::new(0.0, 0.0, z));
            for joint in 1..joint_count {
                let angle = 0.4 * (phase + joint as f32 * 0.3).sin();
                pose[joint] = AffineTransform::new(
                    Vector3::new(0.0, 0.2, 0.0),
                    UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angle),
                );
            }
            pose
        })
        .collect();
    let loop_delta =
        AffineTransform::from_translation(Vector3::new(0.0, 0.0, (FRAMES - 1) as f32 * 0.05));
    MemoryPoseLibrary::new(
        30.0,
        PoseBuffer::identity(joint_count),
        vec![Segment {
            frames,
            next: Some(SegmentLink {
                segment: 0,
                delta_transform: loop_delta,
            }),
        }],
    )
    .expect("bench library")
}

fn bench_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("motion_tick");
    for &joints in &[24usize, 64, 128] {
        let library = walk_library(joints);
        let config = MotionConfig::default();
        let mut synth =
            MotionSynthesizer::new(&library, &config, AffineTransform::identity()).expect("synth");
        synth.push(SamplingTime::at_frame(0, 0));
        let mut tick = 0u32;
        group.bench_with_input(BenchmarkId::from_parameter(joints), &joints, |b, _| {
            b.iter(|| {
                tick = tick.wrapping_add(1);
                if tick % 20 == 0 {
                    synth.push(SamplingTime::at_frame(0, (tick % FRAMES as u32) as i16));
                }
                synth.update(&library, black_box(1.0 / 60.0));
                synth.predict(Vector3::new(0.0, 0.0, 1.5), UnitQuaternion::identity());
                black_box(synth.pose());
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_tick);
criterion_main!(benches);
