mod common;

use approx::assert_relative_eq;
use nalgebra::{UnitQuaternion, Vector3};
use vizij_motion_core::{
    AffineTransform, MotionConfig, MotionError, MotionSynthesizer, PoseLibrary, SamplingTime,
};

use common::{assert_transform_eq, library, translation, yaw, TICK};

#[test]
fn walking_moves_the_world_root_through_the_loop_seam() {
    let lib = library("walk_loop");
    let mut synth =
        MotionSynthesizer::new(&lib, &MotionConfig::default(), AffineTransform::identity())
            .unwrap();
    synth.push(SamplingTime::at_frame(0, 0));

    // 1.5 s at 1 m/s crosses the 1 s loop once.
    for _ in 0..45 {
        synth.update(&lib, TICK);
        assert_eq!(synth.pose().root(), synth.world_root_transform());
    }
    assert_relative_eq!(
        synth.world_root_transform().t,
        Vector3::new(0.0, 0.0, 1.5),
        epsilon = 1e-3
    );
    assert_eq!(synth.sampling_time().segment(), 0);
    assert_relative_eq!(synth.sampling_time().frame_position(), 5.0, epsilon = 1e-2);
    assert_relative_eq!(
        synth.current_velocity(),
        Vector3::new(0.0, 0.0, 1.0),
        epsilon = 1e-3
    );

    // The recorded past trails the root at walking speed.
    assert_relative_eq!(
        synth.trajectory().root_transform_at(-0.5).t,
        Vector3::new(0.0, 0.0, -0.5),
        epsilon = 1e-3
    );
}

#[test]
fn push_blends_into_the_new_clip() {
    let lib = library("two_joint_step");
    let config = MotionConfig {
        blend_duration: 0.3,
        ..Default::default()
    };
    let mut synth = MotionSynthesizer::new(&lib, &config, AffineTransform::identity()).unwrap();
    synth.push(SamplingTime::at_frame(1, 0));
    synth.update(&lib, TICK);
    assert!(synth.is_blending());
    let height = synth.pose()[1].t.y;
    assert!(height > 0.0 && height < 0.5, "{height}");

    for _ in 0..12 {
        synth.update(&lib, TICK);
    }
    assert!(!synth.is_blending());
    assert_relative_eq!(synth.pose()[1].t.y, 1.0, epsilon = 1e-4);
}

#[test]
fn update_without_a_sampling_time_holds_the_pose() {
    let lib = library("walk_loop");
    let start = translation(2.0, 0.0, 0.0);
    let mut synth = MotionSynthesizer::new(&lib, &MotionConfig::default(), start).unwrap();
    assert!(!synth.sampling_time().is_valid());

    for _ in 0..5 {
        synth.update(&lib, TICK);
    }
    assert_eq!(synth.pose(), lib.bind_pose());
    assert_eq!(*synth.world_root_transform(), start);
    assert_eq!(synth.current_velocity(), Vector3::zeros());
}

#[test]
fn predict_fills_the_future_half() {
    let lib = library("walk_loop");
    let config = MotionConfig::default();
    let mut synth = MotionSynthesizer::new(&lib, &config, yaw(0.0)).unwrap();
    let written = synth.predict(Vector3::new(1.0, 0.0, 0.0), UnitQuaternion::identity());
    assert_eq!(written, config.half_length());

    let future = &synth.trajectory().trajectory()[config.half_length()..];
    assert_eq!(future[0], AffineTransform::identity());
    for pair in future.windows(2) {
        assert!(pair[1].t.x >= pair[0].t.x);
    }
    let last = future[future.len() - 1].t.x;
    assert!(last > 0.0 && last < 1.0, "{last}");
}

#[test]
fn teleport_keeps_recorded_history_in_place() {
    let lib = library("walk_loop");
    let mut synth =
        MotionSynthesizer::new(&lib, &MotionConfig::default(), AffineTransform::identity())
            .unwrap();
    synth.push(SamplingTime::at_frame(0, 0));
    for _ in 0..40 {
        synth.update(&lib, TICK);
    }
    let before = synth.trajectory().world_transform_at(-0.5);

    let target = translation(-3.0, 0.0, 7.0) * yaw(2.0);
    synth.teleport(target);
    assert_eq!(*synth.world_root_transform(), target);
    assert_transform_eq(&synth.trajectory().world_transform_at(-0.5), &before, 1e-4);
    assert_transform_eq(synth.trajectory().world_root_transform(), &target, 1e-5);
}

#[test]
fn rejects_invalid_config() {
    let lib = library("walk_loop");
    let config = MotionConfig {
        time_horizon: -1.0,
        ..Default::default()
    };
    let err = MotionSynthesizer::new(&lib, &config, AffineTransform::identity()).unwrap_err();
    assert!(matches!(
        err,
        MotionError::InvalidConfig { ref field, .. } if field == "timeHorizon"
    ));
    assert_eq!(err.category(), "config");

    let config: MotionConfig =
        serde_json::from_str(r#"{ "timeHorizon": 0.5, "sampleRate": 20 }"#).unwrap();
    let synth = MotionSynthesizer::new(&lib, &config, AffineTransform::identity()).unwrap();
    assert_eq!(synth.trajectory().trajectory().len(), 21);
}
