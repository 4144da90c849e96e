use cgmath::{InnerSpace, Vector3};
use cube_drift::data_structures::instance::{Instance, InstanceRaw};

fn source_and_target() -> (Instance, Instance) {
    let source = Instance {
        position: Vector3::new(1.0, -2.0, 3.0),
        scale: Vector3::new(0.0, 0.0, 0.0),
        tile: 4,
        ..Default::default()
    };
    let target = Instance {
        position: Vector3::new(2.5, -5.0, 7.5),
        scale: Vector3::new(1.0, 1.0, 1.0),
        tile: 4,
        ..Default::default()
    };
    (source, target)
}

#[test]
fn should_approach_target_strictly_monotonically() {
    let (mut instance, target) = source_and_target();

    let mut last_distance = (target.position - instance.position).magnitude();
    let mut last_scale_gap = (target.scale - instance.scale).magnitude();
    for _ in 0..50 {
        instance.step_toward(&target, 0.2);
        let distance = (target.position - instance.position).magnitude();
        let scale_gap = (target.scale - instance.scale).magnitude();
        assert!(
            distance < last_distance,
            "distance must shrink every frame: {} >= {}",
            distance,
            last_distance
        );
        assert!(scale_gap < last_scale_gap);
        last_distance = distance;
        last_scale_gap = scale_gap;
    }
}

#[test]
fn should_land_exactly_with_full_alpha() {
    let (mut instance, target) = source_and_target();

    instance.step_toward(&target, 1.0);
    assert_eq!(instance.position, target.position);
    assert_eq!(instance.scale, target.scale);
}

#[test]
fn should_clamp_overshooting_alpha() {
    let (mut instance, target) = source_and_target();

    // an oversized step must not fly past the target
    instance.step_toward(&target, 4.0);
    assert_eq!(instance.position, target.position);
    assert_eq!(instance.scale, target.scale);
}

#[test]
fn should_not_move_with_zero_alpha() {
    let (mut instance, target) = source_and_target();
    let before = instance.clone();

    instance.step_toward(&target, 0.0);
    assert_eq!(instance, before);
}

#[test]
fn should_keep_rotation_and_tile_untouched() {
    let (mut instance, target) = source_and_target();
    let rotation = instance.rotation;

    instance.step_toward(&target, 0.5);
    assert_eq!(instance.rotation, rotation);
    assert_eq!(instance.tile, 4);
}

#[test]
fn should_place_translation_in_matrix() {
    let instance = Instance {
        position: Vector3::new(4.0, 5.0, -6.0),
        ..Default::default()
    };

    let matrix = instance.to_matrix();
    assert_eq!(matrix.w.truncate(), instance.position);
}

#[test]
fn should_scale_matrix_axes() {
    let instance = Instance {
        scale: Vector3::new(2.0, 3.0, 4.0),
        ..Default::default()
    };

    let matrix = instance.to_matrix();
    assert_eq!(matrix.x.truncate().magnitude(), 2.0);
    assert_eq!(matrix.y.truncate().magnitude(), 3.0);
    assert_eq!(matrix.z.truncate().magnitude(), 4.0);
}

#[test]
fn should_keep_gpu_layout_stable() {
    // 4x4 model matrix + 3x3 normal matrix + tile index, tightly packed
    assert_eq!(std::mem::size_of::<InstanceRaw>(), 16 * 4 + 9 * 4 + 4);
}
