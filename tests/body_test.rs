use approx::assert_relative_eq;
use cgmath::{Deg, Quaternion, Rotation3, Vector3};
use flow_collide::{
    config::MeshFilter,
    data_structures::{instance::Instance, scene_graph::SceneNode},
    physics::{
        body::{ActivationState, CollisionFlags, PhysicsBody, build_collision_body, create_body},
        shapes::{CompoundShape, create_convex_hull_shape},
    },
};
use rapier3d::prelude::{Isometry, nalgebra, vector};

use crate::common::test_utils::{cube_corners, flatten, group, mesh_node};

mod common;

#[test]
fn should_add_every_hull_with_zero_margin() {
    let root = group("root", vec![]);
    let hulls = (1..=3)
        .map(|i| create_convex_hull_shape(&flatten(&cube_corners(i as f32))))
        .collect();

    let body = create_body(&root, hulls);

    assert_eq!(body.shape.num_child_shapes(), 3);
    for (transform, hull) in body.shape.children() {
        assert_eq!(hull.margin(), 0.0);
        assert_eq!(*transform, Isometry::identity());
    }
}

#[test]
fn should_create_a_kinematic_body_without_mass() {
    let root = group("root", vec![]);

    let body = create_body(&root, vec![create_convex_hull_shape(&[])]);

    assert_eq!(body.mass, 0.0);
    assert_eq!(body.local_inertia, vector![0.0, 0.0, 0.0]);
    assert!(body.is_kinematic());
    assert_eq!(body.collision_flags, CollisionFlags::KINEMATIC_OBJECT);
    assert_eq!(body.activation_state, ActivationState::DisableDeactivation);
}

#[test]
fn should_place_the_body_at_the_root_position_and_rotation() {
    let mut root = group("root", vec![]);
    let rotation = Quaternion::from_angle_y(Deg(45.0));
    root.set_local_transform(Instance {
        position: Vector3::new(1.0, 2.0, 3.0),
        rotation,
        scale: Vector3::new(3.0, 3.0, 3.0),
    });

    let body = create_body(&root, vec![]);

    let translation = body.motion_state.translation.vector;
    assert_relative_eq!(translation.x, 1.0);
    assert_relative_eq!(translation.y, 2.0);
    assert_relative_eq!(translation.z, 3.0);
    assert_relative_eq!(
        body.motion_state.rotation.angle(),
        std::f32::consts::FRAC_PI_4,
        epsilon = 1e-5
    );
}

#[test]
fn should_default_new_bodies_by_mass() {
    let fixed = PhysicsBody::new(0.0, Isometry::identity(), CompoundShape::new(), vector![0.0, 0.0, 0.0]);
    let dynamic = PhysicsBody::new(1.0, Isometry::identity(), CompoundShape::new(), vector![0.0, 0.0, 0.0]);

    assert_eq!(fixed.collision_flags, CollisionFlags::STATIC_OBJECT);
    assert!(dynamic.collision_flags.is_empty());
    assert_eq!(dynamic.activation_state, ActivationState::Active);
}

#[test]
fn should_approximate_a_unit_cube_at_the_origin() {
    let mut root = group("root", vec![Box::new(mesh_node("cube", None, &cube_corners(0.5)))]);

    let body = build_collision_body(&mut root, &MeshFilter::default());

    assert_eq!(body.shape.num_child_shapes(), 1);
    let hull = body.shape.child_shape(0).expect("one hull");
    assert_eq!(hull.num_points(), 8);
    for (point, corner) in hull.points().iter().zip(cube_corners(0.5)) {
        assert_relative_eq!(point.x, corner[0], epsilon = 1e-6);
        assert_relative_eq!(point.y, corner[1], epsilon = 1e-6);
        assert_relative_eq!(point.z, corner[2], epsilon = 1e-6);
    }
    assert_relative_eq!(hull.volume(), 1.0, epsilon = 1e-4);
    assert_eq!(body.motion_state.translation.vector, vector![0.0, 0.0, 0.0]);
}

#[test]
fn should_build_one_hull_per_collidable_mesh() {
    let cube = cube_corners(0.5);
    let mut root = group(
        "root",
        vec![
            Box::new(mesh_node("a", None, &cube)),
            Box::new(mesh_node("position_rug", None, &cube)),
            Box::new(group("g", vec![Box::new(mesh_node("b", None, &cube))])),
            Box::new(mesh_node("c", Some("Dimensions"), &cube)),
        ],
    );

    let body = build_collision_body(&mut root, &MeshFilter::default());

    assert_eq!(body.shape.num_child_shapes(), 2);
}
