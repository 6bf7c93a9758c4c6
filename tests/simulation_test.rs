use std::time::Duration;

use flow_collide::{
    config::{Config, PhysicsConfig},
    data_structures::scene_graph::SceneNode,
    flow::{FlowEvent, GraphicsFlow, Simulation},
    resources::load_model_gltf_from_slice,
};

use crate::common::test_utils::cube_glb;

mod common;

#[test]
fn should_start_without_a_body_and_tick_anyway() {
    let mut simulation = Simulation::new(&Config::default());

    simulation.tick();

    assert!(simulation.body().is_none());
    assert!(simulation.scene().is_none());
    assert_eq!(simulation.debug.lines.geometry.draw_range(), 0..0);
}

#[test]
fn should_build_a_body_when_the_model_arrives() {
    let mut simulation = Simulation::new(&Config::default());

    simulation.on_model_loaded(load_model_gltf_from_slice(&cube_glb()));
    // default config: 0.01s per tick against a 1/60s fixed step
    assert_eq!(simulation.tick(), 0);
    assert_eq!(simulation.tick(), 1);

    let handle = simulation.body().expect("body registered");
    assert_eq!(simulation.world.num_bodies(), 1);
    assert!(simulation.world.bodies[handle].is_kinematic());
    assert_eq!(simulation.scene().map(|s| s.get_name()), Some("TestScene"));
    assert!(simulation.debug.drawer.index() > 0);
}

#[test]
fn should_keep_running_without_a_body_after_a_failed_load() {
    let mut simulation = Simulation::new(&Config::default());

    simulation.on_model_loaded(Err(anyhow::anyhow!("404")));
    simulation.tick();

    assert!(simulation.body().is_none());
    assert_eq!(simulation.world.num_bodies(), 0);
}

#[test]
fn should_ignore_a_second_model() {
    let mut simulation = Simulation::new(&Config::default());
    simulation.on_model_loaded(load_model_gltf_from_slice(&cube_glb()));
    let first = simulation.body();

    simulation.on_model_loaded(load_model_gltf_from_slice(&cube_glb()));

    assert_eq!(simulation.body(), first);
    assert_eq!(simulation.world.num_bodies(), 1);
}

#[test]
fn should_keep_the_body_in_place_over_many_frames() {
    let config = Config {
        physics: PhysicsConfig {
            gravity: [0.0, -9.81, 0.0],
            ..Default::default()
        },
        ..Default::default()
    };
    let mut simulation = Simulation::new(&config);
    simulation.on_model_loaded(load_model_gltf_from_slice(&cube_glb()));
    let handle = simulation.body().expect("body registered");
    let before = simulation.world.body_transform(handle);

    for _ in 0..100 {
        simulation.tick();
    }

    assert_eq!(simulation.world.body_transform(handle), before);
}

#[test]
fn should_drive_the_simulation_through_its_flow() {
    let mut simulation = Simulation::new(&Config::default());
    let flow: &mut dyn GraphicsFlow = &mut simulation;

    flow.on_custom_events(FlowEvent::ModelLoaded(load_model_gltf_from_slice(
        &cube_glb(),
    )));
    assert!(flow.on_render().geometry.draw_range().is_empty());
    flow.on_update(Duration::from_millis(16));
    flow.on_update(Duration::from_millis(16));

    let lines = flow.on_render();
    assert!(!lines.geometry.draw_range().is_empty());
    assert!(simulation.body().is_some());
    assert_eq!(simulation.world.num_bodies(), 1);
}
