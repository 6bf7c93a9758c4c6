//! Physics world and collision bodies built from scene graphs.
//!
//! - `extract` collects world-space vertex positions of collidable meshes
//! - `shapes` holds convex hulls and compound shapes
//! - `body` assembles a kinematic compound body from a scene root
//!
//! [`PhysicsWorld`] owns the rapier pipeline and every registered body. It is
//! complete after [`PhysicsWorld::new`], so it can be stepped right away.

use std::collections::HashMap;

use rapier3d::prelude::*;

use crate::{
    config::PhysicsConfig,
    physics::{
        body::{ActivationState, CollisionFlags, PhysicsBody},
        shapes::CompoundShape,
    },
};

pub mod body;
pub mod extract;
pub mod shapes;

pub type BodyHandle = RigidBodyHandle;

pub struct PhysicsWorld {
    pub pipeline: PhysicsPipeline,
    pub integration_parameters: IntegrationParameters,
    pub islands: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joints: ImpulseJointSet,
    pub multibody_joints: MultibodyJointSet,
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub query_pipeline: QueryPipeline,
    pub ccd_solver: CCDSolver,
    gravity: Vector<Real>,
    fixed_time_step: Real,
    local_time: Real,
    shapes: HashMap<BodyHandle, CompoundShape>,
}

impl PhysicsWorld {
    pub fn new(config: &PhysicsConfig) -> Self {
        let [x, y, z] = config.gravity;
        Self {
            pipeline: PhysicsPipeline::new(),
            integration_parameters: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            query_pipeline: QueryPipeline::new(),
            ccd_solver: CCDSolver::new(),
            gravity: vector![x, y, z],
            fixed_time_step: config.fixed_time_step,
            local_time: 0.0,
            shapes: HashMap::new(),
        }
    }

    pub fn set_gravity(&mut self, gravity: Vector<Real>) {
        self.gravity = gravity;
    }

    pub fn gravity(&self) -> Vector<Real> {
        self.gravity
    }

    /**
     * Adds a body to the simulation and returns its handle.
     *
     * The body's compound becomes a single collider. A compound without any
     * non-degenerate hull produces a body without collider.
     */
    pub fn add_rigid_body(&mut self, body: PhysicsBody) -> BodyHandle {
        let flags = body.collision_flags;
        let builder = if flags.contains(CollisionFlags::KINEMATIC_OBJECT) {
            RigidBodyBuilder::kinematic_position_based()
        } else if flags.contains(CollisionFlags::STATIC_OBJECT) || body.mass <= 0.0 {
            RigidBodyBuilder::fixed()
        } else {
            RigidBodyBuilder::dynamic().additional_mass(body.mass)
        };
        let rigid_body = builder
            .position(body.motion_state)
            .can_sleep(body.activation_state != ActivationState::DisableDeactivation)
            .enabled(body.activation_state != ActivationState::DisableSimulation)
            .sleeping(body.activation_state == ActivationState::IslandSleeping)
            .build();
        let handle = self.bodies.insert(rigid_body);

        match body.shape.to_shared_shape() {
            Some(shape) => {
                let collider = ColliderBuilder::new(shape)
                    .density(0.0)
                    .sensor(flags.contains(CollisionFlags::NO_CONTACT_RESPONSE))
                    .build();
                self.colliders
                    .insert_with_parent(collider, handle, &mut self.bodies);
            }
            None => log::warn!(
                "body with {} child shapes has no usable hull, it won't collide",
                body.shape.num_child_shapes()
            ),
        }
        log::info!(
            "added body with {} child shapes at {:?}",
            body.shape.num_child_shapes(),
            body.motion_state.translation.vector
        );
        self.shapes.insert(handle, body.shape);
        handle
    }

    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    pub fn body_transform(&self, handle: BodyHandle) -> Option<Isometry<Real>> {
        self.bodies.get(handle).map(|body| *body.position())
    }

    /// The compound shape a body was registered with.
    pub fn collision_shape(&self, handle: BodyHandle) -> Option<&CompoundShape> {
        self.shapes.get(&handle)
    }

    /**
     * Advances the simulation by `time_step` seconds.
     *
     * With `max_sub_steps > 0` time accumulates and is consumed in fixed steps, at most
     * `max_sub_steps` of them per call; leftover time beyond that is dropped. With
     * `max_sub_steps == 0` a single step of exactly `time_step` is taken. Returns the
     * number of steps simulated.
     */
    pub fn step_simulation(&mut self, time_step: Real, max_sub_steps: u32) -> u32 {
        let (steps, dt) = if max_sub_steps > 0 {
            self.local_time += time_step;
            let mut steps = 0;
            if self.local_time >= self.fixed_time_step {
                steps = (self.local_time / self.fixed_time_step) as u32;
                self.local_time -= steps as Real * self.fixed_time_step;
            }
            if steps > max_sub_steps {
                log::debug!(
                    "simulation is {} steps behind, only taking {}",
                    steps,
                    max_sub_steps
                );
            }
            (steps.min(max_sub_steps), self.fixed_time_step)
        } else {
            self.local_time = 0.0;
            (1, time_step)
        };

        self.integration_parameters.dt = dt;
        for _ in 0..steps {
            self.step();
        }
        steps
    }

    fn step(&mut self) {
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }
}
