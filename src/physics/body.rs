//! Rigid bodies before they join a [`PhysicsWorld`](super::PhysicsWorld).
//!
//! A [`PhysicsBody`] bundles everything needed to create the engine body. It
//! is consumed on registration, so one description can only ever become one
//! body in the world.

use bitflags::bitflags;
use rapier3d::prelude::{Isometry, Real, Vector};

use crate::{
    config::MeshFilter,
    data_structures::scene_graph::SceneNode,
    physics::{
        extract::{body_frame, get_vertex_positions},
        shapes::{CompoundShape, ConvexHullShape, create_convex_hull_shape},
    },
};

bitflags! {
    /// Collision flags with Bullet's bit values.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct CollisionFlags: u32 {
        const STATIC_OBJECT = 1;
        /// Moved by the caller, never by the solver.
        const KINEMATIC_OBJECT = 2;
        const NO_CONTACT_RESPONSE = 4;
    }
}

/// Sleep behaviour of a body, numbered like Bullet's activation states.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    Active = 1,
    IslandSleeping = 2,
    WantsDeactivation = 3,
    /// Never put to sleep.
    DisableDeactivation = 4,
    DisableSimulation = 5,
}

pub struct PhysicsBody {
    pub mass: Real,
    /// Initial world transform.
    pub motion_state: Isometry<Real>,
    pub shape: CompoundShape,
    pub local_inertia: Vector<Real>,
    pub collision_flags: CollisionFlags,
    pub activation_state: ActivationState,
}

impl PhysicsBody {
    pub fn new(
        mass: Real,
        motion_state: Isometry<Real>,
        shape: CompoundShape,
        local_inertia: Vector<Real>,
    ) -> Self {
        let collision_flags = if mass == 0.0 {
            CollisionFlags::STATIC_OBJECT
        } else {
            CollisionFlags::empty()
        };
        Self {
            mass,
            motion_state,
            shape,
            local_inertia,
            collision_flags,
            activation_state: ActivationState::Active,
        }
    }

    pub fn set_collision_flags(&mut self, flags: CollisionFlags) {
        self.collision_flags = flags;
    }

    pub fn set_activation_state(&mut self, state: ActivationState) {
        self.activation_state = state;
    }

    pub fn is_kinematic(&self) -> bool {
        self.collision_flags.contains(CollisionFlags::KINEMATIC_OBJECT)
    }
}

/**
 * Assembles the single body representing `root`.
 *
 * Every hull joins the compound untransformed and without margin since the extractor
 * already expresses its points in the root's frame. The body itself sits at the root's
 * position and orientation, has zero mass, is kinematic and never sleeps.
 */
pub fn create_body(root: &dyn SceneNode, hulls: Vec<ConvexHullShape>) -> PhysicsBody {
    let mut shape = CompoundShape::new();
    for mut hull in hulls {
        hull.set_margin(0.0);
        shape.add_child_shape(Isometry::identity(), hull);
    }

    let mass = 0.0;
    let local_inertia = shape.calculate_local_inertia(mass);
    let mut body = PhysicsBody::new(mass, body_frame(root), shape, local_inertia);
    body.set_collision_flags(CollisionFlags::KINEMATIC_OBJECT);
    body.set_activation_state(ActivationState::DisableDeactivation);
    body
}

/// Extracts, hulls and assembles in one go.
pub fn build_collision_body(root: &mut dyn SceneNode, filter: &MeshFilter) -> PhysicsBody {
    let hulls = get_vertex_positions(root, filter)
        .iter()
        .map(|positions| create_convex_hull_shape(&positions.array))
        .collect();
    create_body(root, hulls)
}
