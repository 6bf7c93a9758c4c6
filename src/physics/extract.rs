//! Collects the vertex positions that make up a model's collision geometry.

use cgmath::Matrix4;
use rapier3d::prelude::{Isometry, Real};

use crate::{
    config::MeshFilter,
    data_structures::{
        geometry::VertexBuffer,
        scene_graph::{NodeKind, SceneNode, traverse},
    },
};

/// The rigid frame of the body built for `root`: its own position and orientation.
pub fn body_frame(root: &dyn SceneNode) -> Isometry<Real> {
    root.get_local_transform().to_isometry()
}

/// Whether a node contributes collision geometry.
pub fn is_collidable(node: &dyn SceneNode, filter: &MeshFilter) -> bool {
    if node.get_kind() != NodeKind::Mesh {
        return false;
    }
    if node.get_name() == filter.floor_sentinel {
        return false;
    }
    let Some(mesh) = node.get_mesh() else {
        return false;
    };
    let annotation = mesh
        .material_name
        .as_deref()
        .is_some_and(|name| name.contains(filter.excluded_material_pattern.as_str()));
    if annotation {
        return false;
    }
    if mesh.position.is_none() {
        log::debug!("mesh {} has no positions, skipping it", node.get_name());
        return false;
    }
    true
}

/**
 * Returns one position buffer per collidable mesh below `root`, depth-first.
 *
 * World matrices are refreshed first. Positions are materialized as contiguous
 * `f32`s, moved to world space and then into the frame of the body that
 * [`body_frame`] gives for `root`. For a root without translation or rotation
 * that is plain world space.
 */
pub fn get_vertex_positions(root: &mut dyn SceneNode, filter: &MeshFilter) -> Vec<VertexBuffer> {
    root.update_world_transform_all();
    let to_body: Matrix4<f32> = root.get_local_transform().rigid_inverse_matrix();

    let mut positions = Vec::new();
    traverse(root, &mut |node| {
        if !is_collidable(node, filter) {
            return;
        }
        let Some(attribute) = node.get_mesh().and_then(|mesh| mesh.position.as_ref()) else {
            return;
        };
        let mut buffer = attribute.to_vertex_buffer();
        buffer.apply_matrix4(&(to_body * node.get_world_matrix()));
        log::trace!(
            "collected {} points from {} (interleaved: {})",
            buffer.count(),
            node.get_name(),
            attribute.is_interleaved()
        );
        positions.push(buffer);
    });
    positions
}
