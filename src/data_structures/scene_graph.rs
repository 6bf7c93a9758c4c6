//! Scene graph and hierarchical scene organization.
//!
//! Provides the [`SceneNode`] trait and its two implementations: a
//! [`ContainerNode`] grouping children and a [`MeshNode`] carrying geometry.
//! Nodes own their children. World matrices are cached per node and only
//! recomputed by [`SceneNode::update_world_transforms`], so callers that need
//! world-space data must refresh the tree first.

use std::{collections::HashMap, sync::Arc};

use cgmath::{Matrix4, SquareMatrix};

use crate::data_structures::{
    geometry::{ComponentType, InterleavedAttribute, InterleavedBuffer, PositionAttribute},
    instance::Instance,
};

/// Type tag of a scene node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Group,
    /// Triangle geometry.
    Mesh,
    Lines,
    Points,
}

/// Renderable geometry of a mesh node together with its material metadata.
#[derive(Clone, Debug, Default)]
pub struct Mesh {
    pub position: Option<PositionAttribute>,
    pub material_name: Option<String>,
}

pub trait SceneNode: Send {
    fn get_name(&self) -> &str;

    fn get_kind(&self) -> NodeKind;

    fn get_mesh(&self) -> Option<&Mesh>;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    /// The world matrix as of the last call to `update_world_transforms`.
    fn get_world_matrix(&self) -> Matrix4<f32>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /**
     * Recomputes the world matrix of `self` from the parent's world matrix and
     * passes the result down to every child.
     */
    fn update_world_transforms(&mut self, parents_world_matrix: &Matrix4<f32>);

    /// Treats `self` as the root and refreshes the world matrices of the whole subtree.
    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Matrix4::identity());
    }
}

/**
 * Visits `node` and all of its descendants depth-first, parents before children,
 * siblings in insertion order.
 */
pub fn traverse(node: &dyn SceneNode, visit: &mut dyn FnMut(&dyn SceneNode)) {
    visit(node);
    for child in node.get_children() {
        traverse(child.as_ref(), visit);
    }
}

/// Looks up the first node with the given name in depth-first order.
pub fn find_by_name<'a>(node: &'a dyn SceneNode, name: &str) -> Option<&'a dyn SceneNode> {
    if node.get_name() == name {
        return Some(node);
    }
    node.get_children()
        .iter()
        .find_map(|child| find_by_name(child.as_ref(), name))
}

pub struct ContainerNode {
    pub name: String,
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Matrix4<f32>,
}

impl ContainerNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: vec![],
            local: Instance::default(),
            world: Matrix4::identity(),
        }
    }
}

impl SceneNode for ContainerNode {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_kind(&self) -> NodeKind {
        NodeKind::Group
    }

    fn get_mesh(&self) -> Option<&Mesh> {
        None
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_matrix(&self) -> Matrix4<f32> {
        self.world
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parents_world_matrix: &Matrix4<f32>) {
        self.world = parents_world_matrix * self.local.to_matrix();
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }
}

pub struct MeshNode {
    pub name: String,
    pub mesh: Mesh,
    kind: NodeKind,
    children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Matrix4<f32>,
}

impl MeshNode {
    pub fn new(name: impl Into<String>, mesh: Mesh) -> Self {
        Self::with_kind(name, mesh, NodeKind::Mesh)
    }

    /// A node carrying geometry that is not drawn as triangles (lines or points).
    pub fn with_kind(name: impl Into<String>, mesh: Mesh, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            mesh,
            kind,
            children: vec![],
            local: Instance::default(),
            world: Matrix4::identity(),
        }
    }
}

impl SceneNode for MeshNode {
    fn get_name(&self) -> &str {
        &self.name
    }

    fn get_kind(&self) -> NodeKind {
        self.kind
    }

    fn get_mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }

    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn get_world_matrix(&self) -> Matrix4<f32> {
        self.world
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
        &mut self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parents_world_matrix: &Matrix4<f32>) {
        self.world = parents_world_matrix * self.local.to_matrix();
        let world = self.world;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&world);
        }
    }
}

/// Interleaved buffers already materialized for a glTF file, keyed by buffer view index.
pub type SharedViews = HashMap<usize, Arc<InterleavedBuffer>>;

pub fn to_scene_node(
    node: gltf::scene::Node,
    buf: &[Vec<u8>],
    views: &mut SharedViews,
) -> Box<dyn SceneNode> {
    let name = node
        .name()
        .or_else(|| node.mesh().and_then(|mesh| mesh.name()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("node_{}", node.index()));

    let mut scene_node: Box<dyn SceneNode> = match node.mesh() {
        Some(mesh) => {
            let mut nodes: Vec<MeshNode> = mesh
                .primitives()
                .map(|primitive| {
                    let geometry = Mesh {
                        position: read_positions(&primitive, buf, views),
                        material_name: primitive.material().name().map(str::to_string),
                    };
                    MeshNode::with_kind(name.clone(), geometry, primitive_kind(primitive.mode()))
                })
                .collect();
            // several primitives become a group of meshes
            if nodes.len() == 1 {
                Box::new(nodes.remove(0))
            } else {
                let mut group = ContainerNode::new(name.clone());
                for (i, mut child) in nodes.into_iter().enumerate() {
                    child.name = format!("{}_{}", name, i);
                    group.add_child(Box::new(child));
                }
                Box::new(group)
            }
        }
        None => Box::new(ContainerNode::new(name)),
    };
    scene_node.set_local_transform(node.transform().decomposed().into());
    for child in node.children() {
        let child_node = to_scene_node(child, buf, views);
        scene_node.add_child(child_node);
    }

    scene_node
}

fn primitive_kind(mode: gltf::mesh::Mode) -> NodeKind {
    use gltf::mesh::Mode;
    match mode {
        Mode::Points => NodeKind::Points,
        Mode::Lines | Mode::LineLoop | Mode::LineStrip => NodeKind::Lines,
        Mode::Triangles | Mode::TriangleStrip | Mode::TriangleFan => NodeKind::Mesh,
    }
}

/**
 * Reads the POSITION attribute of a primitive.
 *
 * Strided views stay interleaved and share their bytes with every other attribute of
 * the same view. Tightly packed non-float data is dequantized right away. Everything
 * else (plain floats, sparse accessors) goes through the gltf reader.
 */
fn read_positions(
    primitive: &gltf::Primitive,
    buf: &[Vec<u8>],
    views: &mut SharedViews,
) -> Option<PositionAttribute> {
    let accessor = primitive.get(&gltf::Semantic::Positions)?;
    if accessor.dimensions() != gltf::accessor::Dimensions::Vec3 {
        log::warn!(
            "position accessor {} is not a vec3, ignoring it",
            accessor.index()
        );
        return None;
    }
    let component: ComponentType = accessor.data_type().into();
    let element_size = component.size() * 3;

    if let (Some(view), None) = (accessor.view(), accessor.sparse()) {
        let stride = view.stride().unwrap_or(element_size);
        if stride > element_size || component != ComponentType::F32 {
            let buffer = match views.get(&view.index()) {
                Some(buffer) => buffer.clone(),
                None => {
                    let bytes = buf
                        .get(view.buffer().index())?
                        .get(view.offset()..view.offset() + view.length())?;
                    let buffer = Arc::new(InterleavedBuffer::new(bytes.to_vec(), stride));
                    views.insert(view.index(), buffer.clone());
                    buffer
                }
            };
            let attribute = InterleavedAttribute {
                buffer,
                item_size: 3,
                offset: accessor.offset(),
                count: accessor.count(),
                component,
                normalized: accessor.normalized(),
            };
            if stride > element_size {
                return Some(PositionAttribute::Interleaved(attribute));
            }
            return Some(PositionAttribute::Packed(attribute.deinterleave().array));
        }
    }

    let reader = primitive.reader(|buffer| buf.get(buffer.index()).map(|data| data.as_slice()));
    reader
        .read_positions()
        .map(|positions| PositionAttribute::Packed(positions.flatten().collect()))
}
