#![allow(dead_code)]

use flow_collide::data_structures::{
    geometry::PositionAttribute,
    instance::Instance,
    scene_graph::{ContainerNode, Mesh, MeshNode, SceneNode},
};

/// The eight corners of an axis aligned cube centred at the origin.
pub(crate) fn cube_corners(half: f32) -> Vec<[f32; 3]> {
    let mut corners = Vec::with_capacity(8);
    for x in [-half, half] {
        for y in [-half, half] {
            for z in [-half, half] {
                corners.push([x, y, z]);
            }
        }
    }
    corners
}

pub(crate) fn flatten(points: &[[f32; 3]]) -> Vec<f32> {
    points.iter().flatten().copied().collect()
}

pub(crate) fn mesh_node(name: &str, material: Option<&str>, points: &[[f32; 3]]) -> MeshNode {
    MeshNode::new(
        name,
        Mesh {
            position: Some(PositionAttribute::Packed(flatten(points))),
            material_name: material.map(str::to_string),
        },
    )
}

pub(crate) fn moved(mut node: impl SceneNode + 'static, instance: Instance) -> Box<dyn SceneNode> {
    node.set_local_transform(instance);
    Box::new(node)
}

pub(crate) fn group(name: &str, children: Vec<Box<dyn SceneNode>>) -> ContainerNode {
    let mut node = ContainerNode::new(name);
    for child in children {
        node.add_child(child);
    }
    node
}

pub(crate) struct Primitive {
    pub(crate) position: Option<usize>,
    pub(crate) material: Option<usize>,
    /// glTF primitive mode, 4 for triangles.
    pub(crate) mode: u32,
}

impl Primitive {
    pub(crate) fn triangles(position: usize) -> Self {
        Self {
            position: Some(position),
            material: None,
            mode: 4,
        }
    }

    pub(crate) fn with_material(mut self, material: usize) -> Self {
        self.material = Some(material);
        self
    }
}

#[derive(Default)]
pub(crate) struct Node {
    pub(crate) name: Option<String>,
    pub(crate) mesh: Option<usize>,
    pub(crate) translation: Option<[f32; 3]>,
    /// xyzw
    pub(crate) rotation: Option<[f32; 4]>,
    pub(crate) scale: Option<[f32; 3]>,
    pub(crate) children: Vec<usize>,
}

/**
 * Assembles a binary glTF in memory.
 *
 * Every vertex array lands in its own buffer view of the single BIN chunk; POSITION
 * accessors carry the min/max bounds the format requires.
 */
#[derive(Default)]
pub(crate) struct GlbBuilder {
    bin: Vec<u8>,
    buffer_views: Vec<String>,
    accessors: Vec<String>,
    materials: Vec<String>,
    meshes: Vec<String>,
    nodes: Vec<String>,
}

impl GlbBuilder {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn push_view(&mut self, bytes: &[u8], stride: Option<usize>) -> usize {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let offset = self.bin.len();
        self.bin.extend_from_slice(bytes);
        let stride = stride
            .map(|s| format!(r#","byteStride":{}"#, s))
            .unwrap_or_default();
        self.buffer_views.push(format!(
            r#"{{"buffer":0,"byteOffset":{},"byteLength":{}{}}}"#,
            offset,
            bytes.len(),
            stride
        ));
        self.buffer_views.len() - 1
    }

    fn push_accessor(
        &mut self,
        view: usize,
        component_type: u32,
        normalized: bool,
        count: usize,
        bounds: ([f64; 3], [f64; 3]),
    ) -> usize {
        let (min, max) = bounds;
        self.accessors.push(format!(
            r#"{{"bufferView":{},"componentType":{},"normalized":{},"count":{},"type":"VEC3","min":[{},{},{}],"max":[{},{},{}]}}"#,
            view,
            component_type,
            normalized,
            count,
            min[0],
            min[1],
            min[2],
            max[0],
            max[1],
            max[2]
        ));
        self.accessors.len() - 1
    }

    /// Tightly packed float positions.
    pub(crate) fn positions(&mut self, points: &[[f32; 3]]) -> usize {
        self.interleaved_positions(points, 0)
    }

    /// Float positions followed by `padding` unrelated floats per vertex.
    pub(crate) fn interleaved_positions(&mut self, points: &[[f32; 3]], padding: usize) -> usize {
        let mut bytes = Vec::new();
        for point in points {
            for c in point {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            for i in 0..padding {
                bytes.extend_from_slice(&(1000.0 + i as f32).to_le_bytes());
            }
        }
        let stride = (padding > 0).then_some((3 + padding) * 4);
        let view = self.push_view(&bytes, stride);
        let bounds = bounds(points.iter().map(|p| p.map(f64::from)));
        self.push_accessor(view, 5126, false, points.len(), bounds)
    }

    /// Normalized `i16` positions, each padded to `stride` bytes.
    pub(crate) fn quantized_positions(&mut self, points: &[[i16; 3]], stride: usize) -> usize {
        let mut bytes = Vec::new();
        for point in points {
            for c in point {
                bytes.extend_from_slice(&c.to_le_bytes());
            }
            bytes.resize(bytes.len() + stride - 6, 0);
        }
        let view = self.push_view(&bytes, Some(stride));
        let bounds = bounds(points.iter().map(|p| p.map(f64::from)));
        self.push_accessor(view, 5122, true, points.len(), bounds)
    }

    pub(crate) fn material(&mut self, name: &str) -> usize {
        self.materials.push(format!(r#"{{"name":"{}"}}"#, name));
        self.materials.len() - 1
    }

    pub(crate) fn mesh(&mut self, name: &str, primitives: Vec<Primitive>) -> usize {
        let primitives: Vec<String> = primitives
            .into_iter()
            .map(|p| {
                let attributes = p
                    .position
                    .map(|a| format!(r#""POSITION":{}"#, a))
                    .unwrap_or_default();
                let material = p
                    .material
                    .map(|m| format!(r#","material":{}"#, m))
                    .unwrap_or_default();
                format!(
                    r#"{{"attributes":{{{}}},"mode":{}{}}}"#,
                    attributes, p.mode, material
                )
            })
            .collect();
        self.meshes.push(format!(
            r#"{{"name":"{}","primitives":[{}]}}"#,
            name,
            primitives.join(",")
        ));
        self.meshes.len() - 1
    }

    pub(crate) fn node(&mut self, node: Node) -> usize {
        let mut fields = Vec::new();
        if let Some(name) = node.name {
            fields.push(format!(r#""name":"{}""#, name));
        }
        if let Some(mesh) = node.mesh {
            fields.push(format!(r#""mesh":{}"#, mesh));
        }
        if let Some([x, y, z]) = node.translation {
            fields.push(format!(r#""translation":[{},{},{}]"#, x, y, z));
        }
        if let Some([x, y, z, w]) = node.rotation {
            fields.push(format!(r#""rotation":[{},{},{},{}]"#, x, y, z, w));
        }
        if let Some([x, y, z]) = node.scale {
            fields.push(format!(r#""scale":[{},{},{}]"#, x, y, z));
        }
        if !node.children.is_empty() {
            let children: Vec<String> = node.children.iter().map(usize::to_string).collect();
            fields.push(format!(r#""children":[{}]"#, children.join(",")));
        }
        self.nodes.push(format!("{{{}}}", fields.join(",")));
        self.nodes.len() - 1
    }

    /// Serializes the document with `roots` as the nodes of its only scene.
    pub(crate) fn build(mut self, roots: &[usize]) -> Vec<u8> {
        while self.bin.len() % 4 != 0 {
            self.bin.push(0);
        }
        let roots: Vec<String> = roots.iter().map(usize::to_string).collect();
        let mut json = format!(
            r#"{{"asset":{{"version":"2.0"}},"scene":0,"scenes":[{{"name":"TestScene","nodes":[{}]}}]"#,
            roots.join(",")
        );
        for (key, items) in [
            ("nodes", &self.nodes),
            ("meshes", &self.meshes),
            ("materials", &self.materials),
            ("accessors", &self.accessors),
            ("bufferViews", &self.buffer_views),
        ] {
            if !items.is_empty() {
                json.push_str(&format!(r#","{}":[{}]"#, key, items.join(",")));
            }
        }
        if !self.bin.is_empty() {
            json.push_str(&format!(r#","buffers":[{{"byteLength":{}}}]"#, self.bin.len()));
        }
        json.push('}');
        let mut json = json.into_bytes();
        while json.len() % 4 != 0 {
            json.push(b' ');
        }

        let bin_chunk = if self.bin.is_empty() { 0 } else { 8 + self.bin.len() };
        let total = 12 + 8 + json.len() + bin_chunk;
        let mut glb = Vec::with_capacity(total);
        glb.extend_from_slice(b"glTF");
        glb.extend_from_slice(&2u32.to_le_bytes());
        glb.extend_from_slice(&(total as u32).to_le_bytes());
        glb.extend_from_slice(&(json.len() as u32).to_le_bytes());
        glb.extend_from_slice(b"JSON");
        glb.extend_from_slice(&json);
        if !self.bin.is_empty() {
            glb.extend_from_slice(&(self.bin.len() as u32).to_le_bytes());
            glb.extend_from_slice(b"BIN\0");
            glb.extend_from_slice(&self.bin);
        }
        glb
    }
}

fn bounds(points: impl Iterator<Item = [f64; 3]>) -> ([f64; 3], [f64; 3]) {
    let mut min = [f64::MAX; 3];
    let mut max = [f64::MIN; 3];
    for point in points {
        for i in 0..3 {
            min[i] = min[i].min(point[i]);
            max[i] = max[i].max(point[i]);
        }
    }
    (min, max)
}

/// A single unit cube mesh named `cube` at the scene root.
pub(crate) fn cube_glb() -> Vec<u8> {
    let mut glb = GlbBuilder::new();
    let positions = glb.positions(&cube_corners(0.5));
    let mesh = glb.mesh("cube", vec![Primitive::triangles(positions)]);
    let node = glb.node(Node {
        name: Some("cube".to_string()),
        mesh: Some(mesh),
        ..Default::default()
    });
    glb.build(&[node])
}
