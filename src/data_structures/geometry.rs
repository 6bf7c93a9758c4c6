//! Vertex position storage for meshes in the scene graph.
//!
//! Loaded models store positions either as a tightly packed `f32` array or
//! interleaved with other vertex attributes inside a shared byte buffer, often
//! with a narrower (quantized) numeric encoding. Geometric operations only
//! ever work on [`VertexBuffer`]s, the materialized `f32` form.

use std::sync::Arc;

/// Numeric encoding of a single vertex component inside a buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComponentType {
    I8,
    U8,
    I16,
    U16,
    U32,
    F32,
}

impl ComponentType {
    pub fn size(&self) -> usize {
        match self {
            ComponentType::I8 | ComponentType::U8 => 1,
            ComponentType::I16 | ComponentType::U16 => 2,
            ComponentType::U32 | ComponentType::F32 => 4,
        }
    }

    /// Reads one little-endian component starting at `bytes[0]`.
    ///
    /// Normalized integers are mapped to `[-1, 1]` (signed) or `[0, 1]`
    /// (unsigned) the way glTF defines it.
    pub fn read(&self, bytes: &[u8], normalized: bool) -> Option<f32> {
        let value = match self {
            ComponentType::I8 => {
                let v = i8::from_le_bytes([*bytes.first()?]) as f32;
                if normalized { (v / 127.0).max(-1.0) } else { v }
            }
            ComponentType::U8 => {
                let v = *bytes.first()? as f32;
                if normalized { v / 255.0 } else { v }
            }
            ComponentType::I16 => {
                let v = i16::from_le_bytes(bytes.get(0..2)?.try_into().ok()?) as f32;
                if normalized { (v / 32767.0).max(-1.0) } else { v }
            }
            ComponentType::U16 => {
                let v = u16::from_le_bytes(bytes.get(0..2)?.try_into().ok()?) as f32;
                if normalized { v / 65535.0 } else { v }
            }
            ComponentType::U32 => u32::from_le_bytes(bytes.get(0..4)?.try_into().ok()?) as f32,
            ComponentType::F32 => f32::from_le_bytes(bytes.get(0..4)?.try_into().ok()?),
        };
        Some(value)
    }
}

impl From<gltf::accessor::DataType> for ComponentType {
    fn from(data_type: gltf::accessor::DataType) -> Self {
        use gltf::accessor::DataType;
        match data_type {
            DataType::I8 => ComponentType::I8,
            DataType::U8 => ComponentType::U8,
            DataType::I16 => ComponentType::I16,
            DataType::U16 => ComponentType::U16,
            DataType::U32 => ComponentType::U32,
            DataType::F32 => ComponentType::F32,
        }
    }
}

/// A byte buffer holding several vertex attributes side by side.
///
/// One vertex occupies `stride` bytes. Several [`InterleavedAttribute`]s can
/// point into the same buffer at different byte offsets.
#[derive(Debug)]
pub struct InterleavedBuffer {
    pub bytes: Vec<u8>,
    pub stride: usize,
}

impl InterleavedBuffer {
    pub fn new(bytes: Vec<u8>, stride: usize) -> Self {
        Self { bytes, stride }
    }
}

/// View of one attribute inside an [`InterleavedBuffer`].
#[derive(Clone, Debug)]
pub struct InterleavedAttribute {
    pub buffer: Arc<InterleavedBuffer>,
    pub item_size: usize,
    pub offset: usize,
    pub count: usize,
    pub component: ComponentType,
    pub normalized: bool,
}

impl InterleavedAttribute {
    /**
     * Copies the attribute out of its shared buffer into a dedicated `f32` array.
     *
     * Elements that would read past the end of the buffer are dropped (with a warning)
     * so that the result always holds complete items.
     */
    pub fn deinterleave(&self) -> VertexBuffer {
        let component_size = self.component.size();
        let mut array = Vec::with_capacity(self.count * self.item_size);
        for i in 0..self.count {
            let start = i * self.buffer.stride + self.offset;
            let item: Option<Vec<f32>> = (0..self.item_size)
                .map(|c| {
                    let at = start + c * component_size;
                    self.buffer
                        .bytes
                        .get(at..)
                        .and_then(|bytes| self.component.read(bytes, self.normalized))
                })
                .collect();
            match item {
                Some(mut item) => array.append(&mut item),
                None => {
                    log::warn!(
                        "interleaved attribute reads past its buffer at element {} of {}, truncating",
                        i,
                        self.count
                    );
                    break;
                }
            }
        }
        VertexBuffer {
            array,
            item_size: self.item_size,
        }
    }
}

/// The position attribute of a mesh as it was loaded.
#[derive(Clone, Debug)]
pub enum PositionAttribute {
    /// Tightly packed `f32` xyz triples.
    Packed(Vec<f32>),
    /// Positions stored inside a shared, strided buffer.
    Interleaved(InterleavedAttribute),
}

impl PositionAttribute {
    pub fn is_interleaved(&self) -> bool {
        matches!(self, PositionAttribute::Interleaved(_))
    }

    pub fn count(&self) -> usize {
        match self {
            PositionAttribute::Packed(array) => array.len() / 3,
            PositionAttribute::Interleaved(attribute) => attribute.count,
        }
    }

    /// Materializes the positions into a contiguous `f32` buffer.
    pub fn to_vertex_buffer(&self) -> VertexBuffer {
        match self {
            PositionAttribute::Packed(array) => VertexBuffer {
                array: array.clone(),
                item_size: 3,
            },
            PositionAttribute::Interleaved(attribute) => attribute.deinterleave(),
        }
    }
}

/// A flat, contiguous array of `f32` vertex components.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    pub array: Vec<f32>,
    pub item_size: usize,
}

impl VertexBuffer {
    pub fn new(array: Vec<f32>) -> Self {
        Self {
            array,
            item_size: 3,
        }
    }

    /// Materialized buffers never share storage with other attributes.
    pub fn is_interleaved(&self) -> bool {
        false
    }

    pub fn count(&self) -> usize {
        if self.item_size == 0 {
            return 0;
        }
        self.array.len() / self.item_size
    }

    /// Transforms every xyz point in place.
    pub fn apply_matrix4(&mut self, matrix: &cgmath::Matrix4<f32>) {
        if self.item_size < 3 {
            return;
        }
        for item in self.array.chunks_exact_mut(self.item_size) {
            let p = matrix * cgmath::Vector4::new(item[0], item[1], item[2], 1.0);
            // projective division only matters for non-affine matrices
            let w = if p.w != 0.0 { p.w } else { 1.0 };
            item[0] = p.x / w;
            item[1] = p.y / w;
            item[2] = p.z / w;
        }
    }
}
