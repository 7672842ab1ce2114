use flagset::{flags, FlagSet};

use crate::{
    error::MeshError,
    geometry::{Polygon, Vector3},
};

flags! {
    /// Optional per-vertex fields, written after the position in this order.
    pub enum VertexFormat: u32 {
        Normals = 0x1,
        TexCoords = 0x2,
        Colors = 0x4,
    }
}

pub type VertexFormats = FlagSet<VertexFormat>;

/// Floats per vertex for a given format.
pub fn stride_of(format: VertexFormats) -> usize {
    let mut stride = 3;

    if format.contains(VertexFormat::Normals) {
        stride += 3;
    }
    if format.contains(VertexFormat::TexCoords) {
        stride += 2;
    }
    if format.contains(VertexFormat::Colors) {
        stride += 4;
    }

    stride
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_argb(self) -> u32 {
        u32::from_be_bytes([self.a, self.r, self.g, self.b])
    }

    pub fn to_floats(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a].map(|c| c as f32 / 255.0)
    }
}

/// Directional light baked into vertex colors.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DirectionalLight {
    pub ambient: Color,
    pub color: Color,
    pub direction: Vector3<f32>,
    pub enabled: bool,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            ambient: Color::rgba(0, 0, 0, 255),
            color: Color::WHITE,
            direction: Vector3::new(0.0, 0.0, 1.0),
            enabled: false,
        }
    }
}

impl DirectionalLight {
    /// Ambient plus diffuse term for a vertex normal, clamped per channel.
    pub fn shade(&self, normal: &Vector3<f32>, alpha: u8) -> Color {
        let angle = normal.dot(&self.direction).max(0.0);
        let channel = |c: u8, ambient: u8| ((c as f32 * angle) as u32 + ambient as u32).min(255) as u8;

        Color::rgba(
            channel(self.color.r, self.ambient.r),
            channel(self.color.g, self.ambient.g),
            channel(self.color.b, self.ambient.b),
            alpha,
        )
    }
}

/// Interleaved vertex data: position, then normal, uv and color as selected by `format`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct VertexBuffer {
    pub name: String,
    pub format: VertexFormats,
    pub stride: usize,
    pub data: Vec<f32>,
}

impl VertexBuffer {
    pub fn new(name: impl Into<String>, format: VertexFormats) -> Self {
        Self {
            name: name.into(),
            format,
            stride: stride_of(format),
            data: Vec::new(),
        }
    }

    pub fn vertex_count(&self) -> usize {
        if self.stride == 0 {
            0
        } else {
            self.data.len() / self.stride
        }
    }

    /// Appends one vertex, skipping the fields absent from the format.
    pub fn push(
        &mut self,
        position: &Vector3<f32>,
        normal: &Vector3<f32>,
        uv: [f32; 2],
        color: Color,
    ) {
        self.data.extend_from_slice(&position.to_array());

        if self.format.contains(VertexFormat::Normals) {
            self.data.extend_from_slice(&normal.to_array());
        }
        if self.format.contains(VertexFormat::TexCoords) {
            self.data.extend_from_slice(&uv);
        }
        if self.format.contains(VertexFormat::Colors) {
            self.data.extend_from_slice(&color.to_floats());
        }
    }

    pub fn position(&self, index: usize) -> Vector3<f32> {
        let i = index * self.stride;
        Vector3::new(self.data[i], self.data[i + 1], self.data[i + 2])
    }

    pub fn normal(&self, index: usize) -> Option<Vector3<f32>> {
        if !self.format.contains(VertexFormat::Normals) {
            return None;
        }

        let i = index * self.stride + 3;
        Some(Vector3::new(self.data[i], self.data[i + 1], self.data[i + 2]))
    }
}

/// One frame worth of renderable geometry.
pub type Mesh = Vec<VertexBuffer>;

/// Blends positions (and normals) of two meshes with the same topology.
///
/// Texture coordinates and colors are taken from `a`.
pub fn interpolate(t: f32, a: &Mesh, b: &Mesh) -> Result<Mesh, MeshError> {
    if a.len() != b.len() {
        return Err(MeshError::Mismatch);
    }

    a.iter()
        .zip(b.iter())
        .map(|(va, vb)| {
            if va.format != vb.format || va.stride != vb.stride || va.data.len() != vb.data.len() {
                return Err(MeshError::Mismatch);
            }

            let mut out = va.clone();
            let blended = if va.format.contains(VertexFormat::Normals) { 6 } else { 3 };

            for (vertex, (fa, fb)) in out
                .data
                .chunks_exact_mut(va.stride)
                .zip(va.data.chunks_exact(va.stride).zip(vb.data.chunks_exact(vb.stride)))
            {
                for k in 0..blended {
                    vertex[k] = fa[k] + (fb[k] - fa[k]) * t;
                }
            }

            Ok(out)
        })
        .collect()
}

/// Triangles of every vertex buffer, for collision trees.
pub fn mesh_polygons(mesh: &Mesh) -> Vec<Polygon<f32>> {
    let mut polygons = Vec::new();

    for vb in mesh {
        for i in (0..vb.vertex_count().saturating_sub(2)).step_by(3) {
            polygons.push(Polygon::new(
                vb.position(i),
                vb.position(i + 1),
                vb.position(i + 2),
            ));
        }
    }

    polygons
}
