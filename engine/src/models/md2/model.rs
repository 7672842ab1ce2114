use crate::{
    error::MeshError,
    geometry::Vector3,
    models::{
        md2::{Md2Normals, Md2Parser},
        Mesh, ModelSettings, VertexBuffer, VertexFormat,
    },
};

/// Builds renderable frames from a parsed MD2 file.
#[derive(Clone, Debug)]
pub struct Md2Model {
    pub parser: Md2Parser,
    pub normals: Option<Md2Normals>,
    pub settings: ModelSettings,
}

impl Md2Model {
    pub fn new(parser: Md2Parser, normals: Option<Md2Normals>) -> Self {
        Self {
            parser,
            normals,
            settings: ModelSettings::default(),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.parser.frames.len()
    }

    /// Walks the polygon list of `index` and emits one vertex per corner.
    pub fn mesh(&self, index: usize) -> Result<Mesh, MeshError> {
        let frame = self
            .parser
            .frames
            .get(index)
            .ok_or(MeshError::IndexOutOfRange {
                index,
                count: self.mesh_count(),
            })?;

        let format = self.settings.format;
        let wants_normals = format.contains(VertexFormat::Normals);
        if wants_normals && self.normals.is_none() {
            return Err(MeshError::MissingNormals);
        }

        let lit = self.settings.light.enabled && wants_normals;
        let (skin_width, skin_height) = self.parser.skin_size();
        let uv_scale = |size: u32| if size == 0 { 0.0 } else { 1.0 / size as f32 };
        let (su, sv) = (uv_scale(skin_width), uv_scale(skin_height));

        let mut vb = VertexBuffer::new(frame.name.to_str(), format);
        vb.data.reserve(self.parser.polygons.len() * 3 * vb.stride);

        for polygon in self.parser.polygons.iter() {
            for corner in 0..3 {
                let vertex_index = polygon.vertex_indices[corner] as usize;
                let vertex = frame.vertices.get(vertex_index).ok_or(
                    MeshError::IndexOutOfRange {
                        index: vertex_index,
                        count: frame.vertices.len(),
                    },
                )?;

                let position = Vector3::from_array(self.settings.convert(frame.decompress(vertex)));

                let normal = match &self.normals {
                    Some(table) if wants_normals => {
                        let raw = table.get(vertex.normal_index as usize).ok_or(
                            MeshError::IndexOutOfRange {
                                index: vertex.normal_index as usize,
                                count: table.len(),
                            },
                        )?;
                        Vector3::from_array(self.settings.convert(raw.to_array()))
                    }
                    _ => Vector3::zero(),
                };

                let tc_index = polygon.tex_coord_indices[corner] as usize;
                let uv = self
                    .parser
                    .tex_coords
                    .get(tc_index)
                    .map(|tc| [tc.u as f32 * su, tc.v as f32 * sv])
                    .unwrap_or_default();

                let color = if lit {
                    self.settings.light.shade(&normal, self.settings.color.a)
                } else {
                    self.settings.color
                };

                vb.push(&position, &normal, uv, color);
            }
        }

        Ok(vec![vb])
    }
}
