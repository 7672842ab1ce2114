use crate::{
    error::MeshError,
    geometry::Vector3,
    models::{md3::Md3Parser, Mesh, ModelSettings, VertexBuffer},
};

/// Builds renderable frames from a parsed MD3 file, one vertex buffer per sub-mesh.
#[derive(Clone, Debug)]
pub struct Md3Model {
    pub parser: Md3Parser,
    pub settings: ModelSettings,
}

impl Md3Model {
    pub fn new(parser: Md3Parser) -> Self {
        Self {
            parser,
            settings: ModelSettings::default(),
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.parser.frame_count()
    }

    pub fn mesh(&self, index: usize) -> Result<Mesh, MeshError> {
        let count = self.mesh_count();
        if index >= count {
            return Err(MeshError::IndexOutOfRange { index, count });
        }

        let format = self.settings.format;
        let mut mesh = Mesh::with_capacity(self.parser.meshes.len());

        for sub in self.parser.meshes.iter() {
            let vertex_count = sub.header.vertex_count as usize;
            let base = index * vertex_count;

            let mut vb = VertexBuffer::new(sub.name().to_str(), format);
            vb.data.reserve(sub.faces.len() * 3 * vb.stride);

            for face in sub.faces.iter() {
                for &corner in face.indices.iter() {
                    let corner = corner as usize;
                    let vertex = sub
                        .vertices
                        .get(base + corner)
                        .filter(|_| corner < vertex_count)
                        .ok_or(MeshError::IndexOutOfRange {
                            index: corner,
                            count: vertex_count,
                        })?;

                    let position = Vector3::from_array(self.settings.convert(vertex.decompress()));
                    let normal =
                        Vector3::from_array(self.settings.convert(vertex.decompress_normal()));
                    let uv = sub.tex_coords.get(corner).map(|tc| tc.uv).unwrap_or_default();

                    vb.push(&position, &normal, uv, self.settings.color);
                }
            }

            mesh.push(vb);
        }

        Ok(mesh)
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::{
        buffer::MemoryBuffer,
        models::{md3::parser::fixtures, Color, VertexFormat},
    };

    fn model(frames: u32) -> Md3Model {
        let data = fixtures::md3("upper", frames, &[], &[]);
        Md3Model::new(Md3Parser::read(&mut MemoryBuffer::from(data)).unwrap())
    }

    #[test]
    fn test_mesh_per_frame() {
        let mut md3 = model(3);
        md3.settings.format = VertexFormat::Normals | VertexFormat::TexCoords | VertexFormat::Colors;
        md3.settings.color = Color::rgba(255, 0, 0, 255);

        let mesh = md3.mesh(2).unwrap();
        assert_eq!(mesh.len(), 1);
        assert_eq!(mesh[0].name, "tri");
        assert_eq!(mesh[0].vertex_count(), 3);
        assert_eq!(mesh[0].position(1), Vector3::new(1.0, 0.0, 2.0));
        assert_eq!(mesh[0].normal(0), Some(Vector3::new(0.0, 0.0, 1.0)));

        let second = &mesh[0].data[12..24];
        assert_eq!(&second[6..8], &[1.0, 0.0]);
        assert_eq!(&second[8..12], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_out_of_range() {
        let md3 = model(2);
        assert_eq!(md3.mesh_count(), 2);
        assert_eq!(
            md3.mesh(2),
            Err(MeshError::IndexOutOfRange { index: 2, count: 2 })
        );
    }
}
