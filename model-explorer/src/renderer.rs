use glam::{Mat4, Vec3};
use qr_engine::{
    geometry::Matrix16,
    models::Mesh,
    render::{find_texture, Renderer},
    texture::ModelTexture,
};

/// Renderer that only reports what it was asked to draw.
#[derive(Default)]
pub struct LogRenderer {
    pub scenes: usize,
    pub draws: usize,
    pub vertices: usize,
}

impl Renderer for LogRenderer {
    fn begin_scene(&mut self) {
        self.scenes += 1;
    }

    fn draw(&mut self, mesh: &Mesh, model_matrix: &Matrix16<f32>, textures: &[ModelTexture]) {
        let matrix: Mat4 = (*model_matrix).into();
        let origin = matrix.transform_point3(Vec3::ZERO);

        for vb in mesh.iter() {
            let bound = self.select_texture(textures, &vb.name);
            log::debug!(
                "draw {:?}: {} vertices at {origin}, textured: {bound}",
                vb.name,
                vb.vertex_count()
            );
            self.vertices += vb.vertex_count();
        }
        self.draws += 1;
    }

    fn select_texture(&mut self, textures: &[ModelTexture], name: &str) -> bool {
        find_texture(textures, name).is_some()
    }
}
