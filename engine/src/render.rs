use crate::{
    geometry::Matrix16,
    models::Mesh,
    texture::ModelTexture,
};

/// Drawing backend used by model groups.
pub trait Renderer {
    fn begin_scene(&mut self) {}

    fn end_scene(&mut self) {}

    /// Draws `mesh` transformed by `model_matrix`.
    fn draw(&mut self, mesh: &Mesh, model_matrix: &Matrix16<f32>, textures: &[ModelTexture]);

    /// Binds the texture called `name`, if any. Returns false when nothing matched.
    fn select_texture(&mut self, textures: &[ModelTexture], name: &str) -> bool;
}

/// Picks the enabled texture matching `name`, falling back to the first enabled one.
pub fn find_texture<'a>(textures: &'a [ModelTexture], name: &str) -> Option<&'a ModelTexture> {
    let mut enabled = textures.iter().filter(|t| t.enabled && t.texture.is_some());

    textures
        .iter()
        .find(|t| t.enabled && t.texture.is_some() && t.name == name)
        .or_else(|| enabled.next())
}
