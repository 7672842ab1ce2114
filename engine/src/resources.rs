use std::sync::Arc;

use ahash::AHashMap;
use bevy_ecs::system::Resource;

use crate::texture::Texture;

/// Textures shared between groups, keyed by content hash.
#[derive(Resource, Default, Clone, Debug)]
pub struct Resources {
    textures: AHashMap<u32, Arc<Texture>>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `texture` unless identical content is already present, and returns the shared copy.
    pub fn add_texture(&mut self, texture: Texture) -> Arc<Texture> {
        let hash = texture.hash();

        self.textures
            .entry(hash)
            .or_insert_with(|| {
                log::debug!("new texture {:?} 0x{hash:08X}", texture.name);
                Arc::new(texture)
            })
            .clone()
    }

    pub fn texture(&self, hash: u32) -> Option<Arc<Texture>> {
        self.textures.get(&hash).cloned()
    }

    pub fn remove_texture(&mut self, hash: u32) -> Option<Arc<Texture>> {
        self.textures.remove(&hash)
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    pub fn clear(&mut self) {
        self.textures.clear();
    }
}
