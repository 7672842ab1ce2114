pub mod bmp;

use std::{fmt, sync::Arc};

use crate::hash::{HashChain, MODEL_HASH_SEED};

/// Decoded 24 bit image, rows top-down, RGB.
#[derive(Clone, PartialEq, Eq)]
pub struct Texture {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    hash: u32,
}

impl fmt::Debug for Texture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture")
            .field("name", &self.name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("hash", &format_args!("0x{:08X}", self.hash))
            .finish()
    }
}

impl Texture {
    pub fn new(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u8>) -> Self {
        let hash = HashChain::new(MODEL_HASH_SEED)
            .bytes(&pixels)
            .u32(width)
            .u32(height)
            .finish();

        Self {
            name: name.into(),
            width,
            height,
            pixels,
            hash,
        }
    }

    /// CRC32 over the pixels and dimensions. Names do not take part.
    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }

        let i = ((y * self.width + x) * 3) as usize;
        self.pixels.get(i..i + 3).map(|p| [p[0], p[1], p[2]])
    }
}

/// A texture slot on a model, possibly shared through [`Resources`](crate::resources::Resources).
#[derive(Clone, Debug)]
pub struct ModelTexture {
    pub name: String,
    pub enabled: bool,
    pub texture: Option<Arc<Texture>>,
}

impl ModelTexture {
    pub fn new(name: impl Into<String>, texture: Option<Arc<Texture>>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            texture,
        }
    }

    pub fn hash(&self) -> Option<u32> {
        self.texture.as_ref().map(|t| t.hash())
    }
}
