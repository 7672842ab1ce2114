use crate::{
    binaries::BinaryData,
    buffer::Buffer,
    error::ParseError,
    geometry::Vector3,
};

pub const NORMALS_VERSION: f32 = 1.0;

/// Precomputed normal table addressed by [`Md2Vertex::normal_index`](super::Md2Vertex).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Md2Normals {
    pub normals: Vec<Vector3<f32>>,
}

impl Md2Normals {
    /// Reads `version: f32`, `count: u32` then `count` xyz triplets.
    pub fn read<B: Buffer + ?Sized>(buffer: &mut B) -> Result<Self, ParseError> {
        if buffer.remaining() == 0 {
            return Err(ParseError::Empty);
        }

        let version = f32::read(buffer, None).map_err(|_| ParseError::Truncated("normals"))?;
        if version != NORMALS_VERSION {
            return Err(ParseError::BadVersion {
                found: version as u32,
                expected: NORMALS_VERSION as u32,
            });
        }

        let count = u32::read(buffer, None).map_err(|_| ParseError::Truncated("normals"))?;
        if (count as usize).saturating_mul(12) > buffer.remaining() {
            return Err(ParseError::OutOfBounds {
                section: "normals",
                offset: buffer.offset(),
                size: buffer.size(),
            });
        }

        let raw = <[f32; 3]>::read_array(buffer, count as usize, None)?;

        Ok(Self {
            normals: raw.iter().map(|n| Vector3::from_array(*n)).collect(),
        })
    }

    pub fn get(&self, index: usize) -> Option<Vector3<f32>> {
        self.normals.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.normals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normals.is_empty()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    pub fn normals_file(normals: &[[f32; 3]]) -> Vec<u8> {
        let mut data = 1.0f32.to_le_bytes().to_vec();
        data.extend_from_slice(&(normals.len() as u32).to_le_bytes());
        data.extend_from_slice(bytemuck::cast_slice(normals));
        data
    }
}
