use std::{f32::consts::PI, mem};

use fixedstr::zstr;

use crate::{
    binaries::{fixed_name, BinOffset, BinaryData},
    buffer::Buffer,
    error::ParseError,
    geometry::{Matrix16, Vector3},
    hash::MODEL_HASH_SEED,
    models::{hash_window, read_section},
};

pub const MD3_ID: u32 = u32::from_le_bytes(*b"IDP3");
pub const MD3_VERSION: u32 = 15;

/// Scale between stored integer coordinates and model units.
pub const MD3_XYZ_SCALE: f32 = 1.0 / 64.0;

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3Header {
    pub id: u32,
    pub version: u32,
    pub name: [u8; 64],
    pub flags: u32,
    pub frame_count: u32,
    pub tag_count: u32,
    pub mesh_count: u32,
    pub skin_count: u32,
    pub frame_offset: BinOffset,
    pub tag_offset: BinOffset,
    pub mesh_offset: BinOffset,
    pub file_size: u32,
}

/// Per frame bounds.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3Bone {
    pub min: [f32; 3],
    pub max: [f32; 3],
    pub position: [f32; 3],
    pub scale: f32,
    pub creator: [u8; 16],
}

/// Named attachment point, one per tag per frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3Tag {
    pub name: [u8; 64],
    pub position: [f32; 3],
    pub rotation: [[f32; 3]; 3],
}

impl Md3Tag {
    pub fn name(&self) -> zstr<64> {
        fixed_name(&self.name)
    }

    pub fn position(&self) -> Vector3<f32> {
        Vector3::from_array(self.position)
    }

    /// Rotation as a 4x4 matrix with rows copied from the file.
    pub fn rotation_matrix(&self) -> Matrix16<f32> {
        let r = &self.rotation;
        Matrix16::from_table([
            [r[0][0], r[0][1], r[0][2], 0.0],
            [r[1][0], r[1][1], r[1][2], 0.0],
            [r[2][0], r[2][1], r[2][2], 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3MeshHeader {
    pub id: u32,
    pub name: [u8; 64],
    pub flags: u32,
    pub frame_count: u32,
    pub skin_count: u32,
    pub vertex_count: u32,
    pub face_count: u32,
    pub face_offset: BinOffset,
    pub skin_offset: BinOffset,
    pub tex_coord_offset: BinOffset,
    pub vertex_offset: BinOffset,
    pub mesh_size: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3MeshSkin {
    pub name: [u8; 64],
    pub shader_index: u32,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3Face {
    pub indices: [u32; 3],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3TexCoord {
    pub uv: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md3Vertex {
    pub position: [i16; 3],
    /// Latitude then longitude, 256 steps per turn.
    pub normal: [u8; 2],
}

impl Md3Vertex {
    pub fn decompress(&self) -> [f32; 3] {
        self.position.map(|c| c as f32 * MD3_XYZ_SCALE)
    }

    pub fn decompress_normal(&self) -> [f32; 3] {
        let ratio = PI / 128.0;
        let lat = self.normal[0] as f32 * ratio;
        let lng = self.normal[1] as f32 * ratio;

        [lat.cos() * lng.sin(), lat.sin() * lng.sin(), lng.cos()]
    }
}

#[derive(Clone, Debug)]
pub struct Md3Mesh {
    pub header: Md3MeshHeader,
    pub skins: Box<[Md3MeshSkin]>,
    pub faces: Box<[Md3Face]>,
    pub tex_coords: Box<[Md3TexCoord]>,
    /// `frame_count * vertex_count` vertices, frame major.
    pub vertices: Box<[Md3Vertex]>,
}

impl Md3Mesh {
    pub fn name(&self) -> zstr<64> {
        fixed_name(&self.header.name)
    }

    fn read<B: Buffer + ?Sized>(buffer: &mut B, start: usize) -> Result<Self, ParseError> {
        let header: Box<[Md3MeshHeader]> =
            read_section(buffer, start, BinOffset::new(0), 1, "mesh header")?;
        let header = header[0];

        if header.id != MD3_ID {
            return Err(ParseError::BadMagic {
                found: header.id,
                expected: MD3_ID,
            });
        }

        let skins = read_section(
            buffer,
            start,
            header.skin_offset,
            header.skin_count as usize,
            "mesh skins",
        )?;
        let faces = read_section(
            buffer,
            start,
            header.face_offset,
            header.face_count as usize,
            "mesh faces",
        )?;
        let tex_coords = read_section(
            buffer,
            start,
            header.tex_coord_offset,
            header.vertex_count as usize,
            "mesh tex coords",
        )?;
        let vertices = read_section(
            buffer,
            start,
            header.vertex_offset,
            (header.frame_count as usize).saturating_mul(header.vertex_count as usize),
            "mesh vertices",
        )?;

        Ok(Self {
            header,
            skins,
            faces,
            tex_coords,
            vertices,
        })
    }
}

/// Decoded Quake III model.
#[derive(Clone, Debug)]
pub struct Md3Parser {
    pub header: Md3Header,
    pub bones: Box<[Md3Bone]>,
    /// Indexed `frame * tag_count + tag`.
    pub tags: Box<[Md3Tag]>,
    pub meshes: Vec<Md3Mesh>,
    hash: u32,
}

impl Md3Parser {
    pub fn read<B: Buffer + ?Sized>(buffer: &mut B) -> Result<Self, ParseError> {
        if buffer.remaining() == 0 {
            return Err(ParseError::Empty);
        }

        let start = buffer.offset();
        let hash = hash_window(buffer, MODEL_HASH_SEED);

        let header =
            Md3Header::read(buffer, None).map_err(|_| ParseError::Truncated("md3 header"))?;

        if header.id != MD3_ID {
            return Err(ParseError::BadMagic {
                found: header.id,
                expected: MD3_ID,
            });
        }
        if header.version != MD3_VERSION {
            return Err(ParseError::BadVersion {
                found: header.version,
                expected: MD3_VERSION,
            });
        }

        let bones = read_section(
            buffer,
            start,
            header.frame_offset,
            header.frame_count as usize,
            "frames",
        )?;
        let tags = read_section(
            buffer,
            start,
            header.tag_offset,
            (header.frame_count as usize).saturating_mul(header.tag_count as usize),
            "tags",
        )?;

        let mesh_header_size = mem::size_of::<Md3MeshHeader>();
        let meshes_len = (header.mesh_count as usize).checked_mul(mesh_header_size);
        if meshes_len.map_or(true, |len| header.mesh_offset.check_bounds(buffer, start, len).is_err()) {
            return Err(ParseError::OutOfBounds {
                section: "meshes",
                offset: header.mesh_offset.absolute(start),
                size: buffer.size(),
            });
        }

        let mut meshes = Vec::with_capacity(header.mesh_count as usize);
        let mut mesh_start = header.mesh_offset.absolute(start);
        for _ in 0..header.mesh_count {
            let mesh = Md3Mesh::read(buffer, mesh_start)?;

            // each mesh owns at least its header, so blocks never overlap
            if (mesh.header.mesh_size as usize) < mesh_header_size {
                return Err(ParseError::OutOfBounds {
                    section: "meshes",
                    offset: mesh_start,
                    size: buffer.size(),
                });
            }
            mesh_start = mesh_start.saturating_add(mesh.header.mesh_size as usize);
            meshes.push(mesh);
        }

        log::debug!(
            "md3 {:?}: {} frames, {} tags, {} meshes",
            fixed_name::<64>(&header.name).to_str(),
            bones.len(),
            header.tag_count,
            meshes.len()
        );

        Ok(Self {
            header,
            bones,
            tags,
            meshes,
            hash,
        })
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn name(&self) -> zstr<64> {
        fixed_name(&self.header.name)
    }

    pub fn tag_count(&self) -> usize {
        self.header.tag_count as usize
    }

    pub fn frame_count(&self) -> usize {
        self.header.frame_count as usize
    }

    pub fn tag(&self, frame: usize, index: usize) -> Option<&Md3Tag> {
        if index >= self.tag_count() {
            return None;
        }
        self.tags.get(frame * self.tag_count() + index)
    }
}
