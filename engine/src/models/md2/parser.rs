use fixedstr::zstr;

use crate::{
    binaries::{fixed_name, BinOffset, BinaryData},
    buffer::Buffer,
    error::ParseError,
    hash::MODEL_HASH_SEED,
    models::{hash_window, read_section},
};

pub const MD2_ID: u32 = u32::from_le_bytes(*b"IDP2");
pub const MD2_VERSION: u32 = 8;

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md2Header {
    pub id: u32,
    pub version: u32,
    pub skin_width: u32,
    pub skin_height: u32,
    pub frame_size: u32,
    pub skin_count: u32,
    pub vertex_count: u32,
    pub tex_coord_count: u32,
    pub polygon_count: u32,
    pub gl_cmd_count: u32,
    pub frame_count: u32,
    pub skin_offset: BinOffset,
    pub tex_coord_offset: BinOffset,
    pub polygon_offset: BinOffset,
    pub frame_offset: BinOffset,
    pub gl_cmd_offset: BinOffset,
    pub end_offset: BinOffset,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md2Skin {
    name: [u8; 64],
}

impl Md2Skin {
    pub fn name(&self) -> zstr<64> {
        fixed_name(&self.name)
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md2TexCoord {
    pub u: i16,
    pub v: i16,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md2Polygon {
    pub vertex_indices: [u16; 3],
    pub tex_coord_indices: [u16; 3],
}

/// Quantized position, scaled and translated by the owning frame.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct Md2Vertex {
    pub position: [u8; 3],
    pub normal_index: u8,
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
struct Md2FrameHeader {
    scale: [f32; 3],
    translate: [f32; 3],
    name: [u8; 16],
}

#[derive(Clone, Debug)]
pub struct Md2Frame {
    pub scale: [f32; 3],
    pub translate: [f32; 3],
    pub name: zstr<16>,
    pub vertices: Box<[Md2Vertex]>,
}

impl Md2Frame {
    /// `raw * scale + translate` for one vertex slot.
    pub fn decompress(&self, vertex: &Md2Vertex) -> [f32; 3] {
        [0, 1, 2].map(|i| vertex.position[i] as f32 * self.scale[i] + self.translate[i])
    }
}

/// Decoded Quake II model.
#[derive(Clone, Debug)]
pub struct Md2Parser {
    pub header: Md2Header,
    pub skins: Box<[Md2Skin]>,
    pub tex_coords: Box<[Md2TexCoord]>,
    pub polygons: Box<[Md2Polygon]>,
    pub frames: Vec<Md2Frame>,
    pub gl_cmds: Box<[i32]>,
    hash: u32,
}

impl Md2Parser {
    /// Decodes a model starting at the buffer cursor.
    pub fn read<B: Buffer + ?Sized>(buffer: &mut B) -> Result<Self, ParseError> {
        if buffer.remaining() == 0 {
            return Err(ParseError::Empty);
        }

        let start = buffer.offset();
        let hash = hash_window(buffer, MODEL_HASH_SEED);

        let header =
            Md2Header::read(buffer, None).map_err(|_| ParseError::Truncated("md2 header"))?;

        if header.id != MD2_ID {
            return Err(ParseError::BadMagic {
                found: header.id,
                expected: MD2_ID,
            });
        }
        if header.version != MD2_VERSION {
            return Err(ParseError::BadVersion {
                found: header.version,
                expected: MD2_VERSION,
            });
        }

        let skins = read_section(
            buffer,
            start,
            header.skin_offset,
            header.skin_count as usize,
            "skins",
        )?;
        let tex_coords = read_section(
            buffer,
            start,
            header.tex_coord_offset,
            header.tex_coord_count as usize,
            "tex coords",
        )?;
        let polygons = read_section(
            buffer,
            start,
            header.polygon_offset,
            header.polygon_count as usize,
            "polygons",
        )?;
        let gl_cmds = read_section(
            buffer,
            start,
            header.gl_cmd_offset,
            header.gl_cmd_count as usize,
            "gl commands",
        )?;

        // frames may not overlap, so the whole block has to fit before anything is reserved
        let min_frame_size = (header.vertex_count as usize)
            .checked_mul(std::mem::size_of::<Md2Vertex>())
            .and_then(|len| len.checked_add(std::mem::size_of::<Md2FrameHeader>()));
        let frames_len = (header.frame_count as usize).checked_mul(header.frame_size as usize);
        let frames_fit = match (min_frame_size, frames_len) {
            (Some(min), Some(len)) => {
                header.frame_count == 0
                    || (header.frame_size as usize >= min
                        && header.frame_offset.check_bounds(buffer, start, len).is_ok())
            }
            _ => false,
        };
        if !frames_fit {
            return Err(ParseError::OutOfBounds {
                section: "frames",
                offset: header.frame_offset.absolute(start),
                size: buffer.size(),
            });
        }

        let mut frames = Vec::with_capacity(header.frame_count as usize);
        for i in 0..header.frame_count {
            let offset = BinOffset::new(
                header
                    .frame_offset
                    .index
                    .saturating_add(i.saturating_mul(header.frame_size)),
            );

            let raw: Box<[Md2FrameHeader]> = read_section(buffer, start, offset, 1, "frames")?;
            let vertex_offset =
                BinOffset::new(offset.index.saturating_add(std::mem::size_of::<Md2FrameHeader>() as u32));
            let vertices = read_section(
                buffer,
                start,
                vertex_offset,
                header.vertex_count as usize,
                "frame vertices",
            )?;

            frames.push(Md2Frame {
                scale: raw[0].scale,
                translate: raw[0].translate,
                name: fixed_name(&raw[0].name),
                vertices,
            });
        }

        log::debug!(
            "md2: {} frames, {} polygons, {} vertices",
            frames.len(),
            polygons.len(),
            header.vertex_count
        );

        Ok(Self {
            header,
            skins,
            tex_coords,
            polygons,
            frames,
            gl_cmds,
            hash,
        })
    }

    pub fn hash(&self) -> u32 {
        self.hash
    }

    pub fn skin_size(&self) -> (u32, u32) {
        (self.header.skin_width, self.header.skin_height)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Two frame model with one textured triangle. Frame 1 is frame 0 shifted by +2 on x.
    pub fn triangle_md2(version: u32) -> Vec<u8> {
        let header_size = std::mem::size_of::<Md2Header>() as u32;
        let frame_size = (std::mem::size_of::<Md2FrameHeader>() + 3 * 4) as u32;

        let skin_offset = header_size;
        let tex_coord_offset = skin_offset + 64;
        let polygon_offset = tex_coord_offset + 3 * 4;
        let frame_offset = polygon_offset + 12;
        let end = frame_offset + 2 * frame_size;

        let header = Md2Header {
            id: MD2_ID,
            version,
            skin_width: 64,
            skin_height: 32,
            frame_size,
            skin_count: 1,
            vertex_count: 3,
            tex_coord_count: 3,
            polygon_count: 1,
            gl_cmd_count: 0,
            frame_count: 2,
            skin_offset: BinOffset::new(skin_offset),
            tex_coord_offset: BinOffset::new(tex_coord_offset),
            polygon_offset: BinOffset::new(polygon_offset),
            frame_offset: BinOffset::new(frame_offset),
            gl_cmd_offset: BinOffset::new(end),
            end_offset: BinOffset::new(end),
        };

        let mut data = bytemuck::bytes_of(&header).to_vec();

        let mut skin = Md2Skin { name: [0; 64] };
        skin.name[..9].copy_from_slice(b"skin.pcx\0");
        data.extend_from_slice(bytemuck::bytes_of(&skin));

        for tc in [
            Md2TexCoord { u: 0, v: 0 },
            Md2TexCoord { u: 64, v: 0 },
            Md2TexCoord { u: 0, v: 32 },
        ] {
            data.extend_from_slice(bytemuck::bytes_of(&tc));
        }

        data.extend_from_slice(bytemuck::bytes_of(&Md2Polygon {
            vertex_indices: [0, 1, 2],
            tex_coord_indices: [0, 1, 2],
        }));

        for (i, name) in [b"stand01", b"stand02"].iter().enumerate() {
            let mut frame = Md2FrameHeader {
                scale: [1.0, 1.0, 1.0],
                translate: [i as f32 * 2.0, 0.0, 0.0],
                name: [0; 16],
            };
            frame.name[..7].copy_from_slice(&name[..]);
            data.extend_from_slice(bytemuck::bytes_of(&frame));

            for vertex in [
                Md2Vertex { position: [0, 0, 0], normal_index: 0 },
                Md2Vertex { position: [1, 0, 0], normal_index: 0 },
                Md2Vertex { position: [0, 1, 0], normal_index: 0 },
            ] {
                data.extend_from_slice(bytemuck::bytes_of(&vertex));
            }
        }

        data
    }
}

#[cfg(test)]
mod parser_tests {
    use super::{fixtures::triangle_md2, *};
    use crate::buffer::MemoryBuffer;

    #[test]
    fn test_header_layout() {
        assert_eq!(std::mem::size_of::<Md2Header>(), 68);
        assert_eq!(std::mem::size_of::<Md2FrameHeader>(), 40);
        assert_eq!(std::mem::size_of::<Md2Polygon>(), 12);
    }

    #[test]
    fn test_read_triangle() {
        let mut buffer = MemoryBuffer::from(triangle_md2(MD2_VERSION));
        let md2 = Md2Parser::read(&mut buffer).unwrap();

        assert_eq!(md2.skins[0].name().to_str(), "skin.pcx");
        assert_eq!(md2.frames.len(), 2);
        assert_eq!(md2.frames[1].name.to_str(), "stand02");
        assert_eq!(md2.tex_coords[1], Md2TexCoord { u: 64, v: 0 });
        assert_eq!(md2.polygons[0].vertex_indices, [0, 1, 2]);
        assert_eq!(md2.skin_size(), (64, 32));

        let frame = &md2.frames[1];
        assert_eq!(frame.decompress(&frame.vertices[1]), [3.0, 0.0, 0.0]);
    }

    #[test]
    fn test_hash_follows_content() {
        let data = triangle_md2(MD2_VERSION);
        let a = Md2Parser::read(&mut MemoryBuffer::from(data.clone())).unwrap();
        let b = Md2Parser::read(&mut MemoryBuffer::from(data.clone())).unwrap();
        assert_eq!(a.hash(), b.hash());

        let mut changed = data;
        let last = changed.len() - 2;
        changed[last] ^= 1;
        let c = Md2Parser::read(&mut MemoryBuffer::from(changed)).unwrap();
        assert_ne!(a.hash(), c.hash());
    }

    #[test]
    fn test_rejects_bad_header() {
        let err = Md2Parser::read(&mut MemoryBuffer::from(triangle_md2(7))).unwrap_err();
        assert!(matches!(err, ParseError::BadVersion { found: 7, expected: 8 }));

        let mut data = triangle_md2(MD2_VERSION);
        data[0] = b'X';
        let err = Md2Parser::read(&mut MemoryBuffer::from(data)).unwrap_err();
        assert!(matches!(err, ParseError::BadMagic { .. }));

        let err = Md2Parser::read(&mut MemoryBuffer::from(Vec::new())).unwrap_err();
        assert!(matches!(err, ParseError::Empty));

        let err = Md2Parser::read(&mut MemoryBuffer::from(vec![0; 10])).unwrap_err();
        assert!(matches!(err, ParseError::Truncated(_)));
    }

    #[test]
    fn test_truncated_section() {
        let mut data = triangle_md2(MD2_VERSION);
        data.truncate(data.len() - 4);

        let err = Md2Parser::read(&mut MemoryBuffer::from(data)).unwrap_err();
        assert!(matches!(
            err,
            ParseError::OutOfBounds {
                section: "frames",
                ..
            }
        ));
    }

    fn patch_header(data: &mut [u8], patch: impl FnOnce(&mut Md2Header)) {
        let size = std::mem::size_of::<Md2Header>();
        let mut header: Md2Header = bytemuck::pod_read_unaligned(&data[..size]);
        patch(&mut header);
        data[..size].copy_from_slice(bytemuck::bytes_of(&header));
    }

    #[test]
    fn test_hostile_frame_count() {
        let mut data = triangle_md2(MD2_VERSION);
        patch_header(&mut data, |h| h.frame_count = u32::MAX);
        assert!(matches!(
            Md2Parser::read(&mut MemoryBuffer::from(data)),
            Err(ParseError::OutOfBounds { section: "frames", .. })
        ));

        // overlapping frames would let a tiny file claim any number of them
        let mut data = triangle_md2(MD2_VERSION);
        patch_header(&mut data, |h| {
            h.frame_count = u32::MAX;
            h.frame_size = 0;
        });
        assert!(matches!(
            Md2Parser::read(&mut MemoryBuffer::from(data)),
            Err(ParseError::OutOfBounds { section: "frames", .. })
        ));
    }

    #[test]
    fn test_clone_is_deep() {
        let md2 = Md2Parser::read(&mut MemoryBuffer::from(triangle_md2(MD2_VERSION))).unwrap();
        let mut copy = md2.clone();
        copy.frames[0].vertices[0].position = [9, 9, 9];

        assert_eq!(md2.frames[0].vertices[0].position, [0, 0, 0]);
    }
}
