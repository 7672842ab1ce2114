use std::io;

use crate::{
    binaries::BinaryData,
    buffer::{Buffer, MemoryBuffer},
    error::TextureError,
    texture::Texture,
};

const BMP_SIGNATURE: [u8; 2] = *b"BM";

#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
struct BmpFileHeader {
    signature: [u8; 2],
    file_size: u32,
    reserved: [u16; 2],
    data_offset: u32,
}

/// OS/2 1.x info header.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
struct BmpCoreHeader {
    width: u16,
    height: u16,
    planes: u16,
    bpp: u16,
}

/// Leading fields shared by the Windows V3 and V4 info headers.
#[repr(C, packed)]
#[derive(Copy, Clone, Debug, bytemuck::Zeroable, bytemuck::Pod)]
struct BmpInfoHeader {
    width: i32,
    height: i32,
    planes: u16,
    bpp: u16,
    compression: u32,
}

/// Decodes an uncompressed 24 bit bitmap.
pub fn decode_bmp(name: &str, data: &[u8]) -> Result<Texture, TextureError> {
    let mut buffer = MemoryBuffer::from(data);
    read_bmp(name, &mut buffer)
}

pub fn read_bmp<B: Buffer + ?Sized>(name: &str, buffer: &mut B) -> Result<Texture, TextureError> {
    let start = buffer.offset();

    let file = BmpFileHeader::read(buffer, None).map_err(|_| TextureError::BadSignature)?;
    if file.signature != BMP_SIGNATURE {
        return Err(TextureError::BadSignature);
    }

    let info_size = u32::read(buffer, None)?;
    let (width, height, top_down, bpp, compression) = match info_size {
        12 => {
            let core = BmpCoreHeader::read(buffer, None)?;
            (core.width as u32, core.height as u32, false, core.bpp, 0)
        }
        40 | 108 => {
            let info = BmpInfoHeader::read(buffer, None)?;
            if info.width < 0 {
                return Err(TextureError::UnsupportedFormat(format!(
                    "negative width {}",
                    { info.width }
                )));
            }
            (
                info.width as u32,
                info.height.unsigned_abs(),
                info.height < 0,
                info.bpp,
                info.compression,
            )
        }
        other => {
            return Err(TextureError::UnsupportedFormat(format!(
                "info header of {other} bytes"
            )))
        }
    };

    if bpp != 24 {
        return Err(TextureError::UnsupportedFormat(format!("{bpp} bits per pixel")));
    }
    if compression != 0 {
        return Err(TextureError::UnsupportedFormat(format!(
            "compression {compression}"
        )));
    }

    let row_len = width as usize * 3;
    let padded = (row_len + 3) & !3;

    // pixel rows must be present in full before anything is allocated for them
    let data_start = start.saturating_add(file.data_offset as usize);
    let size = buffer.size();
    let Some(raw_len) = padded
        .checked_mul(height as usize)
        .filter(|&len| data_start <= size && len <= size - data_start)
    else {
        return Err(TextureError::Io(io::ErrorKind::UnexpectedEof.into()));
    };

    buffer.seek(start, file.data_offset as usize);
    let mut raw = vec![0; raw_len];
    if buffer.read(&mut raw) != raw.len() {
        return Err(TextureError::Io(io::ErrorKind::UnexpectedEof.into()));
    }

    let mut pixels = Vec::with_capacity(row_len * height as usize);
    for y in 0..height as usize {
        let src = if top_down { y } else { height as usize - 1 - y };
        let row = &raw[src * padded..src * padded + row_len];

        for bgr in row.chunks_exact(3) {
            pixels.extend_from_slice(&[bgr[2], bgr[1], bgr[0]]);
        }
    }

    log::debug!("bmp {name}: {width}x{height}");

    Ok(Texture::new(name, width, height, pixels))
}
