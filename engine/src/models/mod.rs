pub mod md2;
pub mod md3;
pub mod model;
pub(crate) mod text;
pub mod vertex;

pub use model::{CoordinateSystem, FramedModel, ModelSettings};
pub use vertex::{
    interpolate, mesh_polygons, Color, DirectionalLight, Mesh, VertexBuffer, VertexFormat,
    VertexFormats,
};

use std::mem;

use crate::{
    binaries::{BinOffset, BinaryData},
    buffer::Buffer,
    error::ParseError,
};

/// Reads `count` records of a section after checking it fits in the buffer.
pub(crate) fn read_section<T: BinaryData + bytemuck::Pod, B: Buffer + ?Sized>(
    buffer: &mut B,
    start: usize,
    offset: BinOffset,
    count: usize,
    section: &'static str,
) -> Result<Box<[T]>, ParseError> {
    if count == 0 {
        return Ok(Box::default());
    }

    let out_of_bounds = || ParseError::OutOfBounds {
        section,
        offset: offset.absolute(start),
        size: buffer.size(),
    };

    let len = count.checked_mul(mem::size_of::<T>()).ok_or_else(out_of_bounds)?;
    if offset.check_bounds(buffer, start, len).is_err() {
        return Err(out_of_bounds());
    }

    Ok(offset.read_array_f(buffer, start, count)?)
}

/// Hashes the bytes from the cursor to the end, then restores the cursor.
pub(crate) fn hash_window<B: Buffer + ?Sized>(buffer: &mut B, seed: u32) -> u32 {
    let start = buffer.offset();

    let mut window = vec![0; buffer.remaining()];
    let read = buffer.read(&mut window);
    buffer.seek(start, 0);

    crate::hash::crc32(&window[..read], seed)
}
