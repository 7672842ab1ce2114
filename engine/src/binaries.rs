use std::{io, mem};

use fixedstr::zstr;

use crate::buffer::Buffer;

pub trait BinaryData: Sized {
    fn read<B: Buffer + ?Sized>(buffer: &mut B, max_size: Option<usize>) -> io::Result<Self>;

    fn read_array<B: Buffer + ?Sized>(
        buffer: &mut B,
        count: usize,
        max_size: Option<usize>,
    ) -> io::Result<Box<[Self]>> {
        (0..count).map(|_| Self::read(buffer, max_size)).collect()
    }
}

impl<T: bytemuck::Pod> BinaryData for T {
    fn read<B: Buffer + ?Sized>(buffer: &mut B, _max_size: Option<usize>) -> io::Result<Self> {
        let mut value = T::zeroed();

        let bytes = bytemuck::bytes_of_mut(&mut value);
        if buffer.read(bytes) != bytes.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        Ok(value)
    }

    fn read_array<B: Buffer + ?Sized>(
        buffer: &mut B,
        count: usize,
        _max_size: Option<usize>,
    ) -> io::Result<Box<[Self]>> {
        let mut values: Box<[T]> = bytemuck::zeroed_slice_box(count);

        let bytes: &mut [u8] = bytemuck::cast_slice_mut(&mut values[..]);
        if buffer.read(bytes) != bytes.len() {
            return Err(io::ErrorKind::UnexpectedEof.into());
        }

        Ok(values)
    }
}

/// Byte offset of a section, relative to the start of the block that declares it.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Zeroable, bytemuck::Pod)]
pub struct BinOffset {
    pub index: u32,
}

impl BinOffset {
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// Absolute position of this offset inside a block starting at `start`.
    pub fn absolute(&self, start: usize) -> usize {
        start + self.index as usize
    }

    /// Checks that `len` bytes starting at this offset lie inside the buffer.
    pub fn check_bounds<B: Buffer + ?Sized>(
        &self,
        buffer: &B,
        start: usize,
        len: usize,
    ) -> io::Result<()> {
        let end = self.absolute(start).checked_add(len);

        match end {
            Some(end) if end <= buffer.size() => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "0x{:X}+{len} exceeds buffer of {} bytes",
                    self.absolute(start),
                    buffer.size()
                ),
            )),
        }
    }

    pub fn seek_start<B: Buffer + ?Sized>(&self, buffer: &mut B, start: usize) -> io::Result<()> {
        self.check_bounds(buffer, start, 0)?;
        buffer.seek(start, self.index as usize);
        Ok(())
    }

    /// Seeks to this offset and reads `count` consecutive records.
    pub fn read_array_f<T: BinaryData + bytemuck::Pod, B: Buffer + ?Sized>(
        &self,
        buffer: &mut B,
        start: usize,
        count: usize,
    ) -> io::Result<Box<[T]>> {
        self.check_bounds(buffer, start, count * mem::size_of::<T>())?;
        buffer.seek(start, self.index as usize);

        T::read_array(buffer, count, None)
    }
}

/// Converts a null padded on-disk name into a fixed string.
pub fn fixed_name<const N: usize>(raw: &[u8]) -> zstr<N> {
    let end = raw.iter().position(|&c| c == 0).unwrap_or(raw.len());

    zstr::from(String::from_utf8_lossy(&raw[..end]).as_ref())
}
