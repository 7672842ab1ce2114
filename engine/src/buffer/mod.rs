mod file;
mod memory;

pub use file::{FileBuffer, FileMode};
pub use memory::MemoryBuffer;

/// Random access byte storage.
///
/// Short reads and writes are not errors: both return the number of bytes actually moved,
/// which is 0 at the end of the data or when the buffer cannot serve the request.
pub trait Buffer {
    fn read(&mut self, dest: &mut [u8]) -> usize;
    fn write(&mut self, src: &[u8]) -> usize;
    /// Moves the cursor to `start + delta`, returning the new offset.
    fn seek(&mut self, start: usize, delta: usize) -> usize;
    fn offset(&self) -> usize;
    fn size(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Remaining bytes between the cursor and the end.
    fn remaining(&self) -> usize {
        self.size().saturating_sub(self.offset())
    }

    /// Reads the whole content from the start, leaving the cursor at the end.
    fn to_bytes(&mut self) -> Vec<u8> {
        let mut data = vec![0; self.size()];
        self.seek(0, 0);
        let read = self.read(&mut data);
        data.truncate(read);
        data
    }
}
