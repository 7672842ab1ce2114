use super::Buffer;

#[derive(Default, Clone, Debug)]
pub struct MemoryBuffer {
    data: Vec<u8>,
    offset: usize,
}

impl MemoryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    pub fn clear(&mut self) {
        self.data.clear();
        self.offset = 0;
    }
}

impl From<Vec<u8>> for MemoryBuffer {
    fn from(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }
}

impl From<&[u8]> for MemoryBuffer {
    fn from(data: &[u8]) -> Self {
        Self::from(data.to_vec())
    }
}

impl Buffer for MemoryBuffer {
    fn read(&mut self, dest: &mut [u8]) -> usize {
        if dest.is_empty() || self.offset >= self.data.len() {
            return 0;
        }

        let end = (self.offset + dest.len()).min(self.data.len());
        let length = end - self.offset;

        dest[..length].copy_from_slice(&self.data[self.offset..end]);
        self.offset = end;

        length
    }

    fn write(&mut self, src: &[u8]) -> usize {
        if src.is_empty() {
            return 0;
        }

        let end = self.offset + src.len();

        if end > self.data.len() {
            self.data.resize(end, 0);
        }

        self.data[self.offset..end].copy_from_slice(src);
        self.offset = end;

        src.len()
    }

    fn seek(&mut self, start: usize, delta: usize) -> usize {
        self.offset = start + delta;

        if self.offset > self.data.len() {
            self.data.resize(self.offset, 0);
        }

        self.offset
    }

    fn offset(&self) -> usize {
        self.offset
    }

    fn size(&self) -> usize {
        self.data.len()
    }
}
