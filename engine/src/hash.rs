use crc::{Crc, CRC_32_ISO_HDLC};

const CRC32: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

/// Start value used for every model content hash.
pub const MODEL_HASH_SEED: u32 = 0x14F2_DCA4;

/// CRC32 of `data`, continuing from `seed`.
pub fn crc32(data: &[u8], seed: u32) -> u32 {
    let mut digest = CRC32.digest_with_initial(seed);
    digest.update(data);
    digest.finalize()
}

/// Folds a sequence of values into one CRC32, each value continuing from the last result.
#[derive(Copy, Clone, Debug)]
pub struct HashChain(u32);

impl HashChain {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    pub fn bytes(self, data: &[u8]) -> Self {
        Self(crc32(data, self.0))
    }

    pub fn u32(self, value: u32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn f32(self, value: f32) -> Self {
        self.bytes(&value.to_le_bytes())
    }

    pub fn bool(self, value: bool) -> Self {
        self.bytes(&[value as u8])
    }

    pub fn finish(self) -> u32 {
        self.0
    }
}
