pub use crate::vfile::{VFile, VFileSystem};
