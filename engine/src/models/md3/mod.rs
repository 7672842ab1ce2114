pub mod anim_cfg;
pub mod model;
pub mod parser;
pub mod skin;

pub use anim_cfg::{Md3AnimConfig, Md3AnimRange, Md3Gesture, Md3Sex};
pub use model::Md3Model;
pub use parser::{Md3Bone, Md3Header, Md3Mesh, Md3Parser, Md3Tag, Md3Vertex};
pub use skin::Md3Skin;
