pub use crate::collision::AabbTree;
pub use crate::error::{ConfigError, LoadError, MeshError, ParseError, TextureError};
pub use crate::geometry::{BoundingBox, Matrix16, Quaternion, Ray, Vector3};
pub use crate::group::{
    GroupCallbacks, GroupConfig, GroupState, GroupTransform, MatrixCombination, Md2Group, Md2Info,
    Md3Group, Md3Info, ModelKind, NoCallbacks,
};
pub use crate::models::md2::{Md2Config, Md2Model};
pub use crate::models::md3::{Md3Gesture, Md3Model};
pub use crate::models::{Color, DirectionalLight, FramedModel, Mesh, ModelSettings, VertexFormat};
pub use crate::pak::{load_pk3, read_pk3};
pub use crate::render::Renderer;
pub use crate::resources::Resources;
pub use crate::texture::{ModelTexture, Texture};
