pub mod cfg;
pub mod model;
pub mod normals;
pub mod parser;

pub use cfg::{Md2Animation, Md2Config};
pub use model::Md2Model;
pub use normals::Md2Normals;
pub use parser::{Md2Frame, Md2Header, Md2Parser, Md2Polygon, Md2TexCoord, Md2Vertex};
