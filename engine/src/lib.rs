pub mod binaries;
pub mod buffer;
pub mod collision;
pub mod error;
pub mod geometry;
pub mod group;
pub mod hash;
pub mod models;
pub mod pak;
pub mod prelude;
pub mod render;
pub mod resources;
pub mod texture;
