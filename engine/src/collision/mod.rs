pub mod aabb_tree;

pub use aabb_tree::{AabbNode, AabbTree};
