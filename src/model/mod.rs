//! Data structures representing a voxelization scene

mod core;
mod layer;
mod material;
mod scene;
mod slice;

pub use core::{Mesh, Triangle};
pub use layer::{Layer, Transform};
pub use material::{EMPTY, MaterialId, decode_channel};
pub use scene::{Dimensions, Scene};
pub use slice::Slice;
