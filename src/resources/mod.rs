//! Owned device resources.
//!
//! Each wrapper owns exactly one device object, releases it on drop and
//! keeps a host-side copy of its configuration.

mod storage_buffer;
mod texture;

pub use storage_buffer::{BufferMapping, StorageBuffer};
pub use texture::Texture2D;
