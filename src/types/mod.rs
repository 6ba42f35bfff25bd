//! Host-side descriptions of device resources.
//!
//! This module contains format enums, parameter names and the layout
//! struct that textures mirror in host memory.

mod texture;

pub use texture::{
    full_mip_chain_levels, texel_size, upload_size, InternalFormat, MipmapGeneration,
    PixelFormat, PixelType, TextureFilter, TextureLayout, TextureParameter, TextureWrap,
    DEFAULT_UNPACK_ALIGNMENT,
};
