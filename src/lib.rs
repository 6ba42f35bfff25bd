//! # GL Resources
//!
//! Owned wrappers for OpenGL 4.5 textures and shader storage buffers.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Texture2D`] - 2D texture with mip chain management, reload and
//!   framebuffer-mediated copy
//! - [`StorageBuffer`] - Shader storage buffer with scoped read mapping
//! - [`GlDevice`] - Trait the wrappers drive; implemented by [`DummyDevice`]
//!   for tests and by `GlowDevice` for a real context
//!
//! Every wrapper owns exactly one device object and releases it on drop.
//! All calls must happen on the thread that owns the active context.
//!
//! ## Example
//!
//! ```ignore
//! use std::rc::Rc;
//! use gl_resources::{GlowDevice, MipmapGeneration, StorageBuffer, Texture2D, TextureLayout};
//!
//! let device = Rc::new(unsafe { GlowDevice::from_loader_function(|s| window.get_proc_address(s)) });
//! let texture = Texture2D::new(device.clone(), "albedo", &layout, Some(&pixels[..]), MipmapGeneration::FullChain)?;
//! let mut particles = StorageBuffer::from_slice(device, &positions)?;
//! particles.bind(0);
//! ```

pub mod backend;
pub mod error;
pub mod resources;
pub mod types;

// Re-export main types for convenience
#[cfg(feature = "glow-backend")]
pub use backend::GlowDevice;
pub use backend::{
    BindlessHandle, BufferHandle, DeviceCapabilities, DeviceError, DummyDevice, ErrorCode,
    FramebufferHandle, GlDevice, TextureHandle,
};
pub use error::{ResourceError, ResourceResult};
pub use resources::{BufferMapping, StorageBuffer, Texture2D};
pub use types::{
    InternalFormat, MipmapGeneration, PixelFormat, PixelType, TextureFilter, TextureLayout,
    TextureParameter, TextureWrap,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library.
///
/// Only logs the version; resources can be created without calling it.
pub fn init() {
    log::info!("GL Resources v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_dummy_device() {
        let device = DummyDevice::new();
        assert_eq!(device.name(), "Dummy Device");
    }
}
