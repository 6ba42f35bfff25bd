//! Graphics device abstraction layer.
//!
//! Resource wrappers are generic over [`GlDevice`], so the same code drives a
//! real context or the recording dummy device.
//!
//! # Available Devices
//!
//! - [`DummyDevice`] (always available): in-memory device for tests and
//!   headless development
//! - `GlowDevice` (`glow-backend` feature): OpenGL 4.5 through `glow`

pub mod dummy;
pub mod error;
#[cfg(feature = "glow-backend")]
pub mod glow_backend;
pub mod traits;
pub mod types;

pub use dummy::{DeviceCall, DummyDevice};
pub use error::{DeviceError, DeviceResult, ErrorCode};
#[cfg(feature = "glow-backend")]
pub use glow_backend::GlowDevice;
pub use traits::{
    BindlessHandle, BufferHandle, DeviceCapabilities, FramebufferHandle, GlDevice, Region2d,
    TextureHandle,
};
pub use types::{gl, BufferUsageHint, FramebufferTarget};
