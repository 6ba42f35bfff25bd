//! Device abstraction trait and handle types.
//!
//! The resource wrappers talk to the graphics device only through
//! [`GlDevice`]. Every call that can change device state returns a
//! [`DeviceResult`]; implementations check the sticky error flag right after
//! the native call so failures are attributed to the call that raised them.

use std::num::NonZeroU32;
use std::ptr::NonNull;

use super::error::{DeviceResult, ErrorCode};
use super::types::{BufferUsageHint, FramebufferTarget};

/// Handle to a device texture object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureHandle(pub(crate) NonZeroU32);

/// Handle to a device buffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferHandle(pub(crate) NonZeroU32);

/// Handle to a device framebuffer object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FramebufferHandle(pub(crate) NonZeroU32);

impl TextureHandle {
    /// Wrap a raw object name. Returns `None` for the reserved name 0.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw object name.
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl BufferHandle {
    /// Wrap a raw object name. Returns `None` for the reserved name 0.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw object name.
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

impl FramebufferHandle {
    /// Wrap a raw object name. Returns `None` for the default framebuffer.
    pub fn from_raw(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(Self)
    }

    /// Raw object name.
    pub fn raw(self) -> u32 {
        self.0.get()
    }
}

/// Residency-free (bindless) texture handle, usable directly from shaders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BindlessHandle(pub u64);

/// Rectangle of texels in a texture level or framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Region2d {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region2d {
    /// Region covering `width` x `height` texels from the origin.
    pub fn from_extent(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// Limits and optional features of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceCapabilities {
    /// Maximum texture width or height.
    pub max_texture_dimension: u32,
    /// Maximum buffer size in bytes.
    pub max_buffer_size: u64,
    /// Whether bindless texture handles can be queried.
    pub bindless_textures: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            max_texture_dimension: 16384,
            max_buffer_size: i32::MAX as u64,
            bindless_textures: false,
        }
    }
}

/// A graphics device with an active context on the calling thread.
///
/// Binding calls never report failures; errors they raise stay in the
/// sticky flag and surface from the next checked call or [`poll_error`].
/// Deletes are infallible so they can run from `Drop`. Texture calls that
/// take a handle leave the 2D texture binding as they found it.
///
/// # Safety
///
/// Implementors must guarantee that a pointer returned by
/// [`map_buffer_read_only`] is valid for reads of `size` bytes until the
/// matching [`unmap_buffer`] call, as long as the buffer is not reallocated
/// or deleted in between.
///
/// [`poll_error`]: GlDevice::poll_error
/// [`map_buffer_read_only`]: GlDevice::map_buffer_read_only
/// [`unmap_buffer`]: GlDevice::unmap_buffer
pub unsafe trait GlDevice {
    /// Human readable device name.
    fn name(&self) -> &str;

    /// Limits and optional features.
    fn capabilities(&self) -> DeviceCapabilities;

    /// Read and clear the sticky error flag.
    fn poll_error(&self) -> ErrorCode;

    // Textures

    /// Create a new 2D texture object without storage.
    fn create_texture_2d(&self) -> DeviceResult<TextureHandle>;

    /// Release a texture object.
    fn delete_texture(&self, texture: TextureHandle);

    /// Set an integer-valued texture parameter.
    fn texture_parameter_i32(&self, texture: TextureHandle, name: u32, value: i32)
        -> DeviceResult<()>;

    /// Set a float-valued texture parameter.
    fn texture_parameter_f32(&self, texture: TextureHandle, name: u32, value: f32)
        -> DeviceResult<()>;

    /// Allocate immutable storage for `levels` mip levels.
    fn texture_storage_2d(
        &self,
        texture: TextureHandle,
        levels: u32,
        internal_format: u32,
        width: u32,
        height: u32,
    ) -> DeviceResult<()>;

    /// Upload pixel data into a region of one level.
    ///
    /// Rows in `data` start on 4-byte boundaries with no row padding beyond
    /// that, whatever unpack state the context was left in.
    fn texture_sub_image_2d(
        &self,
        texture: TextureHandle,
        level: u32,
        region: Region2d,
        format: u32,
        ty: u32,
        data: &[u8],
    ) -> DeviceResult<()>;

    /// Regenerate every mip level from level 0.
    fn generate_mipmap(&self, texture: TextureHandle) -> DeviceResult<()>;

    /// Fill one level with a single texel value, or zeros if `data` is `None`.
    fn clear_texture_image(
        &self,
        texture: TextureHandle,
        level: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) -> DeviceResult<()>;

    /// Bind a texture to the 2D target of the active unit; `None` unbinds.
    fn bind_texture(&self, texture: Option<TextureHandle>);

    /// Query the bindless handle of a texture, if the device supports it.
    fn texture_bindless_handle(&self, texture: TextureHandle) -> Option<BindlessHandle>;

    // Framebuffers

    /// Create a new framebuffer object.
    fn create_framebuffer(&self) -> DeviceResult<FramebufferHandle>;

    /// Release a framebuffer object.
    fn delete_framebuffer(&self, framebuffer: FramebufferHandle);

    /// Bind a framebuffer; `None` binds the default framebuffer.
    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>);

    /// Framebuffer currently bound to `target`; `None` is the default framebuffer.
    fn framebuffer_binding(&self, target: FramebufferTarget) -> Option<FramebufferHandle>;

    /// Attach a texture level to the framebuffer bound at `target`.
    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        attachment: u32,
        texture: Option<TextureHandle>,
        level: u32,
    ) -> DeviceResult<()>;

    /// Copy a region of the read framebuffer into the bound 2D texture.
    fn copy_texture_sub_image_2d(&self, level: u32, region: Region2d) -> DeviceResult<()>;

    // Buffers

    /// Create a new buffer object without storage.
    fn create_buffer(&self) -> DeviceResult<BufferHandle>;

    /// Release a buffer object.
    fn delete_buffer(&self, buffer: BufferHandle);

    /// Bind a buffer to an indexed shader storage slot; `None` unbinds.
    ///
    /// Also sets the generic shader storage binding, which is the target of
    /// [`buffer_data`](GlDevice::buffer_data).
    fn bind_buffer_base(&self, index: u32, buffer: Option<BufferHandle>);

    /// (Re)allocate storage for the buffer at the generic shader storage binding.
    ///
    /// `data`, if present, is copied to the start of the new storage.
    fn buffer_data(&self, size: usize, data: Option<&[u8]>, usage: BufferUsageHint)
        -> DeviceResult<()>;

    /// Map a buffer for host reads. Returns `None` if no mapping can be produced.
    fn map_buffer_read_only(&self, buffer: BufferHandle, size: usize) -> Option<NonNull<u8>>;

    /// Release a mapping obtained from [`map_buffer_read_only`](GlDevice::map_buffer_read_only).
    fn unmap_buffer(&self, buffer: BufferHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_not_a_handle() {
        assert!(TextureHandle::from_raw(0).is_none());
        assert!(BufferHandle::from_raw(0).is_none());
        assert!(FramebufferHandle::from_raw(0).is_none());
        assert_eq!(TextureHandle::from_raw(7).map(TextureHandle::raw), Some(7));
    }

    #[test]
    fn test_region_from_extent() {
        let region = Region2d::from_extent(64, 32);
        assert_eq!((region.x, region.y, region.width, region.height), (0, 0, 64, 32));
    }
}
