//! 2D texture resource.

use std::rc::Rc;

use crate::backend::{
    gl, BindlessHandle, DeviceError, DummyDevice, FramebufferHandle, FramebufferTarget,
    GlDevice, Region2d, TextureHandle,
};
use crate::error::{ResourceError, ResourceResult};
use crate::types::{
    full_mip_chain_levels, InternalFormat, MipmapGeneration, PixelFormat, PixelType,
    TextureLayout,
};

/// A 2D texture owning one device texture object.
///
/// The texture mirrors its extent, formats and level count in host memory.
/// It is not `Clone`, and because the context is bound to one thread it is
/// neither `Send` nor `Sync`. Wrap it in an `Rc` for shared access.
///
/// Construction requires an active context on the calling thread.
///
/// # Example
///
/// ```ignore
/// let layout = TextureLayout::new(InternalFormat::Rgba8, 256, 256, PixelFormat::Rgba, PixelType::UnsignedByte)
///     .with_filter(TextureFilter::LinearMipmapLinear, TextureFilter::Linear);
/// let texture = Texture2D::new(device.clone(), "albedo", &layout, Some(&pixels[..]), MipmapGeneration::FullChain)?;
/// assert_eq!(texture.levels(), 9);
/// ```
pub struct Texture2D<D: GlDevice> {
    device: Rc<D>,
    label: String,
    handle: Option<TextureHandle>,
    internal_format: InternalFormat,
    format: PixelFormat,
    pixel_type: PixelType,
    width: u32,
    height: u32,
    levels: u32,
    bindless_handle: Option<BindlessHandle>,
}

impl<D: GlDevice> Texture2D<D> {
    /// Create a texture, upload `data` to level 0 and optionally build its mip chain.
    ///
    /// Parameters are applied in layout order before storage is allocated.
    /// With [`MipmapGeneration::FullChain`] the layout's level count is
    /// replaced by a full chain for the extent.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParameter`] if the layout or data are
    /// rejected before any device call, or [`ResourceError::Texture`] if a
    /// device call fails. The device texture is released in both cases.
    pub fn new(
        device: Rc<D>,
        label: impl Into<String>,
        layout: &TextureLayout,
        data: Option<&[u8]>,
        mipmaps: MipmapGeneration,
    ) -> ResourceResult<Self> {
        let label = label.into();
        validate_layout(&*device, layout, data, mipmaps)?;

        let mut texture = Self {
            device,
            label,
            handle: None,
            internal_format: layout.internal_format,
            format: layout.format,
            pixel_type: layout.pixel_type,
            width: layout.width,
            height: layout.height,
            levels: mipmaps.resolve_levels(layout.width, layout.height, layout.levels),
            bindless_handle: None,
        };
        texture
            .allocate(layout, data, mipmaps)
            .map_err(|err| texture.device_error("new", err))?;
        texture.capture_bindless_handle();
        texture.check_errors("new")?;

        log::trace!(
            "Texture2D: created {:?} {}x{} ({} levels)",
            texture.label,
            texture.width,
            texture.height,
            texture.levels
        );
        Ok(texture)
    }

    /// Replace the texture with a new one of any size and format.
    ///
    /// Host bookkeeping is updated first and the old device texture is
    /// released before the new one is allocated, so the reported layout
    /// always matches `layout` even if the device rejects it. Any bindless
    /// handle is re-queried for the new object.
    ///
    /// # Errors
    ///
    /// Same as [`Texture2D::new`]. On [`ResourceError::InvalidParameter`]
    /// the texture is left untouched.
    pub fn reload(
        &mut self,
        layout: &TextureLayout,
        data: Option<&[u8]>,
        mipmaps: MipmapGeneration,
    ) -> ResourceResult<()> {
        validate_layout(&*self.device, layout, data, mipmaps)?;

        self.internal_format = layout.internal_format;
        self.format = layout.format;
        self.pixel_type = layout.pixel_type;
        self.width = layout.width;
        self.height = layout.height;
        self.levels = mipmaps.resolve_levels(layout.width, layout.height, layout.levels);
        self.bindless_handle = None;

        if let Some(old) = self.handle.take() {
            self.device.delete_texture(old);
        }

        self.allocate(layout, data, mipmaps)
            .map_err(|err| self.device_error("reload", err))?;
        self.capture_bindless_handle();
        self.check_errors("reload")?;

        log::trace!(
            "Texture2D: reloaded {:?} as {}x{} ({} levels)",
            self.label,
            self.width,
            self.height,
            self.levels
        );
        Ok(())
    }

    /// Bind the texture to the 2D target of the active texture unit.
    pub fn bind(&self) {
        match self.handle {
            Some(handle) => self.device.bind_texture(Some(handle)),
            None => log::warn!("Texture2D: bind of released texture {:?}", self.label),
        }
    }

    /// Regenerate the mip chain from the current contents of level 0.
    pub fn update_mipmaps(&self) {
        let Some(handle) = self.handle else {
            return;
        };
        if let Err(err) = self.device.generate_mipmap(handle) {
            log::warn!("Texture2D: {:?} update_mipmaps: {err}", self.label);
        }
    }

    /// Copy the contents of `source` into this texture.
    ///
    /// The source is attached to a temporary framebuffer and copied with a
    /// framebuffer read. Both textures are expected to share an extent;
    /// the copied region is this texture's level 0. Framebuffer bindings are
    /// restored and the 2D target is unbound afterwards, whether or not the
    /// copy succeeded. A pass-through shader is faster for bulk copies.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParameter`] if either texture has no
    /// device object or the two live on different devices, and
    /// [`ResourceError::Texture`] if a device call fails.
    pub fn copy_from(&mut self, source: &Texture2D<D>) -> ResourceResult<()> {
        if !Rc::ptr_eq(&self.device, &source.device) {
            return Err(ResourceError::InvalidParameter(format!(
                "cannot copy {:?} into {:?} across devices",
                source.label, self.label
            )));
        }
        let (Some(target), Some(source_handle)) = (self.handle, source.handle) else {
            return Err(ResourceError::InvalidParameter(format!(
                "cannot copy {:?} into {:?}: texture was released",
                source.label, self.label
            )));
        };
        if (source.width, source.height) != (self.width, self.height) {
            log::warn!(
                "Texture2D: copying {}x{} {:?} into {}x{} {:?}",
                source.width,
                source.height,
                source.label,
                self.width,
                self.height,
                self.label
            );
        }

        let previous_draw = self.device.framebuffer_binding(FramebufferTarget::Draw);
        let previous_read = self.device.framebuffer_binding(FramebufferTarget::Read);

        let framebuffer = self
            .device
            .create_framebuffer()
            .map_err(|err| self.device_error("copy_from", err))?;
        let copied = self.copy_through(framebuffer, source_handle, target);

        self.device
            .bind_framebuffer(FramebufferTarget::Draw, previous_draw);
        self.device
            .bind_framebuffer(FramebufferTarget::Read, previous_read);
        self.device.bind_texture(None);
        self.device.delete_framebuffer(framebuffer);

        copied.map_err(|err| self.device_error("copy_from", err))?;
        self.check_errors("copy_from")
    }

    /// Fill one mip level with a single texel value, or zeros if `data` is `None`.
    ///
    /// `data` holds one texel in the texture's pixel format and type. Device
    /// errors are not reported.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParameter`] if `level` does not exist
    /// or `data` is shorter than one texel.
    pub fn clear_region(&self, data: Option<&[u8]>, level: u32) -> ResourceResult<()> {
        if level >= self.levels {
            return Err(ResourceError::InvalidParameter(format!(
                "level {level} out of range for {:?} with {} levels",
                self.label, self.levels
            )));
        }
        let texel = crate::types::texel_size(self.format, self.pixel_type);
        if let Some(data) = data {
            if data.len() < texel {
                return Err(ResourceError::InvalidParameter(format!(
                    "clear value is {} bytes, one texel needs {texel}",
                    data.len()
                )));
            }
        }
        let Some(handle) = self.handle else {
            return Ok(());
        };
        if let Err(err) = self.device.clear_texture_image(
            handle,
            level,
            self.format.as_raw(),
            self.pixel_type.as_raw(),
            data,
        ) {
            log::warn!("Texture2D: {:?} clear_region: {err}", self.label);
        }
        Ok(())
    }

    /// Snapshot of the current layout. Parameter lists are not retained.
    pub fn layout(&self) -> TextureLayout {
        TextureLayout::new(
            self.internal_format,
            self.width,
            self.height,
            self.format,
            self.pixel_type,
        )
        .with_levels(self.levels)
    }

    /// Get the texture width.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the texture height.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the mip level count.
    pub fn levels(&self) -> u32 {
        self.levels
    }

    pub fn internal_format(&self) -> InternalFormat {
        self.internal_format
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn pixel_type(&self) -> PixelType {
        self.pixel_type
    }

    /// Diagnostic label given at construction.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Device texture object, if one is currently allocated.
    pub fn handle(&self) -> Option<TextureHandle> {
        self.handle
    }

    /// Returns true if the texture owns a device object.
    pub fn is_valid(&self) -> bool {
        self.handle.is_some()
    }

    /// Bindless handle captured at the last successful allocation.
    pub fn bindless_handle(&self) -> Option<BindlessHandle> {
        self.bindless_handle
    }

    /// Get the device the texture lives on.
    pub fn device(&self) -> &Rc<D> {
        &self.device
    }

    /// Create the device object and run the parameter/storage/upload sequence.
    fn allocate(
        &mut self,
        layout: &TextureLayout,
        data: Option<&[u8]>,
        mipmaps: MipmapGeneration,
    ) -> Result<(), DeviceError> {
        let handle = self.device.create_texture_2d()?;
        self.handle = Some(handle);

        for (name, value) in &layout.int_parameters {
            self.device
                .texture_parameter_i32(handle, name.as_raw(), *value)?;
        }
        for (name, value) in &layout.float_parameters {
            self.device
                .texture_parameter_f32(handle, name.as_raw(), *value)?;
        }

        self.device.texture_storage_2d(
            handle,
            self.levels,
            self.internal_format.as_raw(),
            self.width,
            self.height,
        )?;

        if let Some(data) = data {
            self.device.texture_sub_image_2d(
                handle,
                0,
                Region2d::from_extent(self.width, self.height),
                self.format.as_raw(),
                self.pixel_type.as_raw(),
                data,
            )?;
        }

        if mipmaps.generates() {
            self.device.generate_mipmap(handle)?;
        }
        Ok(())
    }

    fn capture_bindless_handle(&mut self) {
        if !cfg!(feature = "bindless") || !self.device.capabilities().bindless_textures {
            return;
        }
        self.bindless_handle = self
            .handle
            .and_then(|handle| self.device.texture_bindless_handle(handle));
    }

    fn copy_through(
        &self,
        framebuffer: FramebufferHandle,
        source: TextureHandle,
        target: TextureHandle,
    ) -> Result<(), DeviceError> {
        self.device
            .bind_framebuffer(FramebufferTarget::Both, Some(framebuffer));
        self.device.framebuffer_texture_2d(
            FramebufferTarget::Both,
            gl::COLOR_ATTACHMENT0,
            Some(source),
            0,
        )?;
        self.device.bind_texture(Some(target));
        self.device
            .copy_texture_sub_image_2d(0, Region2d::from_extent(self.width, self.height))
    }

    /// Poll the sticky flag once at the end of a multi-call operation.
    fn check_errors(&self, operation: &'static str) -> ResourceResult<()> {
        let code = self.device.poll_error();
        if code.is_clear() {
            return Ok(());
        }
        Err(self.device_error(operation, DeviceError::new("poll_error", code)))
    }

    fn device_error(&self, operation: &'static str, source: DeviceError) -> ResourceError {
        log::error!("Texture2D: {:?} {operation} failed: {source}", self.label);
        ResourceError::Texture {
            label: self.label.clone(),
            operation,
            source,
        }
    }
}

impl<D: GlDevice> Drop for Texture2D<D> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.device.delete_texture(handle);
            log::trace!("Texture2D: released {:?}", self.label);
        }
    }
}

impl<D: GlDevice> std::fmt::Debug for Texture2D<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture2D")
            .field("label", &self.label)
            .field("handle", &self.handle)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("levels", &self.levels)
            .field("internal_format", &self.internal_format)
            .finish_non_exhaustive()
    }
}

// Ownership of the device object is exclusive and tied to the context thread.
static_assertions::assert_not_impl_any!(Texture2D<DummyDevice>: Clone, Send, Sync);

fn validate_layout<D: GlDevice>(
    device: &D,
    layout: &TextureLayout,
    data: Option<&[u8]>,
    mipmaps: MipmapGeneration,
) -> ResourceResult<()> {
    let (width, height) = (layout.width, layout.height);
    if width == 0 || height == 0 {
        return Err(ResourceError::InvalidParameter(
            "texture dimensions cannot be zero".to_string(),
        ));
    }

    let max_dim = device.capabilities().max_texture_dimension;
    if width > max_dim || height > max_dim {
        return Err(ResourceError::InvalidParameter(format!(
            "texture dimension {width}x{height} exceeds maximum {max_dim}"
        )));
    }

    if mipmaps != MipmapGeneration::FullChain {
        let full_chain = full_mip_chain_levels(width, height);
        if layout.levels == 0 || layout.levels > full_chain {
            return Err(ResourceError::InvalidParameter(format!(
                "level count {} out of range 1..={full_chain} for {width}x{height}",
                layout.levels
            )));
        }
    }

    if let Some(data) = data {
        let needed = layout.upload_size();
        if data.len() < needed {
            return Err(ResourceError::InvalidParameter(format!(
                "initial data is {} bytes, a {width}x{height} upload reads {needed}",
                data.len()
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceCall, ErrorCode};

    fn rgba8(width: u32, height: u32) -> TextureLayout {
        TextureLayout::new(
            InternalFormat::Rgba8,
            width,
            height,
            PixelFormat::Rgba,
            PixelType::UnsignedByte,
        )
    }

    #[test]
    fn test_texture_debug() {
        let device = Rc::new(DummyDevice::new());
        let texture =
            Texture2D::new(device, "debug", &rgba8(1920, 1080), None, MipmapGeneration::Disabled)
                .unwrap();
        let debug = format!("{:?}", texture);
        assert!(debug.contains("Texture2D"));
        assert!(debug.contains("1920"));
    }

    #[test]
    fn test_layout_snapshot_has_depth_one() {
        let device = Rc::new(DummyDevice::new());
        let texture =
            Texture2D::new(device, "snap", &rgba8(800, 600), None, MipmapGeneration::Disabled)
                .unwrap();
        let layout = texture.layout();
        assert_eq!((layout.width, layout.height, layout.depth), (800, 600, 1));
        assert_eq!(layout.levels, 1);
        assert!(layout.int_parameters.is_empty());
    }

    #[test]
    fn test_zero_extent_is_rejected_before_device_calls() {
        let device = Rc::new(DummyDevice::new());
        let err = Texture2D::new(
            device.clone(),
            "empty",
            &rgba8(0, 16),
            None,
            MipmapGeneration::Disabled,
        )
        .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidParameter(_)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_short_data_is_rejected() {
        let device = Rc::new(DummyDevice::new());
        let pixels = vec![0u8; 15];
        let err = Texture2D::new(
            device,
            "short",
            &rgba8(2, 2),
            Some(pixels.as_slice()),
            MipmapGeneration::Disabled,
        )
        .unwrap_err();
        assert!(err.to_string().contains("reads 16"));
    }

    #[test]
    fn test_too_many_custom_levels_rejected() {
        let device = Rc::new(DummyDevice::new());
        let layout = rgba8(4, 4).with_levels(4);
        let err = Texture2D::new(device, "levels", &layout, None, MipmapGeneration::CustomLevels)
            .unwrap_err();
        assert!(matches!(err, ResourceError::InvalidParameter(_)));
    }

    #[test]
    fn test_sticky_error_fails_construction() {
        let device = Rc::new(DummyDevice::new());
        device.raise_error(ErrorCode::INVALID_ENUM);
        let err =
            Texture2D::new(device.clone(), "sticky", &rgba8(4, 4), None, MipmapGeneration::Disabled)
                .unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::INVALID_ENUM));
        assert!(device.live_textures().is_empty());
        assert_eq!(
            device.count_calls(|c| matches!(c, DeviceCall::DeleteTexture(_))),
            1
        );
    }

    #[test]
    fn test_clear_region_checks_level() {
        let device = Rc::new(DummyDevice::new());
        let texture =
            Texture2D::new(device.clone(), "clear", &rgba8(8, 8), None, MipmapGeneration::FullChain)
                .unwrap();
        assert!(texture.clear_region(None, 3).is_ok());
        assert!(texture.clear_region(None, 4).is_err());
        assert!(texture.clear_region(Some(&[1u8, 2, 3][..]), 0).is_err());
        assert_eq!(
            device.count_calls(|c| matches!(c, DeviceCall::ClearTextureImage { zeroed: true, .. })),
            1
        );
    }
}
