//! OpenGL device backed by `glow`.
//!
//! Texture edits use direct state access and leave the texture bindings of
//! the context alone. Float parameters have no DSA entry point in `glow`, so
//! they go through the 2D binding and restore it afterwards. Buffer uploads
//! and mappings use the generic shader storage binding.

use std::ffi::c_void;
use std::num::NonZeroU32;
use std::ptr::NonNull;

use glow::HasContext;

use super::error::{DeviceError, DeviceResult, ErrorCode};
use super::traits::{
    BindlessHandle, BufferHandle, DeviceCapabilities, FramebufferHandle, GlDevice, Region2d,
    TextureHandle,
};
use super::types::{BufferUsageHint, FramebufferTarget};
use crate::types::DEFAULT_UNPACK_ALIGNMENT;

/// Extension string that gates bindless handle queries.
const BINDLESS_EXTENSION: &str = "GL_ARB_bindless_texture";

const MAX_DRAINED_ERRORS: usize = 16;

type GetTextureHandleFn = unsafe extern "system" fn(texture: u32) -> u64;
type ClearTexImageFn =
    unsafe extern "system" fn(texture: u32, level: i32, format: u32, ty: u32, data: *const c_void);

/// Entry points `glow` does not wrap, loaded alongside the context.
#[derive(Default, Clone, Copy)]
struct ExtraEntryPoints {
    get_texture_handle: Option<GetTextureHandleFn>,
    clear_tex_image: Option<ClearTexImageFn>,
}

impl ExtraEntryPoints {
    unsafe fn load<F>(loader: &mut F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let get_texture_handle = if cfg!(feature = "bindless") {
            let ptr = loader("glGetTextureHandleARB");
            // SAFETY: the loader returned the entry point for this exact symbol.
            (!ptr.is_null())
                .then(|| std::mem::transmute::<*const c_void, GetTextureHandleFn>(ptr))
        } else {
            None
        };
        let ptr = loader("glClearTexImage");
        // SAFETY: as above.
        let clear_tex_image = (!ptr.is_null())
            .then(|| std::mem::transmute::<*const c_void, ClearTexImageFn>(ptr));
        Self {
            get_texture_handle,
            clear_tex_image,
        }
    }
}

/// Pixel-store values that make a client-memory upload read exactly
/// [`upload_size`](crate::types::upload_size) bytes.
const TIGHT_UNPACK: [(u32, i32); 4] = [
    (glow::UNPACK_ALIGNMENT, DEFAULT_UNPACK_ALIGNMENT as i32),
    (glow::UNPACK_ROW_LENGTH, 0),
    (glow::UNPACK_SKIP_ROWS, 0),
    (glow::UNPACK_SKIP_PIXELS, 0),
];

/// Saved unpack state restored after an upload.
struct UnpackState {
    values: [i32; TIGHT_UNPACK.len()],
    buffer: Option<glow::NativeBuffer>,
}

fn native_texture(texture: TextureHandle) -> glow::NativeTexture {
    glow::NativeTexture(texture.0)
}

fn native_buffer(buffer: BufferHandle) -> glow::NativeBuffer {
    glow::NativeBuffer(buffer.0)
}

fn native_framebuffer(framebuffer: FramebufferHandle) -> glow::NativeFramebuffer {
    glow::NativeFramebuffer(framebuffer.0)
}

/// Object name read back from an integer binding query.
fn queried_name(raw: i32) -> Option<NonZeroU32> {
    u32::try_from(raw).ok().and_then(NonZeroU32::new)
}

fn framebuffer_target(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Both => glow::FRAMEBUFFER,
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER,
        FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER,
    }
}

/// `Both` has no binding query of its own and reports the draw binding.
fn framebuffer_binding_query(target: FramebufferTarget) -> u32 {
    match target {
        FramebufferTarget::Read => glow::READ_FRAMEBUFFER_BINDING,
        FramebufferTarget::Both | FramebufferTarget::Draw => glow::DRAW_FRAMEBUFFER_BINDING,
    }
}

fn buffer_usage(usage: BufferUsageHint) -> u32 {
    match usage {
        BufferUsageHint::StaticDraw => glow::STATIC_DRAW,
        BufferUsageHint::DynamicDraw => glow::DYNAMIC_DRAW,
        BufferUsageHint::StreamDraw => glow::STREAM_DRAW,
    }
}

/// Clamp a texel coordinate or size to the signed range the API takes.
fn to_gl_int(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// OpenGL 4.5 device.
///
/// All methods must be called on the thread that owns the current context.
pub struct GlowDevice {
    gl: glow::Context,
    name: String,
    capabilities: DeviceCapabilities,
    entry_points: ExtraEntryPoints,
}

impl GlowDevice {
    /// Wrap an existing context.
    ///
    /// Bindless handles and texture clears are not available; use
    /// [`GlowDevice::from_loader_function`] to get them.
    ///
    /// # Safety
    ///
    /// `context` must be current on the calling thread for the lifetime of the device.
    pub unsafe fn new(context: glow::Context) -> Self {
        Self::with_entry_points(context, ExtraEntryPoints::default())
    }

    /// Load a context through `loader`, including the entry points `glow`
    /// does not wrap when the driver exposes them.
    ///
    /// # Safety
    ///
    /// `loader` must return valid function pointers for the current context,
    /// which must stay current on the calling thread for the lifetime of the
    /// device.
    pub unsafe fn from_loader_function<F>(mut loader: F) -> Self
    where
        F: FnMut(&str) -> *const c_void,
    {
        let entry_points = ExtraEntryPoints::load(&mut loader);
        let context = glow::Context::from_loader_function(|symbol| loader(symbol));
        Self::with_entry_points(context, entry_points)
    }

    unsafe fn with_entry_points(context: glow::Context, mut entry_points: ExtraEntryPoints) -> Self {
        let name = context.get_parameter_string(glow::RENDERER);
        let max_texture_size = context.get_parameter_i32(glow::MAX_TEXTURE_SIZE);
        let bindless_textures = entry_points.get_texture_handle.is_some()
            && context.supported_extensions().contains(BINDLESS_EXTENSION);
        if !bindless_textures {
            entry_points.get_texture_handle = None;
        }
        let capabilities = DeviceCapabilities {
            max_texture_dimension: u32::try_from(max_texture_size).unwrap_or(0),
            max_buffer_size: i32::MAX as u64,
            bindless_textures,
        };
        // Drain anything left over from context setup. Bounded because a lost
        // context keeps reporting errors.
        for _ in 0..MAX_DRAINED_ERRORS {
            if context.get_error() == glow::NO_ERROR {
                break;
            }
        }
        log::info!(
            "GlowDevice: {} (max texture {}, bindless {}, clear {})",
            name,
            capabilities.max_texture_dimension,
            capabilities.bindless_textures,
            entry_points.clear_tex_image.is_some()
        );
        Self {
            gl: context,
            name,
            capabilities,
            entry_points,
        }
    }

    /// The wrapped context.
    pub fn context(&self) -> &glow::Context {
        &self.gl
    }

    fn check(&self, call: &'static str) -> DeviceResult<()> {
        let code = ErrorCode(unsafe { self.gl.get_error() });
        if code.is_clear() {
            Ok(())
        } else {
            log::trace!("GlowDevice: {call} raised {code}");
            Err(DeviceError::new(call, code))
        }
    }

    fn creation_error(&self, call: &'static str, message: String) -> DeviceError {
        log::error!("GlowDevice: {call} failed: {message}");
        match self.check(call) {
            Err(err) => err,
            Ok(()) => DeviceError::new(call, ErrorCode::OUT_OF_MEMORY),
        }
    }

    /// Force tightly packed client-memory uploads, returning the previous state.
    unsafe fn push_unpack_state(&self) -> UnpackState {
        let mut values = [0; TIGHT_UNPACK.len()];
        for (saved, &(name, value)) in values.iter_mut().zip(&TIGHT_UNPACK) {
            *saved = self.gl.get_parameter_i32(name);
            self.gl.pixel_store_i32(name, value);
        }
        let buffer = queried_name(self.gl.get_parameter_i32(glow::PIXEL_UNPACK_BUFFER_BINDING))
            .map(glow::NativeBuffer);
        if buffer.is_some() {
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, None);
        }
        UnpackState { values, buffer }
    }

    unsafe fn pop_unpack_state(&self, state: UnpackState) {
        for (&saved, &(name, _)) in state.values.iter().zip(&TIGHT_UNPACK) {
            self.gl.pixel_store_i32(name, saved);
        }
        if state.buffer.is_some() {
            self.gl.bind_buffer(glow::PIXEL_UNPACK_BUFFER, state.buffer);
        }
    }
}

impl std::fmt::Debug for GlowDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowDevice")
            .field("name", &self.name)
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

// SAFETY: mappings come from glMapBufferRange over `size` bytes and stay
// valid until glUnmapBuffer for the same buffer.
unsafe impl GlDevice for GlowDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn poll_error(&self) -> ErrorCode {
        ErrorCode(unsafe { self.gl.get_error() })
    }

    fn create_texture_2d(&self) -> DeviceResult<TextureHandle> {
        let texture = unsafe { self.gl.create_named_texture(glow::TEXTURE_2D) }
            .map_err(|message| self.creation_error("create_texture_2d", message))?;
        self.check("create_texture_2d")?;
        Ok(TextureHandle(texture.0))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        unsafe { self.gl.delete_texture(native_texture(texture)) }
    }

    fn texture_parameter_i32(
        &self,
        texture: TextureHandle,
        name: u32,
        value: i32,
    ) -> DeviceResult<()> {
        unsafe {
            self.gl
                .texture_parameter_i32(native_texture(texture), name, value)
        };
        self.check("texture_parameter_i32")
    }

    fn texture_parameter_f32(
        &self,
        texture: TextureHandle,
        name: u32,
        value: f32,
    ) -> DeviceResult<()> {
        unsafe {
            let previous = queried_name(self.gl.get_parameter_i32(glow::TEXTURE_BINDING_2D))
                .map(glow::NativeTexture);
            self.gl
                .bind_texture(glow::TEXTURE_2D, Some(native_texture(texture)));
            self.gl.tex_parameter_f32(glow::TEXTURE_2D, name, value);
            self.gl.bind_texture(glow::TEXTURE_2D, previous);
        }
        self.check("texture_parameter_f32")
    }

    fn texture_storage_2d(
        &self,
        texture: TextureHandle,
        levels: u32,
        internal_format: u32,
        width: u32,
        height: u32,
    ) -> DeviceResult<()> {
        unsafe {
            self.gl.texture_storage_2d(
                native_texture(texture),
                to_gl_int(levels),
                internal_format,
                to_gl_int(width),
                to_gl_int(height),
            )
        };
        self.check("texture_storage_2d")
    }

    fn texture_sub_image_2d(
        &self,
        texture: TextureHandle,
        level: u32,
        region: Region2d,
        format: u32,
        ty: u32,
        data: &[u8],
    ) -> DeviceResult<()> {
        unsafe {
            let unpack = self.push_unpack_state();
            self.gl.texture_sub_image_2d(
                native_texture(texture),
                to_gl_int(level),
                to_gl_int(region.x),
                to_gl_int(region.y),
                to_gl_int(region.width),
                to_gl_int(region.height),
                format,
                ty,
                glow::PixelUnpackData::Slice(data),
            );
            self.pop_unpack_state(unpack);
        }
        self.check("texture_sub_image_2d")
    }

    fn generate_mipmap(&self, texture: TextureHandle) -> DeviceResult<()> {
        unsafe { self.gl.generate_texture_mipmap(native_texture(texture)) };
        self.check("generate_mipmap")
    }

    fn clear_texture_image(
        &self,
        texture: TextureHandle,
        level: u32,
        format: u32,
        ty: u32,
        data: Option<&[u8]>,
    ) -> DeviceResult<()> {
        let Some(clear_tex_image) = self.entry_points.clear_tex_image else {
            return Err(DeviceError::new(
                "clear_texture_image",
                ErrorCode::INVALID_OPERATION,
            ));
        };
        let ptr = data.map_or(std::ptr::null(), |data| data.as_ptr().cast::<c_void>());
        // SAFETY: the entry point was loaded for this context; `data` holds at
        // least one texel, which is all glClearTexImage reads.
        unsafe { clear_tex_image(texture.raw(), to_gl_int(level), format, ty, ptr) };
        self.check("clear_texture_image")
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        unsafe {
            self.gl
                .bind_texture(glow::TEXTURE_2D, texture.map(native_texture))
        }
    }

    fn texture_bindless_handle(&self, texture: TextureHandle) -> Option<BindlessHandle> {
        let get_texture_handle = self.entry_points.get_texture_handle?;
        // SAFETY: the entry point was loaded for this context and the
        // extension is advertised.
        let raw = unsafe { get_texture_handle(texture.raw()) };
        (raw != 0).then_some(BindlessHandle(raw))
    }

    fn create_framebuffer(&self) -> DeviceResult<FramebufferHandle> {
        let framebuffer = unsafe { self.gl.create_framebuffer() }
            .map_err(|message| self.creation_error("create_framebuffer", message))?;
        Ok(FramebufferHandle(framebuffer.0))
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        unsafe { self.gl.delete_framebuffer(native_framebuffer(framebuffer)) }
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        unsafe {
            self.gl.bind_framebuffer(
                framebuffer_target(target),
                framebuffer.map(native_framebuffer),
            )
        }
    }

    fn framebuffer_binding(&self, target: FramebufferTarget) -> Option<FramebufferHandle> {
        let raw = unsafe { self.gl.get_parameter_i32(framebuffer_binding_query(target)) };
        queried_name(raw).map(FramebufferHandle)
    }

    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        attachment: u32,
        texture: Option<TextureHandle>,
        level: u32,
    ) -> DeviceResult<()> {
        unsafe {
            self.gl.framebuffer_texture_2d(
                framebuffer_target(target),
                attachment,
                glow::TEXTURE_2D,
                texture.map(native_texture),
                to_gl_int(level),
            )
        };
        self.check("framebuffer_texture_2d")
    }

    fn copy_texture_sub_image_2d(&self, level: u32, region: Region2d) -> DeviceResult<()> {
        unsafe {
            self.gl.copy_tex_sub_image_2d(
                glow::TEXTURE_2D,
                to_gl_int(level),
                to_gl_int(region.x),
                to_gl_int(region.y),
                0,
                0,
                to_gl_int(region.width),
                to_gl_int(region.height),
            )
        };
        self.check("copy_texture_sub_image_2d")
    }

    fn create_buffer(&self) -> DeviceResult<BufferHandle> {
        let buffer = unsafe { self.gl.create_buffer() }
            .map_err(|message| self.creation_error("create_buffer", message))?;
        Ok(BufferHandle(buffer.0))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        unsafe { self.gl.delete_buffer(native_buffer(buffer)) }
    }

    fn bind_buffer_base(&self, index: u32, buffer: Option<BufferHandle>) {
        unsafe {
            self.gl.bind_buffer_base(
                glow::SHADER_STORAGE_BUFFER,
                index,
                buffer.map(native_buffer),
            )
        }
    }

    fn buffer_data(
        &self,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsageHint,
    ) -> DeviceResult<()> {
        let gl_size = i32::try_from(size)
            .map_err(|_| DeviceError::new("buffer_data", ErrorCode::OUT_OF_MEMORY))?;
        let usage = buffer_usage(usage);
        unsafe {
            match data {
                Some(data) if data.len() == size => {
                    self.gl
                        .buffer_data_u8_slice(glow::SHADER_STORAGE_BUFFER, data, usage)
                }
                Some(data) => {
                    self.gl
                        .buffer_data_size(glow::SHADER_STORAGE_BUFFER, gl_size, usage);
                    self.gl
                        .buffer_sub_data_u8_slice(glow::SHADER_STORAGE_BUFFER, 0, data);
                }
                None => self
                    .gl
                    .buffer_data_size(glow::SHADER_STORAGE_BUFFER, gl_size, usage),
            }
        }
        self.check("buffer_data")
    }

    fn map_buffer_read_only(&self, buffer: BufferHandle, size: usize) -> Option<NonNull<u8>> {
        let length = i32::try_from(size).ok()?;
        let ptr = unsafe {
            self.gl
                .bind_buffer(glow::SHADER_STORAGE_BUFFER, Some(native_buffer(buffer)));
            self.gl
                .map_buffer_range(glow::SHADER_STORAGE_BUFFER, 0, length, glow::MAP_READ_BIT)
        };
        if let Err(err) = self.check("map_buffer_read_only") {
            log::warn!("GlowDevice: {err}");
            return None;
        }
        NonNull::new(ptr)
    }

    fn unmap_buffer(&self, buffer: BufferHandle) {
        unsafe {
            self.gl
                .bind_buffer(glow::SHADER_STORAGE_BUFFER, Some(native_buffer(buffer)));
            self.gl.unmap_buffer(glow::SHADER_STORAGE_BUFFER);
        }
    }
}

static_assertions::assert_impl_all!(GlowDevice: GlDevice, std::fmt::Debug);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PixelFormat, PixelType};

    #[test]
    fn test_missing_entry_points_stay_unloaded() {
        let mut requested = Vec::new();
        let entry_points = unsafe {
            ExtraEntryPoints::load(&mut |symbol: &str| {
                requested.push(symbol.to_string());
                std::ptr::null()
            })
        };

        assert!(entry_points.clear_tex_image.is_none());
        assert!(entry_points.get_texture_handle.is_none());
        assert!(requested.iter().any(|s| s == "glClearTexImage"));
        assert_eq!(
            requested.iter().any(|s| s == "glGetTextureHandleARB"),
            cfg!(feature = "bindless")
        );
    }

    #[test]
    fn test_tight_unpack_matches_upload_size() {
        let value = |name: u32| {
            TIGHT_UNPACK
                .iter()
                .find(|&&(n, _)| n == name)
                .map(|&(_, v)| v)
        };
        assert_eq!(value(glow::UNPACK_ROW_LENGTH), Some(0));
        assert_eq!(value(glow::UNPACK_SKIP_ROWS), Some(0));
        assert_eq!(value(glow::UNPACK_SKIP_PIXELS), Some(0));

        // 3 RGB8 texels per row, padded to the alignment except the last row.
        let alignment = value(glow::UNPACK_ALIGNMENT).unwrap() as usize;
        assert_eq!(
            crate::types::upload_size(3, 2, PixelFormat::Rgb, PixelType::UnsignedByte),
            9usize.next_multiple_of(alignment) + 9
        );
    }

    #[test]
    fn test_framebuffer_targets() {
        assert_eq!(framebuffer_target(FramebufferTarget::Both), glow::FRAMEBUFFER);
        assert_eq!(
            framebuffer_binding_query(FramebufferTarget::Read),
            glow::READ_FRAMEBUFFER_BINDING
        );
        assert_eq!(
            framebuffer_binding_query(FramebufferTarget::Both),
            glow::DRAW_FRAMEBUFFER_BINDING
        );
    }

    #[test]
    fn test_default_usage_maps_to_dynamic_draw() {
        assert_eq!(buffer_usage(BufferUsageHint::default()), glow::DYNAMIC_DRAW);
    }

    #[test]
    fn test_queried_name_rejects_default_object() {
        assert_eq!(queried_name(0), None);
        assert_eq!(queried_name(-1), None);
        assert_eq!(queried_name(5).map(NonZeroU32::get), Some(5));
    }
}
