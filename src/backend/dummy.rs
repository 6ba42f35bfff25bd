//! Dummy device for testing and development.
//!
//! This device doesn't talk to a GPU. It keeps enough state to behave like a
//! real context for the calls the resource wrappers make (object lifetimes,
//! immutable storage, framebuffer and buffer bindings, buffer contents) and
//! records every call so tests can assert on the exact sequence.
//!
//! Failures can be injected per call name with [`DummyDevice::fail_next`],
//! or left in the sticky flag with [`DummyDevice::raise_error`].

use std::collections::{HashMap, HashSet};
use std::ptr::NonNull;

use parking_lot::Mutex;

use super::error::{DeviceError, DeviceResult, ErrorCode};
use super::traits::{
    BindlessHandle, BufferHandle, DeviceCapabilities, FramebufferHandle, GlDevice, Region2d,
    TextureHandle,
};
use super::types::{gl, BufferUsageHint, FramebufferTarget};
use crate::types::full_mip_chain_levels;

/// A device call recorded by [`DummyDevice`].
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCall {
    CreateTexture(TextureHandle),
    DeleteTexture(TextureHandle),
    TextureParameterI32 {
        texture: TextureHandle,
        name: u32,
        value: i32,
    },
    TextureParameterF32 {
        texture: TextureHandle,
        name: u32,
        value: f32,
    },
    TextureStorage2d {
        texture: TextureHandle,
        levels: u32,
        internal_format: u32,
        width: u32,
        height: u32,
    },
    TextureSubImage2d {
        texture: TextureHandle,
        level: u32,
        region: Region2d,
        format: u32,
        ty: u32,
        len: usize,
    },
    GenerateMipmap(TextureHandle),
    ClearTextureImage {
        texture: TextureHandle,
        level: u32,
        zeroed: bool,
    },
    BindTexture(Option<TextureHandle>),
    TextureBindlessHandle(TextureHandle),
    CreateFramebuffer(FramebufferHandle),
    DeleteFramebuffer(FramebufferHandle),
    BindFramebuffer {
        target: FramebufferTarget,
        framebuffer: Option<FramebufferHandle>,
    },
    FramebufferTexture2d {
        target: FramebufferTarget,
        attachment: u32,
        texture: Option<TextureHandle>,
        level: u32,
    },
    CopyTextureSubImage2d {
        texture: Option<TextureHandle>,
        source: Option<TextureHandle>,
        level: u32,
        region: Region2d,
    },
    CreateBuffer(BufferHandle),
    DeleteBuffer(BufferHandle),
    BindBufferBase {
        index: u32,
        buffer: Option<BufferHandle>,
    },
    BufferData {
        buffer: Option<BufferHandle>,
        size: usize,
        uploaded: bool,
        usage: BufferUsageHint,
    },
    MapBuffer(BufferHandle),
    UnmapBuffer(BufferHandle),
    PollError,
}

#[derive(Debug, Default)]
struct TextureState {
    /// `(levels, width, height)` once immutable storage is allocated.
    storage: Option<(u32, u32, u32)>,
}

#[derive(Debug, Default)]
struct DummyState {
    next_name: u32,
    calls: Vec<DeviceCall>,
    textures: HashMap<TextureHandle, TextureState>,
    framebuffers: HashMap<FramebufferHandle, Option<TextureHandle>>,
    buffers: HashMap<BufferHandle, Box<[u8]>>,
    invalid_deletes: Vec<String>,
    bound_texture: Option<TextureHandle>,
    read_framebuffer: Option<FramebufferHandle>,
    draw_framebuffer: Option<FramebufferHandle>,
    storage_slots: HashMap<u32, BufferHandle>,
    storage_binding: Option<BufferHandle>,
    mapped: HashSet<BufferHandle>,
    sticky: Option<ErrorCode>,
    injected: HashMap<&'static str, ErrorCode>,
    refuse_mapping: bool,
}

impl DummyState {
    fn next_name(&mut self) -> u32 {
        self.next_name += 1;
        self.next_name
    }

    fn injected(&mut self, call: &'static str) -> DeviceResult<()> {
        match self.injected.remove(call) {
            Some(code) => {
                log::trace!("DummyDevice: injected {code} into {call}");
                Err(DeviceError::new(call, code))
            }
            None => Ok(()),
        }
    }
}

/// Dummy graphics device.
#[derive(Debug)]
pub struct DummyDevice {
    capabilities: DeviceCapabilities,
    state: Mutex<DummyState>,
}

impl DummyDevice {
    /// Create a new dummy device with default capabilities.
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    /// Create a new dummy device reporting the given capabilities.
    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        Self {
            capabilities,
            state: Mutex::new(DummyState::default()),
        }
    }

    /// Make the next call named `call` fail with `code`.
    ///
    /// Names match the [`GlDevice`] method names, e.g. `"texture_storage_2d"`.
    pub fn fail_next(&self, call: &'static str, code: ErrorCode) {
        self.state.lock().injected.insert(call, code);
    }

    /// Set the sticky error flag without failing any call.
    pub fn raise_error(&self, code: ErrorCode) {
        self.state.lock().sticky = Some(code);
    }

    /// Make [`GlDevice::map_buffer_read_only`] return `None`.
    pub fn refuse_mapping(&self, refuse: bool) {
        self.state.lock().refuse_mapping = refuse;
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> Vec<DeviceCall> {
        self.state.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.state.lock().calls.iter().filter(|&c| predicate(c)).count()
    }

    /// Forget recorded calls. Object state is kept.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Textures that have been created and not deleted.
    pub fn live_textures(&self) -> Vec<TextureHandle> {
        let mut live: Vec<_> = self.state.lock().textures.keys().copied().collect();
        live.sort();
        live
    }

    /// Buffers that have been created and not deleted.
    pub fn live_buffers(&self) -> Vec<BufferHandle> {
        let mut live: Vec<_> = self.state.lock().buffers.keys().copied().collect();
        live.sort();
        live
    }

    /// Framebuffers that have been created and not deleted.
    pub fn live_framebuffers(&self) -> Vec<FramebufferHandle> {
        let mut live: Vec<_> = self.state.lock().framebuffers.keys().copied().collect();
        live.sort();
        live
    }

    /// Deletes of objects that were not alive (double frees or foreign names).
    pub fn invalid_deletes(&self) -> Vec<String> {
        self.state.lock().invalid_deletes.clone()
    }

    /// Texture currently bound to the 2D target.
    pub fn bound_texture(&self) -> Option<TextureHandle> {
        self.state.lock().bound_texture
    }

    /// Buffer bound at an indexed shader storage slot.
    pub fn storage_slot(&self, index: u32) -> Option<BufferHandle> {
        self.state.lock().storage_slots.get(&index).copied()
    }

    /// Buffers currently mapped.
    pub fn mapped_buffers(&self) -> usize {
        self.state.lock().mapped.len()
    }

    /// Allocated `(levels, width, height)` of a texture, if it has storage.
    pub fn texture_storage(&self, texture: TextureHandle) -> Option<(u32, u32, u32)> {
        self.state
            .lock()
            .textures
            .get(&texture)
            .and_then(|t| t.storage)
    }

    /// Copy of a buffer's contents.
    pub fn buffer_contents(&self, buffer: BufferHandle) -> Option<Vec<u8>> {
        self.state.lock().buffers.get(&buffer).map(|b| b.to_vec())
    }
}

impl Default for DummyDevice {
    fn default() -> Self {
        Self::new()
    }
}

// SAFETY: mapped pointers point into the boxed contents of a live buffer,
// which are only replaced by `buffer_data` and dropped by `delete_buffer`.
unsafe impl GlDevice for DummyDevice {
    fn name(&self) -> &str {
        "Dummy Device"
    }

    fn capabilities(&self) -> DeviceCapabilities {
        self.capabilities
    }

    fn poll_error(&self) -> ErrorCode {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::PollError);
        state.sticky.take().unwrap_or(ErrorCode::NO_ERROR)
    }

    fn create_texture_2d(&self) -> DeviceResult<TextureHandle> {
        let mut state = self.state.lock();
        state.injected("create_texture_2d")?;
        let name = state.next_name();
        let texture = TextureHandle::from_raw(name)
            .ok_or(DeviceError::new("create_texture_2d", ErrorCode::OUT_OF_MEMORY))?;
        state.textures.insert(texture, TextureState::default());
        state.calls.push(DeviceCall::CreateTexture(texture));
        log::trace!("DummyDevice: created texture {}", texture.raw());
        Ok(texture)
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::DeleteTexture(texture));
        if state.textures.remove(&texture).is_none() {
            log::error!("DummyDevice: delete of dead texture {}", texture.raw());
            state
                .invalid_deletes
                .push(format!("texture {}", texture.raw()));
        }
        if state.bound_texture == Some(texture) {
            state.bound_texture = None;
        }
        log::trace!("DummyDevice: deleted texture {}", texture.raw());
    }

    fn texture_parameter_i32(
        &self,
        texture: TextureHandle,
        name: u32,
        value: i32,
    ) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::TextureParameterI32 {
            texture,
            name,
            value,
        });
        state.injected("texture_parameter_i32")?;
        if !state.textures.contains_key(&texture) {
            return Err(DeviceError::new(
                "texture_parameter_i32",
                ErrorCode::INVALID_OPERATION,
            ));
        }
        Ok(())
    }

    fn texture_parameter_f32(
        &self,
        texture: TextureHandle,
        name: u32,
        value: f32,
    ) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::TextureParameterF32 {
            texture,
            name,
            value,
        });
        state.injected("texture_parameter_f32")?;
        if !state.textures.contains_key(&texture) {
            return Err(DeviceError::new(
                "texture_parameter_f32",
                ErrorCode::INVALID_OPERATION,
            ));
        }
        Ok(())
    }

    fn texture_storage_2d(
        &self,
        texture: TextureHandle,
        levels: u32,
        internal_format: u32,
        width: u32,
        height: u32,
    ) -> DeviceResult<()> {
        const CALL: &str = "texture_storage_2d";
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::TextureStorage2d {
            texture,
            levels,
            internal_format,
            width,
            height,
        });
        state.injected(CALL)?;
        if width == 0 || height == 0 || levels == 0 {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_VALUE));
        }
        if levels > full_mip_chain_levels(width, height) {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        }
        let Some(entry) = state.textures.get_mut(&texture) else {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        };
        if entry.storage.is_some() {
            // Immutable storage cannot be respecified.
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        }
        entry.storage = Some((levels, width, height));
        log::trace!(
            "DummyDevice: texture {} storage {}x{} ({} levels)",
            texture.raw(),
            width,
            height,
            levels
        );
        Ok(())
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
        const CALL: &str = "texture_sub_image_2d";
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::TextureSubImage2d {
            texture,
            level,
            region,
            format,
            ty,
            len: data.len(),
        });
        state.injected(CALL)?;
        let storage = state.textures.get(&texture).and_then(|t| t.storage);
        let Some((levels, width, height)) = storage else {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        };
        let level_width = (width >> level).max(1);
        let level_height = (height >> level).max(1);
        if level >= levels
            || region.x + region.width > level_width
            || region.y + region.height > level_height
        {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_VALUE));
        }
        Ok(())
    }

    fn generate_mipmap(&self, texture: TextureHandle) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::GenerateMipmap(texture));
        state.injected("generate_mipmap")?;
        match state.textures.get(&texture).and_then(|t| t.storage) {
            Some(_) => Ok(()),
            None => Err(DeviceError::new(
                "generate_mipmap",
                ErrorCode::INVALID_OPERATION,
            )),
        }
    }

    fn clear_texture_image(
        &self,
        texture: TextureHandle,
        level: u32,
        _format: u32,
        _ty: u32,
        data: Option<&[u8]>,
    ) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::ClearTextureImage {
            texture,
            level,
            zeroed: data.is_none(),
        });
        state.injected("clear_texture_image")?;
        match state.textures.get(&texture).and_then(|t| t.storage) {
            Some((levels, _, _)) if level < levels => Ok(()),
            _ => Err(DeviceError::new(
                "clear_texture_image",
                ErrorCode::INVALID_OPERATION,
            )),
        }
    }

    fn bind_texture(&self, texture: Option<TextureHandle>) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::BindTexture(texture));
        if texture.is_some_and(|t| !state.textures.contains_key(&t)) {
            state.sticky = Some(ErrorCode::INVALID_VALUE);
            return;
        }
        state.bound_texture = texture;
    }

    fn texture_bindless_handle(&self, texture: TextureHandle) -> Option<BindlessHandle> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::TextureBindlessHandle(texture));
        if !self.capabilities.bindless_textures {
            return None;
        }
        Some(BindlessHandle((1u64 << 32) | u64::from(texture.raw())))
    }

    fn create_framebuffer(&self) -> DeviceResult<FramebufferHandle> {
        let mut state = self.state.lock();
        state.injected("create_framebuffer")?;
        let name = state.next_name();
        let framebuffer = FramebufferHandle::from_raw(name)
            .ok_or(DeviceError::new("create_framebuffer", ErrorCode::OUT_OF_MEMORY))?;
        state.framebuffers.insert(framebuffer, None);
        state.calls.push(DeviceCall::CreateFramebuffer(framebuffer));
        Ok(framebuffer)
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::DeleteFramebuffer(framebuffer));
        if state.framebuffers.remove(&framebuffer).is_none() {
            state
                .invalid_deletes
                .push(format!("framebuffer {}", framebuffer.raw()));
        }
        // Deleting a bound framebuffer reverts the binding to the default.
        if state.read_framebuffer == Some(framebuffer) {
            state.read_framebuffer = None;
        }
        if state.draw_framebuffer == Some(framebuffer) {
            state.draw_framebuffer = None;
        }
    }

    fn bind_framebuffer(&self, target: FramebufferTarget, framebuffer: Option<FramebufferHandle>) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::BindFramebuffer {
            target,
            framebuffer,
        });
        if framebuffer.is_some_and(|f| !state.framebuffers.contains_key(&f)) {
            state.sticky = Some(ErrorCode::INVALID_OPERATION);
            return;
        }
        match target {
            FramebufferTarget::Read => state.read_framebuffer = framebuffer,
            FramebufferTarget::Draw => state.draw_framebuffer = framebuffer,
            FramebufferTarget::Both => {
                state.read_framebuffer = framebuffer;
                state.draw_framebuffer = framebuffer;
            }
        }
    }

    fn framebuffer_binding(&self, target: FramebufferTarget) -> Option<FramebufferHandle> {
        let state = self.state.lock();
        match target {
            FramebufferTarget::Read => state.read_framebuffer,
            FramebufferTarget::Draw | FramebufferTarget::Both => state.draw_framebuffer,
        }
    }

    fn framebuffer_texture_2d(
        &self,
        target: FramebufferTarget,
        attachment: u32,
        texture: Option<TextureHandle>,
        level: u32,
    ) -> DeviceResult<()> {
        const CALL: &str = "framebuffer_texture_2d";
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::FramebufferTexture2d {
            target,
            attachment,
            texture,
            level,
        });
        state.injected(CALL)?;
        let bound = match target {
            FramebufferTarget::Read => state.read_framebuffer,
            FramebufferTarget::Draw | FramebufferTarget::Both => state.draw_framebuffer,
        };
        let Some(framebuffer) = bound else {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        };
        if attachment != gl::COLOR_ATTACHMENT0 {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_ENUM));
        }
        if texture.is_some_and(|t| !state.textures.contains_key(&t)) {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        }
        state.framebuffers.insert(framebuffer, texture);
        Ok(())
    }

    fn copy_texture_sub_image_2d(&self, level: u32, region: Region2d) -> DeviceResult<()> {
        const CALL: &str = "copy_texture_sub_image_2d";
        let mut state = self.state.lock();
        let texture = state.bound_texture;
        let source = state
            .read_framebuffer
            .and_then(|f| state.framebuffers.get(&f).copied().flatten());
        state.calls.push(DeviceCall::CopyTextureSubImage2d {
            texture,
            source,
            level,
            region,
        });
        state.injected(CALL)?;
        if texture.is_none() || source.is_none() {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        }
        Ok(())
    }

    fn create_buffer(&self) -> DeviceResult<BufferHandle> {
        let mut state = self.state.lock();
        state.injected("create_buffer")?;
        let name = state.next_name();
        let buffer = BufferHandle::from_raw(name)
            .ok_or(DeviceError::new("create_buffer", ErrorCode::OUT_OF_MEMORY))?;
        state.buffers.insert(buffer, Box::default());
        state.calls.push(DeviceCall::CreateBuffer(buffer));
        log::trace!("DummyDevice: created buffer {}", buffer.raw());
        Ok(buffer)
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::DeleteBuffer(buffer));
        if state.buffers.remove(&buffer).is_none() {
            log::error!("DummyDevice: delete of dead buffer {}", buffer.raw());
            state
                .invalid_deletes
                .push(format!("buffer {}", buffer.raw()));
        }
        state.mapped.remove(&buffer);
        state.storage_slots.retain(|_, bound| *bound != buffer);
        if state.storage_binding == Some(buffer) {
            state.storage_binding = None;
        }
    }

    fn bind_buffer_base(&self, index: u32, buffer: Option<BufferHandle>) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::BindBufferBase { index, buffer });
        match buffer {
            Some(b) if !state.buffers.contains_key(&b) => {
                state.sticky = Some(ErrorCode::INVALID_VALUE);
            }
            Some(b) => {
                state.storage_slots.insert(index, b);
                state.storage_binding = Some(b);
            }
            None => {
                state.storage_slots.remove(&index);
                state.storage_binding = None;
            }
        }
    }

    fn buffer_data(
        &self,
        size: usize,
        data: Option<&[u8]>,
        usage: BufferUsageHint,
    ) -> DeviceResult<()> {
        const CALL: &str = "buffer_data";
        let mut state = self.state.lock();
        let buffer = state.storage_binding;
        state.calls.push(DeviceCall::BufferData {
            buffer,
            size,
            uploaded: data.is_some(),
            usage,
        });
        state.injected(CALL)?;
        let Some(buffer) = buffer else {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        };
        if state.mapped.contains(&buffer) {
            return Err(DeviceError::new(CALL, ErrorCode::INVALID_OPERATION));
        }
        if size as u64 > self.capabilities.max_buffer_size {
            return Err(DeviceError::new(CALL, ErrorCode::OUT_OF_MEMORY));
        }
        let mut contents = vec![0u8; size].into_boxed_slice();
        if let Some(data) = data {
            let len = data.len().min(size);
            contents[..len].copy_from_slice(&data[..len]);
        }
        state.buffers.insert(buffer, contents);
        Ok(())
    }

    fn map_buffer_read_only(&self, buffer: BufferHandle, size: usize) -> Option<NonNull<u8>> {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::MapBuffer(buffer));
        if state.refuse_mapping || state.mapped.contains(&buffer) {
            state.sticky = Some(ErrorCode::INVALID_OPERATION);
            return None;
        }
        let contents = state.buffers.get_mut(&buffer)?;
        if contents.len() < size || contents.is_empty() {
            return None;
        }
        let ptr = NonNull::new(contents.as_mut_ptr())?;
        state.mapped.insert(buffer);
        Some(ptr)
    }

    fn unmap_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.lock();
        state.calls.push(DeviceCall::UnmapBuffer(buffer));
        if !state.mapped.remove(&buffer) {
            state.sticky = Some(ErrorCode::INVALID_OPERATION);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dummy_device_name() {
        let device = DummyDevice::new();
        assert_eq!(device.name(), "Dummy Device");
        assert!(!device.capabilities().bindless_textures);
    }

    #[test]
    fn test_handles_are_unique_across_kinds() {
        let device = DummyDevice::new();
        let texture = device.create_texture_2d().unwrap();
        let buffer = device.create_buffer().unwrap();
        let framebuffer = device.create_framebuffer().unwrap();
        assert_ne!(texture.raw(), buffer.raw());
        assert_ne!(buffer.raw(), framebuffer.raw());
    }

    #[test]
    fn test_double_delete_is_recorded() {
        let device = DummyDevice::new();
        let texture = device.create_texture_2d().unwrap();
        device.delete_texture(texture);
        assert!(device.invalid_deletes().is_empty());
        device.delete_texture(texture);
        assert_eq!(device.invalid_deletes().len(), 1);
    }

    #[test]
    fn test_immutable_storage_cannot_be_respecified() {
        let device = DummyDevice::new();
        let texture = device.create_texture_2d().unwrap();
        device
            .texture_storage_2d(texture, 1, gl::RGBA8, 4, 4)
            .unwrap();
        let err = device
            .texture_storage_2d(texture, 1, gl::RGBA8, 8, 8)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::INVALID_OPERATION);
        assert_eq!(device.texture_storage(texture), Some((1, 4, 4)));
    }

    #[test]
    fn test_injected_failure_fires_once() {
        let device = DummyDevice::new();
        device.fail_next("create_buffer", ErrorCode::OUT_OF_MEMORY);
        let err = device.create_buffer().unwrap_err();
        assert_eq!(err, DeviceError::new("create_buffer", ErrorCode::OUT_OF_MEMORY));
        assert!(device.create_buffer().is_ok());
    }

    #[test]
    fn test_sticky_error_clears_on_poll() {
        let device = DummyDevice::new();
        device.bind_texture(TextureHandle::from_raw(99));
        assert_eq!(device.poll_error(), ErrorCode::INVALID_VALUE);
        assert_eq!(device.poll_error(), ErrorCode::NO_ERROR);
    }

    #[test]
    fn test_buffer_data_targets_generic_binding() {
        let device = DummyDevice::new();
        let buffer = device.create_buffer().unwrap();
        assert!(device
            .buffer_data(4, None, BufferUsageHint::DynamicDraw)
            .is_err());

        device.bind_buffer_base(2, Some(buffer));
        device
            .buffer_data(4, Some(&[1u8, 2][..]), BufferUsageHint::DynamicDraw)
            .unwrap();
        assert_eq!(device.buffer_contents(buffer), Some(vec![1, 2, 0, 0]));
        assert_eq!(device.storage_slot(2), Some(buffer));
    }
}
