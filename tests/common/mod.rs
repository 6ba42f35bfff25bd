//! Common utilities for resource integration tests.
//!
//! Every test runs against [`DummyDevice`], which records each device call
//! and tracks live objects so leaks and double frees are observable.

#![allow(dead_code)]

use std::rc::Rc;

use gl_resources::backend::DeviceCall;
use gl_resources::{
    DeviceCapabilities, DummyDevice, InternalFormat, PixelFormat, PixelType, TextureLayout,
};

/// Shared device plus helpers for inspecting what the wrappers did.
pub struct TestContext {
    pub device: Rc<DummyDevice>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_capabilities(DeviceCapabilities::default())
    }

    pub fn with_capabilities(capabilities: DeviceCapabilities) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        Self {
            device: Rc::new(DummyDevice::with_capabilities(capabilities)),
        }
    }

    /// Context whose device reports bindless texture support.
    pub fn bindless() -> Self {
        Self::with_capabilities(DeviceCapabilities {
            bindless_textures: true,
            ..DeviceCapabilities::default()
        })
    }

    pub fn count(&self, predicate: impl Fn(&DeviceCall) -> bool) -> usize {
        self.device.count_calls(predicate)
    }

    /// Assert that every object was released exactly once.
    pub fn assert_no_leaks(&self) {
        assert!(self.device.live_textures().is_empty(), "leaked textures");
        assert!(self.device.live_buffers().is_empty(), "leaked buffers");
        assert!(
            self.device.live_framebuffers().is_empty(),
            "leaked framebuffers"
        );
        assert!(
            self.device.invalid_deletes().is_empty(),
            "double frees: {:?}",
            self.device.invalid_deletes()
        );
    }
}

/// RGBA8 layout with a single level.
pub fn rgba8_layout(width: u32, height: u32) -> TextureLayout {
    TextureLayout::new(
        InternalFormat::Rgba8,
        width,
        height,
        PixelFormat::Rgba,
        PixelType::UnsignedByte,
    )
}

/// Deterministic test pattern of `size` bytes.
pub fn generate_test_pattern(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}
