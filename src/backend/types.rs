//! Raw enum values and small target enums shared between backends.

/// OpenGL enum values used by the resource wrappers.
///
/// Kept local so the device seam and the dummy backend do not depend on a
/// particular binding crate.
#[allow(missing_docs)]
pub mod gl {
    // Errors
    pub const NO_ERROR: u32 = 0;
    pub const INVALID_ENUM: u32 = 0x0500;
    pub const INVALID_VALUE: u32 = 0x0501;
    pub const INVALID_OPERATION: u32 = 0x0502;
    pub const OUT_OF_MEMORY: u32 = 0x0505;
    pub const INVALID_FRAMEBUFFER_OPERATION: u32 = 0x0506;

    // Framebuffer attachments
    pub const COLOR_ATTACHMENT0: u32 = 0x8CE0;

    // Texture parameters
    pub const TEXTURE_MAG_FILTER: u32 = 0x2800;
    pub const TEXTURE_MIN_FILTER: u32 = 0x2801;
    pub const TEXTURE_WRAP_S: u32 = 0x2802;
    pub const TEXTURE_WRAP_T: u32 = 0x2803;
    pub const TEXTURE_MIN_LOD: u32 = 0x813A;
    pub const TEXTURE_MAX_LOD: u32 = 0x813B;
    pub const TEXTURE_BASE_LEVEL: u32 = 0x813C;
    pub const TEXTURE_MAX_LEVEL: u32 = 0x813D;
    pub const TEXTURE_LOD_BIAS: u32 = 0x8501;
    pub const TEXTURE_MAX_ANISOTROPY: u32 = 0x84FE;
    pub const TEXTURE_COMPARE_MODE: u32 = 0x884C;
    pub const TEXTURE_COMPARE_FUNC: u32 = 0x884D;

    // Filters and wrap modes
    pub const NEAREST: u32 = 0x2600;
    pub const LINEAR: u32 = 0x2601;
    pub const NEAREST_MIPMAP_NEAREST: u32 = 0x2700;
    pub const LINEAR_MIPMAP_NEAREST: u32 = 0x2701;
    pub const NEAREST_MIPMAP_LINEAR: u32 = 0x2702;
    pub const LINEAR_MIPMAP_LINEAR: u32 = 0x2703;
    pub const REPEAT: u32 = 0x2901;
    pub const CLAMP_TO_BORDER: u32 = 0x812D;
    pub const CLAMP_TO_EDGE: u32 = 0x812F;
    pub const MIRRORED_REPEAT: u32 = 0x8370;

    // Sized internal formats
    pub const R8: u32 = 0x8229;
    pub const RG8: u32 = 0x822B;
    pub const RGB8: u32 = 0x8051;
    pub const RGBA8: u32 = 0x8058;
    pub const SRGB8_ALPHA8: u32 = 0x8C43;
    pub const R16F: u32 = 0x822D;
    pub const RG16F: u32 = 0x822F;
    pub const RGBA16F: u32 = 0x881A;
    pub const R32F: u32 = 0x822E;
    pub const RG32F: u32 = 0x8230;
    pub const RGBA32F: u32 = 0x8814;
    pub const R32I: u32 = 0x8235;
    pub const R32UI: u32 = 0x8236;
    pub const RGBA32UI: u32 = 0x8D70;
    pub const DEPTH_COMPONENT24: u32 = 0x81A6;
    pub const DEPTH_COMPONENT32F: u32 = 0x8CAC;
    pub const DEPTH24_STENCIL8: u32 = 0x88F0;

    // Pixel transfer formats
    pub const DEPTH_COMPONENT: u32 = 0x1902;
    pub const RED: u32 = 0x1903;
    pub const RGB: u32 = 0x1907;
    pub const RGBA: u32 = 0x1908;
    pub const RG: u32 = 0x8227;
    pub const BGRA: u32 = 0x80E1;
    pub const DEPTH_STENCIL: u32 = 0x84F9;
    pub const RED_INTEGER: u32 = 0x8D94;
    pub const RGBA_INTEGER: u32 = 0x8D99;

    // Pixel transfer types
    pub const BYTE: u32 = 0x1400;
    pub const UNSIGNED_BYTE: u32 = 0x1401;
    pub const SHORT: u32 = 0x1402;
    pub const UNSIGNED_SHORT: u32 = 0x1403;
    pub const INT: u32 = 0x1404;
    pub const UNSIGNED_INT: u32 = 0x1405;
    pub const FLOAT: u32 = 0x1406;
    pub const HALF_FLOAT: u32 = 0x140B;
    pub const UNSIGNED_INT_24_8: u32 = 0x84FA;
}

/// Framebuffer binding points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FramebufferTarget {
    /// Both read and draw binding points.
    Both,
    /// Read binding point (source of copies and blits).
    Read,
    /// Draw binding point.
    Draw,
}

/// Usage hint passed along with buffer storage allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BufferUsageHint {
    /// Contents are set once and used many times.
    StaticDraw,
    /// Contents are updated frequently.
    #[default]
    DynamicDraw,
    /// Contents are set once and used at most a few times.
    StreamDraw,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_usage_is_dynamic() {
        assert_eq!(BufferUsageHint::default(), BufferUsageHint::DynamicDraw);
    }
}
