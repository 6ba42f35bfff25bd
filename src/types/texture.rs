//! Texture formats, parameters and layout descriptions.

use crate::backend::types::gl;

/// Unpack row alignment the device uses unless told otherwise.
pub const DEFAULT_UNPACK_ALIGNMENT: usize = 4;

/// Sized internal storage format of a texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum InternalFormat {
    R8,
    Rg8,
    Rgb8,
    #[default]
    Rgba8,
    Srgb8Alpha8,
    R16Float,
    Rg16Float,
    Rgba16Float,
    R32Float,
    Rg32Float,
    Rgba32Float,
    R32Int,
    R32Uint,
    Rgba32Uint,
    Depth24,
    Depth32Float,
    Depth24Stencil8,
}

impl InternalFormat {
    /// Raw enum value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::R8 => gl::R8,
            Self::Rg8 => gl::RG8,
            Self::Rgb8 => gl::RGB8,
            Self::Rgba8 => gl::RGBA8,
            Self::Srgb8Alpha8 => gl::SRGB8_ALPHA8,
            Self::R16Float => gl::R16F,
            Self::Rg16Float => gl::RG16F,
            Self::Rgba16Float => gl::RGBA16F,
            Self::R32Float => gl::R32F,
            Self::Rg32Float => gl::RG32F,
            Self::Rgba32Float => gl::RGBA32F,
            Self::R32Int => gl::R32I,
            Self::R32Uint => gl::R32UI,
            Self::Rgba32Uint => gl::RGBA32UI,
            Self::Depth24 => gl::DEPTH_COMPONENT24,
            Self::Depth32Float => gl::DEPTH_COMPONENT32F,
            Self::Depth24Stencil8 => gl::DEPTH24_STENCIL8,
        }
    }

    /// Returns true if this is a depth or depth/stencil format.
    pub fn is_depth(self) -> bool {
        matches!(
            self,
            Self::Depth24 | Self::Depth32Float | Self::Depth24Stencil8
        )
    }
}

/// Layout of the pixel data passed to uploads and clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PixelFormat {
    Red,
    Rg,
    Rgb,
    #[default]
    Rgba,
    Bgra,
    RedInteger,
    RgbaInteger,
    DepthComponent,
    DepthStencil,
}

impl PixelFormat {
    /// Raw enum value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::Red => gl::RED,
            Self::Rg => gl::RG,
            Self::Rgb => gl::RGB,
            Self::Rgba => gl::RGBA,
            Self::Bgra => gl::BGRA,
            Self::RedInteger => gl::RED_INTEGER,
            Self::RgbaInteger => gl::RGBA_INTEGER,
            Self::DepthComponent => gl::DEPTH_COMPONENT,
            Self::DepthStencil => gl::DEPTH_STENCIL,
        }
    }

    /// Number of components per pixel.
    pub fn components(self) -> usize {
        match self {
            Self::Red | Self::RedInteger | Self::DepthComponent => 1,
            Self::Rg | Self::DepthStencil => 2,
            Self::Rgb => 3,
            Self::Rgba | Self::Bgra | Self::RgbaInteger => 4,
        }
    }
}

/// Component type of the pixel data passed to uploads and clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[non_exhaustive]
pub enum PixelType {
    Byte,
    #[default]
    UnsignedByte,
    Short,
    UnsignedShort,
    Int,
    UnsignedInt,
    HalfFloat,
    Float,
    /// Packed 24-bit depth and 8-bit stencil in one 32-bit word.
    UnsignedInt24_8,
}

impl PixelType {
    /// Raw enum value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::Byte => gl::BYTE,
            Self::UnsignedByte => gl::UNSIGNED_BYTE,
            Self::Short => gl::SHORT,
            Self::UnsignedShort => gl::UNSIGNED_SHORT,
            Self::Int => gl::INT,
            Self::UnsignedInt => gl::UNSIGNED_INT,
            Self::HalfFloat => gl::HALF_FLOAT,
            Self::Float => gl::FLOAT,
            Self::UnsignedInt24_8 => gl::UNSIGNED_INT_24_8,
        }
    }

    /// Size in bytes of one component, or of the whole pixel for packed types.
    pub fn byte_size(self) -> usize {
        match self {
            Self::Byte | Self::UnsignedByte => 1,
            Self::Short | Self::UnsignedShort | Self::HalfFloat => 2,
            Self::Int | Self::UnsignedInt | Self::Float | Self::UnsignedInt24_8 => 4,
        }
    }

    /// Returns true if one value of this type holds every component of a pixel.
    pub fn is_packed(self) -> bool {
        matches!(self, Self::UnsignedInt24_8)
    }
}

/// Size in bytes of one pixel described by `format` and `ty`.
pub fn texel_size(format: PixelFormat, ty: PixelType) -> usize {
    if ty.is_packed() {
        ty.byte_size()
    } else {
        format.components() * ty.byte_size()
    }
}

/// Number of bytes the device reads for a `width` x `height` upload.
///
/// Rows start on [`DEFAULT_UNPACK_ALIGNMENT`] boundaries; the last row is
/// not padded.
pub fn upload_size(width: u32, height: u32, format: PixelFormat, ty: PixelType) -> usize {
    if width == 0 || height == 0 {
        return 0;
    }
    let row_bytes = width as usize * texel_size(format, ty);
    let stride = row_bytes.next_multiple_of(DEFAULT_UNPACK_ALIGNMENT);
    stride * (height as usize - 1) + row_bytes
}

/// Level count of a complete mip chain for the larger of the two dimensions.
///
/// Equals `1 + floor(log2(max(width, height)))`, and is never less than 1.
pub fn full_mip_chain_levels(width: u32, height: u32) -> u32 {
    let largest = width.max(height);
    (u32::BITS - largest.leading_zeros()).max(1)
}

/// How the mip chain is produced when a texture is (re)allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MipmapGeneration {
    /// Allocate the layout's level count and leave the levels untouched.
    #[default]
    Disabled,
    /// Allocate a full chain for the extent and generate it from level 0.
    FullChain,
    /// Allocate the layout's level count and generate it from level 0.
    CustomLevels,
}

impl MipmapGeneration {
    /// Returns true if the chain is regenerated after the upload.
    pub fn generates(self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Level count to allocate for a layout of the given extent.
    pub fn resolve_levels(self, width: u32, height: u32, layout_levels: u32) -> u32 {
        match self {
            Self::FullChain => {
                let levels = full_mip_chain_levels(width, height);
                log::debug!("full mip chain for {width}x{height}: {levels} levels");
                levels
            }
            Self::Disabled | Self::CustomLevels => layout_levels,
        }
    }
}

/// Name of a texture sampling/state parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TextureParameter {
    MinFilter,
    MagFilter,
    WrapS,
    WrapT,
    BaseLevel,
    MaxLevel,
    MinLod,
    MaxLod,
    LodBias,
    MaxAnisotropy,
    CompareMode,
    CompareFunc,
    /// Any other parameter name, passed through unchanged.
    Raw(u32),
}

impl TextureParameter {
    /// Raw enum value.
    pub fn as_raw(self) -> u32 {
        match self {
            Self::MinFilter => gl::TEXTURE_MIN_FILTER,
            Self::MagFilter => gl::TEXTURE_MAG_FILTER,
            Self::WrapS => gl::TEXTURE_WRAP_S,
            Self::WrapT => gl::TEXTURE_WRAP_T,
            Self::BaseLevel => gl::TEXTURE_BASE_LEVEL,
            Self::MaxLevel => gl::TEXTURE_MAX_LEVEL,
            Self::MinLod => gl::TEXTURE_MIN_LOD,
            Self::MaxLod => gl::TEXTURE_MAX_LOD,
            Self::LodBias => gl::TEXTURE_LOD_BIAS,
            Self::MaxAnisotropy => gl::TEXTURE_MAX_ANISOTROPY,
            Self::CompareMode => gl::TEXTURE_COMPARE_MODE,
            Self::CompareFunc => gl::TEXTURE_COMPARE_FUNC,
            Self::Raw(raw) => raw,
        }
    }
}

/// Texture filtering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Linear,
    NearestMipmapNearest,
    LinearMipmapNearest,
    NearestMipmapLinear,
    LinearMipmapLinear,
}

impl TextureFilter {
    /// Raw value, as passed to an integer parameter.
    pub fn as_raw(self) -> i32 {
        let raw = match self {
            Self::Nearest => gl::NEAREST,
            Self::Linear => gl::LINEAR,
            Self::NearestMipmapNearest => gl::NEAREST_MIPMAP_NEAREST,
            Self::LinearMipmapNearest => gl::LINEAR_MIPMAP_NEAREST,
            Self::NearestMipmapLinear => gl::NEAREST_MIPMAP_LINEAR,
            Self::LinearMipmapLinear => gl::LINEAR_MIPMAP_LINEAR,
        };
        raw as i32
    }
}

/// Texture coordinate wrap mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureWrap {
    #[default]
    Repeat,
    MirroredRepeat,
    ClampToEdge,
    ClampToBorder,
}

impl TextureWrap {
    /// Raw value, as passed to an integer parameter.
    pub fn as_raw(self) -> i32 {
        let raw = match self {
            Self::Repeat => gl::REPEAT,
            Self::MirroredRepeat => gl::MIRRORED_REPEAT,
            Self::ClampToEdge => gl::CLAMP_TO_EDGE,
            Self::ClampToBorder => gl::CLAMP_TO_BORDER,
        };
        raw as i32
    }
}

/// Size, format and parameters of a texture.
///
/// Parameter lists are applied in order when the texture is allocated; a
/// later entry for the same name overrides an earlier one.
///
/// # Example
///
/// ```ignore
/// let layout = TextureLayout::new(InternalFormat::Rgba8, 512, 512, PixelFormat::Rgba, PixelType::UnsignedByte)
///     .with_filter(TextureFilter::LinearMipmapLinear, TextureFilter::Linear)
///     .with_wrap(TextureWrap::ClampToEdge, TextureWrap::ClampToEdge);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TextureLayout {
    /// Storage format.
    pub internal_format: InternalFormat,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Depth in pixels; always 1 for 2D textures.
    pub depth: u32,
    /// Format of uploaded pixel data.
    pub format: PixelFormat,
    /// Component type of uploaded pixel data.
    pub pixel_type: PixelType,
    /// Mip level count.
    pub levels: u32,
    /// Integer-valued parameters.
    pub int_parameters: Vec<(TextureParameter, i32)>,
    /// Float-valued parameters.
    pub float_parameters: Vec<(TextureParameter, f32)>,
}

impl TextureLayout {
    /// Create a single-level 2D layout without parameters.
    pub fn new(
        internal_format: InternalFormat,
        width: u32,
        height: u32,
        format: PixelFormat,
        pixel_type: PixelType,
    ) -> Self {
        Self {
            internal_format,
            width,
            height,
            depth: 1,
            format,
            pixel_type,
            levels: 1,
            int_parameters: Vec::new(),
            float_parameters: Vec::new(),
        }
    }

    /// Set the mip level count.
    pub fn with_levels(mut self, levels: u32) -> Self {
        self.levels = levels;
        self
    }

    /// Append an integer-valued parameter.
    pub fn with_int_parameter(mut self, name: TextureParameter, value: i32) -> Self {
        self.int_parameters.push((name, value));
        self
    }

    /// Append a float-valued parameter.
    pub fn with_float_parameter(mut self, name: TextureParameter, value: f32) -> Self {
        self.float_parameters.push((name, value));
        self
    }

    /// Append minification and magnification filters.
    pub fn with_filter(self, min: TextureFilter, mag: TextureFilter) -> Self {
        self.with_int_parameter(TextureParameter::MinFilter, min.as_raw())
            .with_int_parameter(TextureParameter::MagFilter, mag.as_raw())
    }

    /// Append wrap modes for both coordinates.
    pub fn with_wrap(self, s: TextureWrap, t: TextureWrap) -> Self {
        self.with_int_parameter(TextureParameter::WrapS, s.as_raw())
            .with_int_parameter(TextureParameter::WrapT, t.as_raw())
    }

    /// Number of bytes a full level-0 upload reads.
    pub fn upload_size(&self) -> usize {
        upload_size(self.width, self.height, self.format, self.pixel_type)
    }

    /// Size in bytes of one pixel of upload data.
    pub fn texel_size(&self) -> usize {
        texel_size(self.format, self.pixel_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_mip_chain_levels() {
        assert_eq!(full_mip_chain_levels(256, 128), 9);
        assert_eq!(full_mip_chain_levels(128, 256), 9);
        assert_eq!(full_mip_chain_levels(1, 1), 1);
        assert_eq!(full_mip_chain_levels(255, 1), 8);
        assert_eq!(full_mip_chain_levels(1920, 1080), 11);
        assert_eq!(full_mip_chain_levels(0, 0), 1);
    }

    #[test]
    fn test_resolve_levels() {
        assert_eq!(MipmapGeneration::FullChain.resolve_levels(64, 64, 3), 7);
        assert_eq!(MipmapGeneration::CustomLevels.resolve_levels(64, 64, 3), 3);
        assert_eq!(MipmapGeneration::Disabled.resolve_levels(64, 64, 3), 3);
        assert!(!MipmapGeneration::Disabled.generates());
        assert!(MipmapGeneration::CustomLevels.generates());
    }

    #[test]
    fn test_upload_size_respects_row_alignment() {
        // RGB8 rows of 3 pixels are 9 bytes, padded to 12 except the last.
        assert_eq!(upload_size(3, 2, PixelFormat::Rgb, PixelType::UnsignedByte), 21);
        assert_eq!(upload_size(4, 4, PixelFormat::Rgba, PixelType::UnsignedByte), 64);
        assert_eq!(upload_size(2, 2, PixelFormat::Rgba, PixelType::Float), 64);
        assert_eq!(upload_size(0, 4, PixelFormat::Rgba, PixelType::Float), 0);
    }

    #[test]
    fn test_packed_texel_size() {
        assert_eq!(texel_size(PixelFormat::DepthStencil, PixelType::UnsignedInt24_8), 4);
        assert_eq!(texel_size(PixelFormat::Rg, PixelType::HalfFloat), 4);
    }

    #[test]
    fn test_layout_builder_keeps_parameter_order() {
        let layout = TextureLayout::new(
            InternalFormat::Rgba8,
            64,
            32,
            PixelFormat::Rgba,
            PixelType::UnsignedByte,
        )
        .with_filter(TextureFilter::Nearest, TextureFilter::Linear)
        .with_int_parameter(TextureParameter::MinFilter, TextureFilter::Linear.as_raw())
        .with_float_parameter(TextureParameter::MaxAnisotropy, 8.0);

        assert_eq!(layout.depth, 1);
        assert_eq!(layout.levels, 1);
        assert_eq!(layout.int_parameters.len(), 3);
        assert_eq!(layout.int_parameters[0].0, TextureParameter::MinFilter);
        assert_eq!(layout.int_parameters[2].1, gl::LINEAR as i32);
        assert_eq!(layout.float_parameters, vec![(TextureParameter::MaxAnisotropy, 8.0)]);
    }

    #[test]
    fn test_raw_parameter_passthrough() {
        assert_eq!(TextureParameter::Raw(0x1234).as_raw(), 0x1234);
        assert_eq!(TextureParameter::MaxLevel.as_raw(), gl::TEXTURE_MAX_LEVEL);
    }
}
