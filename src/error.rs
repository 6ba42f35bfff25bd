//! Resource error types.

use thiserror::Error;

use crate::backend::{DeviceError, ErrorCode};

/// Errors returned by the resource wrappers.
///
/// A wrapper that returned a device error may hold partially applied state
/// and should be dropped rather than reused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A device call failed while operating on a texture.
    #[error("Texture2D::{operation} - texture id: {label} - OpenGL error {}", source.code)]
    Texture {
        label: String,
        operation: &'static str,
        #[source]
        source: DeviceError,
    },
    /// A device call failed while operating on a storage buffer.
    #[error("StorageBuffer::{operation} - OpenGL error {}", source.code)]
    Buffer {
        operation: &'static str,
        #[source]
        source: DeviceError,
    },
    /// Arguments were rejected before reaching the device.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl ResourceError {
    /// Raw device error code, if the error came from the device.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Texture { source, .. } | Self::Buffer { source, .. } => Some(source.code),
            Self::InvalidParameter(_) => None,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_texture_error_display() {
        let err = ResourceError::Texture {
            label: "albedo".to_string(),
            operation: "reload",
            source: DeviceError::new("texture_storage_2d", ErrorCode::OUT_OF_MEMORY),
        };
        assert_eq!(
            err.to_string(),
            "Texture2D::reload - texture id: albedo - OpenGL error 1285 (GL_OUT_OF_MEMORY)"
        );
        assert_eq!(err.code(), Some(ErrorCode::OUT_OF_MEMORY));
    }

    #[test]
    fn test_invalid_parameter_has_no_code() {
        let err = ResourceError::InvalidParameter("texture dimensions cannot be zero".into());
        assert_eq!(err.to_string(), "invalid parameter: texture dimensions cannot be zero");
        assert_eq!(err.code(), None);
    }
}
