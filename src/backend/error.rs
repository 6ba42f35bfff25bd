//! Device error types.

use thiserror::Error;

use super::types::gl;

/// Raw value of the device's sticky error flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    /// The "no error" value.
    pub const NO_ERROR: Self = Self(gl::NO_ERROR);
    pub const INVALID_ENUM: Self = Self(gl::INVALID_ENUM);
    pub const INVALID_VALUE: Self = Self(gl::INVALID_VALUE);
    pub const INVALID_OPERATION: Self = Self(gl::INVALID_OPERATION);
    pub const OUT_OF_MEMORY: Self = Self(gl::OUT_OF_MEMORY);
    pub const INVALID_FRAMEBUFFER_OPERATION: Self = Self(gl::INVALID_FRAMEBUFFER_OPERATION);

    /// Returns true if this code means the error flag was clear.
    pub fn is_clear(self) -> bool {
        self == Self::NO_ERROR
    }

    /// Symbolic name of the code, if it is one of the core error values.
    pub fn name(self) -> Option<&'static str> {
        match self.0 {
            gl::NO_ERROR => Some("GL_NO_ERROR"),
            gl::INVALID_ENUM => Some("GL_INVALID_ENUM"),
            gl::INVALID_VALUE => Some("GL_INVALID_VALUE"),
            gl::INVALID_OPERATION => Some("GL_INVALID_OPERATION"),
            gl::OUT_OF_MEMORY => Some("GL_OUT_OF_MEMORY"),
            gl::INVALID_FRAMEBUFFER_OPERATION => Some("GL_INVALID_FRAMEBUFFER_OPERATION"),
            _ => None,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{} ({name})", self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

/// A failed device call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{call} failed with OpenGL error {code}")]
pub struct DeviceError {
    /// Name of the device call that raised the error.
    pub call: &'static str,
    /// Raw error code read from the device.
    pub code: ErrorCode,
}

impl DeviceError {
    pub fn new(call: &'static str, code: ErrorCode) -> Self {
        Self { call, code }
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_display() {
        assert_eq!(ErrorCode::OUT_OF_MEMORY.to_string(), "1285 (GL_OUT_OF_MEMORY)");
        assert_eq!(ErrorCode(7).to_string(), "7");
        assert!(ErrorCode::NO_ERROR.is_clear());
        assert!(!ErrorCode::INVALID_VALUE.is_clear());
    }

    #[test]
    fn test_device_error_display() {
        let err = DeviceError::new("texture_storage_2d", ErrorCode::INVALID_VALUE);
        assert_eq!(
            err.to_string(),
            "texture_storage_2d failed with OpenGL error 1281 (GL_INVALID_VALUE)"
        );
    }
}
