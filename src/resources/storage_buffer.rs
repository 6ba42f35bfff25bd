//! Shader storage buffer resource.

use std::ops::Deref;
use std::ptr::NonNull;
use std::rc::Rc;

use bytemuck::Pod;

use crate::backend::{BufferHandle, BufferUsageHint, DeviceError, DummyDevice, GlDevice};
use crate::error::{ResourceError, ResourceResult};

/// A shader storage buffer owning one device buffer object.
///
/// Storage is allocated with a dynamic usage hint. The buffer is bound to an
/// indexed storage slot only while it is being (re)allocated; call
/// [`StorageBuffer::bind`] to attach it for a dispatch.
pub struct StorageBuffer<D: GlDevice> {
    device: Rc<D>,
    handle: BufferHandle,
    size: usize,
}

impl<D: GlDevice> StorageBuffer<D> {
    /// Create a buffer of `size` bytes, optionally initialised from `data`.
    ///
    /// The buffer is temporarily bound to slot 0. Bytes past the end of
    /// `data` have unspecified contents.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidParameter`] if `data` is longer than
    /// `size`, and [`ResourceError::Buffer`] if the device rejects the
    /// allocation.
    pub fn new(device: Rc<D>, size: usize, data: Option<&[u8]>) -> ResourceResult<Self> {
        check_data(size, data)?;

        let handle = device
            .create_buffer()
            .map_err(|err| buffer_error("new", err))?;
        let buffer = Self {
            device,
            handle,
            size,
        };
        buffer.specify(0, data, "new")?;

        log::trace!("StorageBuffer: created {} ({size} bytes)", handle.raw());
        Ok(buffer)
    }

    /// Create a buffer holding a copy of `items`.
    pub fn from_slice<T: Pod>(device: Rc<D>, items: &[T]) -> ResourceResult<Self> {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        Self::new(device, bytes.len(), Some(bytes))
    }

    /// Replace the buffer storage, using slot `index` for the upload.
    ///
    /// The previous contents are discarded. The reported size is updated
    /// even if the device rejects the allocation.
    pub fn reload(&mut self, size: usize, index: u32, data: Option<&[u8]>) -> ResourceResult<()> {
        check_data(size, data)?;
        self.size = size;
        self.specify(index, data, "reload")?;
        log::trace!(
            "StorageBuffer: reloaded {} ({size} bytes)",
            self.handle.raw()
        );
        Ok(())
    }

    /// Attach the buffer to shader storage slot `index`.
    pub fn bind(&self, index: u32) {
        self.device.bind_buffer_base(index, Some(self.handle));
    }

    /// Map the whole buffer for host reads.
    ///
    /// Returns `None` if the buffer is empty or the device could not map it.
    /// A failed map clears the device error flag. The mapping is released
    /// when the returned guard is dropped.
    pub fn map(&mut self) -> Option<BufferMapping<'_, D>> {
        if self.size == 0 {
            return None;
        }
        let Some(ptr) = self.device.map_buffer_read_only(self.handle, self.size) else {
            // A refused map can leave the sticky flag set.
            let code = self.device.poll_error();
            log::warn!(
                "StorageBuffer: failed to map {} ({} bytes, error {code})",
                self.handle.raw(),
                self.size
            );
            return None;
        };
        Some(BufferMapping {
            buffer: self,
            ptr,
        })
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn handle(&self) -> BufferHandle {
        self.handle
    }

    fn specify(&self, index: u32, data: Option<&[u8]>, operation: &'static str) -> ResourceResult<()> {
        self.device.bind_buffer_base(index, Some(self.handle));
        let specified = self
            .device
            .buffer_data(self.size, data, BufferUsageHint::DynamicDraw);
        self.device.bind_buffer_base(index, None);
        specified.map_err(|err| buffer_error(operation, err))?;

        let code = self.device.poll_error();
        if !code.is_clear() {
            return Err(buffer_error(operation, DeviceError::new("poll_error", code)));
        }
        Ok(())
    }
}

impl<D: GlDevice> Drop for StorageBuffer<D> {
    fn drop(&mut self) {
        self.device.delete_buffer(self.handle);
        log::trace!("StorageBuffer: released {}", self.handle.raw());
    }
}

impl<D: GlDevice> std::fmt::Debug for StorageBuffer<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageBuffer")
            .field("handle", &self.handle)
            .field("size", &self.size)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(StorageBuffer<DummyDevice>: Clone, Send, Sync);

/// Read-only view of a mapped [`StorageBuffer`].
///
/// Holding the mapping borrows the buffer, so it cannot be reloaded or
/// mapped again until the mapping is dropped.
pub struct BufferMapping<'a, D: GlDevice> {
    buffer: &'a StorageBuffer<D>,
    ptr: NonNull<u8>,
}

impl<D: GlDevice> BufferMapping<'_, D> {
    /// Copy the mapped bytes out as a vector of `T`.
    ///
    /// Trailing bytes that do not fill a whole `T` are ignored.
    pub fn to_vec_of<T: Pod>(&self) -> Vec<T> {
        let stride = std::mem::size_of::<T>();
        if stride == 0 {
            return Vec::new();
        }
        self.chunks_exact(stride)
            .map(bytemuck::pod_read_unaligned)
            .collect()
    }

    /// Release the mapping.
    pub fn unmap(self) {}
}

impl<D: GlDevice> Deref for BufferMapping<'_, D> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: `GlDevice` implementors guarantee the pointer stays readable
        // for `size` bytes until unmapped, and the shared borrow of the buffer
        // keeps it from being reallocated or deleted meanwhile.
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.buffer.size) }
    }
}

impl<D: GlDevice> Drop for BufferMapping<'_, D> {
    fn drop(&mut self) {
        self.buffer.device.unmap_buffer(self.buffer.handle);
    }
}

fn check_data(size: usize, data: Option<&[u8]>) -> ResourceResult<()> {
    match data {
        Some(data) if data.len() > size => Err(ResourceError::InvalidParameter(format!(
            "buffer data is {} bytes, storage is {size}",
            data.len()
        ))),
        _ => Ok(()),
    }
}

fn buffer_error(operation: &'static str, source: DeviceError) -> ResourceError {
    log::error!("StorageBuffer: {operation} failed: {source}");
    ResourceError::Buffer { operation, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{DeviceCall, ErrorCode};

    #[test]
    fn test_storage_buffer_debug() {
        let device = Rc::new(DummyDevice::new());
        let buffer = StorageBuffer::new(device, 1024, None).unwrap();
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("StorageBuffer"));
        assert!(debug.contains("1024"));
    }

    #[test]
    fn test_data_longer_than_size_is_rejected() {
        let device = Rc::new(DummyDevice::new());
        let err = StorageBuffer::new(device.clone(), 2, Some(&[1u8, 2, 3][..])).unwrap_err();
        assert!(matches!(err, ResourceError::InvalidParameter(_)));
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_creation_leaves_slot_zero_unbound() {
        let device = Rc::new(DummyDevice::new());
        let _buffer = StorageBuffer::new(device.clone(), 16, None).unwrap();
        assert_eq!(device.storage_slot(0), None);
    }

    #[test]
    fn test_empty_buffer_is_never_mapped() {
        let device = Rc::new(DummyDevice::new());
        let mut buffer = StorageBuffer::new(device.clone(), 0, None).unwrap();
        assert!(buffer.map().is_none());
        assert_eq!(
            device.count_calls(|c| matches!(c, DeviceCall::MapBuffer(_))),
            0
        );
    }

    #[test]
    fn test_mapping_reads_typed_values() {
        let device = Rc::new(DummyDevice::new());
        let values = [1u32, 2, 0xdead_beef];
        let mut buffer = StorageBuffer::from_slice(device, &values).unwrap();
        let mapping = buffer.map().unwrap();
        assert_eq!(mapping.len(), 12);
        assert_eq!(mapping.to_vec_of::<u32>(), values);
    }

    #[test]
    fn test_failed_allocation_reports_buffer_error() {
        let device = Rc::new(DummyDevice::new());
        device.fail_next("buffer_data", ErrorCode::OUT_OF_MEMORY);
        let err = StorageBuffer::new(device.clone(), 64, None).unwrap_err();
        assert_eq!(err.code(), Some(ErrorCode::OUT_OF_MEMORY));
        assert!(device.live_buffers().is_empty());
        assert_eq!(device.storage_slot(0), None);
    }
}
