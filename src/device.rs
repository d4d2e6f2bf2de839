//! Hardware device context ownership and backend lookup.
//!
//! A [`DeviceContext`] owns exactly one FFmpeg hardware device handle
//! (`AVBufferRef`) for a named accelerator backend. The handle is attached
//! to a decoder session at setup time and released when the context drops;
//! releasing an already-cleared handle is a no-op, so the drop is safe even
//! after the decoder has taken its own reference.

use std::ffi::{CStr, CString};

use ffmpeg_sys_next::{AVBufferRef, AVCodecContext, AVHWDeviceType};

use crate::error::PrimeplayError;

/// Resolve a backend name (e.g. `"drm"`, `"vaapi"`, `"cuda"`) against the
/// device types the FFmpeg build supports.
///
/// Returns `None` when the name is unknown — use [`available_backends`] to
/// build the diagnostic listing in that case.
pub fn find_backend(name: &str) -> Option<AVHWDeviceType> {
    let c_name = CString::new(name).ok()?;
    let device_type = unsafe { ffmpeg_sys_next::av_hwdevice_find_type_by_name(c_name.as_ptr()) };

    if device_type == AVHWDeviceType::AV_HWDEVICE_TYPE_NONE {
        None
    } else {
        Some(device_type)
    }
}

/// List the names of all hardware device types the FFmpeg build supports.
pub fn available_backends() -> Vec<String> {
    let mut names = Vec::new();
    let mut device_type = AVHWDeviceType::AV_HWDEVICE_TYPE_NONE;

    loop {
        device_type = unsafe { ffmpeg_sys_next::av_hwdevice_iterate_types(device_type) };
        if device_type == AVHWDeviceType::AV_HWDEVICE_TYPE_NONE {
            break;
        }
        if let Some(name) = backend_name(device_type) {
            names.push(name);
        }
    }

    names
}

/// Human-readable name for a device type, as FFmpeg reports it.
pub fn backend_name(device_type: AVHWDeviceType) -> Option<String> {
    let name_pointer = unsafe { ffmpeg_sys_next::av_hwdevice_get_type_name(device_type) };
    if name_pointer.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(name_pointer) }
            .to_string_lossy()
            .into_owned(),
    )
}

/// An owned hardware device handle for one accelerator backend.
///
/// Created once per decoder session. The decoder holds its own reference
/// after [`attach`](DeviceContext::attach), so dropping the context after
/// session teardown only releases this side's reference.
pub struct DeviceContext {
    raw: *mut AVBufferRef,
    device_type: AVHWDeviceType,
}

impl DeviceContext {
    /// Create a hardware device for the given backend type.
    ///
    /// # Errors
    ///
    /// Returns [`PrimeplayError::DeviceInit`] when the device cannot be
    /// created (missing driver, permission, unsupported hardware). This is
    /// fatal to the run; it is not retried.
    pub fn create(device_type: AVHWDeviceType) -> Result<Self, PrimeplayError> {
        let mut raw: *mut AVBufferRef = std::ptr::null_mut();

        let result = unsafe {
            ffmpeg_sys_next::av_hwdevice_ctx_create(
                &mut raw,
                device_type,
                std::ptr::null(),
                std::ptr::null_mut(),
                0,
            )
        };

        if result < 0 {
            return Err(PrimeplayError::DeviceInit {
                backend: backend_name(device_type).unwrap_or_else(|| "unknown".to_string()),
                reason: format!("av_hwdevice_ctx_create failed (result={result})"),
            });
        }

        log::debug!(
            "Created hardware device context (backend={})",
            backend_name(device_type).unwrap_or_else(|| "unknown".to_string())
        );

        Ok(Self { raw, device_type })
    }

    /// The backend type this device was created for.
    pub fn device_type(&self) -> AVHWDeviceType {
        self.device_type
    }

    /// Attach a new reference to this device on a codec context.
    ///
    /// The codec context ends up owning its own `AVBufferRef`, released by
    /// libavcodec when the context is freed.
    ///
    /// # Safety
    ///
    /// `codec_context` must point to a live, not-yet-opened `AVCodecContext`.
    pub(crate) unsafe fn attach(&self, codec_context: *mut AVCodecContext) {
        unsafe {
            (*codec_context).hw_device_ctx = ffmpeg_sys_next::av_buffer_ref(self.raw);
        }
    }
}

impl Drop for DeviceContext {
    fn drop(&mut self) {
        // av_buffer_unref tolerates an already-cleared pointer and nulls it,
        // so a second drop-path release stays a no-op.
        if !self.raw.is_null() {
            unsafe {
                ffmpeg_sys_next::av_buffer_unref(&mut self.raw);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_backend_is_none() {
        assert!(find_backend("definitely-not-a-backend").is_none());
        assert!(find_backend("").is_none());
    }

    #[test]
    fn available_backends_does_not_panic() {
        let backends = available_backends();
        // The list depends on the FFmpeg build; each entry must be non-empty.
        for name in &backends {
            assert!(!name.is_empty());
        }
    }

    #[test]
    fn known_backends_round_trip_through_names() {
        for name in available_backends() {
            let device_type = find_backend(&name).expect("listed backend should resolve");
            assert_eq!(backend_name(device_type).as_deref(), Some(name.as_str()));
        }
    }
}
