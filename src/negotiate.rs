//! Hardware surface format negotiation.
//!
//! When a decoder is opened with a hardware device attached, libavcodec asks
//! which pixel format it should deliver frames in by invoking the codec
//! context's `get_format` callback with the list of formats it is willing to
//! offer. This module provides the selection logic as a plain function over
//! slices ([`select_surface_format`]), the `extern "C"` shim that bridges it
//! into libavcodec ([`negotiate_pixel_format`]), and the session-setup query
//! that decides which format to ask for in the first place
//! ([`desired_surface_format`]).

use ffmpeg_next::{Codec, format::Pixel};
use ffmpeg_sys_next::{
    AV_CODEC_HW_CONFIG_METHOD_HW_DEVICE_CTX, AVCodecContext, AVHWDeviceType, AVPixelFormat,
};

use crate::{device, error::PrimeplayError};

/// The surface format a decoder session has agreed to deliver frames in.
///
/// Boxed and pointed to by the codec context's `opaque` field so the
/// `get_format` callback can read it. The session keeps the box alive for
/// at least as long as the decoder.
pub(crate) struct SurfaceTarget {
    pub(crate) desired: AVPixelFormat,
}

/// Pick the hardware surface format from the list a decoder offers.
///
/// Scans `offered` in order and returns the first entry equal to `desired`.
/// Returns `None` when the decoder does not offer the desired format — the
/// session cannot proceed without an agreed format, so the caller must treat
/// this as fatal.
pub fn select_surface_format(
    offered: &[AVPixelFormat],
    desired: AVPixelFormat,
) -> Option<AVPixelFormat> {
    offered.iter().copied().find(|&format| format == desired)
}

/// `get_format` callback installed on every decoder session.
///
/// Reads the desired format from the context's `opaque` pointer (a
/// [`SurfaceTarget`] owned by the session) and delegates to
/// [`select_surface_format`]. A failed negotiation is logged here and
/// reported to libavcodec as `AV_PIX_FMT_NONE`; the decoder then fails the
/// current open/decode call, which the session surfaces as a decode error.
pub(crate) unsafe extern "C" fn negotiate_pixel_format(
    context: *mut AVCodecContext,
    mut offered: *const AVPixelFormat,
) -> AVPixelFormat {
    let target = unsafe { (*context).opaque } as *const SurfaceTarget;
    if target.is_null() {
        log::error!("Surface format negotiation invoked without a target format");
        return AVPixelFormat::AV_PIX_FMT_NONE;
    }
    let desired = unsafe { (*target).desired };

    let mut formats = Vec::new();
    unsafe {
        while *offered != AVPixelFormat::AV_PIX_FMT_NONE {
            formats.push(*offered);
            offered = offered.add(1);
        }
    }

    match select_surface_format(&formats, desired) {
        Some(format) => format,
        None => {
            log::error!(
                "Failed to negotiate hardware surface format: decoder did not offer {desired:?}"
            );
            AVPixelFormat::AV_PIX_FMT_NONE
        }
    }
}

/// Determine the surface format a decoder will deliver for a backend.
///
/// Scans the decoder's advertised hardware configurations for an entry
/// whose device-context method matches `device_type` and adopts its pixel
/// format.
///
/// # Errors
///
/// Returns [`PrimeplayError::UnsupportedHardwareConfig`] when no entry
/// matches — the decoder cannot produce hardware frames for this backend.
pub fn desired_surface_format(
    codec: &Codec,
    device_type: AVHWDeviceType,
) -> Result<Pixel, PrimeplayError> {
    let mut index = 0;

    loop {
        let config = unsafe { ffmpeg_sys_next::avcodec_get_hw_config(codec.as_ptr(), index) };
        if config.is_null() {
            return Err(PrimeplayError::UnsupportedHardwareConfig {
                decoder: codec.name().to_string(),
                backend: device::backend_name(device_type)
                    .unwrap_or_else(|| "unknown".to_string()),
            });
        }

        let methods = unsafe { (*config).methods };
        let config_device_type = unsafe { (*config).device_type };
        if methods & (AV_CODEC_HW_CONFIG_METHOD_HW_DEVICE_CTX as i32) != 0
            && config_device_type == device_type
        {
            let pix_fmt = unsafe { (*config).pix_fmt };
            return Ok(Pixel::from(pix_fmt));
        }

        index += 1;
    }
}
