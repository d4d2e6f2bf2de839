//! Decoder session construction and teardown.
//!
//! A [`DecoderSession`] is the live decode context for one run iteration:
//! the opened video decoder, the hardware device reference it carries, and
//! the negotiated surface format. Sessions are created fresh on every loop
//! pass and never share state with the previous pass.

use ffmpeg_next::{
    Codec,
    codec::{context::Context as CodecContext, threading},
    decoder::Video as VideoDecoder,
    format::Pixel,
};
use ffmpeg_sys_next::AVPixelFormat;

use crate::{
    device::DeviceContext,
    error::PrimeplayError,
    negotiate::{self, SurfaceTarget},
};

/// Fixed decode-thread hint passed to every decoder.
const DECODE_THREADS: usize = 3;

/// One live decode context: codec parameters, hardware device, negotiated
/// surface format, and thread hint, all bound at open time.
pub struct DecoderSession {
    decoder: VideoDecoder,
    surface_format: Pixel,
    // Holds a device reference for the session's lifetime; the codec
    // context keeps its own reference from `attach`.
    _device: DeviceContext,
    // Pointed to by the codec context's opaque field; must outlive the
    // decoder, which drops first by declaration order.
    _surface_target: Box<SurfaceTarget>,
}

impl DecoderSession {
    /// Build and open a decoder session.
    ///
    /// Copies the stream's codec parameters into a fresh context, installs
    /// the surface-format negotiation callback, attaches the hardware
    /// device, sets the decode-thread hint, and opens the codec.
    ///
    /// # Errors
    ///
    /// Any failing step aborts the run: parameter copy surfaces as
    /// [`PrimeplayError::Ffmpeg`], codec open as
    /// [`PrimeplayError::DecoderOpen`].
    pub fn open(
        codec: Codec,
        parameters: ffmpeg_next::codec::Parameters,
        surface_format: Pixel,
        device: DeviceContext,
    ) -> Result<Self, PrimeplayError> {
        let mut context = CodecContext::new_with_codec(codec);
        context.set_parameters(parameters)?;

        let surface_target = Box::new(SurfaceTarget {
            desired: AVPixelFormat::from(surface_format),
        });

        unsafe {
            let raw = context.as_mut_ptr();
            (*raw).opaque = std::ptr::from_ref::<SurfaceTarget>(&*surface_target)
                .cast_mut()
                .cast();
            (*raw).get_format = Some(negotiate::negotiate_pixel_format);
            device.attach(raw);
        }

        context.set_threading(threading::Config::count(DECODE_THREADS));

        // Open with the codec the context was built for. `video()` alone
        // would look up the default decoder for the codec id, and for a
        // named substitute like h264_v4l2m2m that mismatch makes
        // avcodec_open2 reject the context with EINVAL.
        let decoder = context
            .decoder()
            .open_as(codec)
            .map_err(|error| {
                PrimeplayError::DecoderOpen(format!("'{}': {error}", codec.name()))
            })?
            .video()
            .map_err(|error| {
                PrimeplayError::DecoderOpen(format!("'{}': {error}", codec.name()))
            })?;

        log::debug!(
            "Opened decoder session (surface_format={surface_format:?}, threads={DECODE_THREADS})"
        );

        Ok(Self {
            decoder,
            surface_format,
            _device: device,
            _surface_target: surface_target,
        })
    }

    /// The hardware surface format negotiated for this session. Frames
    /// arriving in this format are GPU-resident and need a transfer before
    /// their pixel data can be read on the host.
    pub fn surface_format(&self) -> Pixel {
        self.surface_format
    }

    pub(crate) fn decoder_mut(&mut self) -> &mut VideoDecoder {
        &mut self.decoder
    }
}
