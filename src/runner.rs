//! Run orchestration: open input, decode to exhaustion, flush, repeat.
//!
//! A [`Runner`] owns the three deliberately process-wide resources — the
//! display sink, the raw output stream, and (in process scope) the frame
//! budget — and constructs everything else fresh on every loop pass. Each
//! pass re-opens and re-probes the input; no decoder state crosses pass
//! boundaries.

use std::{fs::File, io::Write, path::Path};

use ffmpeg_next::{
    Codec, codec,
    format::{self, Pixel},
    media::Type,
};
use ffmpeg_sys_next::AVHWDeviceType;

use crate::{
    config::{FrameLimitScope, RunConfig},
    decode::{DecodeLoop, DrainOutcome, FrameBudget},
    device::{self, DeviceContext},
    display::{DisplaySink, NullDisplay},
    error::PrimeplayError,
    negotiate,
    session::DecoderSession,
    sink::FrameSink,
};

/// The stateful V4L2 decoder that delivers zero-copy DRM PRIME surfaces
/// for H.264, substituted for the probed decoder when the stream is H.264.
const ZERO_COPY_H264_DECODER: &str = "h264_v4l2m2m";

/// What a completed run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Total frames emitted to the display sink across all passes.
    pub frames_emitted: u64,
    /// Number of full decode passes that ran to completion.
    pub passes_completed: u32,
}

/// Orchestrates one or more full decode passes over an input file.
///
/// # Example
///
/// ```no_run
/// use primeplay::{RunConfig, Runner};
///
/// let config = RunConfig::new().with_frame_limit(Some(100)).with_output("dump.yuv");
/// let report = Runner::new(config).run("input.mp4")?;
/// println!("emitted {} frames", report.frames_emitted);
/// # Ok::<(), primeplay::PrimeplayError>(())
/// ```
pub struct Runner {
    config: RunConfig,
    display: Box<dyn DisplaySink>,
}

impl Runner {
    /// Create a runner with a [`NullDisplay`] sink.
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            display: Box::new(NullDisplay::open()),
        }
    }

    /// Replace the display sink the decode loop forwards frames to.
    #[must_use]
    pub fn with_display(mut self, display: Box<dyn DisplaySink>) -> Self {
        self.display = display;
        self
    }

    /// Execute the configured number of full decode passes over
    /// `input_path`.
    ///
    /// The backend is resolved and the output file opened before the first
    /// pass; both are shared by every pass and released once at the end.
    /// A fatal error on any pass aborts the remaining passes.
    ///
    /// # Errors
    ///
    /// Every [`PrimeplayError`] is fatal; see the variant documentation for
    /// the step each belongs to.
    pub fn run(&mut self, input_path: impl AsRef<Path>) -> Result<RunReport, PrimeplayError> {
        let input_path = input_path.as_ref();

        ffmpeg_next::init()?;

        // Resolve the backend before touching the input, so an unsupported
        // name fails with the full diagnostic listing and nothing opened.
        let backend =
            device::find_backend(&self.config.backend).ok_or_else(|| {
                PrimeplayError::BackendNotFound {
                    name: self.config.backend.clone(),
                    available: device::available_backends(),
                }
            })?;

        let mut output = match &self.config.output {
            Some(path) => Some(File::create(path)?),
            None => None,
        };

        let mut budget = FrameBudget::new(self.config.frame_limit);
        let mut report = RunReport::default();

        for pass in 1..=self.config.passes() {
            if self.config.limit_scope == FrameLimitScope::PerRun {
                budget = FrameBudget::new(self.config.frame_limit);
            }

            let emitted = run_pass(
                input_path,
                backend,
                self.display.as_mut(),
                output.as_mut(),
                &mut budget,
            )?;

            report.frames_emitted += emitted;
            report.passes_completed = pass;
            log::info!(
                "Completed decode pass {pass}/{} ({emitted} frames)",
                self.config.passes()
            );
        }

        if let Some(file) = output.as_mut() {
            file.flush()?;
        }
        self.display.close();

        Ok(report)
    }
}

/// One full decode pass: open, probe, build a session, pump packets, flush,
/// tear down.
fn run_pass(
    input_path: &Path,
    backend: AVHWDeviceType,
    display: &mut dyn DisplaySink,
    output: Option<&mut File>,
    budget: &mut FrameBudget,
) -> Result<u64, PrimeplayError> {
    let mut input =
        format::input(&input_path).map_err(|error| PrimeplayError::InputOpen {
            path: input_path.to_path_buf(),
            reason: error.to_string(),
        })?;

    if input.streams().count() == 0 {
        return Err(PrimeplayError::StreamProbe(format!(
            "no streams in {}",
            input_path.display()
        )));
    }

    let (stream_index, parameters) = {
        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(PrimeplayError::NoVideoStream)?;
        (stream.index(), stream.parameters())
    };

    let (decoder_codec, surface_format) = select_decoder(parameters.id(), backend)?;

    log::debug!(
        "Decoding stream #{stream_index} with '{}' (surface_format={surface_format:?})",
        decoder_codec.name()
    );

    let hardware_device = DeviceContext::create(backend)?;
    let mut session = DecoderSession::open(decoder_codec, parameters, surface_format, hardware_device)?;

    let mut sink = FrameSink::new(
        display,
        output.map(|file| file as &mut dyn Write),
        session.surface_format(),
    );

    {
        let mut decode_loop = DecodeLoop::new(&mut session, &mut sink, budget);

        for (stream, packet) in input.packets() {
            if stream.index() != stream_index {
                continue;
            }
            if decode_loop.submit(&packet)? == DrainOutcome::LimitReached {
                break;
            }
        }

        // Flush even when the cutoff stopped the packet loop early; the
        // decoder is torn down drained either way.
        decode_loop.flush()?;
    }

    Ok(sink.emitted())
}

/// Pick the decoder and target surface format for a stream's codec id.
///
/// H.264 goes through the stateful V4L2 decoder, which hands out DRM PRIME
/// surfaces directly. Everything else keeps the probed decoder and adopts
/// the surface format its hardware config advertises for the active
/// backend.
fn select_decoder(
    codec_id: codec::Id,
    backend: AVHWDeviceType,
) -> Result<(Codec, Pixel), PrimeplayError> {
    if codec_id == codec::Id::H264 {
        let decoder_codec = codec::decoder::find_by_name(ZERO_COPY_H264_DECODER)
            .ok_or_else(|| PrimeplayError::DecoderNotFound(ZERO_COPY_H264_DECODER.to_string()))?;
        return Ok((decoder_codec, Pixel::DRM_PRIME));
    }

    let decoder_codec = codec::decoder::find(codec_id)
        .ok_or_else(|| PrimeplayError::DecoderNotFound(format!("{codec_id:?}")))?;
    let surface_format = negotiate::desired_surface_format(&decoder_codec, backend)?;
    Ok((decoder_codec, surface_format))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn h264_selects_the_named_zero_copy_decoder() {
        ffmpeg_next::init().ok();
        match select_decoder(codec::Id::H264, AVHWDeviceType::AV_HWDEVICE_TYPE_DRM) {
            Ok((decoder_codec, surface_format)) => {
                assert_eq!(decoder_codec.name(), ZERO_COPY_H264_DECODER);
                assert_eq!(surface_format, Pixel::DRM_PRIME);
            }
            // Builds without the V4L2 decoder must say which decoder is
            // missing rather than fall back to the default one.
            Err(PrimeplayError::DecoderNotFound(name)) => {
                assert_eq!(name, ZERO_COPY_H264_DECODER);
            }
            Err(other) => panic!("unexpected selection error: {other}"),
        }
    }

    #[test]
    fn unknown_codec_id_reports_decoder_not_found() {
        ffmpeg_next::init().ok();
        let result = select_decoder(codec::Id::None, AVHWDeviceType::AV_HWDEVICE_TYPE_DRM);
        assert!(matches!(result, Err(PrimeplayError::DecoderNotFound(_))));
    }
}
