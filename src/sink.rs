//! Frame sink adapter: display forwarding and raw pixel output.
//!
//! Every decoded frame goes to the display sink unconditionally. When an
//! output stream is configured, the frame's planar pixel data is also
//! packed (1-byte alignment, stride normalized away) and appended to the
//! stream — transferring GPU-resident frames to host memory first. The
//! output is a raw concatenated-frame format: planar pixel bytes, no length
//! prefix, one frame immediately after another.

use std::io::Write;

use ffmpeg_next::{format::Pixel, frame::Video as VideoFrame};
use ffmpeg_sys_next::AVPixelFormat;

use crate::{display::DisplaySink, error::PrimeplayError};

/// Receives every frame the decode loop emits.
///
/// Owns the display sink for the whole process lifetime and borrows the
/// output stream per run (the stream itself is owned by the
/// [`Runner`](crate::Runner), opened before the first pass and closed once
/// after the last).
pub struct FrameSink<'a> {
    display: &'a mut dyn DisplaySink,
    output: Option<&'a mut dyn Write>,
    surface_format: Pixel,
    emitted: u64,
}

impl<'a> FrameSink<'a> {
    /// Create a sink for one run iteration.
    ///
    /// `surface_format` is the session's negotiated hardware format; frames
    /// arriving in it are transferred to host memory before packing.
    pub fn new(
        display: &'a mut dyn DisplaySink,
        output: Option<&'a mut dyn Write>,
        surface_format: Pixel,
    ) -> Self {
        Self {
            display,
            output,
            surface_format,
            emitted: 0,
        }
    }

    /// Number of frames emitted through this sink.
    pub fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Forward one decoded frame to the display and, if configured, append
    /// its packed pixel data to the output stream.
    ///
    /// # Errors
    ///
    /// - [`PrimeplayError::Transfer`] if the GPU-to-host transfer fails.
    /// - [`PrimeplayError::OutOfMemory`] if the packed buffer cannot be
    ///   allocated.
    /// - [`PrimeplayError::OutputWrite`] if the stream write fails.
    pub fn emit(&mut self, frame: &VideoFrame) -> Result<(), PrimeplayError> {
        self.display.display(frame);
        self.emitted += 1;

        let Some(output) = self.output.as_mut() else {
            return Ok(());
        };

        // GPU-resident frames carry a surface handle, not pixel data; pull
        // them into host memory first. Host-resident frames are used as-is.
        let host_frame;
        let source = if frame.format() == self.surface_format {
            host_frame = transfer_to_host(frame)?;
            &host_frame
        } else {
            frame
        };

        let packed = pack_frame(source)?;
        output.write_all(&packed)?;

        Ok(())
    }
}

/// Transfer a GPU-resident frame into a new host-memory frame.
pub(crate) fn transfer_to_host(frame: &VideoFrame) -> Result<VideoFrame, PrimeplayError> {
    let mut host_frame = VideoFrame::empty();

    let result = unsafe {
        ffmpeg_sys_next::av_hwframe_transfer_data(host_frame.as_mut_ptr(), frame.as_ptr(), 0)
    };

    if result < 0 {
        return Err(PrimeplayError::Transfer(format!(
            "av_hwframe_transfer_data failed (result={result})"
        )));
    }

    Ok(host_frame)
}

/// Exact byte size of a frame packed with 1-byte alignment, where stride
/// equals width times pixel size.
pub fn packed_image_size(format: Pixel, width: u32, height: u32) -> Result<usize, PrimeplayError> {
    let size = unsafe {
        ffmpeg_sys_next::av_image_get_buffer_size(
            AVPixelFormat::from(format),
            width as i32,
            height as i32,
            1,
        )
    };

    if size < 0 {
        return Err(PrimeplayError::Ffmpeg(format!(
            "av_image_get_buffer_size failed for {format:?} {width}x{height} (result={size})"
        )));
    }

    Ok(size as usize)
}

/// Copy a host-resident frame's planes into a packed buffer.
///
/// De-interleaves whatever row padding the decoder used: the result has no
/// stride, making it suitable for sequential raw file output.
fn pack_frame(frame: &VideoFrame) -> Result<Vec<u8>, PrimeplayError> {
    let size = packed_image_size(frame.format(), frame.width(), frame.height())?;

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| PrimeplayError::OutOfMemory)?;
    buffer.resize(size, 0);

    let result = unsafe {
        let raw = frame.as_ptr();
        ffmpeg_sys_next::av_image_copy_to_buffer(
            buffer.as_mut_ptr(),
            size as i32,
            (*raw).data.as_ptr() as *const *const u8,
            (*raw).linesize.as_ptr(),
            AVPixelFormat::from(frame.format()),
            frame.width() as i32,
            frame.height() as i32,
            1,
        )
    };

    if result < 0 {
        return Err(PrimeplayError::Ffmpeg(format!(
            "av_image_copy_to_buffer failed (result={result})"
        )));
    }

    Ok(buffer)
}
