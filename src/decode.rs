//! The packet-submit / frame-drain state machine.
//!
//! One [`DecodeLoop`] exists per run iteration. Each submitted packet is
//! followed by a drain that pulls frames one at a time, handing each to the
//! frame sink synchronously before retrieving the next — frames are emitted
//! in strict decode order, never buffered ahead or reordered.

use ffmpeg_next::{Error as FfmpegError, Packet, frame::Video as VideoFrame, util::error::EAGAIN};

use crate::{error::PrimeplayError, session::DecoderSession, sink::FrameSink};

/// Why a drain returned control to the caller.
///
/// The cutoff case is deliberately distinguishable from decoder exhaustion:
/// "policy told us to stop" and "decoder is done" are different facts, even
/// though the run controller treats both as a clean unwind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// The decoder has no frame available right now; feed it the next
    /// packet.
    NeedMore,
    /// End of stream: the flush sequence is complete.
    Flushed,
    /// The frame-count cutoff was reached; stop submitting packets for this
    /// run.
    LimitReached,
}

/// Decrement-to-zero frame cutoff. `None` is unlimited.
///
/// "Unlimited", "exactly N remaining", and "exhausted" are all
/// distinguishable states; the budget is checked before each emit, so a
/// cutoff of 0 emits no frames at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameBudget {
    remaining: Option<u64>,
}

impl FrameBudget {
    /// A budget permitting exactly `limit` emitted frames, or unlimited
    /// when `limit` is `None`.
    pub fn new(limit: Option<u64>) -> Self {
        Self { remaining: limit }
    }

    /// An unlimited budget.
    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    /// True once no further frame may be emitted.
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Record one emitted frame.
    pub fn consume(&mut self) {
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
    }

    /// Frames still permitted, or `None` for unlimited.
    pub fn remaining(&self) -> Option<u64> {
        self.remaining
    }
}

/// Feeds compressed packets to a decoder session and drains decoded frames
/// into a frame sink, consuming the frame budget as it goes.
pub struct DecodeLoop<'a, 'b> {
    session: &'a mut DecoderSession,
    sink: &'a mut FrameSink<'b>,
    budget: &'a mut FrameBudget,
}

impl<'a, 'b> DecodeLoop<'a, 'b> {
    pub fn new(
        session: &'a mut DecoderSession,
        sink: &'a mut FrameSink<'b>,
        budget: &'a mut FrameBudget,
    ) -> Self {
        Self {
            session,
            sink,
            budget,
        }
    }

    /// Submit one compressed packet, then drain whatever frames it made
    /// available.
    ///
    /// # Errors
    ///
    /// [`PrimeplayError::Submit`] if the decoder rejects the packet (e.g.
    /// it is already in an error state), or any error from the drain.
    pub fn submit(&mut self, packet: &Packet) -> Result<DrainOutcome, PrimeplayError> {
        self.session
            .decoder_mut()
            .send_packet(packet)
            .map_err(|error| PrimeplayError::Submit(error.to_string()))?;
        self.drain()
    }

    /// Signal end-of-input and drain every frame still buffered inside the
    /// decoder.
    ///
    /// Returns [`DrainOutcome::Flushed`] once the decoder reports end of
    /// stream, or [`DrainOutcome::LimitReached`] if the cutoff was already
    /// exhausted.
    pub fn flush(&mut self) -> Result<DrainOutcome, PrimeplayError> {
        self.session
            .decoder_mut()
            .send_eof()
            .map_err(|error| PrimeplayError::Submit(error.to_string()))?;
        self.drain()
    }

    /// Retrieve frames one at a time until the decoder has nothing more,
    /// the stream ends, or the budget runs out.
    ///
    /// Each frame is owned by this function for exactly one iteration and
    /// released when the loop advances, on every exit path.
    fn drain(&mut self) -> Result<DrainOutcome, PrimeplayError> {
        loop {
            if self.budget.is_exhausted() {
                return Ok(DrainOutcome::LimitReached);
            }

            let mut frame = VideoFrame::empty();
            match self.session.decoder_mut().receive_frame(&mut frame) {
                Ok(()) => {
                    self.sink.emit(&frame)?;
                    self.budget.consume();
                }
                Err(FfmpegError::Other { errno: EAGAIN }) => return Ok(DrainOutcome::NeedMore),
                Err(FfmpegError::Eof) => return Ok(DrainOutcome::Flushed),
                Err(error) => return Err(PrimeplayError::Decode(error.to_string())),
            }
        }
    }
}
