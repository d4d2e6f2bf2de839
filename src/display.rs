//! Display sink collaborator contract.
//!
//! The decode loop forwards every frame to a display sink. The sink is an
//! opaque collaborator: it takes frames fire-and-forget and is responsible
//! for its own buffering and synchronization. Opening a sink is the
//! implementation's constructor; [`close`](DisplaySink::close) is called
//! once after the final loop pass.

use ffmpeg_next::frame::Video as VideoFrame;

/// A consumer of decoded frames, typically a scan-out or preview window.
///
/// `display` must not block on vertical sync or similar long waits in ways
/// that stall the decode loop indefinitely; whatever pacing the sink needs
/// is its own concern.
pub trait DisplaySink {
    /// Present a frame. Fire-and-forget: failures are the sink's problem
    /// and must not abort the decode run.
    fn display(&mut self, frame: &VideoFrame);

    /// Release the sink's resources. Called once, after all loop passes.
    fn close(&mut self) {}
}

/// A sink that discards frames, logging them at debug level.
///
/// Used when no real display is wired up, and as the default sink of a
/// [`Runner`](crate::Runner).
#[derive(Debug, Default)]
pub struct NullDisplay {
    presented: u64,
}

impl NullDisplay {
    /// Open a null display. Never fails.
    pub fn open() -> Self {
        Self::default()
    }

    /// Number of frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl DisplaySink for NullDisplay {
    fn display(&mut self, frame: &VideoFrame) {
        self.presented += 1;
        log::debug!(
            "Discarding frame {} ({}x{}, format={:?})",
            self.presented,
            frame.width(),
            frame.height(),
            frame.format()
        );
    }

    fn close(&mut self) {
        log::debug!("Null display closed after {} frames", self.presented);
    }
}
