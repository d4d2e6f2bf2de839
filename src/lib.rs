//! # primeplay
//!
//! Hardware-accelerated video decode runner — drive an FFmpeg codec through
//! a hardware device, negotiate a GPU surface format, forward decoded
//! frames to a display sink, and optionally dump their packed planar pixel
//! data to a raw file.
//!
//! `primeplay` wraps the decode-submit/receive control loop of the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) stack: packets are
//! pumped from the demuxer into a decoder session whose frames may live in
//! GPU memory (e.g. DRM PRIME surfaces), and each emitted frame is handed —
//! strictly in decode order — to a [`DisplaySink`] and, when configured,
//! transferred to host memory and appended to an output stream.
//!
//! ## Quick start
//!
//! ```no_run
//! use primeplay::{RunConfig, Runner};
//!
//! let config = RunConfig::new()
//!     .with_loop_count(2)
//!     .with_frame_limit(Some(300))
//!     .with_output("frames.yuv");
//!
//! let report = Runner::new(config).run("input.mp4")?;
//! println!("decoded {} frames over {} passes", report.frames_emitted, report.passes_completed);
//! # Ok::<(), primeplay::PrimeplayError>(())
//! ```
//!
//! ## How a run works
//!
//! 1. The backend name (default `"drm"`) is resolved against the device
//!    types the FFmpeg build supports; an unknown name fails with a
//!    diagnostic listing before the input is even opened.
//! 2. Per pass, the input is opened and probed, the best video stream
//!    located, and a fresh [`DecoderSession`] built: H.264 streams are
//!    routed to the `h264_v4l2m2m` zero-copy decoder with DRM PRIME
//!    surfaces, everything else adopts the surface format the decoder's
//!    hardware configuration advertises for the backend.
//! 3. Packets belonging to the video stream are submitted one at a time;
//!    after each submission the decoder is drained frame by frame until it
//!    reports "no frame available". A final flush drains whatever the
//!    decoder still buffers.
//! 4. A configured frame cutoff stops the run cleanly once reached; the
//!    flush step still runs so the session tears down drained.
//!
//! All control flow is single-threaded and blocking; the only parallelism
//! is inside the decoder itself (a fixed thread hint). Every error is fatal
//! to the current run — the `--loop` repetition is a full fresh run, never
//! a retry.
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on the system, and actual
//! hardware decoding additionally needs a usable accelerator device (e.g.
//! `/dev/dri` for the DRM backend).

pub mod config;
pub mod decode;
pub mod device;
pub mod display;
pub mod error;
pub mod ffmpeg;
pub mod negotiate;
pub mod runner;
pub mod session;
pub mod sink;

pub use config::{FrameLimitScope, RunConfig};
pub use decode::{DecodeLoop, DrainOutcome, FrameBudget};
pub use device::{DeviceContext, available_backends, find_backend};
pub use display::{DisplaySink, NullDisplay};
pub use error::PrimeplayError;
pub use ffmpeg::{FfmpegLogLevel, set_ffmpeg_log_level};
pub use negotiate::{desired_surface_format, select_surface_format};
pub use runner::{RunReport, Runner};
pub use session::DecoderSession;
pub use sink::{FrameSink, packed_image_size};
