//! Error types for the `primeplay` crate.
//!
//! This module defines [`PrimeplayError`], the unified error type returned by
//! all fallible operations in the crate. Every error here is fatal to the
//! current decode run — nothing is retried internally. The only retry-like
//! behavior in the crate is the `--loop` repetition, which is a full fresh
//! run, not a retry of a failed step.

use std::{io::Error as IoError, path::PathBuf};

use ffmpeg_next::Error as FfmpegError;
use thiserror::Error;

/// The unified error type for all `primeplay` operations.
///
/// Every public method that can fail returns `Result<T, PrimeplayError>`.
/// Variants carry enough context to diagnose the problem without needing
/// additional logging at the call site.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PrimeplayError {
    /// The requested hardware backend name is not known to this FFmpeg
    /// build. Carries the full list of supported backends so the message
    /// doubles as the diagnostic listing.
    #[error("Hardware backend '{name}' is not supported; available backends: {}", available.join(", "))]
    BackendNotFound {
        /// The backend name that was requested.
        name: String,
        /// Names of all backends the FFmpeg build supports.
        available: Vec<String>,
    },

    /// The hardware device could not be created (missing driver, missing
    /// permission, unsupported hardware).
    #[error("Failed to create hardware device for backend '{backend}': {reason}")]
    DeviceInit {
        /// The backend the device was requested for.
        backend: String,
        /// Underlying reason the creation failed.
        reason: String,
    },

    /// The decoder advertises no hardware configuration usable with the
    /// active backend.
    #[error("Decoder '{decoder}' does not support hardware device type '{backend}'")]
    UnsupportedHardwareConfig {
        /// Name of the decoder that was probed.
        decoder: String,
        /// The active backend name.
        backend: String,
    },

    /// The input file could not be opened.
    #[error("Cannot open input file {path}: {reason}")]
    InputOpen {
        /// Path that was passed to [`Runner::run`](crate::Runner::run).
        path: PathBuf,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The input opened, but its stream metadata could not be probed.
    #[error("Cannot find stream information: {0}")]
    StreamProbe(String),

    /// The input does not contain a video stream.
    #[error("No video stream found in input file")]
    NoVideoStream,

    /// A named decoder implementation is missing from the FFmpeg build.
    #[error("Decoder '{0}' is not available in this FFmpeg build")]
    DecoderNotFound(String),

    /// The decoder exists but could not be opened (for device-backed
    /// decoders, typically a missing or inaccessible device node).
    #[error("Failed to open decoder {0}")]
    DecoderOpen(String),

    /// The decoder rejected a submitted packet.
    #[error("Failed to submit packet to decoder: {0}")]
    Submit(String),

    /// Decoding failed. Also covers the fallout of a failed surface-format
    /// negotiation, which the decoder reports as a decode error.
    #[error("Failed to decode frame: {0}")]
    Decode(String),

    /// A GPU-to-host frame transfer failed.
    #[error("Failed to transfer frame data to system memory: {0}")]
    Transfer(String),

    /// A frame or buffer allocation failed. Distinguished from codec-level
    /// errors so callers can tell resource exhaustion apart.
    #[error("Out of memory while allocating a frame buffer")]
    OutOfMemory,

    /// Writing the packed pixel buffer to the output stream failed.
    #[error("Failed to write raw frame data: {0}")]
    OutputWrite(#[from] IoError),

    /// Any other error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    Ffmpeg(String),
}

impl From<FfmpegError> for PrimeplayError {
    fn from(error: FfmpegError) -> Self {
        PrimeplayError::Ffmpeg(error.to_string())
    }
}
