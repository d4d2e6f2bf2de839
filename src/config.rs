//! Run configuration.
//!
//! [`RunConfig`] is a builder that carries loop count, frame cutoff, output
//! path, and backend selection into [`Runner`](crate::Runner) without
//! threading each setting through every function signature. Immutable once
//! a run starts.

use std::path::PathBuf;

/// Whether the frame-count cutoff spans the whole process or resets on
/// every loop pass.
///
/// The historical behavior sets the counter once before the first pass and
/// never resets it, so three loop passes share one budget; that stays the
/// default. `PerRun` gives each pass its own fresh budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameLimitScope {
    /// One budget shared across all loop passes.
    #[default]
    Process,
    /// The budget resets at the start of every loop pass.
    PerRun,
}

/// Configuration for a decode run.
///
/// All fields have defaults matching a plain single-pass run with no
/// cutoff, no raw output, and the DRM backend.
///
/// # Example
///
/// ```
/// use primeplay::RunConfig;
///
/// let config = RunConfig::new()
///     .with_loop_count(3)
///     .with_frame_limit(Some(120))
///     .with_output("dump.yuv");
/// ```
#[derive(Debug, Clone)]
#[must_use]
pub struct RunConfig {
    /// Number of full decode passes. 0 and 1 both mean a single pass.
    pub loop_count: u32,
    /// Stop after emitting this many frames. `None` is unlimited.
    pub frame_limit: Option<u64>,
    /// Scope of the frame limit across loop passes.
    pub limit_scope: FrameLimitScope,
    /// Raw output file; each emitted frame's packed pixel bytes are
    /// appended, no header or length prefix.
    pub output: Option<PathBuf>,
    /// Hardware backend name resolved at run start.
    pub backend: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfig {
    /// Create a configuration with default settings: one pass, unlimited
    /// frames, no output file, backend `"drm"`.
    pub fn new() -> Self {
        Self {
            loop_count: 1,
            frame_limit: None,
            limit_scope: FrameLimitScope::Process,
            output: None,
            backend: "drm".to_string(),
        }
    }

    /// Repeat the full decode run this many times. 0 is treated as 1.
    pub fn with_loop_count(mut self, count: u32) -> Self {
        self.loop_count = count;
        self
    }

    /// Cap the number of emitted frames. `None` removes the cap.
    pub fn with_frame_limit(mut self, limit: Option<u64>) -> Self {
        self.frame_limit = limit;
        self
    }

    /// Choose whether the frame cap spans all passes or resets per pass.
    pub fn with_limit_scope(mut self, scope: FrameLimitScope) -> Self {
        self.limit_scope = scope;
        self
    }

    /// Append each emitted frame's packed pixel data to this file.
    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Select the hardware acceleration backend by name.
    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = name.into();
        self
    }

    /// Number of passes to actually execute.
    pub(crate) fn passes(&self) -> u32 {
        self.loop_count.max(1)
    }
}
