//! Full decode-run properties.
//!
//! These tests need both a media fixture (`tests/fixtures/sample_video.mp4`)
//! and a usable hardware acceleration device; neither is reliably available
//! in CI, so each run is skipped when the environment cannot support it
//! (missing fixture, missing backend, missing driver, or a decoder the
//! FFmpeg build does not ship or cannot open).

use std::{
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use ffmpeg_next::frame::Video as VideoFrame;
use primeplay::{
    DisplaySink, FrameLimitScope, PrimeplayError, RunConfig, RunReport, Runner,
};
use tempfile::TempDir;

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

/// Display sink that only counts presentations, shared with the test body.
struct CountingDisplay {
    presented: Arc<AtomicU64>,
}

impl DisplaySink for CountingDisplay {
    fn display(&mut self, _frame: &VideoFrame) {
        self.presented.fetch_add(1, Ordering::Relaxed);
    }
}

/// Display sink that counts presentations and removes a file on the first
/// one, so a later loop pass fails to reopen its input.
struct FileRemovingDisplay {
    target: PathBuf,
    presented: Arc<AtomicU64>,
}

impl DisplaySink for FileRemovingDisplay {
    fn display(&mut self, _frame: &VideoFrame) {
        self.presented.fetch_add(1, Ordering::Relaxed);
        let _ = std::fs::remove_file(&self.target);
    }
}

fn fixture_missing() -> bool {
    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping: fixture {SAMPLE_VIDEO} not found");
        return true;
    }
    false
}

/// Run, returning `None` when the host cannot do hardware decoding at all.
fn run_or_skip(config: RunConfig) -> Option<(RunReport, u64)> {
    let presented = Arc::new(AtomicU64::new(0));
    let display = CountingDisplay {
        presented: presented.clone(),
    };

    let mut runner = Runner::new(config).with_display(Box::new(display));
    match runner.run(SAMPLE_VIDEO) {
        Ok(report) => Some((report, presented.load(Ordering::Relaxed))),
        // Only session-setup failures count as "no hardware" (e.g.
        // v4l2m2m is compiled in but the video device node is absent).
        // A mid-run decode or transfer error is a real failure.
        Err(
            error @ (PrimeplayError::BackendNotFound { .. }
            | PrimeplayError::DeviceInit { .. }
            | PrimeplayError::DecoderNotFound(_)
            | PrimeplayError::DecoderOpen(_)
            | PrimeplayError::UnsupportedHardwareConfig { .. }),
        ) => {
            eprintln!("Skipping: no usable hardware decode path ({error})");
            None
        }
        Err(other) => panic!("decode run failed: {other}"),
    }
}

#[test]
fn display_sees_every_emitted_frame() {
    if fixture_missing() {
        return;
    }
    let Some((report, presented)) = run_or_skip(RunConfig::new()) else {
        return;
    };

    assert_eq!(report.passes_completed, 1);
    assert_eq!(report.frames_emitted, presented);
    assert!(report.frames_emitted > 0, "fixture should decode to frames");
}

#[test]
fn frame_limit_caps_emissions() {
    if fixture_missing() {
        return;
    }
    let Some((report, presented)) = run_or_skip(RunConfig::new().with_frame_limit(Some(5))) else {
        return;
    };

    assert!(report.frames_emitted <= 5);
    assert_eq!(report.frames_emitted, presented);
}

#[test]
fn loop_count_runs_that_many_passes() {
    if fixture_missing() {
        return;
    }
    let config = RunConfig::new()
        .with_loop_count(3)
        .with_frame_limit(Some(2))
        .with_limit_scope(FrameLimitScope::PerRun);
    let Some((report, _)) = run_or_skip(config) else {
        return;
    };

    assert_eq!(report.passes_completed, 3);
    assert!(report.frames_emitted <= 6);
}

#[test]
fn process_scope_budget_spans_passes() {
    if fixture_missing() {
        return;
    }
    let config = RunConfig::new()
        .with_loop_count(2)
        .with_frame_limit(Some(3))
        .with_limit_scope(FrameLimitScope::Process);
    let Some((report, _)) = run_or_skip(config) else {
        return;
    };

    // One budget across both passes: the second pass still runs but emits
    // nothing once the shared budget is spent.
    assert_eq!(report.passes_completed, 2);
    assert!(report.frames_emitted <= 3);
}

#[test]
fn cutoff_output_is_byte_prefix_of_unbounded_output() {
    if fixture_missing() {
        return;
    }

    let scratch = TempDir::new().unwrap();
    let unbounded_path = scratch.path().join("unbounded.yuv");
    let cutoff_path = scratch.path().join("cutoff.yuv");

    let Some((unbounded, _)) = run_or_skip(RunConfig::new().with_output(&unbounded_path)) else {
        return;
    };
    let Some((cutoff, _)) =
        run_or_skip(RunConfig::new().with_frame_limit(Some(3)).with_output(&cutoff_path))
    else {
        return;
    };

    if unbounded.frames_emitted <= cutoff.frames_emitted {
        eprintln!("Skipping: fixture too short for a meaningful prefix check");
        return;
    }

    let unbounded_bytes = std::fs::read(&unbounded_path).unwrap();
    let cutoff_bytes = std::fs::read(&cutoff_path).unwrap();
    assert!(!cutoff_bytes.is_empty());
    assert!(cutoff_bytes.len() < unbounded_bytes.len());
    assert_eq!(cutoff_bytes[..], unbounded_bytes[..cutoff_bytes.len()]);
}

#[test]
fn fatal_error_aborts_remaining_passes() {
    if fixture_missing() {
        return;
    }
    let Some((baseline, _)) = run_or_skip(RunConfig::new()) else {
        return;
    };
    if baseline.frames_emitted == 0 {
        eprintln!("Skipping: fixture decoded to no frames");
        return;
    }

    let scratch = TempDir::new().unwrap();
    let doomed = scratch.path().join("sample_video.mp4");
    std::fs::copy(SAMPLE_VIDEO, &doomed).unwrap();

    let presented = Arc::new(AtomicU64::new(0));
    let display = FileRemovingDisplay {
        target: doomed.clone(),
        presented: presented.clone(),
    };
    let mut runner = Runner::new(RunConfig::new().with_loop_count(3)).with_display(Box::new(display));

    // Pass 1 keeps decoding from its already-open handle after the unlink;
    // pass 2 cannot reopen the input and must end the run before pass 3.
    let result = runner.run(&doomed);
    assert!(matches!(result, Err(PrimeplayError::InputOpen { .. })));
    assert_eq!(presented.load(Ordering::Relaxed), baseline.frames_emitted);
}

#[test]
fn zero_frame_limit_emits_nothing() {
    if fixture_missing() {
        return;
    }
    let Some((report, presented)) = run_or_skip(RunConfig::new().with_frame_limit(Some(0))) else {
        return;
    };

    assert_eq!(report.frames_emitted, 0);
    assert_eq!(presented, 0);
    assert_eq!(report.passes_completed, 1);
}
