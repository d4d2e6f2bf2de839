use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use colored::Colorize;
use primeplay::{FfmpegLogLevel, RunConfig, Runner};

const CLI_AFTER_HELP: &str = "Examples:\n  primeplay input.mp4\n  primeplay -f 100 -o dump.yuv input.mp4\n  primeplay --loop 3 --device vaapi input.mkv";

#[derive(Debug, Parser)]
#[command(
    name = "primeplay",
    version,
    about = "Hardware-accelerated video decode runner",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Repeat the full decode run N times (0 or omitted = run once).
    #[arg(short = 'l', long = "loop", value_name = "N", default_value_t = 0)]
    loop_count: u32,

    /// Stop after emitting N decoded frames (negative or omitted = unlimited).
    #[arg(short = 'f', long = "frames", value_name = "N", allow_hyphen_values = true)]
    frames: Option<i64>,

    /// Append each emitted frame's packed raw pixel data to this file.
    #[arg(short = 'o', value_name = "OUTPUT_FILE")]
    output: Option<PathBuf>,

    /// Hardware acceleration backend name.
    #[arg(short = 'd', long = "device", value_name = "NAME", default_value = "drm")]
    device: String,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Input media path.
    #[arg(value_name = "INPUT_FILE")]
    input: PathBuf,
}

fn build_config(cli: &Cli) -> RunConfig {
    let mut config = RunConfig::new()
        .with_loop_count(cli.loop_count)
        .with_frame_limit(frame_limit(cli.frames))
        .with_backend(cli.device.clone());

    if let Some(output) = &cli.output {
        config = config.with_output(output.clone());
    }

    config
}

/// Negative frame counts mean "unlimited", matching the CLI contract.
fn frame_limit(frames: Option<i64>) -> Option<u64> {
    frames.and_then(|count| u64::try_from(count).ok())
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &cli.log_level {
        let parsed: FfmpegLogLevel = level.parse()?;
        primeplay::set_ffmpeg_log_level(parsed);
    }

    let input = cli.input.clone();
    let report = Runner::new(build_config(&cli)).run(&input)?;

    eprintln!(
        "{} {} frames over {} pass{}",
        "done:".green().bold(),
        report.frames_emitted,
        report.passes_completed,
        if report.passes_completed == 1 { "" } else { "es" },
    );

    Ok(())
}

/// Exit status for a failed parse. clap reports `--help`/`--version`
/// through `Err` too; those exit 0, while genuine usage errors exit 1
/// (clap's own default for them is 2).
fn parse_exit_status(error: &clap::Error) -> u8 {
    match error.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(error) => {
            let status = parse_exit_status(&error);
            let _ = error.print();
            return ExitCode::from(status);
        }
    };

    if let Err(error) = run(cli) {
        eprintln!("{} {error}", "error:".red().bold());
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, build_config, frame_limit, parse_exit_status};

    #[test]
    fn parses_minimal_invocation() {
        let cli = Cli::try_parse_from(["primeplay", "input.mp4"]).unwrap();
        assert_eq!(cli.loop_count, 0);
        assert_eq!(cli.frames, None);
        assert!(cli.output.is_none());
        assert_eq!(cli.device, "drm");
        assert_eq!(cli.input.to_str(), Some("input.mp4"));
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "primeplay", "-l", "3", "-f", "100", "-o", "dump.yuv", "-d", "vaapi", "input.mkv",
        ])
        .unwrap();
        assert_eq!(cli.loop_count, 3);
        assert_eq!(cli.frames, Some(100));
        assert_eq!(cli.output.as_deref(), Some(std::path::Path::new("dump.yuv")));
        assert_eq!(cli.device, "vaapi");
    }

    #[test]
    fn help_and_version_exit_successfully() {
        let help = Cli::try_parse_from(["primeplay", "--help"]).unwrap_err();
        assert_eq!(parse_exit_status(&help), 0);

        let version = Cli::try_parse_from(["primeplay", "--version"]).unwrap_err();
        assert_eq!(parse_exit_status(&version), 0);
    }

    #[test]
    fn usage_errors_exit_with_status_one() {
        let bad_value = Cli::try_parse_from(["primeplay", "-l", "three", "input.mp4"]).unwrap_err();
        assert_eq!(parse_exit_status(&bad_value), 1);

        let missing_input = Cli::try_parse_from(["primeplay"]).unwrap_err();
        assert_eq!(parse_exit_status(&missing_input), 1);
    }

    #[test]
    fn rejects_non_numeric_loop_count() {
        assert!(Cli::try_parse_from(["primeplay", "-l", "three", "input.mp4"]).is_err());
    }

    #[test]
    fn rejects_missing_input() {
        assert!(Cli::try_parse_from(["primeplay", "-l", "2"]).is_err());
    }

    #[test]
    fn negative_frames_means_unlimited() {
        assert_eq!(frame_limit(Some(-1)), None);
        assert_eq!(frame_limit(None), None);
        assert_eq!(frame_limit(Some(0)), Some(0));
        assert_eq!(frame_limit(Some(42)), Some(42));
    }

    #[test]
    fn config_mirrors_cli() {
        let cli = Cli::try_parse_from([
            "primeplay", "--loop", "2", "--frames", "50", "-o", "out.yuv", "input.mp4",
        ])
        .unwrap();
        let config = build_config(&cli);
        assert_eq!(config.loop_count, 2);
        assert_eq!(config.frame_limit, Some(50));
        assert_eq!(config.output.as_deref(), Some(std::path::Path::new("out.yuv")));
        assert_eq!(config.backend, "drm");
    }
}
