//! Livecheck CLI
//!
//! Usage:
//!   livecheck --trace frames.jsonl          # Replay a landmark trace
//!   livecheck --interactive                 # Read JSON frames from stdin
//!   livecheck --serve                       # HTTP API server
//!   livecheck --demo > demo.jsonl           # Write a synthetic passing trace
//!   livecheck --trace frames.jsonl --json   # JSON output

use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use livecheck::core::{
    demo_session, parse_frame_line, run_server, write_trace, LivenessPipeline, LivenessSession,
    TraceProvider,
};
use livecheck::types::{LivenessConfig, LivenessOutput, LivenessStep, ReasonCode};
use livecheck::VERSION;

#[derive(Parser, Debug)]
#[command(
    name = "livecheck",
    version = VERSION,
    about = "Livecheck - blink and head-turn liveness detection over facial landmarks",
    long_about = "Livecheck turns per-frame facial landmarks into a liveness verdict.\n\n\
                  A session passes after two blinks and a held head turn to each side.\n\n\
                  Modes:\n  \
                  --trace FILE   Replay a JSON-lines landmark trace\n  \
                  --interactive  Read JSON frame records from stdin\n  \
                  --serve        HTTP API server mode\n  \
                  --demo         Print a synthetic passing trace\n\n\
                  Steps:\n  \
                  BLINK - Blink twice\n  \
                  LEFT  - Turn your head left\n  \
                  RIGHT - Turn your head right\n  \
                  PASS  - Liveness confirmed"
)]
struct Args {
    /// JSON-lines trace to replay
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Interactive mode - read frame records from stdin
    #[arg(short, long)]
    interactive: bool,

    /// Run as HTTP API server
    #[arg(short, long)]
    serve: bool,

    /// Server address (default: 127.0.0.1:3000)
    #[arg(long, default_value = "127.0.0.1:3000")]
    addr: String,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write a synthetic passing trace to stdout
    #[arg(long)]
    demo: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Disable colors in output
    #[arg(long)]
    no_color: bool,

    /// Print every frame, not only events
    #[arg(long)]
    verbose: bool,
}

/// How frame outputs are printed
#[derive(Debug, Clone, Copy)]
struct OutputMode {
    json: bool,
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("livecheck=info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    if args.no_color {
        colored::control::set_override(false);
    }

    let config = load_config(args.config.as_ref())?;
    let mode = OutputMode { json: args.json, verbose: args.verbose };

    if args.serve {
        run_server(&args.addr, config)
            .await
            .with_context(|| format!("API server on {} failed", args.addr))
    } else if args.demo {
        write_trace(io::stdout().lock(), &demo_session(config.landmarks))
            .context("failed to write demo trace")
    } else if let Some(ref path) = args.trace {
        run_trace(path, config, mode)
    } else {
        if !args.interactive {
            tracing::debug!("no mode given, defaulting to interactive");
        }
        run_interactive(config, mode)
    }
}

/// Defaults, then file, then `LIVECHECK_*` environment
fn load_config(path: Option<&PathBuf>) -> Result<LivenessConfig> {
    let config = match path {
        Some(path) => LivenessConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => LivenessConfig::default(),
    }
    .with_env_overrides();
    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// Replay a trace file through a full session
fn run_trace(path: &Path, config: LivenessConfig, mode: OutputMode) -> Result<()> {
    print_header("Trace Replay");

    let provider = TraceProvider::new(path);
    let mut session = LivenessSession::new(provider, config)
        .on_frame(move |out| print_output(out, mode));

    if let Err(e) = session.start() {
        println!("{}", format!("  Camera error: {}", e).red());
        return Err(e).with_context(|| format!("could not open trace {}", path.display()));
    }

    let last = session.run();
    print_summary(last.as_ref(), session.pipeline().frame_count(), session.pipeline().error_count());
    Ok(())
}

/// Read frame records from stdin, one per line
fn run_interactive(config: LivenessConfig, mode: OutputMode) -> Result<()> {
    let mut pipeline = LivenessPipeline::new(config);

    print_header("Interactive");
    println!("Paste one JSON frame per line, e.g.");
    println!("  {{\"landmarks\": null, \"timestamp_ms\": 0}}");
    println!("Type 'quit' to exit.");
    println!();

    let stdin = io::stdin();
    for (i, line) in stdin.lock().lines().enumerate() {
        let line = line.context("failed to read stdin")?;
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let output = match parse_frame_line(trimmed, i + 1) {
            Ok(None) => continue,
            Ok(Some(frame)) => pipeline.process(&frame),
            Err(e) => pipeline.reject(e),
        };
        print_output(&output, OutputMode { verbose: true, ..mode });

        if output.liveness_passed {
            break;
        }
    }

    print_summary(Some(pipeline.last_output()), pipeline.frame_count(), pipeline.error_count());
    Ok(())
}

/// Frames with nothing new to report are only printed in verbose mode
fn is_event(out: &LivenessOutput) -> bool {
    !matches!(
        out.reason,
        ReasonCode::L002_TRACKING | ReasonCode::L002_EYES_CLOSED | ReasonCode::L004_TURN_HOLDING
    )
}

fn print_output(out: &LivenessOutput, mode: OutputMode) {
    if !mode.verbose && !is_event(out) {
        return;
    }
    if mode.json {
        match serde_json::to_string(out) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::warn!(error = %e, "failed to serialize output"),
        }
    } else if colored::control::SHOULD_COLORIZE.should_colorize() {
        println!("{}", out.to_terminal_string());
    } else {
        println!("{}", out.to_parseable_string());
    }
}

fn print_header(mode: &str) {
    println!("{}", "========================================".bold());
    println!("{}", format!("  Livecheck v{} - {}", VERSION, mode).bold());
    println!("{}", "========================================".bold());
    println!();
}

fn print_summary(last: Option<&LivenessOutput>, frames: u64, skipped: u64) {
    println!();
    let Some(out) = last else {
        println!("{}", "  No frames processed".dimmed());
        return;
    };

    if out.liveness_passed {
        println!("{}", "  ✓ LIVENESS PASSED".green().bold());
    } else {
        println!(
            "{}",
            format!("  ✗ Not passed - next step: {}", out.step.headline()).color(out.step.color())
        );
        if out.step != LivenessStep::Pass {
            println!("{}", format!("    {}", out.step.hint()).dimmed());
        }
    }
    println!(
        "{}",
        format!(
            "  blinks={} left={} right={} progress={:.0}% | frames={} skipped={}",
            out.blink_count,
            out.turned_left,
            out.turned_right,
            out.progress * 100.0,
            frames,
            skipped
        )
        .dimmed()
    );
}
