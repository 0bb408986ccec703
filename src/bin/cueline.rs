use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cueline", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate a scenario, printing soft warnings.
    Validate(ValidateArgs),
    /// Dump the fully resolved scenario as JSON.
    Resolve(ResolveArgs),
    /// Print per-cue lifecycle states and live node ids at a media time.
    States(StatesArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,
}

#[derive(Parser, Debug)]
struct ResolveArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct StatesArgs {
    /// Input scenario JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Media time in seconds.
    #[arg(long)]
    time: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Resolve(args) => cmd_resolve(args),
        Command::States(args) => cmd_states(args),
    }
}

fn read_scenario_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let f = File::open(path).with_context(|| format!("open scenario '{}'", path.display()))?;
    let r = BufReader::new(f);
    serde_json::from_reader(r).with_context(|| "parse scenario JSON")
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let raw = read_scenario_json(&args.in_path)?;
    let resolved = cueline::resolve(&raw)?;

    for w in &resolved.warnings {
        eprintln!("warning: {}: {}", w.path, w.message);
    }
    eprintln!(
        "ok: {} tracks, {} cues, {} warnings",
        resolved.tracks.len(),
        resolved.cues.len(),
        resolved.warnings.len()
    );
    Ok(())
}

fn cmd_resolve(args: ResolveArgs) -> anyhow::Result<()> {
    let raw = read_scenario_json(&args.in_path)?;
    let resolved = cueline::resolve(&raw)?;

    let out = if args.pretty {
        serde_json::to_string_pretty(&resolved)?
    } else {
        serde_json::to_string(&resolved)?
    };
    println!("{out}");
    Ok(())
}

fn cmd_states(args: StatesArgs) -> anyhow::Result<()> {
    let raw = read_scenario_json(&args.in_path)?;
    let resolved = cueline::resolve(&raw)?;

    let mut session = cueline::PlaybackSession::new(
        std::sync::Arc::new(resolved),
        Box::new(cueline::NoopEvaluator),
        cueline::SchedulerOptions::default(),
    );
    let out = session.update(args.time);

    for cue in &session.scenario().cues {
        let state = match session.scheduler().state(&cue.id) {
            Some(cueline::LifecycleState::Preloading) => "preloading",
            Some(cueline::LifecycleState::Active) => "active",
            Some(cueline::LifecycleState::CleanupPending) => "cleanup_pending",
            None => "unmounted",
        };
        eprintln!("{}: {}", cue.id, state);
    }
    eprintln!("live nodes at t={}: {:?}", args.time, out.live_nodes);
    Ok(())
}
