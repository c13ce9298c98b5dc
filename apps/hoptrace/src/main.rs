mod export;
mod output;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use hoptrace_graph::{build_topology, export_csv};
use hoptrace_session::{discover_source, SessionRegistry, SessionState};
use hoptrace_trace::{parse_output, parse_target, SystemLauncher, TraceSettings};
use output::{print_topology, Printer};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "hoptrace", version, about = "Live traceroute topology")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Trace(TraceArgs),
    Parse(ParseArgs),
}

#[derive(Args)]
#[command(
    about = "Run the system traceroute and print the path as it is discovered. Ctrl-C stops the trace."
)]
struct TraceArgs {
    target: String,

    /// Binary to run instead of traceroute/tracert.
    #[arg(long)]
    program: Option<String>,

    /// Extra argument passed before the target; repeatable.
    #[arg(long = "arg", allow_hyphen_values = true)]
    extra_args: Vec<String>,

    #[arg(long)]
    json: bool,

    /// Workspace folder to write the CSV export into.
    #[arg(long)]
    export_dir: Option<PathBuf>,

    /// Stop the trace after this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,
}

#[derive(Args)]
#[command(about = "Build the topology from captured traceroute/tracert output")]
struct ParseArgs {
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Destination label when the output has no banner.
    #[arg(long)]
    target: Option<String>,

    #[arg(long)]
    json: bool,

    #[arg(long, conflicts_with = "json")]
    csv: bool,
}

fn main() {
    init_logging();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Trace(args) => run_trace(args),
        Commands::Parse(args) => run_parse(args),
    }
}

fn run_trace(args: TraceArgs) -> Result<()> {
    let settings = TraceSettings {
        program: args.program,
        extra_args: args.extra_args,
        ..TraceSettings::default()
    };
    let launcher = Arc::new(SystemLauncher::new(settings));
    let mut registry = SessionRegistry::new(launcher, discover_source());
    let id = registry.create();

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    let session = registry
        .get_mut(id)
        .ok_or_else(|| anyhow!("{id} vanished from registry"))?;
    let notifications = session.subscribe();
    if !session.start(&args.target)? {
        return Err(anyhow!("target must not be empty"));
    }

    let deadline = args
        .timeout_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut printer = Printer::new(io::stdout().lock(), args.json);

    loop {
        let closed = session.wait_for_close(POLL);
        for notification in notifications.try_iter() {
            printer.notify(&notification)?;
        }
        if closed {
            break;
        }

        let expired = deadline.is_some_and(|deadline| Instant::now() >= deadline);
        if session.state() == SessionState::Running
            && (interrupted.load(Ordering::SeqCst) || expired)
        {
            info!(expired, "stopping trace");
            session.stop();
        }
    }

    let topology = session.topology();
    if topology.hop_count() == 0 {
        warn!(host = %args.target, "no hops discovered; is traceroute installed?");
    }

    if let Some(root) = args.export_dir {
        if topology.nodes.is_empty() {
            warn!("no data to export");
        } else {
            let path = export::write_csv_export(&root, &session.export_csv(), &Local::now())?;
            eprintln!("exported to {}", path.display());
        }
    }

    registry.dispose(id);
    Ok(())
}

fn run_parse(args: ParseArgs) -> Result<()> {
    let contents = fs::read_to_string(&args.in_path)
        .map_err(|err| anyhow!("failed to read input {:?}: {}", args.in_path, err))?;

    let target = args
        .target
        .filter(|value| !value.trim().is_empty())
        .or_else(|| parse_target(&contents))
        .ok_or_else(|| anyhow!("missing target in traceroute output (use --target)"))?;

    let hops = parse_output(&contents);
    let topology = build_topology(&discover_source(), &hops, &target);

    let mut out = io::stdout().lock();
    if args.json {
        serde_json::to_writer_pretty(&mut out, &topology)?;
        writeln!(out)?;
    } else if args.csv {
        write!(out, "{}", export_csv(&topology))?;
    } else {
        print_topology(&mut out, &topology)?;
    }
    Ok(())
}
