//! Binary entry point for the relcount command-line tool.
#![forbid(unsafe_code)]

use std::error::Error;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use relcount::cli::replay::{parse_query, run_replay, ReplayConfig, ReplayReport, DEFAULT_BATCH_SIZE};
use relcount::config::RelcountSettings;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "relcount",
    version,
    about = "Relationship degree cache with adaptive compaction",
    disable_help_subcommand = true
)]
struct Cli {
    #[command(flatten)]
    settings: SettingsArgs,

    #[arg(
        long,
        global = true,
        value_enum,
        default_value_t = OutputFormat::Text,
        help = "Output format for structured responses"
    )]
    format: OutputFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SettingsArgs {
    #[arg(
        long,
        global = true,
        value_name = "FILE",
        env = "RELCOUNT_CONFIG",
        help = "Settings file (defaults to the user config directory)"
    )]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Override the compaction threshold")]
    threshold: Option<usize>,

    #[arg(long, global = true, help = "Override the storage key prefix")]
    prefix: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(about = "Replay relationship events from a CSV file and print cached degrees")]
    Replay(ReplayCmd),
}

#[derive(Args, Debug)]
struct ReplayCmd {
    #[arg(value_name = "EVENTS.csv")]
    events: PathBuf,

    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE, help = "Events per unit of work")]
    batch: usize,

    #[arg(
        long = "query",
        value_name = "TYPE:DIR[:k=v,...]",
        help = "Count matching relationships on every node (repeatable)"
    )]
    queries: Vec<String>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    init_tracing();
    if let Err(err) = run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RELCOUNT_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init();
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let settings = load_settings(&cli.settings)?;

    match cli.command {
        Command::Replay(cmd) => {
            let queries = cmd
                .queries
                .iter()
                .map(|raw| parse_query(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let cfg = ReplayConfig {
                events: cmd.events,
                batch: cmd.batch,
                queries,
            };
            let report = run_replay(&cfg, settings)?;
            emit(&cli.format, &report, |_| print_replay_text(&report))?;
        }
    }
    Ok(())
}

fn load_settings(args: &SettingsArgs) -> Result<RelcountSettings, Box<dyn Error>> {
    let path = args.config.clone().or_else(RelcountSettings::default_path);
    let mut settings = match path {
        Some(path) => RelcountSettings::load(&path)?,
        None => RelcountSettings::default(),
    };
    if let Some(threshold) = args.threshold {
        settings.threshold = threshold;
    }
    if let Some(prefix) = &args.prefix {
        settings.prefix = prefix.clone();
    }
    settings.validate()?;
    Ok(settings)
}

fn emit<T, F>(format: &OutputFormat, value: &T, printer: F) -> Result<(), Box<dyn Error>>
where
    T: serde::Serialize,
    F: Fn(OutputFormat),
{
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(value)?;
            println!("{json}");
        }
        OutputFormat::Text => printer(OutputFormat::Text),
    }
    Ok(())
}

fn print_replay_text(report: &ReplayReport) {
    println!(
        "Replayed {} events in {} units of work",
        report.events, report.batches
    );
    for node in &report.nodes {
        println!("node {}:", node.node);
        for entry in &node.degrees {
            println!("  {:>8}  {}", entry.count, entry.description);
        }
    }
    if !report.counts.is_empty() {
        println!("Counts:");
        for count in &report.counts {
            println!("  node {} {} = {}", count.node, count.query, count.count);
        }
    }
}
