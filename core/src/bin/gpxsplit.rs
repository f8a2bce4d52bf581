use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Parser, Subcommand, ValueHint};
use log::info;

use gpxsplit_core::{
    list_recordings, load_config, load_recording, parse_recording_text, process_gpx_and_split,
    save_recording, save_split_gpx, DirStore, SplitConfig,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Split a GPX track into Good/Avoid segments from a recorded state log", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Print prometheus counters after the command
    #[arg(long, action = ArgAction::SetTrue, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the intervals parsed from a recording as JSON
    Intervals {
        #[arg(value_hint = ValueHint::FilePath)]
        recording: PathBuf,
    },
    /// Split a GPX file into good.gpx and avoid.gpx
    Split(SplitArgs),
    /// Store a recording text file as a new recording
    Import {
        #[arg(long, value_hint = ValueHint::DirPath)]
        store: PathBuf,
        #[arg(value_hint = ValueHint::FilePath)]
        recording: PathBuf,
    },
    /// List recordings in a store
    List {
        #[arg(long, value_hint = ValueHint::DirPath)]
        store: PathBuf,
    },
}

#[derive(Parser, Debug)]
struct SplitArgs {
    /// GPX file to split
    #[arg(long, value_hint = ValueHint::FilePath)]
    gpx: PathBuf,

    /// Recording text file (alternative to --store/--key)
    #[arg(long, value_hint = ValueHint::FilePath, conflicts_with_all = ["store", "key"])]
    recording: Option<PathBuf>,

    /// Recording store directory
    #[arg(long, value_hint = ValueHint::DirPath, requires = "key")]
    store: Option<PathBuf>,

    /// Recording key in the store
    #[arg(long, requires = "store")]
    key: Option<String>,

    /// Output directory for good.gpx/avoid.gpx
    #[arg(short, long, default_value = ".", value_hint = ValueHint::DirPath)]
    out_dir: PathBuf,

    /// JSON config file
    #[arg(long, value_hint = ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Override the gap threshold in seconds
    #[arg(long)]
    max_gap_secs: Option<i64>,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn read_recording_text(args: &SplitArgs) -> Result<String> {
    match (&args.recording, &args.store, &args.key) {
        (Some(path), _, _) => {
            fs::read_to_string(path).with_context(|| format!("reading recording {}", path.display()))
        }
        (None, Some(dir), Some(key)) => {
            let store = DirStore::open(dir).with_context(|| format!("opening store {}", dir.display()))?;
            Ok(load_recording(&store, key).with_context(|| format!("loading recording {key}"))?)
        }
        _ => bail!("either --recording or --store with --key is required"),
    }
}

fn run_split(args: &SplitArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path).with_context(|| format!("loading config {}", path.display()))?,
        None => SplitConfig::default(),
    };
    if let Some(gap) = args.max_gap_secs {
        config.max_gap_secs = gap;
    }

    let text = read_recording_text(args)?;
    let intervals = parse_recording_text(&text);
    info!("{} intervaller fra opptaket", intervals.len());

    let gpx_text =
        fs::read_to_string(&args.gpx).with_context(|| format!("reading GPX {}", args.gpx.display()))?;
    let result = process_gpx_and_split(&gpx_text, &intervals, &config)
        .context("something went wrong while processing the GPX file")?;

    save_split_gpx(&args.out_dir, &result, &config)
        .with_context(|| format!("writing output to {}", args.out_dir.display()))?;

    println!("Good segments:  {}", result.good.len());
    println!("Avoid segments: {}", result.avoid.len());
    println!(
        "Points: {} timed, {} without time, {} outside any interval",
        result.stats.points_total, result.stats.points_without_time, result.stats.points_unmatched
    );
    if let Some(b) = result.bounds() {
        println!("Bounds: [{}, {}] - [{}, {}]", b.min_lat, b.min_lon, b.max_lat, b.max_lon);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match &cli.command {
        Command::Intervals { recording } => {
            let text = fs::read_to_string(recording)
                .with_context(|| format!("reading recording {}", recording.display()))?;
            let intervals = parse_recording_text(&text);
            println!("{}", serde_json::to_string_pretty(&intervals)?);
        }
        Command::Split(args) => run_split(args)?,
        Command::Import { store, recording } => {
            let text = fs::read_to_string(recording)
                .with_context(|| format!("reading recording {}", recording.display()))?;
            let mut store = DirStore::open(store).with_context(|| format!("opening store {}", store.display()))?;
            let key = save_recording(&mut store, &text, Utc::now())?;
            println!("{key}");
        }
        Command::List { store } => {
            let store = DirStore::open(store).with_context(|| format!("opening store {}", store.display()))?;
            for listing in list_recordings(&store)? {
                println!("{}\t{}", listing.key, listing.label());
            }
        }
    }

    if cli.metrics {
        print!("{}", gpxsplit_core::metrics::gather_text());
    }
    Ok(())
}
