use std::path::PathBuf;

use chrono::Utc;
use clap::Parser;
use clap::ValueEnum;
use rand::rngs::StdRng;
use rand::SeedableRng;
use telemetry_gen::players::generate_player_ids;
use telemetry_gen::sink::persist;
use telemetry_gen::sink::WritePolicy;
use telemetry_gen::timeseries::guaranteed_players;
use telemetry_gen::timeseries::resolve_window;
use telemetry_gen::timeseries::synthesize;
use telemetry_gen::timeseries::Mode;
use tracing::debug;
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Copy, Debug, Clone, PartialEq, Eq, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
        .into()
    }
}

/// Hourly time-series generator for the feature-store demo.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// number of generated players
    player_count: usize,
    /// destination directory for the generated datasets
    dest_dir: PathBuf,
    /// hist generates 10 days of data until the start of the current day and
    /// replaces the destination; curr generates data from the start of the
    /// current day to now and appends to the existing datasets
    #[arg(long, value_enum, default_value = "hist")]
    mode: Mode,
    /// generator seed
    #[arg(long, default_value_t = 123)]
    seed: u64,
    #[arg(long, value_enum, default_value = "info")]
    log_level: LogLevel,
}

fn main() -> Result<(), anyhow::Error> {
    let args = Args::parse();
    let subscriber = FmtSubscriber::builder()
        .with_max_level(LevelFilter::from(args.log_level))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut rng = StdRng::seed_from_u64(args.seed);

    let player_ids = generate_player_ids(&mut rng, args.player_count)?;
    debug!("player ids: {player_ids:?}");

    let window = resolve_window(args.mode, Utc::now());
    if let (Some(start), Some(end)) = (window.first(), window.last()) {
        info!("generating synthetic data from {start} to {end}...");
    }

    let guaranteed = guaranteed_players(&player_ids);
    let (stats, payments) = synthesize(&mut rng, &window, &player_ids, &guaranteed)?;
    info!("{} stats rows generated", stats.len());
    info!("{} payments rows generated", payments.len());

    let policy = match args.mode {
        Mode::Hist => WritePolicy::Replace,
        Mode::Curr => WritePolicy::Append,
    };
    persist(&args.dest_dir, &stats, &payments, policy)?;

    info!("done");
    Ok(())
}
