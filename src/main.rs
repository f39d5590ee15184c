//! Michi-SGF: inspect the training records extracted from Go game records.
//!
//! ## Usage
//!
//! - `michi-sgf replay game.sgf` - Print every record of the main line
//! - `michi-sgf replay game.sgf --at D4` - Print the records followed by a move at D4
//! - `michi-sgf stats *.sgf` - Summarize a set of game records
//! - `michi-sgf sample *.sgf --count 5 --seed 1` - Print random usable records

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use log::{LevelFilter, info, warn};

use michi_sgf::board::Point;
use michi_sgf::constants::PASS_MOVE;
use michi_sgf::position::parse_coord;
use michi_sgf::record::PositionRecord;
use michi_sgf::replay::SgfWrapper;

/// Michi-SGF: replay Go game records into training positions
#[derive(Parser)]
#[command(name = "michi-sgf")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level on stderr (off, error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "warn")]
    log_level: LevelFilter,

    /// Also write debug logs to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the records of a game's main line
    Replay {
        file: PathBuf,
        /// Skip records that cannot be used for training
        #[arg(long)]
        usable_only: bool,
        /// Stop after this many records
        #[arg(long)]
        limit: Option<usize>,
        /// Only print records whose next move is this point (e.g. D4)
        #[arg(long)]
        at: Option<String>,
    },
    /// Summarize game records
    Stats {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Print usable records drawn at random from game records
    Sample {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Number of records to draw
        #[arg(long, default_value_t = 10)]
        count: usize,
        /// Seed for the random draw
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.log_level, cli.log_file.as_deref())?;

    match cli.command {
        Commands::Replay {
            file,
            usable_only,
            limit,
            at,
        } => run_replay(&file, usable_only, limit, at.as_deref()),
        Commands::Stats { files } => run_stats(&files),
        Commands::Sample { files, count, seed } => run_sample(&files, count, seed),
    }
}

fn setup_logging(level: LevelFilter, log_file: Option<&Path>) -> Result<()> {
    let log_dispatcher = fern::Dispatch::new().format(|out, message, record| {
        out.finish(format_args!(
            "{}[{}][{}] {}",
            chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
            record.target(),
            record.level(),
            message
        ))
    });

    let log_dispatcher = match log_file {
        Some(path) => log_dispatcher
            .chain(
                fern::Dispatch::new()
                    .level(level.max(LevelFilter::Debug))
                    .chain(fern::log_file(path).with_context(|| {
                        format!("cannot open log file {}", path.display())
                    })?),
            )
            .chain(fern::Dispatch::new().level(level).chain(io::stderr())),
        None => log_dispatcher.level(level).chain(io::stderr()),
    };
    log_dispatcher.apply().context("cannot install logger")?;
    Ok(())
}

fn load(path: &Path) -> Result<SgfWrapper> {
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    SgfWrapper::from_text(&text).with_context(|| format!("cannot replay {}", path.display()))
}

fn run_replay(
    path: &Path,
    usable_only: bool,
    limit: Option<usize>,
    at: Option<&str>,
) -> Result<()> {
    let sgf = load(path)?;
    let size = sgf.board_size();
    let at = at.map(|coord| target_point(coord, size)).transpose()?;
    let records = sgf
        .main_branch()
        .enumerate()
        .filter(|(_, record)| !usable_only || record.is_usable())
        .filter(|(_, record)| at.is_none() || record.next_move() == at)
        .take(limit.unwrap_or(usize::MAX));
    for (i, record) in records {
        println!("#{i}\n{record}\n");
    }
    Ok(())
}

/// Board point named by a GTP coordinate such as `D4`.
fn target_point(coord: &str, size: usize) -> Result<Point> {
    match parse_coord(coord, size) {
        PASS_MOVE => bail!("'{coord}' is not a point of a {size}x{size} board"),
        pt => Ok(pt),
    }
}

fn run_stats(paths: &[PathBuf]) -> Result<()> {
    let (mut games, mut failed, mut total, mut usable) = (0, 0, 0, 0);
    for path in paths {
        let sgf = match load(path) {
            Ok(sgf) => sgf,
            Err(err) => {
                warn!("{err:#}");
                failed += 1;
                continue;
            }
        };
        let (mut records, mut good, mut complete) = (0, 0, true);
        for record in sgf.main_branch() {
            records += 1;
            good += usize::from(record.is_usable());
            complete &= record.position().is_some();
        }
        println!(
            "{}: {size}x{size} komi {} result {} records {records} usable {good}{}",
            path.display(),
            sgf.komi(),
            sgf.result().unwrap_or("-"),
            if complete { "" } else { " (truncated)" },
            size = sgf.board_size(),
        );
        games += 1;
        total += records;
        usable += good;
    }
    println!("{games} games, {failed} failed, {total} records, {usable} usable");
    Ok(())
}

fn run_sample(paths: &[PathBuf], count: usize, seed: u64) -> Result<()> {
    let mut pool: Vec<PositionRecord> = Vec::new();
    for path in paths {
        match load(path) {
            Ok(sgf) => pool.extend(sgf.main_branch().filter(PositionRecord::is_usable)),
            Err(err) => warn!("{err:#}"),
        }
    }
    info!("{} usable records in {} files", pool.len(), paths.len());

    let mut rng = fastrand::Rng::with_seed(seed);
    rng.shuffle(&mut pool);
    for record in pool.iter().take(count) {
        println!("{record}\n");
    }
    Ok(())
}
