use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use connect4_minimax::*;

/// Find the best move in a Connect 4 position with a depth-limited minimax search
#[derive(Parser, Debug)]
#[command(name = "connect4-minimax", version)]
struct Args {
    /// Moves played so far as one-indexed columns, player 1 first (e.g. 4453)
    #[arg(default_value = "")]
    moves: String,

    /// Search depth, or the deepest search allowed with --time-limit-ms
    #[arg(short, long, default_value_t = 8)]
    depth: usize,

    /// Cache file loaded before the search and merged into afterwards
    #[arg(short, long)]
    cache: Option<PathBuf>,

    /// Search the root columns on separate threads
    #[arg(short, long, conflicts_with = "time_limit_ms")]
    parallel: bool,

    /// Deepen the search one ply at a time until this many milliseconds have passed
    #[arg(short, long)]
    time_limit_ms: Option<u64>,

    /// Log more (-v for progress, -vv for search statistics), RUST_LOG overrides this
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbosity: u8) {
    let default = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let board = BoardState::from_moves(&args.moves)
        .with_context(|| format!("invalid move string '{}'", args.moves))?;
    board.render(&mut stdout())?;

    // end states
    match board.winner() {
        Some(Player::One) => {
            println!("Player 1 wins!");
            return Ok(());
        }
        Some(Player::Two) => {
            println!("Player 2 wins!");
            return Ok(());
        }
        None if board.is_full() => {
            println!("Draw!");
            return Ok(());
        }
        None => {}
    }

    let mut cache = match &args.cache {
        Some(path) => cache_file::load(path)?,
        None => TranspositionCache::new(),
    };

    let player = board.side_to_move();
    let maximizing = player.is_maximizing();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg} [{elapsed}]"));
    spinner.set_message(&format!("AI is thinking for {}...", player));
    spinner.enable_steady_tick(100);

    let start = Instant::now();
    let (depth, result, nodes) = match (args.time_limit_ms, args.parallel) {
        (Some(time_limit), _) => {
            let mut searcher = Searcher::new(&mut cache);
            let (depth, result) = searcher.search_iterative(
                &board,
                maximizing,
                args.depth,
                Duration::from_millis(time_limit),
            );
            (depth, result, Some(searcher.node_count))
        }
        (None, true) => (
            args.depth,
            parallel_choose_move(&board, args.depth, maximizing, &mut cache),
            None,
        ),
        (None, false) => {
            let mut searcher = Searcher::new(&mut cache);
            let result = searcher.search(&board, args.depth, maximizing);
            (args.depth, result, Some(searcher.node_count))
        }
    };
    let time = start.elapsed();
    spinner.finish_and_clear();

    match result.score {
        WIN_SCORE => println!("Player 1 can force a win within {} plies.", depth),
        LOSS_SCORE => println!("Player 2 can force a win within {} plies.", depth),
        score => println!("Position score at depth {}: {}", depth, score),
    }
    match result.column {
        Some(column) => println!("Best move: {}", column + 1),
        None => println!("No move available"),
    }
    match nodes {
        Some(nodes) => println!(
            "Searched {} positions in {:.3}s, {} cached",
            nodes,
            time.as_secs_f64(),
            cache.len()
        ),
        None => println!("Searched in {:.3}s, {} cached", time.as_secs_f64(), cache.len()),
    }

    if let Some(path) = &args.cache {
        let saved = cache_file::save(path, &cache)?;
        println!("Saved {} cache entries to {}", saved, path.display());
    }
    Ok(())
}
