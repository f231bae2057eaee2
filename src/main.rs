use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;

use kestrel_core::{STARTING_FEN, format_uci_move, parse_fen, play_uci_moves};
use kestrel_engine::{Engine, EngineConfig, GoParams, TracingListener};

#[derive(Parser, Debug)]
#[command(name = "kestrel", about = "Search a chess position and print the best move")]
struct Args {
    /// FEN string or "startpos"
    #[arg(long, default_value = "startpos")]
    fen: String,
    /// Moves in coordinate notation played from the position
    #[arg(long, num_args = 1.., value_name = "MOVE")]
    moves: Vec<String>,
    /// Search depth in plies
    #[arg(long, conflicts_with_all = ["movetime", "nodes"])]
    depth: Option<u32>,
    /// Thinking time in milliseconds
    #[arg(long, conflicts_with = "nodes")]
    movetime: Option<u64>,
    /// Node budget
    #[arg(long)]
    nodes: Option<u64>,
    /// Transposition table size in MB
    #[arg(long, default_value_t = 16)]
    hash: usize,
    /// Playing strength, 0..=1000
    #[arg(long, default_value_t = 1000)]
    strength: u32,
    /// Override a search parameter, as NAME=VALUE
    #[arg(long = "param", value_name = "NAME=VALUE")]
    params: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let fen = if args.fen == "startpos" { STARTING_FEN } else { args.fen.as_str() };
    let start = parse_fen(fen)?;
    let moves: Vec<&str> = args.moves.iter().map(String::as_str).collect();
    let (board, game_hashes) = play_uci_moves(&start, &moves)?;

    let mut engine = Engine::new(EngineConfig {
        hash_mb: args.hash,
        ponder_mode: false,
        strength: args.strength,
    });
    engine.new_game();
    for param in &args.params {
        let (name, value) = param
            .split_once('=')
            .with_context(|| format!("expected NAME=VALUE, got {param:?}"))?;
        let value: i32 = value
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {name}"))?;
        engine.set_parameter(name.trim(), value)?;
    }

    let go = GoParams {
        depth: args.depth,
        movetime: args.movetime.map(Duration::from_millis),
        nodes: args.nodes,
        ..GoParams::default()
    };
    if go.depth.is_none() && go.movetime.is_none() && go.nodes.is_none() {
        bail!("give at least one of --depth, --movetime or --nodes");
    }

    info!(fen = %board, "kestrel searching");
    engine.start_search(&board, &game_hashes, go, Box::new(TracingListener))?;
    let outcome = engine.wait()?.context("search did not run")?;
    match (outcome.best_move, outcome.ponder_move) {
        (Some(best), Some(ponder)) => {
            let mut after = board.clone();
            after.play_unchecked(best.into());
            println!(
                "bestmove {} ponder {}",
                format_uci_move(&board, best),
                format_uci_move(&after, ponder)
            );
        }
        (Some(best), None) => println!("bestmove {}", format_uci_move(&board, best)),
        (None, _) => println!("bestmove (none)"),
    }
    Ok(())
}
