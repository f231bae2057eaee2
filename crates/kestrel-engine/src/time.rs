//! Time management: convert `go` parameters to search limits.

use std::time::Duration;

use cozy_chess::Color;
use kestrel_core::Move;

/// Moves assumed left in the game when the clock gives no `movestogo`.
const DEFAULT_MOVES_TO_GO: i64 = 45;

/// Share of the remaining moves expected to be ponder misses.
const PONDER_MOVE_FACTOR: f64 = 0.65;

/// Largest safety margin kept on the clock, in milliseconds.
const MAX_MARGIN_MS: i64 = 1000;

/// Parameters of one `go` request. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoParams {
    pub wtime: Option<Duration>,
    pub btime: Option<Duration>,
    pub winc: Option<Duration>,
    pub binc: Option<Duration>,
    pub movestogo: Option<u32>,
    /// Search to exactly this depth.
    pub depth: Option<u32>,
    /// Search for a mate in this many moves.
    pub mate: Option<u32>,
    pub movetime: Option<Duration>,
    pub nodes: Option<u64>,
    pub infinite: bool,
    /// Search the predicted position until a ponder hit or stop.
    pub ponder: bool,
    /// Restrict the root to these moves. Empty means all legal moves.
    pub search_moves: Vec<Move>,
}

/// Limits for one search. `None` means unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Time after which no new iteration or root move is started.
    pub min: Option<Duration>,
    /// Time the search may run to while the best move is in doubt.
    pub max: Option<Duration>,
    pub depth: Option<u32>,
    pub nodes: Option<u64>,
}

impl Limits {
    /// Return `true` if nothing bounds the search.
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none() && self.depth.is_none() && self.nodes.is_none()
    }
}

/// Compute search limits from `go` parameters for the side to move.
///
/// The first option present wins:
///
/// | Option      | Limits                     |
/// |-------------|----------------------------|
/// | `infinite`  | none                       |
/// | `depth d`   | depth `d`                  |
/// | `mate n`    | depth `2n - 1`             |
/// | `movetime t`| min = max = `t`            |
/// | `nodes n`   | `n` nodes                  |
/// | clock       | min/max from the formula   |
///
/// With a clock, `moves` is `movestogo` capped at 45 (45 when absent or 0),
/// scaled by 0.65 in ponder mode since ponder hits save time. Then
///
/// ```text
/// margin = min(1000 ms, 0.9 * time)
/// per    = (time + inc * (moves - 1) - margin) / moves
/// min    = 0.85 * per
/// max    = min * clamp(moves / 2, 2.5, 4.0)
/// ```
///
/// and both are clamped to `1..=time - margin` milliseconds.
pub fn compute_time_limits(params: &GoParams, side: Color, ponder_mode: bool) -> Limits {
    if params.infinite {
        return Limits::default();
    }
    if let Some(depth) = params.depth {
        return Limits {
            depth: Some(depth),
            ..Limits::default()
        };
    }
    if let Some(mate) = params.mate {
        return Limits {
            depth: Some((mate * 2).saturating_sub(1).max(1)),
            ..Limits::default()
        };
    }
    if let Some(movetime) = params.movetime {
        return Limits {
            min: Some(movetime),
            max: Some(movetime),
            ..Limits::default()
        };
    }
    if let Some(nodes) = params.nodes {
        return Limits {
            nodes: Some(nodes),
            ..Limits::default()
        };
    }

    let (time, inc) = match side {
        Color::White => (params.wtime, params.winc),
        Color::Black => (params.btime, params.binc),
    };
    let time = time.map_or(0, |d| d.as_millis() as i64);
    let inc = inc.map_or(0, |d| d.as_millis() as i64);

    let mut moves = match params.movestogo {
        Some(m) if m > 0 => (m as i64).min(DEFAULT_MOVES_TO_GO),
        _ => DEFAULT_MOVES_TO_GO,
    };
    if ponder_mode {
        moves = (moves as f64 * PONDER_MOVE_FACTOR).ceil() as i64;
    }
    let margin = MAX_MARGIN_MS.min(time * 9 / 10);
    let per_move = (time + inc * (moves - 1) - margin) / moves;
    let min = per_move * 85 / 100;
    let max = (min as f64 * ((moves / 2) as f64).clamp(2.5, 4.0)) as i64;

    let ceiling = time - margin;
    let clamp = |ms: i64| Duration::from_millis(ms.min(ceiling).max(1) as u64);
    Limits {
        min: Some(clamp(min)),
        max: Some(clamp(max)),
        depth: None,
        nodes: None,
    }
}
