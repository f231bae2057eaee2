//! Progress notifications emitted while a search runs.

use kestrel_core::Move;
use tracing::{debug, info};

use crate::search::MATE0;

/// Score as reported to the outside world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportedScore {
    /// Centipawns from the side to move's point of view.
    Cp(i32),
    /// Mate in this many moves; negative when the side to move gets mated.
    Mate(i32),
}

impl ReportedScore {
    /// Convert a ply-relative search score.
    pub fn from_search(score: i32) -> Self {
        if score > MATE0 / 2 {
            ReportedScore::Mate((MATE0 - score + 1) / 2)
        } else if score < -MATE0 / 2 {
            ReportedScore::Mate(-((MATE0 + score) / 2))
        } else {
            ReportedScore::Cp(score)
        }
    }
}

impl std::fmt::Display for ReportedScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportedScore::Cp(cp) => write!(f, "cp {cp}"),
            ReportedScore::Mate(n) => write!(f, "mate {n}"),
        }
    }
}

/// Whether a reported score is exact or only a bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreBound {
    Exact,
    /// The search failed high; the true score is at least this.
    Lower,
    /// The search failed low; the true score is at most this.
    Upper,
}

/// One principal variation report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PvInfo {
    /// Iteration depth in plies.
    pub depth: u32,
    pub score: ReportedScore,
    pub bound: ScoreBound,
    /// Milliseconds since the search started.
    pub time_ms: u64,
    pub nodes: u64,
    pub nps: u64,
    pub pv: Vec<Move>,
}

/// Receiver of search progress.
///
/// Every method has an empty default, so implementors pick the events they
/// care about. Notifications arrive on the search thread.
pub trait SearchListener: Send {
    /// A new iteration of the given depth starts.
    fn notify_depth(&mut self, _depth: u32) {}

    /// The root move `mv` (1-based `move_nr`) is being searched.
    fn notify_curr_move(&mut self, _mv: Move, _move_nr: usize) {}

    /// A new principal variation is available.
    fn notify_pv(&mut self, _info: &PvInfo) {}

    /// Periodic node statistics.
    fn notify_stats(&mut self, _nodes: u64, _nps: u64, _time_ms: u64) {}

    /// The search is finished and this move will be played.
    fn notify_best_move(&mut self, _best: Move, _ponder: Option<Move>) {}
}

/// Listener that forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl SearchListener for TracingListener {
    fn notify_depth(&mut self, depth: u32) {
        debug!(depth, "starting iteration");
    }

    fn notify_curr_move(&mut self, mv: Move, move_nr: usize) {
        debug!(%mv, move_nr, "current move");
    }

    fn notify_pv(&mut self, info: &PvInfo) {
        let pv = info
            .pv
            .iter()
            .map(|m| m.to_string())
            .collect::<Vec<_>>()
            .join(" ");
        info!(
            depth = info.depth,
            score = %info.score,
            bound = ?info.bound,
            time_ms = info.time_ms,
            nodes = info.nodes,
            nps = info.nps,
            %pv,
            "principal variation"
        );
    }

    fn notify_stats(&mut self, nodes: u64, nps: u64, time_ms: u64) {
        debug!(nodes, nps, time_ms, "search stats");
    }

    fn notify_best_move(&mut self, best: Move, ponder: Option<Move>) {
        match ponder {
            Some(ponder) => info!(%best, %ponder, "best move"),
            None => info!(%best, "best move"),
        }
    }
}
