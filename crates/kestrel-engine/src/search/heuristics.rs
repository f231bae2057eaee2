//! Killer move table and history heuristic for quiet move ordering.

use cozy_chess::Board;
use kestrel_core::Move;

use super::MAX_PLY;

/// Two killer moves per ply: quiet moves that caused beta cutoffs.
pub struct KillerTable {
    slots: [[Move; 2]; MAX_PLY],
}

impl KillerTable {
    /// Create an empty killer table.
    pub fn new() -> Self {
        Self {
            slots: [[Move::NULL; 2]; MAX_PLY],
        }
    }

    /// Store a killer move at the given ply.
    ///
    /// Shifts slot 0 to slot 1 if the new move differs from slot 0.
    pub fn store(&mut self, ply: usize, mv: Move) {
        if ply >= MAX_PLY {
            return;
        }
        if self.slots[ply][0] != mv {
            self.slots[ply][1] = self.slots[ply][0];
            self.slots[ply][0] = mv;
        }
    }

    /// Killer score in `0..=4`.
    ///
    /// 4 and 3 for the primary and secondary killer at this ply, 2 and 1
    /// for killers two plies above or below (same side to move).
    pub fn score(&self, ply: usize, mv: Move) -> i32 {
        if mv.is_null() {
            return 0;
        }
        if ply < MAX_PLY {
            if self.slots[ply][0] == mv {
                return 4;
            }
            if self.slots[ply][1] == mv {
                return 3;
            }
        }
        for other in [ply.checked_sub(2), ply.checked_add(2)].into_iter().flatten() {
            if other < MAX_PLY {
                if self.slots[other][0] == mv {
                    return 2;
                }
                if self.slots[other][1] == mv {
                    return 1;
                }
            }
        }
        0
    }
}

impl Default for KillerTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Success count above which both counters are halved.
const SUCCESS_LIMIT: i32 = 1000;

/// Largest history score.
pub const HISTORY_MAX: i32 = 49;

/// History heuristic: per (colour, piece, destination) success and failure
/// counts, weighted by depth.
///
/// The score is `success * 49 / (success + fail)`, cached until the next
/// update of that cell.
pub struct History {
    success: [[i32; 64]; 12],
    fail: [[i32; 64]; 12],
    cache: [[Option<i32>; 64]; 12],
}

impl History {
    /// Create an empty history table.
    pub fn new() -> Self {
        Self {
            success: [[0; 64]; 12],
            fail: [[0; 64]; 12],
            cache: [[None; 64]; 12],
        }
    }

    fn cell(board: &Board, mv: Move) -> Option<(usize, usize)> {
        let piece = board.piece_on(mv.source())?;
        let color = board.color_on(mv.source())?;
        Some((color as usize * 6 + piece as usize, mv.dest() as usize))
    }

    /// Record a quiet move that caused a beta cutoff at `depth` plies.
    pub fn add_success(&mut self, board: &Board, mv: Move, depth: i32) {
        let Some((p, sq)) = Self::cell(board, mv) else {
            return;
        };
        let mut val = self.success[p][sq] + depth;
        if val > SUCCESS_LIMIT {
            val /= 2;
            self.fail[p][sq] /= 2;
        }
        self.success[p][sq] = val;
        self.cache[p][sq] = None;
    }

    /// Record a quiet move that was searched without causing a cutoff.
    pub fn add_fail(&mut self, board: &Board, mv: Move, depth: i32) {
        let Some((p, sq)) = Self::cell(board, mv) else {
            return;
        };
        self.fail[p][sq] += depth;
        self.cache[p][sq] = None;
    }

    /// History score in `0..=HISTORY_MAX`.
    pub fn score(&mut self, board: &Board, mv: Move) -> i32 {
        let Some((p, sq)) = Self::cell(board, mv) else {
            return 0;
        };
        if let Some(cached) = self.cache[p][sq] {
            return cached;
        }
        let succ = self.success[p][sq];
        let fail = self.fail[p][sq];
        let score = if succ + fail > 0 {
            succ * HISTORY_MAX / (succ + fail)
        } else {
            0
        };
        self.cache[p][sq] = Some(score);
        score
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new()
    }
}
