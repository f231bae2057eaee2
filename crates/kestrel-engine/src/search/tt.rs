//! Two-bucket transposition table.
//!
//! Every key has two candidate slots: one addressed by the low 32 bits of
//! the key, one by the high 32 bits. An entry remembers which hash placed
//! it so that a valuable victim can be moved to its alternate slot instead
//! of being discarded.
//!
//! The table has a single writer. It is moved into the search thread for
//! the duration of a search and handed back afterwards, so all mutation
//! goes through `&mut self`.

use cozy_chess::Board;
use kestrel_core::{GenKind, Move, MoveList, generate};

use super::{MATE0, MAX_PLY, PLY_SCALE};

/// Sentinel for "static eval not computed" inside stored entries.
pub const UNKNOWN_SCORE: i16 = -32767;

/// Scores beyond this magnitude are mate scores.
const MATE_THRESHOLD: i32 = MATE0 - 1000;

/// Depth occupies the low 15 bits of `depth_slot`; bit 15 is the hash slot.
const DEPTH_MASK: u16 = 0x7FFF;
const SLOT_BIT: u16 = 0x8000;

/// Kind of bound a stored score represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Bound {
    /// Unused slot.
    #[default]
    Empty = 0,
    /// The score is exact.
    Exact = 1,
    /// The true score is at least the stored score (fail high).
    Lower = 2,
    /// The true score is at most the stored score (fail low).
    Upper = 3,
}

/// Convert a search score to table form.
///
/// Mate scores are stored as distance from this node rather than from the
/// root, so they stay valid when the position is reached at another ply.
pub fn score_to_tt(score: i32, ply: usize) -> i16 {
    let ply = ply as i32;
    let adjusted = if score > MATE_THRESHOLD {
        score + ply
    } else if score < -MATE_THRESHOLD {
        score - ply
    } else {
        score
    };
    adjusted as i16
}

/// Inverse of [`score_to_tt`].
pub fn score_from_tt(score: i16, ply: usize) -> i32 {
    let score = score as i32;
    let ply = ply as i32;
    if score > MATE_THRESHOLD {
        score - ply
    } else if score < -MATE_THRESHOLD {
        score + ply
    } else {
        score
    }
}

/// One table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtEntry {
    key: u64,
    mv: u16,
    score: i16,
    depth_slot: u16,
    generation: u8,
    bound: Bound,
    eval: i16,
}

impl TtEntry {
    const EMPTY: TtEntry = TtEntry {
        key: 0,
        mv: 0,
        score: 0,
        depth_slot: 0,
        generation: 0,
        bound: Bound::Empty,
        eval: UNKNOWN_SCORE,
    };

    /// Stored best move, [`Move::NULL`] if none.
    pub fn best_move(&self) -> Move {
        Move::unpack(self.mv)
    }

    /// Stored score rebased to a node at `ply`.
    pub fn score(&self, ply: usize) -> i32 {
        score_from_tt(self.score, ply)
    }

    /// Search depth in fractional plies.
    pub fn depth(&self) -> i32 {
        (self.depth_slot & DEPTH_MASK) as i32
    }

    /// Bound type.
    pub fn bound(&self) -> Bound {
        self.bound
    }

    /// Cached static evaluation, if one was stored.
    pub fn eval(&self) -> Option<i32> {
        (self.eval != UNKNOWN_SCORE).then_some(self.eval as i32)
    }

    /// Return `true` if the stored bound settles the window `(alpha, beta)`.
    pub fn cuts_off(&self, alpha: i32, beta: i32, ply: usize) -> bool {
        let score = self.score(ply);
        match self.bound {
            Bound::Exact => true,
            Bound::Lower => score >= beta,
            Bound::Upper => score <= alpha,
            Bound::Empty => false,
        }
    }

    fn hash_slot(&self) -> usize {
        usize::from(self.depth_slot & SLOT_BIT != 0)
    }

    fn set_depth_and_slot(&mut self, depth: i32, slot: usize) {
        let depth = depth.clamp(0, DEPTH_MASK as i32) as u16;
        self.depth_slot = depth | if slot == 1 { SLOT_BIT } else { 0 };
    }

    /// Ordering for replacement: current generation first, then exact
    /// bounds, then deeper entries.
    fn better_than(&self, other: &TtEntry, generation: u8) -> bool {
        let mine = self.generation == generation;
        let theirs = other.generation == generation;
        if mine != theirs {
            return mine;
        }
        let exact = self.bound == Bound::Exact;
        if exact != (other.bound == Bound::Exact) {
            return exact;
        }
        self.depth() > other.depth()
    }

    /// Worth relocating rather than overwriting.
    fn valuable(&self, generation: u8) -> bool {
        self.generation == generation
            && (self.bound == Bound::Exact || self.depth() > 3 * PLY_SCALE)
    }
}

/// Transposition table with two hash functions and generation aging.
pub struct TranspositionTable {
    entries: Vec<TtEntry>,
    mask: u64,
    generation: u8,
}

impl TranspositionTable {
    /// Create a table of at most `mb` megabytes.
    ///
    /// The entry count is the largest power of two that fits.
    pub fn with_hash_mb(mb: usize) -> Self {
        let bytes = mb.max(1) * 1024 * 1024;
        let count = bytes / std::mem::size_of::<TtEntry>();
        let log2 = usize::BITS - 1 - count.max(1).leading_zeros();
        Self::with_log2_size(log2)
    }

    /// Create a table with exactly `2^log2` entries.
    pub fn with_log2_size(log2: u32) -> Self {
        let count = 1usize << log2;
        Self {
            entries: vec![TtEntry::EMPTY; count],
            mask: (count - 1) as u64,
            generation: 0,
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return `true` if the table has no slots (never the case in practice).
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current generation tag.
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Empty every slot. Must not be called while a search uses the table.
    pub fn clear(&mut self) {
        self.entries.fill(TtEntry::EMPTY);
    }

    /// Start a new search generation. Older entries become replacement candidates.
    pub fn next_generation(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    #[inline]
    fn h0(&self, key: u64) -> usize {
        (key & self.mask) as usize
    }

    #[inline]
    fn h1(&self, key: u64) -> usize {
        ((key >> 32) & self.mask) as usize
    }

    /// Store a search result.
    ///
    /// `mv` carries the score in its ordering field; a null `mv` keeps the
    /// move already stored for the same key. An existing entry for the same
    /// key survives when it is deeper, of the same bound type, and the new
    /// bound would not tighten it.
    pub fn insert(&mut self, key: u64, mv: Move, bound: Bound, ply: usize, depth: i32, eval: Option<i32>) {
        let depth = depth.max(0);
        let idx0 = self.h0(key);
        let idx1 = self.h1(key);

        let (mut idx, mut slot) = (idx0, 0);
        if self.entries[idx].key != key {
            idx = idx1;
            slot = 1;
        }
        if self.entries[idx].key != key {
            if self.entries[idx1].better_than(&self.entries[idx0], self.generation) {
                idx = idx0;
                slot = 0;
            }
            let victim = self.entries[idx];
            if victim.valuable(self.generation) {
                let alt = if victim.hash_slot() == 0 {
                    self.h1(victim.key)
                } else {
                    self.h0(victim.key)
                };
                if alt != idx && victim.better_than(&self.entries[alt], self.generation) {
                    let mut moved = victim;
                    moved.set_depth_and_slot(victim.depth(), 1 - victim.hash_slot());
                    self.entries[alt] = moved;
                }
            }
        }

        let generation = self.generation;
        let ent = &mut self.entries[idx];
        let score = mv.score();
        if ent.key == key && ent.depth() > depth && ent.bound == bound {
            let old = ent.score(ply);
            let keep = match bound {
                Bound::Exact => true,
                Bound::Lower => score <= old,
                Bound::Upper => score >= old,
                Bound::Empty => false,
            };
            if keep {
                return;
            }
        }

        if ent.key != key || !mv.is_null() {
            ent.mv = mv.pack();
        }
        ent.key = key;
        ent.score = score_to_tt(score, ply);
        ent.set_depth_and_slot(depth, slot);
        ent.generation = generation;
        ent.bound = bound;
        ent.eval = eval.map_or(UNKNOWN_SCORE, |e| e.clamp(-MATE0, MATE0) as i16);
    }

    /// Look up `key`. A hit is refreshed to the current generation.
    pub fn probe(&mut self, key: u64) -> Option<TtEntry> {
        let generation = self.generation;
        for idx in [self.h0(key), self.h1(key)] {
            let ent = &mut self.entries[idx];
            if ent.key == key && ent.bound != Bound::Empty {
                ent.generation = generation;
                return Some(*ent);
            }
        }
        None
    }

    /// Principal variation starting with `first`, followed through stored
    /// best moves until a miss, an illegal move, or a repeated position.
    pub fn extract_pv(&mut self, board: &Board, first: Move) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut pos = board.clone();
        let mut seen = Vec::new();
        let mut legal = MoveList::new();
        let mut mv = first;
        loop {
            if mv.is_null() || !pos.is_legal(mv.into()) {
                break;
            }
            pv.push(mv);
            pos.play_unchecked(mv.into());
            if seen.contains(&pos.hash()) || pv.len() >= MAX_PLY {
                break;
            }
            seen.push(pos.hash());
            let Some(ent) = self.probe(pos.hash()) else {
                break;
            };
            mv = ent.best_move();
            generate(&pos, GenKind::All, &mut legal);
            if !legal.contains(mv) {
                break;
            }
        }
        pv
    }
}

impl std::fmt::Debug for TranspositionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranspositionTable")
            .field("entries", &self.entries.len())
            .field("generation", &self.generation)
            .finish()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
