//! Reusable move buffers.
//!
//! [`MoveList`] is a growable, in-place sortable list of moves.
//! [`MoveStack`] is a per-ply arena of lists: a search node takes the list
//! for its ply, fills it, and hands it back when done, so steady-state
//! search does not allocate.

use std::ops::{Index, IndexMut};

use crate::chess_move::Move;

/// Capacity reserved for each pooled list. No legal chess position has more.
const LIST_CAPACITY: usize = 256;

/// An ordered, mutable list of moves.
#[derive(Debug, Clone, Default)]
pub struct MoveList {
    moves: Vec<Move>,
}

impl MoveList {
    /// Create an empty list with room for any legal position.
    pub fn new() -> Self {
        Self {
            moves: Vec::with_capacity(LIST_CAPACITY),
        }
    }

    /// Remove all moves, keeping the allocation.
    pub fn clear(&mut self) {
        self.moves.clear();
    }

    /// Append a move.
    pub fn push(&mut self, mv: Move) {
        self.moves.push(mv);
    }

    /// Number of moves in the list.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Return `true` if the list is empty.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Swap two entries.
    pub fn swap(&mut self, a: usize, b: usize) {
        self.moves.swap(a, b);
    }

    /// Return `true` if `mv` is in the list (scores ignored).
    pub fn contains(&self, mv: Move) -> bool {
        self.moves.contains(&mv)
    }

    /// Keep only the moves matching `f`.
    pub fn retain(&mut self, f: impl FnMut(&Move) -> bool) {
        self.moves.retain(f);
    }

    /// View as a slice.
    pub fn as_slice(&self) -> &[Move] {
        &self.moves
    }

    /// View as a mutable slice.
    pub fn as_mut_slice(&mut self) -> &mut [Move] {
        &mut self.moves
    }

    /// Iterate over the moves.
    pub fn iter(&self) -> std::slice::Iter<'_, Move> {
        self.moves.iter()
    }
}

impl Index<usize> for MoveList {
    type Output = Move;

    fn index(&self, index: usize) -> &Move {
        &self.moves[index]
    }
}

impl IndexMut<usize> for MoveList {
    fn index_mut(&mut self, index: usize) -> &mut Move {
        &mut self.moves[index]
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Move;
    type IntoIter = std::slice::Iter<'a, Move>;

    fn into_iter(self) -> Self::IntoIter {
        self.moves.iter()
    }
}

impl FromIterator<Move> for MoveList {
    fn from_iter<I: IntoIterator<Item = Move>>(iter: I) -> Self {
        Self {
            moves: iter.into_iter().collect(),
        }
    }
}

/// Per-ply pool of move lists.
#[derive(Debug)]
pub struct MoveStack {
    lists: Vec<MoveList>,
}

impl MoveStack {
    /// Create a pool with one preallocated list per ply.
    pub fn new(plies: usize) -> Self {
        Self {
            lists: (0..plies).map(|_| MoveList::new()).collect(),
        }
    }

    /// Take the (cleared) list for `ply` out of the pool.
    ///
    /// If the list was never handed back (an aborted search), a fresh
    /// list is returned instead.
    pub fn take(&mut self, ply: usize) -> MoveList {
        match self.lists.get_mut(ply) {
            Some(slot) => {
                let mut list = std::mem::take(slot);
                list.clear();
                list
            }
            None => MoveList::new(),
        }
    }

    /// Return a list to the pool slot for `ply`.
    pub fn give_back(&mut self, ply: usize, list: MoveList) {
        if let Some(slot) = self.lists.get_mut(ply) {
            *slot = list;
        }
    }
}
