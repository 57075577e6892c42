//! Small, strongly-typed handles used throughout the core instead of bare
//! integers, so that e.g. a lexeme id can never be silently swapped for a
//! state id at a call site.

use std::fmt;

/// Stable identity of a `Lexeme` within the `LexemeIndex` that owns it.
///
/// Per the data model's note on hashable sequence identity: this is an
/// integer assigned at creation time, not a pointer, so it survives moves,
/// reallocation, and (de)serialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LexemeId(pub(crate) u32);

impl LexemeId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The little-endian byte representation used to build a
    /// `LexemeSequence`'s identity key.
    pub(crate) fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }
}

impl fmt::Display for LexemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lexeme#{}", self.0)
    }
}

/// Handle into a `Transducer`'s state arena.
///
/// Using an index rather than a raw pointer keeps the automaton's states
/// movable and trivially serializable: the on-disk QUTD `state_id` is just
/// this value remapped to a dense, non-zero range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn lexeme_id_round_trips_through_bytes() {
        let id = LexemeId::new(0x1234_5678);
        check!(id.to_le_bytes() == [0x78, 0x56, 0x34, 0x12]);
    }

    #[test]
    fn state_id_index_matches_raw() {
        let id = StateId::new(7);
        check!(id.index() == 7);
    }
}
