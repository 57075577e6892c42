//! Bidirectional mapping between lexeme names, token positions, and
//! `Lexeme` entities.

use std::collections::HashMap;

use crate::lexeme::Lexeme;
use crate::types::LexemeId;

/// Maintains three coherent mappings: lexeme name → `Lexeme`, lexeme name →
/// its ordered positions, and token position → owning `Lexeme`.
///
/// Invariants (see the data model): for every recorded `(name, pos)`,
/// `by_name[name]` exists, `pos` appears in `positions_of[name]`, and
/// `at_position[pos]` names the same lexeme; every token position across the
/// whole index is unique.
#[derive(Debug, Default, Clone)]
pub struct LexemeIndex {
    by_name: HashMap<String, Lexeme>,
    positions_of: HashMap<String, Vec<usize>>,
    at_position: HashMap<usize, LexemeId>,
    id_to_name: HashMap<LexemeId, String>,
    next_id: u32,
}

impl LexemeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct lexeme names.
    pub fn size(&self) -> usize {
        self.by_name.len()
    }

    /// Number of distinct token positions recorded (`atPosition`'s size).
    pub fn num_unique_positions(&self) -> usize {
        self.at_position.len()
    }

    pub fn lexeme(&self, name: &str) -> Option<&Lexeme> {
        self.by_name.get(name)
    }

    /// All lexeme names currently owned by this index, in arbitrary order.
    pub fn all_names(&self) -> Vec<&str> {
        self.by_name.keys().map(String::as_str).collect()
    }

    pub fn positions_of(&self, name: &str) -> Option<&[usize]> {
        self.positions_of.get(name).map(Vec::as_slice)
    }

    /// The lexeme occupying token position `pos`, if any.
    pub fn at_position(&self, pos: usize) -> Option<&Lexeme> {
        let id = *self.at_position.get(&pos)?;
        let name = self.id_to_name.get(&id)?;
        self.by_name.get(name)
    }

    /// Inserts `(name, pos)`, creating a fresh `Lexeme` (with `is_boundary`)
    /// if `name` is unseen. Returns the resulting lexeme's name and whether
    /// it was freshly created.
    ///
    /// Rejecting negative positions is handled at the API boundary — `pos`
    /// is `usize` here, so there is nothing to reject at this layer; callers
    /// that receive signed offsets must filter negatives before calling.
    pub fn add_position(&mut self, name: &str, pos: usize, is_boundary: bool) -> (String, bool) {
        let is_new = !self.by_name.contains_key(name);
        if is_new {
            let id = LexemeId::new(self.next_id);
            self.next_id += 1;
            self.id_to_name.insert(id, name.to_string());
            self.by_name
                .insert(name.to_string(), Lexeme::new(id, name, is_boundary));
        }
        let lexeme = self.by_name.get_mut(name).expect("just inserted or present");
        lexeme.add_form(name, pos, false);

        self.positions_of
            .entry(name.to_string())
            .or_default()
            .push(pos);
        self.at_position.insert(pos, lexeme.id());

        (name.to_string(), is_new)
    }

    /// Inserts every position in `positions` for `name`.
    pub fn add_positions(&mut self, name: &str, positions: &[usize], is_boundary: bool) {
        for &pos in positions {
            self.add_position(name, pos, is_boundary);
        }
    }

    /// Clones `other`'s named lexeme into `self` as a new owning instance,
    /// copying its positions. A no-op augmentation if `self` already owns
    /// `name`.
    pub fn copy_from_index(&mut self, other: &LexemeIndex, name: &str) {
        if self.by_name.contains_key(name) {
            return;
        }
        let Some(lexeme) = other.lexeme(name) else {
            return;
        };
        let is_boundary = lexeme.is_boundary();
        let positions: Vec<usize> = other.positions_of(name).unwrap_or(&[]).to_vec();
        self.add_positions(name, &positions, is_boundary);
    }

    /// Folds every `(name, positions)` pair of `other` into `self` via
    /// `add_positions`. Union on positions; `other` is left untouched.
    pub fn merge(&mut self, other: &LexemeIndex) {
        for (name, lexeme) in &other.by_name {
            let positions = other.positions_of(name).unwrap_or(&[]);
            self.add_positions(name, positions, lexeme.is_boundary());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn add_position_creates_lexeme_once() {
        let mut idx = LexemeIndex::new();
        let (_, is_new1) = idx.add_position("dog", 0, false);
        let (_, is_new2) = idx.add_position("dog", 5, false);
        check!(is_new1);
        check!(!is_new2);
        check!(idx.size() == 1);
        check!(idx.positions_of("dog").unwrap() == [0, 5]);
        check!(idx.num_unique_positions() == 2);
    }

    #[test]
    fn at_position_resolves_to_owning_lexeme() {
        let mut idx = LexemeIndex::new();
        idx.add_position("cat", 3, false);
        check!(idx.at_position(3).unwrap().name() == "cat");
        check!(idx.at_position(99).is_none());
    }

    // Scenario 3 from §8: LexemeIndex merge.
    #[test]
    fn merge_unions_positions_and_leaves_other_untouched() {
        let mut idx1 = LexemeIndex::new();
        for (i, name) in ["a", "man", "wants", "to", "see", "the"].iter().enumerate() {
            idx1.add_position(name, i, false);
        }

        let mut idx2 = LexemeIndex::new();
        for (i, name) in ["man", "men", "will", "never", "see"].iter().enumerate() {
            idx2.add_position(name, i + 6, false);
        }

        idx1.merge(&idx2);

        check!(idx1.positions_of("man").unwrap() == [1, 6]);
        check!(idx1.positions_of("see").unwrap() == [4, 10]);
        check!(idx1.num_unique_positions() == 11);

        check!(idx2.positions_of("man").unwrap() == [6]);
        check!(idx2.size() == 5);
    }

    #[test]
    fn copy_from_index_is_noop_if_already_owned() {
        let mut idx1 = LexemeIndex::new();
        idx1.add_position("dog", 0, false);

        let mut idx2 = LexemeIndex::new();
        idx2.add_position("dog", 7, false);
        idx2.add_position("dog", 8, false);

        idx1.copy_from_index(&idx2, "dog");
        // idx1 already owned "dog" — no-op.
        check!(idx1.positions_of("dog").unwrap() == [0]);
    }

    #[test]
    fn copy_from_index_clones_unseen_name() {
        let mut idx1 = LexemeIndex::new();
        let mut idx2 = LexemeIndex::new();
        idx2.add_position("cat", 1, false);
        idx2.add_position("cat", 2, false);

        idx1.copy_from_index(&idx2, "cat");
        check!(idx1.positions_of("cat").unwrap() == [1, 2]);
    }
}
