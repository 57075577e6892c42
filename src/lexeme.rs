//! A named class of word-form occurrences.

use crate::types::LexemeId;

/// A uniquely-named entity representing either a word-form class or a lemma
/// class, together with every `(surface_form, token_offset)` pair that
/// contributed an occurrence.
///
/// Owned by exactly one `LexemeIndex`; `is_boundary` is fixed at creation
/// and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Lexeme {
    id: LexemeId,
    name: String,
    is_boundary: bool,
    forms: Vec<(String, usize)>,
    offsets_seen: std::collections::HashSet<usize>,
}

impl Lexeme {
    pub(crate) fn new(id: LexemeId, name: impl Into<String>, is_boundary: bool) -> Self {
        Self {
            id,
            name: name.into(),
            is_boundary,
            forms: Vec::new(),
            offsets_seen: std::collections::HashSet::new(),
        }
    }

    /// Stable identity, used to build `LexemeSequence` keys.
    pub fn id(&self) -> LexemeId {
        self.id
    }

    /// The normalised name identifying this lexeme class.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True iff this lexeme's name consists entirely of punctuation/symbol
    /// characters (see `Text`'s boundary-token rule).
    pub fn is_boundary(&self) -> bool {
        self.is_boundary
    }

    /// Every `(surface_form, token_offset)` pair recorded for this lexeme.
    pub fn forms(&self) -> &[(String, usize)] {
        &self.forms
    }

    /// Record a new occurrence. Offsets are unique unless `overwrite` is set;
    /// a duplicate offset without `overwrite` is a no-op.
    pub(crate) fn add_form(&mut self, form: impl Into<String>, offset: usize, overwrite: bool) {
        if self.offsets_seen.contains(&offset) {
            if overwrite {
                if let Some(slot) = self.forms.iter_mut().find(|(_, off)| *off == offset) {
                    slot.0 = form.into();
                }
            }
            return;
        }
        self.offsets_seen.insert(offset);
        self.forms.push((form.into(), offset));
    }
}
