//! Orchestrates bigram collection and iterative expansion into multi-word
//! terms, applying an optional filter, and yielding the final term list.

use std::collections::HashSet;

use crate::error::ExtractError;
use crate::lexeme_index::LexemeIndex;
use crate::sequence::{LexemeSequence, SequenceKey};
use crate::text::Text;

/// Tunable thresholds driving seed collection and expansion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractorConfig {
    pub min_bigram_frequency: usize,
    pub min_bigram_score: f64,
    pub max_source_extraction_rate: f64,
    pub max_left_expansion_distance: u32,
    pub max_right_expansion_distance: u32,
    pub quality_decrease_threshold: f64,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            min_bigram_frequency: 3,
            min_bigram_score: 5.0,
            max_source_extraction_rate: 0.3,
            max_left_expansion_distance: 2,
            max_right_expansion_distance: 2,
            quality_decrease_threshold: 3.0,
        }
    }
}

/// External hook for rejecting extracted candidates, e.g. by part of speech.
pub trait TermFilter {
    /// Returns false to drop `sequence` from the final term list. Applied
    /// only to candidates that already survived phase 2's retention test.
    fn passes(&self, sequence: &LexemeSequence, index: &LexemeIndex) -> bool;
}

/// Default filter for English text: rejects sequences whose first or last
/// lexeme is a closed-class article, conjunction, preposition, or
/// demonstrative (carried over from the original `extract-terms` front-end).
pub struct EnglishTermFilter {
    articles: HashSet<&'static str>,
    conjunctions: HashSet<&'static str>,
    prepositions: HashSet<&'static str>,
    demonstratives: HashSet<&'static str>,
}

impl Default for EnglishTermFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl EnglishTermFilter {
    pub fn new() -> Self {
        Self {
            articles: ["a", "an", "the"].into_iter().collect(),
            conjunctions: ["and", "or"].into_iter().collect(),
            prepositions: PREPOSITIONS.iter().copied().collect(),
            demonstratives: ["this", "these", "that", "those"].into_iter().collect(),
        }
    }
}

const PREPOSITIONS: &[&str] = &[
    "abaft",
    "abeam",
    "aboard",
    "about",
    "above",
    "absent",
    "across",
    "afore",
    "after",
    "against",
    "along",
    "alongside",
    "amid",
    "amidst",
    "among",
    "amongst",
    "anenst",
    "apropos",
    "apud",
    "around",
    "as",
    "aside",
    "astride",
    "at",
    "athwart",
    "atop",
    "barring",
    "before",
    "behind",
    "below",
    "beneath",
    "beside",
    "besides",
    "between",
    "beyond",
    "but",
    "by",
    "circa",
    "concerning",
    "despite",
    "down",
    "during",
    "except",
    "excluding",
    "failing",
    "following",
    "for",
    "forenenst",
    "from",
    "given",
    "in",
    "including",
    "inside",
    "into",
    "like",
    "mid",
    "midst",
    "minus",
    "modulo",
    "near",
    "next",
    "notwithstanding",
    "of",
    "off",
    "on",
    "onto",
    "opposite",
    "out",
    "outside",
    "over",
    "pace",
    "past",
    "per",
    "plus",
    "pro",
    "qua",
    "regarding",
    "round",
    "sans",
    "save",
    "since",
    "than",
    "through",
    "throughout",
    "till",
    "times",
    "to",
    "toward",
    "towards",
    "under",
    "underneath",
    "unlike",
    "until",
    "unto",
    "up",
    "upon",
    "versus",
    "via",
    "vice",
    "with",
    "within",
    "without",
    "worth",
];

impl TermFilter for EnglishTermFilter {
    fn passes(&self, sequence: &LexemeSequence, index: &LexemeIndex) -> bool {
        let ids = sequence.lexeme_ids();
        let Some(&first_id) = ids.first() else {
            return true;
        };
        let last_id = ids[ids.len() - 1];

        let names = first_and_last_names(index, first_id, last_id);
        let Some((first, last)) = names else {
            return true;
        };

        let closed = |w: &str| {
            self.prepositions.contains(w)
                || self.conjunctions.contains(w)
                || self.articles.contains(w)
                || self.demonstratives.contains(w)
        };
        !(closed(first) || closed(last))
    }
}

fn first_and_last_names<'a>(
    index: &'a LexemeIndex,
    first_id: crate::types::LexemeId,
    last_id: crate::types::LexemeId,
) -> Option<(&'a str, &'a str)> {
    // LexemeIndex exposes lookups by name, not id; scan is acceptable here
    // since the closed-class sets are tiny and this runs once per candidate.
    let mut first = None;
    let mut last = None;
    for name in index_names(index) {
        let lex = index.lexeme(name)?;
        if lex.id() == first_id {
            first = Some(name);
        }
        if lex.id() == last_id {
            last = Some(name);
        }
    }
    Some((first?, last?))
}

fn index_names(index: &LexemeIndex) -> Vec<&str> {
    // Small helper kept local to this module: filters don't need a general
    // "all names" accessor on LexemeIndex itself.
    index.all_names()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// Drives the two-phase extraction algorithm over a tokenized `Text`.
pub struct Extractor<'a> {
    text: &'a Text,
    config: ExtractorConfig,
}

impl<'a> Extractor<'a> {
    pub fn new(text: &'a Text) -> Self {
        Self {
            text,
            config: ExtractorConfig::default(),
        }
    }

    pub fn with_config(text: &'a Text, config: ExtractorConfig) -> Self {
        Self { text, config }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut ExtractorConfig {
        &mut self.config
    }

    /// Runs phase 1 (seed collection) then phase 2 (expansion), optionally
    /// applying `filter` and sorting the result by descending score.
    pub fn extract(
        &self,
        filter: Option<&dyn TermFilter>,
        sort: bool,
    ) -> Result<Vec<LexemeSequence>, ExtractError> {
        let index = self.text.index();
        let txt_len = self.text.length();

        let mut seen: HashSet<SequenceKey> = HashSet::new();
        let mut candidates: Vec<LexemeSequence> = Vec::new();
        let mut keep: Vec<bool> = Vec::new();

        for i in 0..txt_len {
            let seq = LexemeSequence::new(Some(index), i, 2, 1);
            if !seq.is_ok() {
                continue;
            }
            let Some(key) = seq.key().cloned() else {
                continue;
            };
            if seen.contains(&key) {
                continue;
            }
            if seq.frequency() >= self.config.min_bigram_frequency
                && seq.score() >= self.config.min_bigram_score
            {
                seen.insert(key);
                candidates.push(seq);
                keep.push(true);
            }
        }

        if candidates.is_empty() {
            return Err(ExtractError::NoSeeds);
        }

        let mut i = 0;
        while i < candidates.len() {
            let source = candidates[i].clone();
            let mut num_expansions = 0u32;

            if source.led() < self.config.max_left_expansion_distance {
                num_expansions +=
                    self.expand(index, &source, Side::Left, &mut seen, &mut candidates, &mut keep);
            }
            if source.red() < self.config.max_right_expansion_distance {
                num_expansions += self.expand(
                    index,
                    &source,
                    Side::Right,
                    &mut seen,
                    &mut candidates,
                    &mut keep,
                );
            }

            let survives_rate = num_expansions == 0
                || (f64::from(num_expansions) / source.frequency() as f64)
                    <= self.config.max_source_extraction_rate;

            let filter_passes = match filter {
                Some(f) => f.passes(&candidates[i], index),
                None => true,
            };
            let survives = survives_rate && filter_passes;

            if !survives {
                keep[i] = false;
                if let Some(key) = candidates[i].key() {
                    seen.remove(key);
                }
            }

            i += 1;
        }

        let mut result: Vec<LexemeSequence> = candidates
            .into_iter()
            .zip(keep)
            .filter_map(|(seq, k)| k.then_some(seq))
            .collect();

        if sort {
            result.sort_by(|a, b| b.score().partial_cmp(&a.score()).unwrap_or(std::cmp::Ordering::Equal));
        }

        Ok(result)
    }

    #[allow(clippy::too_many_arguments)]
    fn expand(
        &self,
        index: &LexemeIndex,
        source: &LexemeSequence,
        side: Side,
        seen: &mut HashSet<SequenceKey>,
        candidates: &mut Vec<LexemeSequence>,
        keep: &mut Vec<bool>,
    ) -> u32 {
        let mut count = 0u32;
        let n = source.len() + 1;

        for &p in source.positions() {
            let (offset, n1) = match side {
                Side::Left => {
                    if p == 0 {
                        continue;
                    }
                    (p - 1, 1)
                }
                Side::Right => (p, source.len()),
            };
            let (led, red) = match side {
                Side::Left => (source.led() + 1, source.red()),
                Side::Right => (source.led(), source.red() + 1),
            };

            let expanded = LexemeSequence::with_expansion(Some(index), offset, n, n1, led, red);
            if !expanded.is_ok() || expanded.score() <= 0.0 {
                continue;
            }
            let Some(key) = expanded.key().cloned() else {
                continue;
            };
            if seen.contains(&key) {
                continue;
            }
            if !(expanded.score() > source.score() - self.config.quality_decrease_threshold) {
                continue;
            }

            seen.insert(key);
            candidates.push(expanded);
            keep.push(true);
            count += 1;
        }

        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::Locale;
    use assert2::{check, let_assert};

    fn corpus() -> Text {
        let mut text = Text::new(Locale::Default);
        text.append(
            "A database connection string is a special format string that is passed \
             to the database driver each time a database connection is performed. \
             It is very important to specify correct setting in the database \
             connection string since default connection parameters will generally \
             not work.",
        );
        text
    }

    #[test]
    fn extract_finds_database_connection_string() {
        let text = corpus();
        let extractor = Extractor::new(&text);
        let_assert!(Ok(terms) = extractor.extract(None, true));
        let found = terms
            .iter()
            .any(|t| t.image(text.index()) == "database connection string");
        check!(found);
    }

    #[test]
    fn extract_fails_with_no_seeds_on_tiny_text() {
        let mut text = Text::new(Locale::Default);
        text.append("one two three");
        let extractor = Extractor::new(&text);
        let_assert!(Err(ExtractError::NoSeeds) = extractor.extract(None, false));
    }

    #[test]
    fn extract_is_deterministic() {
        let text = corpus();
        let extractor = Extractor::new(&text);
        let_assert!(Ok(first) = extractor.extract(None, true));
        let_assert!(Ok(second) = extractor.extract(None, true));
        let first_images: Vec<_> = first.iter().map(|t| t.image(text.index())).collect();
        let second_images: Vec<_> = second.iter().map(|t| t.image(text.index())).collect();
        check!(first_images == second_images);
    }

    #[test]
    fn sorted_results_are_non_increasing_by_score() {
        let text = corpus();
        let extractor = Extractor::new(&text);
        let_assert!(Ok(terms) = extractor.extract(None, true));
        let scores: Vec<f64> = terms.iter().map(LexemeSequence::score).collect();
        check!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn english_filter_rejects_leading_preposition() {
        let mut text = Text::new(Locale::Default);
        text.append(
            "we discussed the topic of of database systems and systems design \
             database systems database systems database systems in depth today",
        );
        let extractor = Extractor::new(&text);
        let filter = EnglishTermFilter::new();
        let_assert!(Ok(terms) = extractor.extract(Some(&filter), false));
        for t in &terms {
            let image = t.image(text.index());
            let first = image.split(' ').next().unwrap_or("");
            check!(first != "of");
        }
    }
}
