//! Tokenizes input on Unicode word boundaries and populates a wordform
//! `LexemeIndex`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use unicode_segmentation::UnicodeSegmentation;

use crate::error::TextError;
use crate::lexeme_index::LexemeIndex;

/// Default chunk size (in `char`s) used when streaming a file; large enough
/// tokens straddling a chunk boundary are carried over and re-tokenized.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 80;

/// Determines whether `Text` lower-cases with a plain ASCII pass (the
/// "C" locale / no `--language` case) or a full Unicode-aware fold —
/// sufficient to reproduce the Cyrillic case-folding scenario without a full
/// ICU locale database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    /// No `--language` given: ASCII-only lower-casing.
    Default,
    /// A concrete two-letter ISO code: full Unicode lower-casing.
    Unicode,
}

impl Locale {
    /// Parses a (possibly longer) language tag by taking its first two
    /// letters, matching the original CLI's `language.left(2)` convention.
    pub fn from_tag(tag: &str) -> Self {
        if tag.trim().is_empty() {
            Locale::Default
        } else {
            Locale::Unicode
        }
    }

    fn normalize(self, token: &str) -> String {
        match self {
            Locale::Default => token.to_ascii_lowercase(),
            Locale::Unicode => token.to_lowercase(),
        }
    }
}

/// A tokenized corpus view: owns a dense wordform `LexemeIndex` covering
/// every token position `[0, length)`.
#[derive(Debug, Clone)]
pub struct Text {
    locale: Locale,
    index: LexemeIndex,
    length: usize,
    carry: String,
}

impl Text {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            index: LexemeIndex::new(),
            length: 0,
            carry: String::new(),
        }
    }

    /// The wordform index populated so far.
    pub fn index(&self) -> &LexemeIndex {
        &self.index
    }

    /// Number of tokens ingested (also the exclusive upper bound of valid
    /// positions).
    pub fn length(&self) -> usize {
        self.length
    }

    /// Appends the contents of a file, streamed in fixed-size chunks.
    pub fn append_file(&mut self, path: impl AsRef<Path>) -> Result<(), TextError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| TextError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        self.append_reader(BufReader::new(file), path)
    }

    /// Appends the contents of an arbitrary reader (e.g. stdin).
    pub fn append_stdin(&mut self, reader: impl Read) -> Result<(), TextError> {
        self.append_reader(reader, Path::new("<stdin>"))
    }

    fn append_reader(&mut self, mut reader: impl Read, path: &Path) -> Result<(), TextError> {
        let mut buf = [0u8; 4096];
        let mut pending = String::new();

        loop {
            let n = reader.read(&mut buf).map_err(|e| TextError::IoUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            if n == 0 {
                break;
            }
            pending.push_str(&String::from_utf8_lossy(&buf[..n]));

            while pending.chars().count() >= DEFAULT_READ_BUFFER_SIZE {
                let split_at = pending
                    .char_indices()
                    .nth(DEFAULT_READ_BUFFER_SIZE)
                    .map(|(i, _)| i)
                    .unwrap_or(pending.len());
                let chunk: String = pending.drain(..split_at).collect();
                self.consume_chunk(&chunk);
            }
        }
        if !pending.is_empty() {
            self.consume_chunk(&pending);
        }
        self.flush_carry();
        Ok(())
    }

    /// Appends an in-memory string directly (no chunking needed, but the
    /// same carry-over machinery is used so behaviour matches file ingestion
    /// for a string split across manual `append` calls).
    pub fn append(&mut self, s: &str) {
        self.consume_chunk(s);
        self.flush_carry();
    }

    fn consume_chunk(&mut self, chunk: &str) {
        self.carry.push_str(chunk);

        let tokens: Vec<&str> = self.carry.split_word_bounds().collect();
        if tokens.is_empty() {
            return;
        }

        // The last token might be a fragment straddling the next chunk; keep
        // it in `carry` and process everything before it now.
        let (complete, tail) = tokens.split_at(tokens.len() - 1);
        for tok in complete {
            self.process_token(tok);
        }
        self.carry = tail[0].to_string();
    }

    fn flush_carry(&mut self) {
        if self.carry.is_empty() {
            return;
        }
        let carry = std::mem::take(&mut self.carry);
        for tok in carry.split_word_bounds() {
            self.process_token(tok);
        }
    }

    fn process_token(&mut self, token: &str) {
        if is_whitespace_token(token) {
            return;
        }
        let is_boundary = is_boundary_token(token);
        let normalized = self.locale.normalize(token);
        let pos = self.length;
        self.index.add_position(&normalized, pos, is_boundary);
        self.length += 1;
    }
}

fn is_whitespace_token(token: &str) -> bool {
    token.chars().all(char::is_whitespace)
}

/// A token is a boundary iff every character is in the Unicode punctuation
/// category or in a fixed ASCII symbol range (matching Qt's `QChar::Punct`
/// plus its symbol ranges: 0x00-0x2F, 0x3A-0x40, 0x5B-0x60, 0x7B-0x7E).
fn is_boundary_token(token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    token.chars().all(is_boundary_char)
}

fn is_boundary_char(c: char) -> bool {
    if c.is_ascii() {
        let b = c as u32;
        matches!(b, 0x00..=0x2F | 0x3A..=0x40 | 0x5B..=0x60 | 0x7B..=0x7E)
    } else {
        c.is_ascii_punctuation() || is_unicode_punctuation(c)
    }
}

fn is_unicode_punctuation(c: char) -> bool {
    // `char::is_alphanumeric`/`is_whitespace` cover the complement we care
    // about well enough without pulling in a full Unicode category table.
    !c.is_alphanumeric() && !c.is_whitespace()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    #[test]
    fn dense_covering_invariant_holds() {
        let mut text = Text::new(Locale::Default);
        text.append("The quick brown fox jumps over the lazy dog.");
        check!(text.index().num_unique_positions() == text.length());
        for pos in 0..text.length() {
            check!(text.index().at_position(pos).is_some());
        }
    }

    #[test]
    fn empty_input_leaves_index_unchanged() {
        let mut text = Text::new(Locale::Default);
        text.append("   \n\t ");
        check!(text.length() == 0);
        check!(text.index().size() == 0);
    }

    #[rstest]
    #[case(".", true)]
    #[case("dog", false)]
    #[case("...", true)]
    #[case("don't", false)]
    fn boundary_classification(#[case] token: &str, #[case] expected: bool) {
        check!(is_boundary_token(token) == expected);
    }

    #[test]
    fn carry_over_handles_tokens_spanning_chunk_boundary() {
        let mut text = Text::new(Locale::Default);
        let long_word = "a".repeat(200);
        let input = format!("{} end", long_word);
        text.append(&input);
        check!(text.index().lexeme(&long_word).is_some());
        check!(text.length() == 2);
    }

    // Scenario 6 from §8: Unicode/Russian locale case-folding.
    #[test]
    fn russian_locale_case_folds_and_counts_boundaries() {
        let mut text = Text::new(Locale::Unicode);
        text.append(
            "Быть может быть, а может и не быть. А может быть, она и БЫТЬ не может. \
             А может быть, Она и может быть.",
        );
        check!(text.length() == 29);
        check!(text.index().size() == 8);

        let dot = text.index().lexeme(".").expect("'.' lexeme present");
        check!(dot.is_boundary());
        check!(
            text.index()
                .positions_of(".")
                .expect("positions for '.'")
                == [9, 19, 28]
        );

        check!(
            text.index()
                .positions_of("быть")
                .expect("positions for 'быть'")
                .len()
                == 7
        );
    }
}
