//! Stub extension point for future lemmatization support.
//!
//! Lemmatization is explicitly out of scope for the core: no implementation
//! is provided here, only the interfaces the core would consume if a
//! lemmatizer were plugged in. `Lemmatizer::start` is async because the
//! original design runs lemmatization as a background task that eventually
//! merges a partial lexeme index into the text's lemma index.

use std::collections::HashMap;

use crate::lexeme_index::LexemeIndex;
use crate::text::Text;

/// Produces `Lemmatizer` instances configured from string parameters.
pub trait LemmatizerFactory {
    fn init(&mut self, params: HashMap<String, String>) -> bool;
    fn destroy(&mut self) -> bool;
    fn new_lemmatizer(&self, id: u32, text: &Text) -> Box<dyn Lemmatizer>;
}

/// Runs asynchronously and eventually yields a partial lexeme index to be
/// merged into the owning `Text`'s lemma index via `LexemeIndex::merge`.
pub trait Lemmatizer: Send {
    fn start(self: Box<Self>) -> tokio::task::JoinHandle<LexemeIndex>;
}
