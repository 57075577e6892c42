#![warn(unreachable_pub)]
#![warn(dead_code)]

pub mod cli;
pub mod error;
pub mod extractor;
pub mod fst;
pub mod lemmatizer;
pub mod lexeme;
pub mod lexeme_index;
pub mod sequence;
pub mod text;
pub mod tracing;
pub mod types;
pub mod worker;

pub use error::{Result, TermsError};
pub use extractor::{EnglishTermFilter, Extractor, ExtractorConfig, TermFilter};
pub use fst::{SearchTrace, SelfTestMismatch, State, Transducer, TransducerManager, Transition};
pub use lexeme::Lexeme;
pub use lexeme_index::LexemeIndex;
pub use sequence::{LexemeSequence, SequenceState};
pub use text::{Locale, Text};
pub use types::{LexemeId, StateId};
