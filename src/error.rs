//! Centralized error handling with typed error enums.
//!
//! This module provides structured error types for every core operation.
//! Errors are designed to:
//! - Provide detailed context via Debug for logging (`{:?}`)
//! - Provide user-friendly messages via Display for CLI output
//! - Enable pattern matching for programmatic error handling
//!
//! # Error Hierarchy
//!
//! ```text
//! TermsError (top-level)
//! ├── Text(TextError)         - Tokenization / file ingestion
//! ├── Extract(ExtractError)   - Term extraction
//! ├── Build(BuildError)       - FST construction
//! ├── Save(SaveError)         - FST persistence
//! └── Load(LoadError)         - FST loading
//! ```
//!
//! `LexemeSequence` construction failures are *not* part of this hierarchy:
//! per the propagation policy, an invalid sequence is a value (its `state`
//! field), never an error.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized Result type for qubiq-terms operations.
pub type Result<T> = std::result::Result<T, TermsError>;

/// Primary error type for core operations.
#[derive(Debug, Error)]
pub enum TermsError {
    /// Errors from `Text` ingestion.
    #[error("{0}")]
    Text(#[from] TextError),

    /// Errors from `Extractor::extract`.
    #[error("{0}")]
    Extract(#[from] ExtractError),

    /// Errors from `TransducerManager::build`.
    #[error("{0}")]
    Build(#[from] BuildError),

    /// Errors from `TransducerManager::save`.
    #[error("{0}")]
    Save(#[from] SaveError),

    /// Errors from `TransducerManager::load`.
    #[error("{0}")]
    Load(#[from] LoadError),
}

impl TermsError {
    /// Additional guidance for resolving the error, if available.
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::Text(e) => e.help(),
            Self::Extract(e) => e.help(),
            Self::Build(e) => e.help(),
            Self::Save(e) => e.help(),
            Self::Load(e) => e.help(),
        }
    }

    /// A user-friendly message with optional help text appended.
    pub fn user_message(&self) -> String {
        match self.help() {
            Some(help) => format!("{}\n\n{}", self, help),
            None => self.to_string(),
        }
    }
}

/// Errors from ingesting and tokenizing a corpus.
#[derive(Debug, Error)]
pub enum TextError {
    #[error("could not open '{path}': {reason}")]
    IoUnavailable { path: PathBuf, reason: String },
}

impl TextError {
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::IoUnavailable { .. } => {
                Some("Check that the file exists and is readable by the current user.")
            }
        }
    }
}

/// Errors from `Extractor::extract`.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("no bigram candidates survived seed collection")]
    NoSeeds,
}

impl ExtractError {
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::NoSeeds => Some(
                "Lower --mbf/--mbs, or supply a larger corpus: \
                 phase 1 requires at least one bigram meeting both thresholds.",
            ),
        }
    }
}

/// Errors from building a transducer from a sorted key/value file.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not open build input '{path}': {reason}")]
    IoUnavailable { path: PathBuf, reason: String },

    #[error("build input contained no usable key/value lines")]
    EmptyInput,

    #[error("key '{key}' on line {line} exceeds max_word_size ({max})")]
    WordTooLong {
        key: String,
        line: usize,
        max: usize,
    },
}

impl BuildError {
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::IoUnavailable { .. } => Some("Check the input path and its permissions."),
            Self::EmptyInput => {
                Some("The input file must contain at least one 'key\\tvalue' line.")
            }
            Self::WordTooLong { .. } => {
                Some("Increase max_word_size or shorten the offending key.")
            }
        }
    }
}

/// Errors from saving a transducer to the QUTD format.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("transducer is not ready (no initial state)")]
    NotReady,

    #[error("could not write '{path}': {reason}")]
    IoUnavailable { path: PathBuf, reason: String },
}

impl SaveError {
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::NotReady => Some("Call build() (or a successful load()) before save()."),
            Self::IoUnavailable { .. } => Some("Check the output path and its permissions."),
        }
    }
}

/// Errors from loading a QUTD-format transducer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("could not read '{path}': {reason}")]
    IoUnavailable { path: PathBuf, reason: String },

    #[error("bad magic: expected \"QUTD\"")]
    BadMagic,

    #[error("init_state_id must be non-zero")]
    BadInitId,

    #[error("num_states must be positive, got {0}")]
    BadStateCount(i64),

    #[error("state id must be non-zero (line {0})")]
    BadStateId(usize),

    #[error("unrecognized state mark {0:?} (expected 'f' or 'F')")]
    BadStateMark(char),

    #[error("negative transition count ({0}) for state {1}")]
    BadTransitionCount(i64, i64),

    #[error("transition label must be non-null (state {0})")]
    BadLabel(i64),

    #[error("non-final state {0} has zero transitions")]
    BadNextId(i64),

    #[error("init_state_id {0} does not reference any state in the stream")]
    UnknownInitId(i64),

    #[error("transition from state {0} targets unknown state id {1}")]
    UnknownNextId(i64, i64),

    #[error("declared num_states ({declared}) does not match states read ({read})")]
    StateCountMismatch { declared: i64, read: i64 },
}

impl LoadError {
    pub fn help(&self) -> Option<&'static str> {
        match self {
            Self::IoUnavailable { .. } => Some("Check the input path and its permissions."),
            _ => Some("The file is not a valid QUTD v1 transducer, or is truncated/corrupted."),
        }
    }
}
