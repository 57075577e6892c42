//! Async adapter running the synchronous `build`/`save`/`load` operations on
//! a blocking thread, reporting progress over an `mpsc` channel.
//!
//! The core itself is single-threaded and synchronous (see its concurrency
//! notes); this module is the only place that talks to tokio. Unlike the
//! workspace detector's `DocState`, there is no cache or de-duplication of
//! in-flight work here — `build`/`save`/`load` are one-shot CLI operations,
//! not something many callers await concurrently.

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::error::{BuildError, LoadError, SaveError};
use crate::fst::{Transducer, TransducerManager};

/// A progress event delivered in monotonically non-decreasing order for a
/// given operation, terminated by exactly one `Finished`.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    Build { bytes_read: u64, bytes_total: u64 },
    Save { states_done: u64, states_total: u64 },
    Load { states_done: u64, states_total: u64 },
    Finished { success: bool, message: String },
}

/// Runs `TransducerManager::build` on a blocking thread. `Progress` only
/// carries status, so the built `Transducer` itself is returned through the
/// join handle; callers await it after draining the progress receiver.
pub fn build(
    manager: TransducerManager,
    path: PathBuf,
) -> (
    mpsc::UnboundedReceiver<Progress>,
    tokio::task::JoinHandle<Result<Transducer, BuildError>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let report_tx = tx.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let result = manager.build_with_progress(&path, |bytes_read, bytes_total| {
            let _ = report_tx.send(Progress::Build {
                bytes_read,
                bytes_total,
            });
        });
        finish(
            &tx,
            result.as_ref().map(|_| ()).map_err(|e| AnyOpError::Build(e.to_string())),
        );
        result
    });

    (rx, handle)
}

/// Runs `TransducerManager::save` on a blocking thread.
pub fn save(
    manager: TransducerManager,
    transducer: Transducer,
    path: PathBuf,
) -> (
    mpsc::UnboundedReceiver<Progress>,
    tokio::task::JoinHandle<Result<(), SaveError>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let report_tx = tx.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let result = manager.save_with_progress(&transducer, &path, |states_done, states_total| {
            let _ = report_tx.send(Progress::Save {
                states_done,
                states_total,
            });
        });
        let status = match &result {
            Ok(()) => Ok(()),
            Err(e) => Err(AnyOpError::Save(e.to_string())),
        };
        finish(&tx, status);
        result
    });

    (rx, handle)
}

/// Runs `TransducerManager::load` on a blocking thread. `Progress` only
/// carries status, so the loaded `Transducer` itself is returned through the
/// join handle; callers await it after draining the progress receiver.
pub fn load(
    manager: TransducerManager,
    path: PathBuf,
) -> (
    mpsc::UnboundedReceiver<Progress>,
    tokio::task::JoinHandle<Result<Transducer, LoadError>>,
) {
    let (tx, rx) = mpsc::unbounded_channel();
    let report_tx = tx.clone();

    let handle = tokio::task::spawn_blocking(move || {
        let result = manager.load_with_progress(&path, |states_done, states_total| {
            let _ = report_tx.send(Progress::Load {
                states_done,
                states_total,
            });
        });
        let status = match &result {
            Ok(_) => Ok(()),
            Err(e) => Err(AnyOpError::Load(e.to_string())),
        };
        finish(&tx, status);
        result
    });

    (rx, handle)
}

#[derive(Debug)]
enum AnyOpError {
    Build(String),
    Save(String),
    Load(String),
}

impl std::fmt::Display for AnyOpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build(m) | Self::Save(m) | Self::Load(m) => write!(f, "{m}"),
        }
    }
}

fn finish(tx: &mpsc::UnboundedSender<Progress>, result: Result<(), AnyOpError>) {
    let (success, message) = match result {
        Ok(()) => (true, "done".to_string()),
        Err(e) => (false, e.to_string()),
    };
    let _ = tx.send(Progress::Finished { success, message });
}
