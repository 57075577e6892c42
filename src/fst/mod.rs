//! Minimal acyclic subsequential transducer: construction, lookup, and the
//! QUTD v1 binary persistence format.

mod manager;
mod state;
mod transducer;
mod transition;

pub use manager::{SelfTestMismatch, TransducerManager};
pub use state::State;
pub use transducer::{SearchTrace, Transducer};
pub use transition::Transition;
