//! FST state: final flag, labeled transitions, and final suffixes.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use super::transition::Transition;
use crate::types::StateId;

/// A transducer state with a final flag, a label-keyed transition set
/// (`BTreeMap` so iteration is already in the canonical label-sorted order
/// the hash and equality checks require), and an ordered, deduplicated list
/// of final suffixes meaningful only when `is_final`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    is_final: bool,
    transitions: BTreeMap<char, Transition>,
    finals: Vec<String>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_final(&self) -> bool {
        self.is_final
    }

    pub fn set_final(&mut self, is_final: bool) {
        self.is_final = is_final;
    }

    pub fn transition(&self, label: char) -> Option<&Transition> {
        self.transitions.get(&label)
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn num_transitions(&self) -> usize {
        self.transitions.len()
    }

    pub fn finals(&self) -> &[String] {
        &self.finals
    }

    /// Sets (or implicitly creates) the transition for `label` to point at
    /// `next`, preserving any existing output on that transition.
    pub fn set_next(&mut self, label: char, next: StateId) {
        self.transitions
            .entry(label)
            .and_modify(|t| t.next = next)
            .or_insert(Transition {
                label,
                output: String::new(),
                next,
            });
    }

    pub fn next(&self, label: char) -> Option<StateId> {
        self.transitions.get(&label).map(Transition::next)
    }

    pub fn output(&self, label: char) -> Option<&str> {
        self.transitions.get(&label).map(Transition::output)
    }

    /// Silently ignored if `label` has no transition.
    pub fn set_output(&mut self, label: char, output: String) {
        if let Some(t) = self.transitions.get_mut(&label) {
            t.output = output;
        }
    }

    /// Prepends `prefix` to every transition's output.
    pub fn update_outputs_with_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        for t in self.transitions.values_mut() {
            t.output.insert_str(0, prefix);
        }
    }

    /// Prepends `prefix` to every transition's output except the one
    /// labeled `excluding` — used while pushing outputs forward along a
    /// shared prefix, where that one transition is being rewritten to its
    /// own new (shorter) output by the caller instead.
    pub fn update_outputs_with_prefix_excluding(&mut self, prefix: &str, excluding: char) {
        if prefix.is_empty() {
            return;
        }
        for (label, t) in &mut self.transitions {
            if *label != excluding {
                t.output.insert_str(0, prefix);
            }
        }
    }

    /// Inserts into the sorted final-suffix list; no duplicates.
    pub fn add_final(&mut self, suffix: String) {
        if let Err(pos) = self.finals.binary_search(&suffix) {
            self.finals.insert(pos, suffix);
        }
    }

    /// Prepends `prefix` to every final suffix, or — if the list is empty —
    /// appends `prefix` itself as the sole final suffix.
    pub fn update_finals_with_prefix(&mut self, prefix: &str) {
        if prefix.is_empty() {
            return;
        }
        if self.finals.is_empty() {
            self.finals.push(prefix.to_string());
        } else {
            for f in &mut self.finals {
                f.insert_str(0, prefix);
            }
        }
    }

    pub fn clear(&mut self) {
        self.is_final = false;
        self.transitions.clear();
        self.finals.clear();
    }

    /// Stable structural hash: a marker byte, then each transition (in
    /// label order) as `(label, next, output)`, then — if final — the
    /// `|`-joined final suffixes. Equal states always produce equal hashes.
    pub fn key(&self) -> u64 {
        let mut hasher = ahash::AHasher::default();
        let marker: u8 = if self.is_final { b'f' } else { b'F' };
        marker.hash(&mut hasher);
        for t in self.transitions.values() {
            t.label.hash(&mut hasher);
            t.next.hash(&mut hasher);
            t.output.hash(&mut hasher);
        }
        if self.is_final {
            self.finals.join("|").hash(&mut hasher);
        }
        hasher.finish()
    }
}
