//! The frozen, queryable transducer: an arena of interned states plus a
//! single initial state id.

use super::state::State;
use crate::types::StateId;

/// Diagnostic trail left by a `search` call, independent of whether the
/// search found a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTrace {
    pub is_transducer_ready: bool,
    /// How many input characters were consumed before the walk stopped.
    pub reached_pos: usize,
    /// Whether the state reached at `reached_pos` is final.
    pub is_reached_pos_final: bool,
    /// Labels available at the state where the walk stopped, if it stopped
    /// early because no transition matched the next input character.
    pub labels_at_failed: Vec<char>,
}

/// An immutable, minimal acyclic subsequential transducer over `char` labels.
#[derive(Debug, Clone, Default)]
pub struct Transducer {
    states: Vec<State>,
    init_state: Option<StateId>,
}

impl Transducer {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(states: Vec<State>, init_state: Option<StateId>) -> Self {
        Self { states, init_state }
    }

    pub fn is_ready(&self) -> bool {
        self.init_state.is_some()
    }

    pub fn init_state(&self) -> Option<StateId> {
        self.init_state
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, id: StateId) -> &State {
        &self.states[id.index()]
    }

    pub fn states(&self) -> &[State] {
        &self.states
    }

    /// Walks `s` from the initial state, accumulating transition outputs.
    /// Returns every value associated with `s`: the accumulated edge output
    /// on its own if the final state it lands on has no extra final
    /// suffixes, plus `accumulated + suffix` for each final suffix recorded
    /// at that state (multiple suffixes only occur when the same key string
    /// was registered more than once during construction).
    pub fn search(&self, s: &str) -> (Vec<String>, SearchTrace) {
        let Some(init) = self.init_state else {
            return (
                Vec::new(),
                SearchTrace {
                    is_transducer_ready: false,
                    reached_pos: 0,
                    is_reached_pos_final: false,
                    labels_at_failed: Vec::new(),
                },
            );
        };

        let mut current = init;
        let mut accumulated = String::new();
        let mut reached_pos = 0usize;

        for c in s.chars() {
            let state = self.state(current);
            match state.transition(c) {
                Some(t) => {
                    accumulated.push_str(t.output());
                    current = t.next();
                    reached_pos += 1;
                }
                None => {
                    let mut labels: Vec<char> = state.transitions().map(|t| t.label()).collect();
                    labels.sort_unstable();
                    return (
                        Vec::new(),
                        SearchTrace {
                            is_transducer_ready: true,
                            reached_pos,
                            is_reached_pos_final: state.is_final(),
                            labels_at_failed: labels,
                        },
                    );
                }
            }
        }

        let state = self.state(current);
        let mut values = Vec::new();
        if state.is_final() {
            if state.finals().is_empty() {
                values.push(accumulated.clone());
            } else {
                for suffix in state.finals() {
                    values.push(format!("{accumulated}{suffix}"));
                }
            }
        }

        (
            values,
            SearchTrace {
                is_transducer_ready: true,
                reached_pos,
                is_reached_pos_final: state.is_final(),
                labels_at_failed: Vec::new(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    fn two_word_dict() -> Transducer {
        // "cat" -> "feline", "car" -> "vehicle"
        // ca[t]-> s1(final, out="") ; but pushing common prefix semantics:
        // state0 --c/--> state1 --a/--> state2 --t/feline--> state3(final)
        //                                      --r/vehicle--> state4(final)
        let mut states = vec![State::new(); 5];
        states[0].set_next('c', StateId::new(1));
        states[1].set_next('a', StateId::new(2));
        states[2].set_next('t', StateId::new(3));
        states[2].set_next('r', StateId::new(4));
        states[2].set_output('t', "feline".to_string());
        states[2].set_output('r', "vehicle".to_string());
        states[3].set_final(true);
        states[4].set_final(true);
        Transducer::from_parts(states, Some(StateId::new(0)))
    }

    #[test]
    fn search_finds_single_value_for_each_key() {
        let t = two_word_dict();
        let (values, trace) = t.search("cat");
        check!(values == ["feline".to_string()]);
        check!(trace.is_reached_pos_final);

        let (values, _) = t.search("car");
        check!(values == ["vehicle".to_string()]);
    }

    #[test]
    fn search_reports_failure_point_on_missing_transition() {
        let t = two_word_dict();
        let (values, trace) = t.search("cow");
        check!(values.is_empty());
        check!(trace.reached_pos == 1);
        check!(trace.labels_at_failed == ['a']);
    }

    #[test]
    fn search_on_unready_transducer() {
        let t = Transducer::new();
        let (values, trace) = t.search("x");
        check!(values.is_empty());
        check!(!trace.is_transducer_ready);
    }

    #[test]
    fn search_multi_valued_final_returns_all_suffixes() {
        let mut states = vec![State::new(); 2];
        states[0].set_next('x', StateId::new(1));
        states[1].set_final(true);
        states[1].add_final("one".to_string());
        states[1].add_final("two".to_string());
        let t = Transducer::from_parts(states, Some(StateId::new(0)));

        let (mut values, _) = t.search("x");
        values.sort();
        check!(values == ["one".to_string(), "two".to_string()]);
    }
}
