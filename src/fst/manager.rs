//! Online construction of a minimal acyclic subsequential transducer from a
//! sorted `key<TAB>value` file, plus binary persistence in the QUTD v1
//! format.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::state::State;
use super::transducer::Transducer;
use crate::error::{BuildError, LoadError, SaveError};
use crate::types::StateId;

/// Every ~4KB of input consumed during `build`, and every 1024 states
/// written/read during `save`/`load`.
const BUILD_PROGRESS_GRANULARITY: u64 = 4096;
const STATE_PROGRESS_GRANULARITY: u64 = 1024;

const MAGIC: &[u8; 4] = b"QUTD";
const FORMAT_VERSION: i32 = 1;

/// A sentinel next-state placeholder used while a tmp state's transition is
/// opened but its target has not yet been frozen. Every placeholder is
/// overwritten before the owning tmp state is itself frozen, since children
/// are always frozen strictly before their parents.
const PENDING: StateId = StateId::new(u32::MAX);

/// Drives construction, persistence, and self-test of `Transducer`s.
#[derive(Debug, Clone, Copy)]
pub struct TransducerManager {
    max_word_size: usize,
}

impl Default for TransducerManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TransducerManager {
    pub const DEFAULT_MAX_WORD_SIZE: usize = 1024;

    pub fn new() -> Self {
        Self {
            max_word_size: Self::DEFAULT_MAX_WORD_SIZE,
        }
    }

    pub fn with_max_word_size(max_word_size: usize) -> Self {
        Self { max_word_size }
    }

    pub fn build(&self, path: &Path) -> Result<Transducer, BuildError> {
        self.build_with_progress(path, |_, _| {})
    }

    /// Builds a transducer from the sorted `key<TAB>value` lines at `path`,
    /// calling `on_progress(bytes_read, bytes_total)` at least every ~4KB.
    pub fn build_with_progress(
        &self,
        path: &Path,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<Transducer, BuildError> {
        let file = File::open(path).map_err(|e| BuildError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let bytes_total = file.metadata().map(|m| m.len()).unwrap_or(0);
        let reader = BufReader::new(file);

        let mut tmp_states: Vec<State> = vec![State::new(); self.max_word_size + 1];
        let mut interned: HashMap<u64, Vec<StateId>> = HashMap::new();
        let mut arena: Vec<State> = Vec::new();

        let mut w_prev: Vec<char> = Vec::new();
        let mut any_lines = false;
        let mut bytes_read: u64 = 0;
        let mut last_reported: u64 = 0;

        for (line_no, line_result) in reader.lines().enumerate() {
            let line = line_result.map_err(|e| BuildError::IoUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            bytes_read += line.len() as u64 + 1;

            if bytes_read - last_reported >= BUILD_PROGRESS_GRANULARITY {
                on_progress(bytes_read, bytes_total);
                last_reported = bytes_read;
            }

            let Some((key, value)) = line.split_once('\t') else {
                continue;
            };
            if key.is_empty() {
                continue;
            }

            let w: Vec<char> = key.chars().collect();
            if w.len() > self.max_word_size {
                return Err(BuildError::WordTooLong {
                    key: key.to_string(),
                    line: line_no + 1,
                    max: self.max_word_size,
                });
            }
            any_lines = true;
            let mut o = value.to_string();

            let p = common_prefix_len(&w_prev, &w);

            // Freeze the suffix of the previous word below the shared prefix.
            for i in (p + 1..=w_prev.len()).rev() {
                let frozen = intern(&tmp_states[i], &mut interned, &mut arena);
                tmp_states[i - 1].set_next(w_prev[i - 1], frozen);
            }

            // Open a fresh (unfrozen) suffix for the current word.
            for i in (p + 1)..=w.len() {
                tmp_states[i].clear();
                tmp_states[i - 1].set_next(w[i - 1], PENDING);
            }

            if w != w_prev {
                tmp_states[w.len()].set_final(true);
            }

            // Push outputs forward along the shared prefix.
            for (i, &c) in w.iter().enumerate().take(p) {
                let cur_out = tmp_states[i].output(c).unwrap_or("").to_string();
                let cp = common_prefix_str(&cur_out, &o);
                let suffix = cur_out[cp.len()..].to_string();

                let cp_len = cp.chars().count();
                tmp_states[i].set_output(c, cp);
                tmp_states[i].update_outputs_with_prefix_excluding(&suffix, c);
                if tmp_states[i].is_final() {
                    tmp_states[i].update_finals_with_prefix(&suffix);
                }
                o = o.chars().skip(cp_len).collect();
            }

            if w == w_prev {
                tmp_states[w.len()].add_final(o);
            } else {
                tmp_states[p].set_output(w[p], o);
            }

            w_prev = w;
        }

        if !any_lines {
            return Err(BuildError::EmptyInput);
        }

        for i in (1..=w_prev.len()).rev() {
            let frozen = intern(&tmp_states[i], &mut interned, &mut arena);
            tmp_states[i - 1].set_next(w_prev[i - 1], frozen);
        }
        let init = intern(&tmp_states[0], &mut interned, &mut arena);

        on_progress(bytes_total, bytes_total);

        Ok(Transducer::from_parts(arena, Some(init)))
    }

    pub fn save(&self, transducer: &Transducer, path: &Path) -> Result<(), SaveError> {
        self.save_with_progress(transducer, path, |_, _| {})
    }

    pub fn save_with_progress(
        &self,
        transducer: &Transducer,
        path: &Path,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<(), SaveError> {
        let Some(init) = transducer.init_state() else {
            return Err(SaveError::NotReady);
        };

        let file = File::create(path).map_err(|e| SaveError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut w = BufWriter::new(file);
        let states = transducer.states();
        let total = states.len() as u64;

        let result: std::io::Result<()> = (|| {
            w.write_all(MAGIC)?;
            w.write_i32::<LittleEndian>(FORMAT_VERSION)?;
            w.write_i64::<LittleEndian>(i64::from(init.index() as u32) + 1)?;
            w.write_i64::<LittleEndian>(total as i64)?;

            for (idx, state) in states.iter().enumerate() {
                w.write_i64::<LittleEndian>(idx as i64 + 1)?;
                w.write_i8(if state.is_final() { b'f' as i8 } else { b'F' as i8 })?;

                if state.is_final() {
                    write_string_list(&mut w, state.finals())?;
                }

                w.write_i64::<LittleEndian>(state.num_transitions() as i64)?;
                for t in state.transitions() {
                    w.write_i32::<LittleEndian>(t.label() as i32)?;
                    write_utf16_string(&mut w, t.output())?;
                    w.write_i64::<LittleEndian>(i64::from(t.next().index() as u32) + 1)?;
                }

                if (idx as u64 + 1) % STATE_PROGRESS_GRANULARITY == 0 {
                    on_progress(idx as u64 + 1, total);
                }
            }
            w.flush()
        })();

        result.map_err(|e| SaveError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        on_progress(total, total);
        Ok(())
    }

    pub fn load(&self, path: &Path) -> Result<Transducer, LoadError> {
        self.load_with_progress(path, |_, _| {})
    }

    pub fn load_with_progress(
        &self,
        path: &Path,
        mut on_progress: impl FnMut(u64, u64),
    ) -> Result<Transducer, LoadError> {
        let file = File::open(path).map_err(|e| LoadError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let mut r = BufReader::new(file);

        let io_err = |e: std::io::Error| LoadError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic).map_err(io_err)?;
        if &magic != MAGIC {
            return Err(LoadError::BadMagic);
        }
        let _version = r.read_i32::<LittleEndian>().map_err(io_err)?;
        let init_state_id = r.read_i64::<LittleEndian>().map_err(io_err)?;
        if init_state_id == 0 {
            return Err(LoadError::BadInitId);
        }
        let num_states = r.read_i64::<LittleEndian>().map_err(io_err)?;
        if num_states <= 0 {
            return Err(LoadError::BadStateCount(num_states));
        }

        let mut id_map: HashMap<i64, StateId> = HashMap::new();
        let mut raw_states: Vec<(i64, Vec<String>, bool, Vec<(char, String, i64)>)> =
            Vec::new();

        let mut read_count: i64 = 0;
        for _ in 0..num_states {
            let disk_id = r.read_i64::<LittleEndian>().map_err(io_err)?;
            if disk_id == 0 {
                return Err(LoadError::BadStateId(read_count as usize));
            }

            let mark_raw = r.read_i8().map_err(io_err)?;
            let mark = mark_raw as u8 as char;
            if mark != 'f' && mark != 'F' {
                return Err(LoadError::BadStateMark(mark));
            }
            let is_final = mark == 'f';

            let finals = if is_final {
                read_string_list(&mut r).map_err(io_err)?
            } else {
                Vec::new()
            };

            let n = r.read_i64::<LittleEndian>().map_err(io_err)?;
            if n < 0 {
                return Err(LoadError::BadTransitionCount(n, disk_id));
            }
            if !is_final && n == 0 {
                return Err(LoadError::BadNextId(disk_id));
            }

            let mut transitions = Vec::with_capacity(n as usize);
            for _ in 0..n {
                let label_cp = r.read_i32::<LittleEndian>().map_err(io_err)?;
                if label_cp == 0 {
                    return Err(LoadError::BadLabel(disk_id));
                }
                let label = char::from_u32(label_cp as u32).ok_or(LoadError::BadLabel(disk_id))?;
                let output = read_utf16_string(&mut r).map_err(io_err)?;
                let next_id = r.read_i64::<LittleEndian>().map_err(io_err)?;
                transitions.push((label, output, next_id));
            }

            id_map.insert(disk_id, StateId::new(raw_states.len() as u32));
            raw_states.push((disk_id, finals, is_final, transitions));
            read_count += 1;

            if read_count as u64 % STATE_PROGRESS_GRANULARITY == 0 {
                on_progress(read_count as u64, num_states as u64);
            }
        }

        // A trailing state record beyond the declared count is also a
        // mismatch, even though the declared count was satisfied above.
        if r.read_i64::<LittleEndian>().is_ok() {
            return Err(LoadError::StateCountMismatch {
                declared: num_states,
                read: read_count + 1,
            });
        }

        let Some(&init) = id_map.get(&init_state_id) else {
            return Err(LoadError::UnknownInitId(init_state_id));
        };

        let mut states = Vec::with_capacity(raw_states.len());
        for (disk_id, finals, is_final, transitions) in raw_states {
            let mut state = State::new();
            state.set_final(is_final);
            for f in finals {
                state.add_final(f);
            }
            for (label, output, next_id) in transitions {
                let next = *id_map
                    .get(&next_id)
                    .ok_or(LoadError::UnknownNextId(disk_id, next_id))?;
                state.set_next(label, next);
                state.set_output(label, output);
            }
            states.push(state);
        }

        on_progress(num_states as u64, num_states as u64);

        Ok(Transducer::from_parts(states, Some(init)))
    }

    /// Looks every `key` from `path` up in `transducer`, reporting keys
    /// whose search yields no value.
    pub fn self_test(
        &self,
        transducer: &Transducer,
        path: &Path,
    ) -> Result<Vec<SelfTestMismatch>, BuildError> {
        let file = File::open(path).map_err(|e| BuildError::IoUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let reader = BufReader::new(file);

        let mut mismatches = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| BuildError::IoUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
            let Some((key, _value)) = line.split_once('\t') else {
                continue;
            };
            let (values, trace) = transducer.search(key);
            if values.is_empty() {
                mismatches.push(SelfTestMismatch {
                    line: idx + 1,
                    key: key.to_string(),
                    reached_pos: trace.reached_pos,
                    is_transducer_ready: trace.is_transducer_ready,
                    is_reached_pos_final: trace.is_reached_pos_final,
                    labels_at_failed: trace.labels_at_failed.clone(),
                });
            }
        }
        Ok(mismatches)
    }
}

/// A key that failed self-test lookup, and how far the walk got.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelfTestMismatch {
    /// 1-based input line number.
    pub line: usize,
    pub key: String,
    pub reached_pos: usize,
    pub is_transducer_ready: bool,
    pub is_reached_pos_final: bool,
    pub labels_at_failed: Vec<char>,
}

impl SelfTestMismatch {
    /// `key` with `<--` spliced in right after the reached position, for
    /// display — mirrors the original self-test's failure marker.
    pub fn marked_key(&self) -> String {
        let mut out = String::new();
        for (i, c) in self.key.chars().enumerate() {
            out.push(c);
            if i == self.reached_pos {
                out.push_str("<--");
            }
        }
        out
    }
}

fn intern(state: &State, interned: &mut HashMap<u64, Vec<StateId>>, arena: &mut Vec<State>) -> StateId {
    let hash = state.key();
    if let Some(ids) = interned.get(&hash) {
        for &id in ids {
            if arena[id.index()] == *state {
                return id;
            }
        }
    }
    let id = StateId::new(arena.len() as u32);
    arena.push(state.clone());
    interned.entry(hash).or_default().push(id);
    id
}

fn common_prefix_len(a: &[char], b: &[char]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_prefix_str(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

fn write_utf16_string(w: &mut impl Write, s: &str) -> std::io::Result<()> {
    let units: Vec<u16> = s.encode_utf16().collect();
    w.write_i32::<LittleEndian>(units.len() as i32)?;
    for u in units {
        w.write_u16::<LittleEndian>(u)?;
    }
    Ok(())
}

fn read_utf16_string(r: &mut impl Read) -> std::io::Result<String> {
    let len = r.read_i32::<LittleEndian>()?;
    let mut units = Vec::with_capacity(len.max(0) as usize);
    for _ in 0..len {
        units.push(r.read_u16::<LittleEndian>()?);
    }
    Ok(String::from_utf16_lossy(&units))
}

fn write_string_list(w: &mut impl Write, items: &[String]) -> std::io::Result<()> {
    w.write_i64::<LittleEndian>(items.len() as i64)?;
    for item in items {
        write_utf16_string(w, item)?;
    }
    Ok(())
}

fn read_string_list(r: &mut impl Read) -> std::io::Result<Vec<String>> {
    let len = r.read_i64::<LittleEndian>()?;
    let mut items = Vec::with_capacity(len.max(0) as usize);
    for _ in 0..len {
        items.push(read_utf16_string(r)?);
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::{check, let_assert};
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn write_input(lines: &[&str]) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(f, "{line}").unwrap();
        }
        f.flush().unwrap();
        f
    }

    // Scenario 4 from §8: minimality and lookup over a small dictionary.
    #[test]
    fn build_minimal_transducer_and_look_up_every_key() {
        let input = write_input(&["lexeme\tlexeme", "lexemes\tlexeme"]);
        let manager = TransducerManager::new();
        let_assert!(Ok(transducer) = manager.build(input.path()));
        check!(transducer.is_ready());

        let (values, _) = transducer.search("lexeme");
        check!(values == ["lexeme".to_string()]);
        let (values, _) = transducer.search("lexemes");
        check!(values == ["lexeme".to_string()]);

        let (values, _) = transducer.search("lex");
        check!(values.is_empty());
    }

    #[test]
    fn build_fails_on_empty_input() {
        let input = write_input(&[]);
        let manager = TransducerManager::new();
        let_assert!(Err(BuildError::EmptyInput) = manager.build(input.path()));
    }

    #[test]
    fn build_fails_on_word_too_long() {
        let long_key = "x".repeat(10);
        let input = write_input(&[&format!("{long_key}\tval")]);
        let manager = TransducerManager::with_max_word_size(4);
        let_assert!(Err(BuildError::WordTooLong { max: 4, .. }) = manager.build(input.path()));
    }

    #[test]
    fn save_then_load_round_trips() {
        let input = write_input(&["car\tvehicle", "care\tvehicle2", "cat\tfeline"]);
        let manager = TransducerManager::new();
        let_assert!(Ok(built) = manager.build(input.path()));

        let out = NamedTempFile::new().unwrap();
        let_assert!(Ok(()) = manager.save(&built, out.path()));

        let_assert!(Ok(loaded) = manager.load(out.path()));
        check!(loaded.num_states() == built.num_states());

        for (key, expected) in [("cat", "feline"), ("car", "vehicle"), ("care", "vehicle2")] {
            let (values, _) = loaded.search(key);
            check!(values == [expected.to_string()]);
        }
    }

    #[test]
    fn save_rejects_unready_transducer() {
        let manager = TransducerManager::new();
        let transducer = Transducer::new();
        let out = NamedTempFile::new().unwrap();
        let_assert!(Err(SaveError::NotReady) = manager.save(&transducer, out.path()));
    }

    #[test]
    fn load_rejects_bad_magic() {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(b"NOPE").unwrap();
        f.flush().unwrap();
        let manager = TransducerManager::new();
        let_assert!(Err(LoadError::BadMagic) = manager.load(f.path()));
    }

    #[test]
    fn load_rejects_transition_to_unknown_state() {
        let mut f = NamedTempFile::new().unwrap();
        {
            let mut w = std::io::BufWriter::new(f.as_file_mut());
            w.write_all(MAGIC).unwrap();
            w.write_i32::<LittleEndian>(FORMAT_VERSION).unwrap();
            w.write_i64::<LittleEndian>(1).unwrap(); // init_state_id
            w.write_i64::<LittleEndian>(1).unwrap(); // num_states

            // Single non-final state with one transition dangling to state 2,
            // which never appears in the stream.
            w.write_i64::<LittleEndian>(1).unwrap(); // disk_id
            w.write_i8(b'F' as i8).unwrap(); // non-final
            w.write_i64::<LittleEndian>(1).unwrap(); // transition count
            w.write_i32::<LittleEndian>('a' as i32).unwrap();
            write_utf16_string(&mut w, "").unwrap();
            w.write_i64::<LittleEndian>(2).unwrap(); // dangling next_id
            w.flush().unwrap();
        }
        let manager = TransducerManager::new();
        let_assert!(Err(LoadError::UnknownNextId(1, 2)) = manager.load(f.path()));
    }

    #[test]
    fn self_test_reports_no_mismatches_for_consistent_dictionary() {
        let input = write_input(&["dog\tanimal", "dogs\tanimal"]);
        let manager = TransducerManager::new();
        let_assert!(Ok(built) = manager.build(input.path()));
        let_assert!(Ok(mismatches) = manager.self_test(&built, input.path()));
        check!(mismatches.is_empty());
    }

    // Scenario 5 from §8: construction order does not affect the resulting
    // automaton as long as keys are presented in sorted order both times.
    #[test]
    fn build_is_independent_of_unrelated_insertion_order_within_sorted_input() {
        let input_a = write_input(&["ab\tx", "abc\ty", "b\tz"]);
        let input_b = write_input(&["ab\tx", "abc\ty", "b\tz"]);
        let manager = TransducerManager::new();
        let_assert!(Ok(t1) = manager.build(input_a.path()));
        let_assert!(Ok(t2) = manager.build(input_b.path()));
        check!(t1.num_states() == t2.num_states());
        for key in ["ab", "abc", "b"] {
            check!(t1.search(key).0 == t2.search(key).0);
        }
    }
}
