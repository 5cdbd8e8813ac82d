use std::collections::BTreeMap;

use bit_set::BitSet;
use bit_vec::BitVec;
use log::debug;

use crate::automaton::{Alphabet, Automaton, DfaTransitions, State, StateSet};
use crate::error::Result;

pub const DFA_STUCK: usize = 0;
pub const DFA_START: usize = 1;

/// A deterministic automaton over named states. It may be partial: a
/// missing `(state, symbol)` entry rejects.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dfa {
    alphabet: Alphabet,
    transitions: DfaTransitions,
    start: State,
    accepting: StateSet,
}

impl Dfa {
    /// An automaton over the binary alphabet.
    pub fn new<S: Into<State>>(transitions: DfaTransitions,
                               start: S,
                               accepting: StateSet)
                               -> Result<Self> {
        Dfa::with_alphabet(Alphabet::binary(), transitions, start, accepting)
    }

    pub fn with_alphabet<S: Into<State>>(alphabet: Alphabet,
                                         transitions: DfaTransitions,
                                         start: S,
                                         accepting: StateSet)
                                         -> Result<Self> {
        alphabet.check(transitions.keys().map(|&(_, symbol)| Some(symbol)))?;
        Ok(Dfa::from_parts(alphabet, transitions, start.into(), accepting))
    }

    pub(crate) fn from_parts(alphabet: Alphabet,
                             transitions: DfaTransitions,
                             start: State,
                             accepting: StateSet)
                             -> Self {
        Dfa {
            alphabet: alphabet,
            transitions: transitions,
            start: start,
            accepting: accepting,
        }
    }

    pub(crate) fn into_parts(self) -> (Alphabet, DfaTransitions, State, StateSet) {
        (self.alphabet, self.transitions, self.start, self.accepting)
    }

    /// Numbers the states and lays the transitions out as dense rows, one
    /// column per alphabet symbol. Missing transitions go to `DFA_STUCK`.
    pub fn freeze(&self) -> FrozenDfa {
        let mut numbers: BTreeMap<&State, usize> = BTreeMap::new();
        numbers.insert(&self.start, DFA_START);
        for state in self.states() {
            let next = numbers.len() + 1;
            numbers.entry(state).or_insert(next);
        }

        let width = self.alphabet.len();
        let mut rows = vec![vec![DFA_STUCK; width]; numbers.len() + 1];
        for ((from, symbol), to) in &self.transitions {
            if let Some(column) = self.alphabet.index_of(*symbol) {
                rows[numbers[from]][column] = numbers[to];
            }
        }

        let mut finals = BitVec::from_elem(rows.len(), false);
        for state in &self.accepting {
            if let Some(&number) = numbers.get(state) {
                finals.set(number, true);
            }
        }

        // Live states can still reach a final state.
        let mut predecessors = vec![Vec::new(); rows.len()];
        for (from, row) in rows.iter().enumerate() {
            for &to in row {
                predecessors[to].push(from);
            }
        }
        let mut live = BitSet::with_capacity(rows.len());
        let mut worklist: Vec<usize> = (0..rows.len()).filter(|&n| finals[n]).collect();
        for &state in &worklist {
            live.insert(state);
        }
        while let Some(state) = worklist.pop() {
            for &from in &predecessors[state] {
                if live.insert(from) {
                    worklist.push(from);
                }
            }
        }

        debug!("froze dfa: {} states, {} live, {} symbols",
               numbers.len(),
               live.len(),
               width);
        FrozenDfa {
            alphabet: self.alphabet.clone(),
            states: rows.into_iter()
                .map(|row| FrozenState { transitions: row.into_boxed_slice() })
                .collect::<Vec<_>>()
                .into_boxed_slice(),
            finals: finals,
            live: live,
        }
    }
}

impl Automaton for Dfa {
    type Symbol = char;
    type Destination = State;

    fn transitions(&self) -> &DfaTransitions {
        &self.transitions
    }

    fn start_state(&self) -> &State {
        &self.start
    }

    fn accepting_states(&self) -> &StateSet {
        &self.accepting
    }

    fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn accepts(&self, input: &str) -> Result<bool> {
        self.alphabet.encode(input)?;
        let mut state = &self.start;
        for symbol in input.chars() {
            match self.transitions.get(&(state.clone(), symbol)) {
                Some(next) => state = next,
                None => return Ok(false),
            }
        }
        Ok(self.accepting.contains(state))
    }
}

#[derive(Clone, Debug)]
pub struct FrozenState {
    pub transitions: Box<[usize]>,
}

/// Table form of a `Dfa`. State `DFA_STUCK` loops on every symbol and state
/// `DFA_START` is the start state.
#[derive(Clone, Debug)]
pub struct FrozenDfa {
    alphabet: Alphabet,
    states: Box<[FrozenState]>,
    finals: BitVec,
    live: BitSet,
}

impl FrozenDfa {
    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn states(&self) -> &[FrozenState] {
        &self.states
    }

    pub fn is_final(&self, state: usize) -> bool {
        self.finals.get(state).unwrap_or(false)
    }

    pub fn is_live(&self, state: usize) -> bool {
        self.live.contains(state)
    }

    pub fn is_match(&self, input: &str) -> Result<bool> {
        let input = self.alphabet.encode(input)?;
        let mut state = DFA_START;
        for column in input {
            // Nothing reachable from here accepts.
            if !self.live.contains(state) {
                return Ok(false);
            }
            state = self.states[state].transitions[column];
        }
        Ok(self.finals[state])
    }
}
