use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::iter;
use std::mem;

use log::{debug, trace};

use crate::automaton::{state_set_name, Alphabet, Automaton, DfaTransitions, NfaTransitions,
                       State, StateSet};
use crate::dfa::Dfa;
use crate::error::Result;

/// A non-deterministic automaton: every `(state, symbol)` leads to a set of
/// states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nfa {
    alphabet: Alphabet,
    transitions: NfaTransitions,
    start: State,
    accepting: StateSet,
}

impl Nfa {
    /// An automaton over the binary alphabet.
    pub fn new<S: Into<State>>(transitions: NfaTransitions,
                               start: S,
                               accepting: StateSet)
                               -> Result<Self> {
        Nfa::with_alphabet(Alphabet::binary(), transitions, start, accepting)
    }

    pub fn with_alphabet<S: Into<State>>(alphabet: Alphabet,
                                         transitions: NfaTransitions,
                                         start: S,
                                         accepting: StateSet)
                                         -> Result<Self> {
        alphabet.check(transitions.keys().map(|&(_, symbol)| Some(symbol)))?;
        Ok(Nfa::from_parts(alphabet, transitions, start.into(), accepting))
    }

    pub(crate) fn from_parts(alphabet: Alphabet,
                             transitions: NfaTransitions,
                             start: State,
                             accepting: StateSet)
                             -> Self {
        Nfa {
            alphabet: alphabet,
            transitions: transitions,
            start: start,
            accepting: accepting,
        }
    }

    pub(crate) fn into_parts(self) -> (Alphabet, NfaTransitions, State, StateSet) {
        (self.alphabet, self.transitions, self.start, self.accepting)
    }

    #[inline]
    fn next_states<'a, I, E>(&'a self, states: I, symbol: char, nxt_states: &mut E)
        where I: IntoIterator<Item = &'a State>,
              E: Extend<&'a State>
    {
        for state in states {
            if let Some(states) = self.transitions.get(&(state.clone(), symbol)) {
                nxt_states.extend(states);
            }
        }
    }

    /// Subset construction. Every state of the result names the set of
    /// states of `self` it stands for.
    pub fn to_dfa(&self) -> Dfa {
        // Every transition of `self`, keyed by the singleton set of its source.
        let mut subsets: BTreeMap<(StateSet, char), StateSet> = self.transitions
            .iter()
            .map(|((from, symbol), to)| ((iter::once(from.clone()).collect(), *symbol), to.clone()))
            .collect();

        let mut worklist: VecDeque<StateSet> = self.transitions.values().cloned().collect();
        let mut enqueued: BTreeSet<StateSet> = worklist.iter().cloned().collect();
        while let Some(cur_states) = worklist.pop_front() {
            trace!("expanding {{{}}}", state_set_name(&cur_states));
            for symbol in self.alphabet.iter() {
                let mut nxt_states = BTreeSet::new();
                self.next_states(&cur_states, symbol, &mut nxt_states);

                // Skip the stuck state
                if nxt_states.is_empty() {
                    continue;
                }

                let nxt_states: StateSet = nxt_states.into_iter().cloned().collect();
                if nxt_states != cur_states && !enqueued.contains(&nxt_states) {
                    enqueued.insert(nxt_states.clone());
                    worklist.push_back(nxt_states.clone());
                }
                subsets.insert((cur_states.clone(), symbol), nxt_states);
            }
        }

        // One pass only: a set survives if it is the start set or the
        // destination of a transition leaving some other set.
        let start: StateSet = iter::once(self.start.clone()).collect();
        let reachable: BTreeSet<StateSet> = subsets.iter()
            .filter(|(key, to)| key.0 != **to)
            .map(|(_, to)| to.clone())
            .collect();
        subsets.retain(|(from, _), _| *from == start || reachable.contains(from));

        let start_name = state_set_name(&start);
        let mut accepting = StateSet::new();
        if self.accepting.contains(&self.start) {
            accepting.insert(start_name.clone());
        }
        let mut transitions = DfaTransitions::new();
        for ((from, symbol), to) in &subsets {
            for set in [from, to].iter() {
                if !set.is_disjoint(&self.accepting) {
                    accepting.insert(state_set_name(set));
                }
            }
            transitions.insert((state_set_name(from), *symbol), state_set_name(to));
        }

        debug!("subset construction: {} sets explored, {} transitions kept, {} accepting",
               enqueued.len(),
               transitions.len(),
               accepting.len());
        Dfa::from_parts(self.alphabet.clone(), transitions, start_name, accepting)
    }
}

impl Automaton for Nfa {
    type Symbol = char;
    type Destination = StateSet;

    fn transitions(&self) -> &NfaTransitions {
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
        let mut cur_states = BTreeSet::new();
        let mut nxt_states = BTreeSet::new();
        cur_states.insert(&self.start);
        for symbol in input.chars() {
            self.next_states(cur_states.iter().cloned(), symbol, &mut nxt_states);
            // clear + swap: reuses memory.
            cur_states.clear();
            mem::swap(&mut cur_states, &mut nxt_states);

            // Return early if "in stuck state"
            if cur_states.is_empty() {
                return Ok(false);
            }
        }
        Ok(cur_states.iter().any(|state| self.accepting.contains(*state)))
    }
}

impl From<Dfa> for Nfa {
    fn from(dfa: Dfa) -> Self {
        let (alphabet, transitions, start, accepting) = dfa.into_parts();
        let transitions = transitions.into_iter()
            .map(|(key, to)| (key, iter::once(to).collect()))
            .collect();
        Nfa::from_parts(alphabet, transitions, start, accepting)
    }
}
