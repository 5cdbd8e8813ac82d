use std::collections::{BTreeMap, BTreeSet};
use std::iter;

use log::{debug, trace};

use crate::automaton::{Alphabet, Automaton, EnfaTransitions, NfaTransitions, State, StateSet};
use crate::error::Result;
use crate::nfa::Nfa;

/// A non-deterministic automaton that may also move on epsilon, written
/// `None` in the transition map.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enfa {
    alphabet: Alphabet,
    transitions: EnfaTransitions,
    start: State,
    accepting: StateSet,
}

impl Enfa {
    /// An automaton over the binary alphabet.
    pub fn new<S: Into<State>>(transitions: EnfaTransitions,
                               start: S,
                               accepting: StateSet)
                               -> Result<Self> {
        Enfa::with_alphabet(Alphabet::binary(), transitions, start, accepting)
    }

    pub fn with_alphabet<S: Into<State>>(alphabet: Alphabet,
                                         transitions: EnfaTransitions,
                                         start: S,
                                         accepting: StateSet)
                                         -> Result<Self> {
        alphabet.check(transitions.keys().map(|&(_, symbol)| symbol))?;
        Ok(Enfa::from_parts(alphabet, transitions, start.into(), accepting))
    }

    pub(crate) fn from_parts(alphabet: Alphabet,
                             transitions: EnfaTransitions,
                             start: State,
                             accepting: StateSet)
                             -> Self {
        Enfa {
            alphabet: alphabet,
            transitions: transitions,
            start: start,
            accepting: accepting,
        }
    }

    /// All states reachable from `states` through epsilon moves alone,
    /// `states` included.
    fn epsilon_closure<'a, I>(&'a self, states: I) -> BTreeSet<&'a State>
        where I: IntoIterator<Item = &'a State>
    {
        let mut done = BTreeSet::new();
        let mut todo: Vec<&State> = states.into_iter().collect();
        while let Some(state) = todo.pop() {
            if !done.insert(state) {
                continue;
            }
            if let Some(next) = self.transitions.get(&(state.clone(), None)) {
                todo.extend(next.iter().filter(|next| !done.contains(next)));
            }
        }
        done
    }

    /// Removes the epsilon transitions, then drops the transitions of states
    /// nothing points at.
    ///
    /// Epsilon edges are handled a layer at a time. For an edge `p -ε-> q`,
    /// `p` takes over every symbol transition of `q` and becomes accepting
    /// when `q` is. The epsilon edges leaving `q` then form the next layer
    /// as edges leaving `p`. A `(p, q)` pair is only handled once, which
    /// bounds the work on epsilon cycles.
    pub fn to_nfa(&self) -> Nfa {
        let mut accepting = self.accepting.clone();
        let mut transitions = NfaTransitions::new();
        let mut epsilons: BTreeMap<&State, &StateSet> = BTreeMap::new();
        let mut symbols: BTreeMap<&State, Vec<(char, &StateSet)>> = BTreeMap::new();
        for ((from, symbol), to) in &self.transitions {
            match *symbol {
                Some(symbol) => {
                    transitions.insert((from.clone(), symbol), to.clone());
                    symbols.entry(from).or_insert_with(Vec::new).push((symbol, to));
                }
                None => {
                    epsilons.insert(from, to);
                }
            }
        }

        let mut spliced: BTreeSet<(&State, &State)> = BTreeSet::new();
        let mut layer: Vec<(&State, &State)> = epsilons.iter()
            .flat_map(|(&from, &to)| to.iter().map(move |to| (from, to)))
            .collect();
        let mut depth = 0;
        while !layer.is_empty() {
            trace!("epsilon layer {}: {} edges", depth, layer.len());
            let mut next_layer = Vec::new();
            for (from, to) in layer {
                if from == to || !spliced.insert((from, to)) {
                    continue;
                }
                if self.accepting.contains(to) {
                    accepting.insert(from.clone());
                }
                for &(symbol, targets) in symbols.get(to).into_iter().flatten() {
                    transitions.entry((from.clone(), symbol))
                        .or_insert_with(StateSet::new)
                        .extend(targets.iter().cloned());
                }
                if let Some(&targets) = epsilons.get(to) {
                    next_layer.extend(targets.iter().map(|target| (from, target)));
                }
            }
            layer = next_layer;
            depth += 1;
        }

        // A single pass: keep the start state and whatever some destination
        // set mentions.
        let referenced: BTreeSet<State> = transitions.values()
            .flat_map(|to| to.iter().cloned())
            .collect();
        let before = transitions.len();
        transitions.retain(|(from, _), _| *from == self.start || referenced.contains(from));

        debug!("epsilon elimination: {} layers, {} pairs spliced, {} of {} transitions kept, \
                {} accepting",
               depth,
               spliced.len(),
               transitions.len(),
               before,
               accepting.len());
        Nfa::from_parts(self.alphabet.clone(), transitions, self.start.clone(), accepting)
    }
}

impl Automaton for Enfa {
    type Symbol = Option<char>;
    type Destination = StateSet;

    fn transitions(&self) -> &EnfaTransitions {
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
        let mut cur_states = self.epsilon_closure(iter::once(&self.start));
        for symbol in input.chars() {
            let mut nxt_states = Vec::new();
            for state in &cur_states {
                if let Some(states) = self.transitions.get(&((*state).clone(), Some(symbol))) {
                    nxt_states.extend(states);
                }
            }
            if nxt_states.is_empty() {
                return Ok(false);
            }
            cur_states = self.epsilon_closure(nxt_states);
        }
        Ok(cur_states.iter().any(|state| self.accepting.contains(*state)))
    }
}

impl From<Nfa> for Enfa {
    fn from(nfa: Nfa) -> Self {
        let (alphabet, transitions, start, accepting) = nfa.into_parts();
        let transitions = transitions.into_iter()
            .map(|((from, symbol), to)| ((from, Some(symbol)), to))
            .collect();
        Enfa::from_parts(alphabet, transitions, start, accepting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn set(states: &[&str]) -> StateSet {
        states.iter().map(|s| s.to_string()).collect()
    }

    fn enfa(edges: &[(&str, Option<char>, &[&str])], start: &str, accepting: &[&str]) -> Enfa {
        let transitions = edges.iter()
            .map(|&(from, symbol, to)| ((from.to_string(), symbol), set(to)))
            .collect();
        Enfa::new(transitions, start, set(accepting)).unwrap()
    }

    fn nfa_map(edges: &[(&str, char, &[&str])]) -> NfaTransitions {
        edges.iter()
            .map(|&(from, symbol, to)| ((from.to_string(), symbol), set(to)))
            .collect()
    }

    fn layered() -> Enfa {
        enfa(&[("A", Some('0'), &["H"]),
               ("B", None, &["C", "I"]),
               ("C", None, &["F", "G"]),
               ("D", None, &["B"]),
               ("E", None, &["B"]),
               ("F", Some('0'), &["D"]),
               ("G", Some('1'), &["E"]),
               ("H", None, &["C", "I"]),
               ("I", Some('1'), &["J"])],
             "A",
             &["J"])
    }

    #[test]
    fn eliminates_nested_epsilons() {
        let nfa = layered().to_nfa();
        assert_eq!(nfa.transitions(),
                   &nfa_map(&[("A", '0', &["H"]),
                              ("D", '0', &["D"]),
                              ("D", '1', &["E", "J"]),
                              ("E", '0', &["D"]),
                              ("E", '1', &["E", "J"]),
                              ("H", '0', &["D"]),
                              ("H", '1', &["E", "J"])]));
        assert_eq!(nfa.start_state(), "A");
        assert_eq!(nfa.accepting_states(), &set(&["J"]));
    }

    #[test]
    fn elimination_keeps_the_language() {
        let enfa = layered();
        let nfa = enfa.to_nfa();
        for input in &["011001", "0000011001", "", "1", "1011011", "0", "01", "0101", "00"] {
            assert_eq!(enfa.accepts(input), nfa.accepts(input), "input {:?}", input);
        }
        assert_eq!(enfa.accepts("011001"), Ok(true));
        assert_eq!(enfa.accepts(""), Ok(false));
        assert_eq!(enfa.accepts("1"), Ok(false));
    }

    #[test]
    fn elimination_is_idempotent() {
        let nfa = layered().to_nfa();
        assert_eq!(Enfa::from(nfa.clone()).to_nfa(), nfa);
    }

    #[test]
    fn acceptance_flows_back_along_epsilons() {
        let nfa = enfa(&[("S", None, &["T"]), ("T", None, &["U"]), ("U", Some('1'), &["U"])],
                       "S",
                       &["U"])
            .to_nfa();
        assert_eq!(nfa.accepting_states(), &set(&["S", "T", "U"]));
        assert_eq!(nfa.accepts(""), Ok(true));
        assert_eq!(nfa.accepts("11"), Ok(true));
    }

    #[test]
    fn epsilon_cycles_terminate() {
        let enfa = enfa(&[("P", None, &["Q"]),
                          ("Q", None, &["P", "R"]),
                          ("R", None, &["P"]),
                          ("P", Some('0'), &["P"]),
                          ("R", Some('1'), &["Z"])],
                        "P",
                        &["Z"]);
        let nfa = enfa.to_nfa();
        assert_eq!(nfa.transitions().get(&("P".to_string(), '1')), Some(&set(&["Z"])));
        for input in &["", "1", "01", "0001", "10", "011"] {
            assert_eq!(enfa.accepts(input), nfa.accepts(input), "input {:?}", input);
        }
    }

    #[test]
    fn pruning_is_a_single_pass() {
        // U is unreferenced and goes; V is only referenced by U, but the
        // filter runs once, so V keeps its transition.
        let nfa = enfa(&[("S", Some('0'), &["X"]),
                         ("U", Some('0'), &["V"]),
                         ("V", Some('1'), &["W"])],
                       "S",
                       &["X"])
            .to_nfa();
        assert_eq!(nfa.transitions(),
                   &nfa_map(&[("S", '0', &["X"]), ("V", '1', &["W"])]));
    }

    #[test]
    fn empty_language_of_epsilons_only() {
        let nfa = enfa(&[("S", None, &["T"])], "S", &["T"]).to_nfa();
        assert!(nfa.transitions().is_empty());
        assert_eq!(nfa.accepting_states(), &set(&["S", "T"]));
        assert_eq!(nfa.accepts(""), Ok(true));
        assert_eq!(nfa.accepts("0"), Ok(false));
    }

    #[test]
    fn source_is_left_untouched() {
        let enfa = enfa(&[("S", None, &["T"])], "S", &["T"]);
        let _ = enfa.to_nfa();
        assert_eq!(enfa.accepting_states(), &set(&["T"]));
    }

    #[test]
    fn rejects_foreign_transition_symbols() {
        let transitions = vec![(("A".to_string(), None), set(&["B"])),
                               (("B".to_string(), Some('2')), set(&["C"]))]
            .into_iter()
            .collect();
        assert_eq!(Enfa::new(transitions, "A", set(&["C"])),
                   Err(Error::InvalidSymbol { symbol: '2', offset: 1 }));
    }
}
