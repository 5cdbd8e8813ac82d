use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

use lazy_static::lazy_static;

use crate::error::{Error, Result};

/// States are named, and compared by name.
pub type State = String;
pub type StateSet = BTreeSet<State>;

/// `None` is the epsilon symbol.
pub type EnfaTransitions = BTreeMap<(State, Option<char>), StateSet>;
pub type NfaTransitions = BTreeMap<(State, char), StateSet>;
pub type DfaTransitions = BTreeMap<(State, char), State>;

lazy_static! {
    static ref BINARY: Alphabet = Alphabet::new(vec!['0', '1']);
}

/// The finite set of input symbols an automaton reads, kept sorted.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Alphabet {
    symbols: Box<[char]>,
}

impl Alphabet {
    pub fn new<I: IntoIterator<Item = char>>(symbols: I) -> Self {
        let symbols: BTreeSet<char> = symbols.into_iter().collect();
        Alphabet {
            symbols: symbols.into_iter().collect::<Vec<_>>().into_boxed_slice(),
        }
    }

    /// `{0, 1}`
    pub fn binary() -> Self {
        BINARY.clone()
    }

    #[inline]
    pub fn contains(&self, symbol: char) -> bool {
        self.index_of(symbol).is_some()
    }

    /// Position of `symbol` in the sorted alphabet.
    #[inline]
    pub fn index_of(&self, symbol: char) -> Option<usize> {
        self.symbols.binary_search(&symbol).ok()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = char> + '_ {
        self.symbols.iter().cloned()
    }

    /// Maps every symbol of `input` to its alphabet position, failing on the
    /// first symbol that is not part of the alphabet.
    pub fn encode(&self, input: &str) -> Result<Vec<usize>> {
        input
            .chars()
            .enumerate()
            .map(|(offset, symbol)| {
                self.index_of(symbol)
                    .ok_or(Error::InvalidSymbol { symbol, offset })
            })
            .collect()
    }

    /// Used on directly built transition maps; the offset is the position
    /// of the offending transition in map order. Epsilon (`None`) passes.
    pub(crate) fn check<I>(&self, symbols: I) -> Result<()>
        where I: IntoIterator<Item = Option<char>>
    {
        for (offset, symbol) in symbols.into_iter().enumerate() {
            match symbol {
                Some(symbol) if !self.contains(symbol) => {
                    return Err(Error::InvalidSymbol { symbol, offset });
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Alphabet::binary()
    }
}

/// What a transition leads to: one state for deterministic automata, a set
/// of states otherwise.
pub trait Destination: Debug {
    fn targets(&self) -> Box<dyn Iterator<Item = &State> + '_>;
}

impl Destination for State {
    fn targets(&self) -> Box<dyn Iterator<Item = &State> + '_> {
        Box::new(::std::iter::once(self))
    }
}

impl Destination for StateSet {
    fn targets(&self) -> Box<dyn Iterator<Item = &State> + '_> {
        Box::new(self.iter())
    }
}

/// The read-only view shared by every automaton kind.
pub trait Automaton {
    type Symbol: Copy + Ord + Debug;
    type Destination: Destination;

    fn transitions(&self) -> &BTreeMap<(State, Self::Symbol), Self::Destination>;

    fn start_state(&self) -> &State;

    fn accepting_states(&self) -> &StateSet;

    fn alphabet(&self) -> &Alphabet;

    /// Runs `input` through the automaton. A string that gets stuck is
    /// rejected; only symbols outside the alphabet are an error.
    fn accepts(&self, input: &str) -> Result<bool>;

    fn is_accepting(&self, state: &str) -> bool {
        self.accepting_states().contains(state)
    }

    /// Every state mentioned by the start state, the transitions or the
    /// accepting set.
    fn states(&self) -> BTreeSet<&State> {
        let mut states = BTreeSet::new();
        states.insert(self.start_state());
        for ((from, _), to) in self.transitions() {
            states.insert(from);
            states.extend(to.targets());
        }
        states.extend(self.accepting_states());
        states
    }
}

/// Canonical name of a set of states: the sorted members joined by commas.
/// Commas and backslashes inside a member are escaped with a backslash, so
/// `{"A,B"}` and `{"A", "B"}` get different names.
pub fn state_set_name(states: &StateSet) -> State {
    let mut name = String::new();
    for (i, state) in states.iter().enumerate() {
        if i > 0 {
            name.push(',');
        }
        for c in state.chars() {
            if c == ',' || c == '\\' {
                name.push('\\');
            }
            name.push(c);
        }
    }
    name
}
