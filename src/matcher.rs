use log::debug;

use crate::automaton::{Alphabet, Automaton};
use crate::dfa::{Dfa, FrozenDfa};
use crate::error::Result;
use crate::regex::Regex;

/// A regular expression compiled all the way down: Thompson's construction,
/// epsilon elimination, subset construction, then a frozen table.
#[derive(Clone, Debug)]
pub struct Matcher {
    regex: Regex,
    dfa: Dfa,
    frozen: FrozenDfa,
}

impl Matcher {
    /// Compiles an expression over the binary alphabet.
    pub fn new<S: Into<String>>(expression: S) -> Result<Self> {
        Matcher::from_regex(Regex::new(expression))
    }

    pub fn with_alphabet<S: Into<String>>(expression: S, alphabet: Alphabet) -> Result<Self> {
        Matcher::from_regex(Regex::with_alphabet(expression, alphabet)?)
    }

    pub fn from_regex(regex: Regex) -> Result<Self> {
        let enfa = regex.to_enfa()?;
        let nfa = enfa.to_nfa();
        let dfa = nfa.to_dfa();
        let frozen = dfa.freeze();
        debug!("compiled {:?}: {} -> {} -> {} states",
               regex.as_str(),
               enfa.states().len(),
               nfa.states().len(),
               dfa.states().len());
        Ok(Matcher {
            regex: regex,
            dfa: dfa,
            frozen: frozen,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// The deterministic automaton, for anything that wants to inspect it.
    pub fn dfa(&self) -> &Dfa {
        &self.dfa
    }

    pub fn is_match(&self, input: &str) -> Result<bool> {
        self.frozen.is_match(input)
    }
}

/// Compiles `expression` and runs `input` through it once.
pub fn is_match(expression: &str, input: &str) -> Result<bool> {
    Matcher::new(expression)?.is_match(input)
}
