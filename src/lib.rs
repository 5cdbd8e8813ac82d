//! Compiles regular expressions over a small alphabet into deterministic
//! automata.
//!
//! The pipeline runs one stage per module: `regex` parses an expression to
//! postfix form and builds an epsilon automaton with Thompson's
//! construction, `enfa` removes the epsilon transitions, `nfa` performs the
//! subset construction and `dfa` simulates. `Matcher` drives all of it.
//!
//! ```
//! use regfa::Matcher;
//!
//! let matcher = Matcher::new("(0+1)*011").unwrap();
//! assert_eq!(matcher.is_match("110011"), Ok(true));
//! assert_eq!(matcher.is_match("0110"), Ok(false));
//! ```

pub mod automaton;
pub mod dfa;
pub mod enfa;
pub mod error;
pub mod matcher;
pub mod nfa;
pub mod regex;

pub use crate::automaton::{state_set_name, Alphabet, Automaton, DfaTransitions, EnfaTransitions,
                           NfaTransitions, State, StateSet};
pub use crate::dfa::{Dfa, FrozenDfa, FrozenState, DFA_START, DFA_STUCK};
pub use crate::enfa::Enfa;
pub use crate::error::{Error, Malformed, Result};
pub use crate::matcher::{is_match, Matcher};
pub use crate::nfa::Nfa;
pub use crate::regex::{NameGenerator, Regex};
