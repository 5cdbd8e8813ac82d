use std::iter;

use log::debug;

use crate::automaton::{Alphabet, EnfaTransitions, State, StateSet};
use crate::enfa::Enfa;
use crate::error::{Error, Malformed, Result};

const STAR: char = '*';
const CONCAT: char = '.';
const UNION: char = '+';
const OPEN: char = '(';
const CLOSE: char = ')';

const RESERVED: [char; 5] = [STAR, CONCAT, UNION, OPEN, CLOSE];

/// A symbol of the expression together with its offset in the source text.
/// Inserted concatenations take the offset of the symbol they precede.
type Token = (usize, char);

macro_rules! add_transitions {
    ($one:expr, $other:expr) => {
        for tr in $other {
            $one.entry(tr.0).or_insert_with(StateSet::new).extend(tr.1);
        }
    }
}

#[inline]
fn precedence(operator: char) -> u8 {
    match operator {
        STAR => 2,
        CONCAT => 1,
        _ => 0,
    }
}

/// Hands out the fresh state names of one compilation: `aa`, `ab`, ...,
/// `zz`, `aaa`, ...
#[derive(Debug, Default)]
pub struct NameGenerator {
    count: usize,
}

impl NameGenerator {
    pub fn new() -> Self {
        NameGenerator { count: 0 }
    }

    pub fn fresh(&mut self) -> State {
        let mut n = self.count;
        self.count += 1;

        let mut width = 2;
        let mut capacity = 26 * 26;
        while n >= capacity {
            n -= capacity;
            width += 1;
            capacity *= 26;
        }
        let mut name = vec!['a'; width];
        for slot in name.iter_mut().rev() {
            *slot = (b'a' + (n % 26) as u8) as char;
            n /= 26;
        }
        name.into_iter().collect()
    }
}

/// An automaton under construction. Thompson fragments always have exactly
/// one accepting state, with no transitions leaving it, and nothing leads
/// back into their start state.
#[derive(Debug)]
struct Fragment {
    transitions: EnfaTransitions,
    start: State,
    accept: State,
}

struct Builder<'n> {
    names: &'n mut NameGenerator,
}

impl<'n> Builder<'n> {
    fn empty(&mut self) -> Fragment {
        let start = self.names.fresh();
        let accept = self.names.fresh();
        let mut transitions = EnfaTransitions::new();
        transitions.insert((start.clone(), None), iter::once(accept.clone()).collect());
        Fragment {
            transitions: transitions,
            start: start,
            accept: accept,
        }
    }

    fn symbol(&mut self, symbol: char) -> Fragment {
        let start = self.names.fresh();
        let accept = self.names.fresh();
        let mut transitions = EnfaTransitions::new();
        transitions.insert((start.clone(), Some(symbol)), iter::once(accept.clone()).collect());
        Fragment {
            transitions: transitions,
            start: start,
            accept: accept,
        }
    }

    /// Everything that led into `left.accept` leads into a fresh splice state
    /// instead, and whatever left `right.start` leaves from the splice state.
    fn concatenate(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let splice = self.names.fresh();
        let right_start = right.start;
        let mut transitions = left.transitions;
        add_transitions!(transitions, right.transitions);

        for to in transitions.values_mut() {
            if to.remove(&left.accept) {
                to.insert(splice.clone());
            }
        }

        let moved: Vec<_> = transitions.keys()
            .filter(|(from, _)| *from == right_start)
            .cloned()
            .collect();
        for key in moved {
            if let Some(to) = transitions.remove(&key) {
                add_transitions!(transitions, iter::once(((splice.clone(), key.1), to)));
            }
        }

        Fragment {
            transitions: transitions,
            start: left.start,
            accept: right.accept,
        }
    }

    fn union(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let start = self.names.fresh();
        let accept = self.names.fresh();
        let mut transitions = EnfaTransitions::new();
        transitions.insert((start.clone(), None),
                           vec![left.start, right.start].into_iter().collect());
        transitions.insert((left.accept, None), iter::once(accept.clone()).collect());
        transitions.insert((right.accept, None), iter::once(accept.clone()).collect());
        add_transitions!(transitions, left.transitions);
        add_transitions!(transitions, right.transitions);
        Fragment {
            transitions: transitions,
            start: start,
            accept: accept,
        }
    }

    fn star(&mut self, inner: Fragment) -> Fragment {
        let start = self.names.fresh();
        let accept = self.names.fresh();
        let exits: StateSet = vec![accept.clone(), inner.start.clone()].into_iter().collect();
        let mut transitions = EnfaTransitions::new();
        transitions.insert((start.clone(), None), exits.clone());
        transitions.insert((inner.accept, None), exits);
        add_transitions!(transitions, inner.transitions);
        Fragment {
            transitions: transitions,
            start: start,
            accept: accept,
        }
    }
}

/// Makes every implicit concatenation explicit: `ab` becomes `a.b`.
fn insert_concatenation(expression: &str, alphabet: &Alphabet) -> Result<Vec<Token>> {
    let mut tokens = Vec::with_capacity(expression.len() * 2);
    let mut prev: Option<char> = None;
    for (offset, symbol) in expression.chars().enumerate() {
        let operand = alphabet.contains(symbol);
        if !operand && !RESERVED.contains(&symbol) {
            return Err(Error::InvalidSymbol {
                symbol: symbol,
                offset: offset,
            });
        }
        let after_operand = prev.map_or(false, |prev| {
            alphabet.contains(prev) || prev == CLOSE || prev == STAR
        });
        if (operand || symbol == OPEN) && after_operand {
            tokens.push((offset, CONCAT));
        }
        tokens.push((offset, symbol));
        prev = Some(symbol);
    }
    Ok(tokens)
}

/// Shunting-yard. Every operator is left-associative; star binds tightest,
/// then concatenation, then union.
fn to_postfix(tokens: Vec<Token>) -> Result<Vec<Token>> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut operators: Vec<Token> = Vec::new();
    for (offset, symbol) in tokens {
        match symbol {
            OPEN => operators.push((offset, symbol)),
            CLOSE => loop {
                match operators.pop() {
                    Some((_, OPEN)) => break,
                    Some(operator) => output.push(operator),
                    None => return Err(Malformed::UnbalancedParenthesis(offset).into()),
                }
            },
            STAR | CONCAT | UNION => {
                while let Some(&(_, top)) = operators.last() {
                    if top == OPEN || precedence(top) < precedence(symbol) {
                        break;
                    }
                    output.extend(operators.pop());
                }
                operators.push((offset, symbol));
            }
            _ => output.push((offset, symbol)),
        }
    }
    while let Some((offset, operator)) = operators.pop() {
        if operator == OPEN {
            return Err(Malformed::UnbalancedParenthesis(offset).into());
        }
        output.push((offset, operator));
    }
    Ok(output)
}

fn operand(stack: &mut Vec<Fragment>, operator: char, offset: usize) -> Result<Fragment> {
    stack.pop().ok_or_else(|| {
        Error::from(Malformed::MissingOperand {
            operator: operator,
            offset: offset,
        })
    })
}

/// Thompson's construction over a postfix expression.
fn construct(postfix: &[Token], names: &mut NameGenerator) -> Result<Fragment> {
    let mut builder = Builder { names: names };
    if postfix.is_empty() {
        return Ok(builder.empty());
    }

    let mut stack = Vec::new();
    for &(offset, symbol) in postfix {
        let fragment = match symbol {
            STAR => {
                let inner = operand(&mut stack, symbol, offset)?;
                builder.star(inner)
            }
            CONCAT | UNION => {
                let right = operand(&mut stack, symbol, offset)?;
                let left = operand(&mut stack, symbol, offset)?;
                if symbol == CONCAT {
                    builder.concatenate(left, right)
                } else {
                    builder.union(left, right)
                }
            }
            _ => builder.symbol(symbol),
        };
        stack.push(fragment);
    }

    match (stack.pop(), stack.len()) {
        (Some(fragment), 0) => Ok(fragment),
        (_, left) => Err(Malformed::DanglingOperands(left + 1).into()),
    }
}

/// A regular expression over an alphabet, with `+` for union, `*` for the
/// Kleene star, `.` or juxtaposition for concatenation, and parentheses.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Regex {
    expression: String,
    alphabet: Alphabet,
}

impl Regex {
    /// An expression over the binary alphabet.
    pub fn new<S: Into<String>>(expression: S) -> Self {
        Regex {
            expression: expression.into(),
            alphabet: Alphabet::binary(),
        }
    }

    /// Fails when the alphabet uses one of the operator symbols.
    pub fn with_alphabet<S: Into<String>>(expression: S, alphabet: Alphabet) -> Result<Self> {
        if let Some(&symbol) = RESERVED.iter().find(|&&symbol| alphabet.contains(symbol)) {
            return Err(Error::ReservedSymbol(symbol));
        }
        Ok(Regex {
            expression: expression.into(),
            alphabet: alphabet,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.expression
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    fn postfix_tokens(&self) -> Result<Vec<Token>> {
        to_postfix(insert_concatenation(&self.expression, &self.alphabet)?)
    }

    /// The expression in postfix form, concatenations explicit.
    pub fn postfix(&self) -> Result<String> {
        Ok(self.postfix_tokens()?.into_iter().map(|(_, symbol)| symbol).collect())
    }

    /// Builds the epsilon automaton with Thompson's construction. Fresh state
    /// names are unique within the returned automaton.
    pub fn to_enfa(&self) -> Result<Enfa> {
        let postfix = self.postfix_tokens()?;
        debug!("postfix form of {:?}: {:?}",
               self.expression,
               postfix.iter().map(|&(_, symbol)| symbol).collect::<String>());

        let mut names = NameGenerator::new();
        let fragment = construct(&postfix, &mut names)?;
        debug!("thompson construction: {} states named, {} transitions",
               names.count,
               fragment.transitions.len());
        Ok(Enfa::from_parts(self.alphabet.clone(),
                            fragment.transitions,
                            fragment.start,
                            iter::once(fragment.accept).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::automaton::Automaton;

    fn set(states: &[&str]) -> StateSet {
        states.iter().map(|s| s.to_string()).collect()
    }

    fn enfa_map(edges: &[(&str, Option<char>, &[&str])]) -> EnfaTransitions {
        edges.iter()
            .map(|&(from, symbol, to)| ((from.to_string(), symbol), set(to)))
            .collect()
    }

    fn explicit(expression: &str) -> String {
        insert_concatenation(expression, &Alphabet::binary())
            .unwrap()
            .into_iter()
            .map(|(_, symbol)| symbol)
            .collect()
    }

    fn postfix(expression: &str) -> String {
        Regex::new(expression).postfix().unwrap()
    }

    #[test]
    fn fresh_names() {
        let mut names = NameGenerator::new();
        let all: Vec<State> = (0..26 * 26 + 2).map(|_| names.fresh()).collect();
        assert_eq!(all[0], "aa");
        assert_eq!(all[1], "ab");
        assert_eq!(all[25], "az");
        assert_eq!(all[26], "ba");
        assert_eq!(all[26 * 26 - 1], "zz");
        assert_eq!(all[26 * 26], "aaa");
        assert_eq!(all[26 * 26 + 1], "aab");
        let distinct: StateSet = all.iter().cloned().collect();
        assert_eq!(distinct.len(), all.len());
    }

    #[test]
    fn explicit_concatenation() {
        assert_eq!(explicit("01"), "0.1");
        assert_eq!(explicit("0.1"), "0.1");
        assert_eq!(explicit("0(1)"), "0.(1)");
        assert_eq!(explicit("(0)(1)"), "(0).(1)");
        assert_eq!(explicit("0*1"), "0*.1");
        assert_eq!(explicit("(0+1)*01"), "(0+1)*.0.1");
        assert_eq!(explicit("0+1"), "0+1");
    }

    #[test]
    fn postfix_forms() {
        assert_eq!(postfix("0+1"), "01+");
        assert_eq!(postfix("01"), "01.");
        assert_eq!(postfix("0+1*"), "01*+");
        assert_eq!(postfix("0+10"), "010.+");
        assert_eq!(postfix("0+1+0"), "01+0+");
        assert_eq!(postfix("(0+1)*"), "01+*");
        assert_eq!(postfix("(0+1)*011"), "01+*0.1.1.");
        assert_eq!(postfix(""), "");
    }

    #[test]
    fn malformed_expressions() {
        let error = |expression: &str| Regex::new(expression).to_enfa().unwrap_err();
        assert_eq!(error("(0"), Error::MalformedExpression(Malformed::UnbalancedParenthesis(0)));
        assert_eq!(error("0)"), Error::MalformedExpression(Malformed::UnbalancedParenthesis(1)));
        assert_eq!(error("(0+1))*"), Error::MalformedExpression(Malformed::UnbalancedParenthesis(5)));
        assert_eq!(error("+"),
                   Error::MalformedExpression(Malformed::MissingOperand { operator: '+', offset: 0 }));
        assert_eq!(error("0+"),
                   Error::MalformedExpression(Malformed::MissingOperand { operator: '+', offset: 1 }));
        assert_eq!(error("*0"),
                   Error::MalformedExpression(Malformed::MissingOperand { operator: '*', offset: 0 }));
        assert_eq!(error("0..1"),
                   Error::MalformedExpression(Malformed::MissingOperand { operator: '.', offset: 1 }));
        assert_eq!(error("0a1"), Error::InvalidSymbol { symbol: 'a', offset: 1 });
    }

    #[test]
    fn operands_without_operator() {
        let mut names = NameGenerator::new();
        assert_eq!(construct(&[(0, '0'), (1, '1')], &mut names).unwrap_err(),
                   Error::MalformedExpression(Malformed::DanglingOperands(2)));
    }

    #[test]
    fn empty_expression() {
        for expression in &["", "()"] {
            let enfa = Regex::new(*expression).to_enfa().unwrap();
            assert_eq!(enfa.transitions(), &enfa_map(&[("aa", None, &["ab"])]));
            assert_eq!(enfa.start_state(), "aa");
            assert_eq!(enfa.accepting_states(), &set(&["ab"]));
        }
    }

    #[test]
    fn literal() {
        let enfa = Regex::new("1").to_enfa().unwrap();
        assert_eq!(enfa.transitions(), &enfa_map(&[("aa", Some('1'), &["ab"])]));
        assert_eq!(enfa.start_state(), "aa");
        assert_eq!(enfa.accepting_states(), &set(&["ab"]));
    }

    #[test]
    fn concatenation_splices() {
        let enfa = Regex::new("01").to_enfa().unwrap();
        assert_eq!(enfa.transitions(),
                   &enfa_map(&[("aa", Some('0'), &["ae"]), ("ae", Some('1'), &["ad"])]));
        assert_eq!(enfa.start_state(), "aa");
        assert_eq!(enfa.accepting_states(), &set(&["ad"]));
    }

    #[test]
    fn union() {
        let enfa = Regex::new("0+1").to_enfa().unwrap();
        assert_eq!(enfa.transitions(),
                   &enfa_map(&[("aa", Some('0'), &["ab"]),
                               ("ab", None, &["af"]),
                               ("ac", Some('1'), &["ad"]),
                               ("ad", None, &["af"]),
                               ("ae", None, &["aa", "ac"])]));
        assert_eq!(enfa.start_state(), "ae");
        assert_eq!(enfa.accepting_states(), &set(&["af"]));
    }

    #[test]
    fn kleene_star() {
        let enfa = Regex::new("0*").to_enfa().unwrap();
        assert_eq!(enfa.transitions(),
                   &enfa_map(&[("aa", Some('0'), &["ab"]),
                               ("ab", None, &["aa", "ad"]),
                               ("ac", None, &["aa", "ad"])]));
        assert_eq!(enfa.start_state(), "ac");
        assert_eq!(enfa.accepting_states(), &set(&["ad"]));
    }

    #[test]
    fn concatenation_of_compound_fragments() {
        let enfa = Regex::new("(0+1)(0+1)*").to_enfa().unwrap();
        for (input, expected) in &[("", false), ("0", true), ("1", true), ("0110", true)] {
            assert_eq!(enfa.accepts(input), Ok(*expected), "input {:?}", input);
        }
        let enfa = Regex::new("(01)(1+0)").to_enfa().unwrap();
        for (input, expected) in &[("010", true), ("011", true), ("01", false), ("0101", false)] {
            assert_eq!(enfa.accepts(input), Ok(*expected), "input {:?}", input);
        }
    }

    #[test]
    fn concatenation_after_star() {
        let enfa = Regex::new("0*1").to_enfa().unwrap();
        for (input, expected) in &[("", false), ("1", true), ("0001", true), ("10", false)] {
            assert_eq!(enfa.accepts(input), Ok(*expected), "input {:?}", input);
        }
    }

    #[test]
    fn other_alphabets() {
        let alphabet = Alphabet::new("abc".chars());
        let regex = Regex::with_alphabet("a(b+c)*", alphabet).unwrap();
        assert_eq!(regex.postfix().unwrap(), "abc+*.");
        let enfa = regex.to_enfa().unwrap();
        assert_eq!(enfa.accepts("abcb"), Ok(true));
        assert_eq!(enfa.accepts("ba"), Ok(false));

        assert_eq!(Regex::with_alphabet("a", Alphabet::new("a+".chars())),
                   Err(Error::ReservedSymbol('+')));
    }
}
