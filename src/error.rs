use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed expression: {0}")]
    MalformedExpression(#[from] Malformed),
    #[error("symbol {symbol:?} at offset {offset} is not in the alphabet")]
    InvalidSymbol { symbol: char, offset: usize },
    #[error("symbol {0:?} is reserved for regular expression operators")]
    ReservedSymbol(char),
}

/// Structural problems found while parsing or building an expression.
/// Offsets point into the expression as the caller wrote it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    #[error("unbalanced parenthesis at offset {0}")]
    UnbalancedParenthesis(usize),
    #[error("operator {operator:?} at offset {offset} is missing an operand")]
    MissingOperand { operator: char, offset: usize },
    #[error("{0} operands are not joined by an operator")]
    DanglingOperands(usize),
}
