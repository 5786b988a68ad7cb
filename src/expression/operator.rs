//! Operator codes and operand-count bounds.

use std::fmt;

/// Built-in operators, plus the sentinel for functions invoked by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OperatorCode {
    // Logical
    And,
    Or,
    Not,

    // Comparison
    Equal,
    Unequal,
    Smaller,
    SmallerOrEqual,
    Greater,
    GreaterOrEqual,

    // Extended comparison
    ContainsOneOf,
    ContainsNone,
    ContainsAll,
    Like,

    // Arithmetic
    Add,
    Sub,
    Mult,
    Div,
    Mod,
    UnaryPlus,
    UnaryMinus,

    NamedFunction,
}

impl OperatorCode {
    /// Every operator a complete store must bind (excludes `NamedFunction`)
    pub const REQUIRED: [OperatorCode; 20] = [
        OperatorCode::And,
        OperatorCode::Or,
        OperatorCode::Not,
        OperatorCode::Equal,
        OperatorCode::Unequal,
        OperatorCode::Smaller,
        OperatorCode::SmallerOrEqual,
        OperatorCode::Greater,
        OperatorCode::GreaterOrEqual,
        OperatorCode::ContainsOneOf,
        OperatorCode::ContainsNone,
        OperatorCode::ContainsAll,
        OperatorCode::Like,
        OperatorCode::Add,
        OperatorCode::Sub,
        OperatorCode::Mult,
        OperatorCode::Div,
        OperatorCode::Mod,
        OperatorCode::UnaryPlus,
        OperatorCode::UnaryMinus,
    ];

    /// Number of slots in an operator table
    pub const SLOTS: usize = Self::REQUIRED.len();

    /// Slot index in an operator table, `None` for `NamedFunction`
    pub fn slot(self) -> Option<usize> {
        match self {
            OperatorCode::NamedFunction => None,
            op => Some(op as usize),
        }
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            OperatorCode::And => "AND",
            OperatorCode::Or => "OR",
            OperatorCode::Not => "NOT",
            OperatorCode::Equal => "=",
            OperatorCode::Unequal => "!=",
            OperatorCode::Smaller => "<",
            OperatorCode::SmallerOrEqual => "<=",
            OperatorCode::Greater => ">",
            OperatorCode::GreaterOrEqual => ">=",
            OperatorCode::ContainsOneOf => "CONTAINS_ONE_OF",
            OperatorCode::ContainsNone => "CONTAINS_NONE",
            OperatorCode::ContainsAll => "CONTAINS_ALL",
            OperatorCode::Like => "LIKE",
            OperatorCode::Add => "+",
            OperatorCode::Sub => "-",
            OperatorCode::Mult => "*",
            OperatorCode::Div => "/",
            OperatorCode::Mod => "%",
            OperatorCode::UnaryPlus => "unary +",
            OperatorCode::UnaryMinus => "unary -",
            OperatorCode::NamedFunction => "named function",
        }
    }
}

impl fmt::Display for OperatorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bounds on the number of operands a function accepts
///
/// `max == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arity {
    pub min: usize,
    pub max: Option<usize>,
}

impl Arity {
    pub const fn exactly(n: usize) -> Self {
        Self { min: n, max: Some(n) }
    }

    pub const fn at_least(min: usize) -> Self {
        Self { min, max: None }
    }

    pub const fn between(min: usize, max: usize) -> Self {
        assert!(min <= max, "arity min must not exceed max");
        Self {
            min,
            max: Some(max),
        }
    }

    pub fn accepts(&self, count: usize) -> bool {
        count >= self.min && self.max.map_or(true, |max| count <= max)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) if max == self.min => write!(f, "{}", max),
            Some(max) => write!(f, "{} to {}", self.min, max),
            None => write!(f, "at least {}", self.min),
        }
    }
}
