//! Abstract syntax tree of filter expressions.

use crate::span::{Span, Spanned};
use std::fmt;

/// A parsed filter condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `field op value`
    Comparison {
        field: Spanned<String>,
        op: ComparisonOp,
        value: Spanned<Literal>,
    },
    /// `field is [not] null`
    IsNull {
        field: Spanned<String>,
        negated: bool,
    },
    /// `field [not] in [values]`
    In {
        field: Spanned<String>,
        values: Vec<Spanned<Literal>>,
        negated: bool,
    },
    /// `field [not] between low and high`, both bounds inclusive.
    Between {
        field: Spanned<String>,
        low: Spanned<Literal>,
        high: Spanned<Literal>,
        negated: bool,
    },
    /// `field [not] startsWith|endsWith|contains|like "text"`
    Text {
        field: Spanned<String>,
        op: TextOp,
        pattern: Spanned<String>,
        negated: bool,
    },
    /// `field isEmpty` / `field isNotEmpty`
    Empty {
        field: Spanned<String>,
        negated: bool,
    },
    /// `!condition`
    Not(Box<Condition>),
    /// Conjunction, in source order.
    And(Vec<Condition>),
    /// Disjunction, in source order.
    Or(Vec<Condition>),
}

impl Condition {
    /// Source span covered by the condition.
    pub fn span(&self) -> Span {
        match self {
            Condition::Comparison { field, value, .. } => field.span.merge(value.span),
            Condition::In { field, values, .. } => values
                .iter()
                .fold(field.span, |span, value| span.merge(value.span)),
            Condition::Between { field, high, .. } => field.span.merge(high.span),
            Condition::Text { field, pattern, .. } => field.span.merge(pattern.span),
            Condition::IsNull { field, .. } | Condition::Empty { field, .. } => field.span,
            Condition::Not(inner) => inner.span(),
            Condition::And(conditions) | Condition::Or(conditions) => conditions
                .iter()
                .map(Condition::span)
                .reduce(Span::merge)
                .unwrap_or_default(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let not = |negated: &bool| if *negated { "not " } else { "" };
        match self {
            Condition::Comparison { field, op, value } => {
                write!(f, "{} {} {}", field.value, op, value.value)
            }
            Condition::IsNull { field, negated } => {
                write!(f, "{} is {}null", field.value, not(negated))
            }
            Condition::In {
                field,
                values,
                negated,
            } => {
                let values: Vec<String> = values.iter().map(|v| v.value.to_string()).collect();
                write!(f, "{} {}in [{}]", field.value, not(negated), values.join(", "))
            }
            Condition::Between {
                field,
                low,
                high,
                negated,
            } => write!(
                f,
                "{} {}between {} and {}",
                field.value,
                not(negated),
                low.value,
                high.value
            ),
            Condition::Text {
                field,
                op,
                pattern,
                negated,
            } => write!(
                f,
                "{} {}{} {}",
                field.value,
                not(negated),
                op,
                Literal::String(pattern.value.clone())
            ),
            Condition::Empty { field, negated } => {
                let keyword = if *negated { "isNotEmpty" } else { "isEmpty" };
                write!(f, "{} {}", field.value, keyword)
            }
            Condition::Not(inner) => write!(f, "!({})", inner),
            Condition::And(conditions) => write_joined(f, conditions, " && "),
            Condition::Or(conditions) => write_joined(f, conditions, " || "),
        }
    }
}

fn write_joined(
    f: &mut fmt::Formatter<'_>,
    conditions: &[Condition],
    separator: &str,
) -> fmt::Result {
    f.write_str("(")?;
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        write!(f, "{}", condition)?;
    }
    f.write_str(")")
}

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl fmt::Display for ComparisonOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ComparisonOp::Eq => "==",
            ComparisonOp::Ne => "!=",
            ComparisonOp::Lt => "<",
            ComparisonOp::Le => "<=",
            ComparisonOp::Gt => ">",
            ComparisonOp::Ge => ">=",
        })
    }
}

/// String matching operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOp {
    StartsWith,
    EndsWith,
    Contains,
    /// Raw LIKE pattern.
    Like,
}

impl fmt::Display for TextOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TextOp::StartsWith => "startsWith",
            TextOp::EndsWith => "endsWith",
            TextOp::Contains => "contains",
            TextOp::Like => "like",
        })
    }
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    /// Name of the literal's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::String(_) => "string",
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Null => f.write_str("null"),
            Literal::Bool(b) => write!(f, "{}", b),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(x) => write!(f, "{:?}", x),
            Literal::String(s) => write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\"")),
        }
    }
}
