use std::fmt::Display;

use crate::{error::ErrorKind, tokenizer::Fields};

/// An integer literal as written in the listing.
///
/// The spelling is kept so that `0x0FF00000` is emitted as such and not as `267386880`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    pub spelling: String,
    /// `None` if the literal does not fit into 64 bits or has no digits (`0x`).
    pub value: Option<u64>,
}

impl Literal {
    pub fn decimal(value: u64) -> Literal {
        Literal {
            spelling: value.to_string(),
            value: Some(value),
        }
    }

    /// Parses a decimal or `0x`-prefixed hexadecimal literal.
    pub fn parse(text: &str) -> Option<Literal> {
        if let Some(digits) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            if !digits.chars().all(|ch| ch.is_ascii_hexdigit()) {
                return None;
            }
            Some(Literal {
                spelling: format!("0x{}", digits.to_ascii_uppercase()),
                value: u64::from_str_radix(digits, 16).ok(),
            })
        } else if !text.is_empty() && text.chars().all(|ch| ch.is_ascii_digit()) {
            Some(Literal {
                spelling: text.to_string(),
                value: text.parse().ok(),
            })
        } else {
            None
        }
    }
}

impl Display for Literal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.spelling)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(Literal),
    /// The name was followed by another name instead of a number, e.g. `EM_ALIAS EM_386`.
    Symbol(String),
}

impl Value {
    fn from_field(text: String) -> Value {
        match Literal::parse(&text) {
            Some(literal) => Value::Number(literal),
            None => Value::Symbol(text),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(literal) => literal.fmt(f),
            Value::Symbol(symbol) => f.write_str(symbol),
        }
    }
}

/// The typed form of one listing line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Bare {
        name: String,
        value: Value,
    },
    Described {
        name: String,
        value: Value,
        description: String,
    },
    /// An inclusive interval of values, expanded into one entry per integer.
    Range {
        name: String,
        start: u64,
        end: u64,
        description: String,
    },
}

impl Row {
    pub fn name(&self) -> &str {
        match self {
            Row::Bare { name, .. } | Row::Described { name, .. } | Row::Range { name, .. } => name,
        }
    }

    pub fn is_reserved(&self) -> bool {
        self.name().eq_ignore_ascii_case("reserved")
    }
}

fn parse_bound(text: String) -> Result<u64, ErrorKind> {
    Literal::parse(&text)
        .and_then(|literal| literal.value)
        .ok_or(ErrorKind::MalformedRangeBound { bound: text })
}

impl TryFrom<Fields> for Row {
    type Error = ErrorKind;

    fn try_from(fields: Fields) -> Result<Row, ErrorKind> {
        let fields = fields.into_inner();
        if !(2..=4).contains(&fields.len()) {
            return Err(ErrorKind::FieldCount { fields });
        }

        let len = fields.len();
        let mut columns = fields.into_iter();
        let mut next = || columns.next().unwrap_or_default();
        let name = next();
        let second = next();
        Ok(match len {
            2 => Row::Bare {
                name,
                value: Value::from_field(second),
            },
            3 => Row::Described {
                name,
                value: Value::from_field(second),
                description: next(),
            },
            _ => {
                let end = next();
                Row::Range {
                    name,
                    start: parse_bound(second)?,
                    end: parse_bound(end)?,
                    description: next(),
                }
            }
        })
    }
}
