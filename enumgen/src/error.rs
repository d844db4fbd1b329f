use std::fmt::Display;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    pub kind: ErrorKind,
    /// 1-based line of the listing the error was raised for.
    pub line: usize,
}

impl Error {
    pub fn new(kind: ErrorKind, line: usize) -> Error {
        Error { kind, line }
    }

    pub fn phase(&self) -> ErrorPhase {
        match self.kind {
            ErrorKind::FieldCount { .. } | ErrorKind::MalformedRangeBound { .. } => {
                ErrorPhase::Format
            }
            ErrorKind::Strict(_) => ErrorPhase::Strict,
        }
    }
}

impl std::error::Error for Error {}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at line {}", self.kind.message(), self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The tokenizer produced a row with a column count outside of 2..=4.
    FieldCount { fields: Vec<String> },
    MalformedRangeBound { bound: String },
    /// A diagnostic promoted to an error because strict mode is enabled.
    Strict(DiagnosticKind),
}

impl ErrorKind {
    pub fn message(&self) -> String {
        match self {
            ErrorKind::FieldCount { fields } => format!(
                "invalid number of columns ({}) in row {:?}",
                fields.len(),
                fields
            ),
            ErrorKind::MalformedRangeBound { bound } => {
                format!("malformed range bound '{}'", bound)
            }
            ErrorKind::Strict(kind) => kind.message(),
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    Format,
    Strict,
}

impl ErrorPhase {
    pub fn get_error_prefix(&self) -> &'static str {
        match self {
            Self::Format => "format error",
            Self::Strict => "strict error",
        }
    }
}

/// An [`Error`] located in a particular listing file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateError {
    pub path: String,
    pub error: Error,
}

impl std::error::Error for GenerateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} at {}:{}",
            self.error.phase().get_error_prefix(),
            self.error.kind.message(),
            self.path,
            self.error.line
        )
    }
}

/// A non-fatal finding about the listing, reported while compiling it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub line: usize,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (line {})", self.kind.message(), self.line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Two entries map to the same numeric value; the lookup returns `first`.
    ValueCollision {
        value: u64,
        first: String,
        second: String,
    },
    DuplicateName {
        name: String,
    },
    /// An unnumbered row names a symbol that no earlier entry declares.
    UnresolvedSymbol {
        name: String,
        symbol: String,
    },
    EmptyRange {
        name: String,
        start: u64,
        end: u64,
    },
    /// A range with more entries than a listing can reasonably mean.
    HugeRange {
        name: String,
        start: u64,
        end: u64,
    },
    /// A value literal without a 64-bit meaning, such as `0x` or a decimal overflowing `u64`.
    MalformedValue {
        name: String,
        literal: String,
    },
    /// A name or symbol that would not compile as an identifier in the generated code.
    InvalidIdentifier {
        name: String,
    },
}

impl DiagnosticKind {
    pub fn message(&self) -> String {
        match self {
            DiagnosticKind::ValueCollision {
                value,
                first,
                second,
            } => format!(
                "value {} of '{}' is already taken by '{}'",
                value, second, first
            ),
            DiagnosticKind::DuplicateName { name } => {
                format!("symbol '{}' is declared more than once", name)
            }
            DiagnosticKind::UnresolvedSymbol { name, symbol } => format!(
                "'{}' refers to '{}', which is not declared before it",
                name, symbol
            ),
            DiagnosticKind::EmptyRange { name, start, end } => format!(
                "range {}-{} of '{}' is empty and produces no entries",
                start, end, name
            ),
            DiagnosticKind::HugeRange { name, start, end } => format!(
                "range {}-{} of '{}' exceeds {} entries and is not expanded",
                start,
                end,
                name,
                crate::compiler::MAX_RANGE_LEN
            ),
            DiagnosticKind::MalformedValue { name, literal } => format!(
                "value '{}' of '{}' is not a 64-bit integer",
                literal, name
            ),
            DiagnosticKind::InvalidIdentifier { name } => {
                format!("'{}' is not a valid identifier", name)
            }
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}
