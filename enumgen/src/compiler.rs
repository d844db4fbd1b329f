use indexmap::IndexMap;

use crate::{
    error::{Diagnostic, DiagnosticKind, Error, Result},
    row::{Literal, Row, Value},
    tokenizer::{tokenize, Fields},
};

/// Returned by the lookup function for values no entry declares.
pub const UNKNOWN: &str = "unknown";

/// Ranges with more entries are reported instead of expanded.
pub const MAX_RANGE_LEN: u64 = 1 << 16;

lazy_static::lazy_static! {
    static ref IDENT_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Whether `name` can be emitted as a C++ and Rust identifier.
pub fn is_identifier(name: &str) -> bool {
    IDENT_REGEX.is_match(name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRow {
    /// 1-based line number in the listing.
    pub line: usize,
    pub fields: Fields,
}

pub type RowSet = Vec<SourceRow>;

/// Tokenizes every line of a listing, skipping the ones that hold no name.
pub fn read_rows(source: &str) -> RowSet {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .filter_map(|(index, line)| {
            let fields = tokenize(line);
            if fields.is_empty() {
                log::debug!("skipping line {} without a name: {:?}", index + 1, line);
                None
            } else {
                Some(SourceRow {
                    line: index + 1,
                    fields,
                })
            }
        })
        .collect()
}

/// Numbers the reserved rows of one enumeration, so that repeated `reserved`
/// names turn into distinct symbols.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReservedCounter(usize);

impl ReservedCounter {
    pub fn starting_at(value: usize) -> ReservedCounter {
        ReservedCounter(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }

    fn take(&mut self) -> usize {
        let value = self.0;
        self.0 += 1;
        value
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumEntry {
    pub name: String,
    pub value: Value,
    /// The numeric meaning of `value`, if it is known.
    pub number: Option<u64>,
    pub description: Option<String>,
    pub line: usize,
}

/// A compiled listing: the entries of the enumeration in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enumeration {
    pub name: String,
    pub namespace: String,
    pub entries: Vec<EnumEntry>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Enumeration {
    pub fn lookup_function_name(&self) -> String {
        format!("{}_to_string", self.name)
    }

    /// Maps a value back to its symbolic name, the same way the generated function does.
    ///
    /// If several entries share the value, the first declared one wins.
    pub fn lookup(&self, value: u64) -> &str {
        self.entries
            .iter()
            .find(|entry| entry.number == Some(value))
            .map_or(UNKNOWN, |entry| entry.name.as_str())
    }
}

struct Compilation {
    enumeration: Enumeration,
    counter: ReservedCounter,
    /// Declared names and their values.
    names: IndexMap<String, Option<u64>>,
    /// The first name declared for each value.
    values: IndexMap<u64, String>,
}

impl Compilation {
    fn new(enum_name: &str, namespace: &str, counter: ReservedCounter) -> Compilation {
        Compilation {
            enumeration: Enumeration {
                name: enum_name.to_string(),
                namespace: namespace.to_string(),
                entries: Vec::new(),
                diagnostics: Vec::new(),
            },
            counter,
            names: IndexMap::new(),
            values: IndexMap::new(),
        }
    }

    fn report(&mut self, kind: DiagnosticKind, line: usize) {
        let diagnostic = Diagnostic { kind, line };
        log::warn!("{}: {}", self.enumeration.name, diagnostic);
        self.enumeration.diagnostics.push(diagnostic);
    }

    fn push(&mut self, entry: EnumEntry, alias: bool) {
        if !is_identifier(&entry.name) {
            self.report(
                DiagnosticKind::InvalidIdentifier {
                    name: entry.name.clone(),
                },
                entry.line,
            );
        }
        if self.names.contains_key(&entry.name) {
            self.report(
                DiagnosticKind::DuplicateName {
                    name: entry.name.clone(),
                },
                entry.line,
            );
        } else {
            self.names.insert(entry.name.clone(), entry.number);
        }

        // an alias shares its value on purpose
        if let (Some(number), false) = (entry.number, alias) {
            match self.values.get(&number) {
                Some(first) => {
                    let kind = DiagnosticKind::ValueCollision {
                        value: number,
                        first: first.clone(),
                        second: entry.name.clone(),
                    };
                    self.report(kind, entry.line);
                }
                None => {
                    self.values.insert(number, entry.name.clone());
                }
            }
        }

        self.enumeration.entries.push(entry);
    }

    fn compile_row(&mut self, row: Row, line: usize) {
        let reserved = row.is_reserved();
        match row {
            Row::Bare { name, value } => self.compile_single(name, value, None, reserved, line),
            Row::Described {
                name,
                value,
                description,
            } => self.compile_single(name, value, Some(description), reserved, line),
            Row::Range {
                name,
                start,
                end,
                description,
            } => {
                if start > end {
                    self.report(DiagnosticKind::EmptyRange { name, start, end }, line);
                    return;
                }
                if end - start >= MAX_RANGE_LEN {
                    self.report(DiagnosticKind::HugeRange { name, start, end }, line);
                    return;
                }
                let prefix = if reserved {
                    format!("{}_{}", self.enumeration.name, name)
                } else {
                    name
                };
                for value in start..=end {
                    let entry = EnumEntry {
                        name: format!("{}_{}", prefix, value),
                        value: Value::Number(Literal::decimal(value)),
                        number: Some(value),
                        description: Some(description.clone()),
                        line,
                    };
                    self.push(entry, false);
                }
            }
        }
    }

    fn compile_single(
        &mut self,
        name: String,
        value: Value,
        description: Option<String>,
        reserved: bool,
        line: usize,
    ) {
        let name = if reserved {
            format!("{}_{}_{}", self.enumeration.name, name, self.counter.take())
        } else {
            name
        };
        let (number, alias) = match &value {
            Value::Number(literal) => {
                if literal.value.is_none() {
                    let kind = DiagnosticKind::MalformedValue {
                        name: name.clone(),
                        literal: literal.spelling.clone(),
                    };
                    self.report(kind, line);
                }
                (literal.value, false)
            }
            Value::Symbol(symbol) => match self.names.get(symbol) {
                Some(number) => (*number, true),
                None if !is_identifier(symbol) => {
                    let kind = DiagnosticKind::InvalidIdentifier {
                        name: symbol.clone(),
                    };
                    self.report(kind, line);
                    (None, true)
                }
                None => {
                    let kind = DiagnosticKind::UnresolvedSymbol {
                        name: name.clone(),
                        symbol: symbol.clone(),
                    };
                    self.report(kind, line);
                    (None, true)
                }
            },
        };
        let entry = EnumEntry {
            name,
            value,
            number,
            description,
            line,
        };
        self.push(entry, alias);
    }
}

/// Compiles the rows of one listing into an [`Enumeration`].
pub fn compile(rows: RowSet, enum_name: &str, namespace: &str) -> Result<Enumeration> {
    compile_with_counter(rows, enum_name, namespace, ReservedCounter::default())
        .map(|(enumeration, _)| enumeration)
}

/// Like [`compile`], but continues numbering reserved rows from `counter` and
/// hands the advanced counter back.
pub fn compile_with_counter(
    rows: RowSet,
    enum_name: &str,
    namespace: &str,
    counter: ReservedCounter,
) -> Result<(Enumeration, ReservedCounter)> {
    let mut compilation = Compilation::new(enum_name, namespace, counter);
    for SourceRow { line, fields } in rows {
        let row = Row::try_from(fields).map_err(|kind| Error::new(kind, line))?;
        compilation.compile_row(row, line);
    }
    log::debug!(
        "compiled {} entries for '{}'",
        compilation.enumeration.entries.len(),
        enum_name
    );
    Ok((compilation.enumeration, compilation.counter))
}
