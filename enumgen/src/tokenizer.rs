use std::fmt::Display;

/// Description given to range rows that end without one, e.g. `EM_RESERVED 242-256`.
pub const PLACEHOLDER_DESCRIPTION: &str = "Description not available";

/// The raw columns of one listing line, in the order they were scanned.
///
/// Depending on the line this holds `[name, value]`, `[name, value, description]` or
/// `[name, start, end, description]`. Malformed lines may yield any other count;
/// those are rejected when the row is compiled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(pub Vec<String>);

impl Fields {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if the line never produced a name, e.g. a blank line or one made of punctuation.
    pub fn is_empty(&self) -> bool {
        self.0.first().map_or(true, |name| name.is_empty())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Display for Fields {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Name,
    Number,
    Description,
}

struct Scanner {
    state: State,
    buf: String,
    fields: Vec<String>,
    /// Number of numeric columns closed so far.
    numbers: usize,
    range: bool,
    hex: bool,
}

impl Scanner {
    fn new() -> Scanner {
        Scanner {
            state: State::Name,
            buf: String::with_capacity(32),
            fields: Vec::with_capacity(4),
            numbers: 0,
            range: false,
            hex: false,
        }
    }

    fn close(&mut self) {
        let field = std::mem::take(&mut self.buf);
        self.fields.push(field);
    }

    fn close_number(&mut self) {
        if !self.buf.is_empty() {
            self.close();
            self.numbers += 1;
            self.hex = false;
        }
    }

    fn feed(&mut self, ch: char) {
        let ch = if ch == '\t' { ' ' } else { ch };
        match self.state {
            State::Name => {
                if is_name_char(ch) {
                    self.buf.push(ch);
                } else if ch == ' ' && !self.buf.is_empty() {
                    self.close();
                    self.state = State::Number;
                }
            }
            State::Number => self.feed_number(ch),
            State::Description => self.buf.push(ch),
        }
    }

    fn feed_number(&mut self, ch: char) {
        match ch {
            '0'..='9' => self.buf.push(ch),
            '-' if !self.buf.is_empty() => {
                self.close_number();
                self.range = true;
            }
            ' ' if !self.buf.is_empty() => self.close_number(),
            ' ' | '-' => (),
            'x' | 'X' if self.buf == "0" => {
                self.hex = true;
                self.buf.push('x');
            }
            'a'..='f' | 'A'..='F' if self.hex => self.buf.push(ch.to_ascii_uppercase()),
            _ => {
                self.close_number();
                self.state = State::Description;
                self.buf.push(ch);
            }
        }
    }

    fn finish(mut self) -> Fields {
        match self.state {
            State::Name | State::Description => self.close(),
            State::Number => {
                self.close_number();
                if self.range || self.numbers > 1 {
                    if self.numbers < 2 {
                        // `NAME 5-` opened a range without an end
                        self.fields.push(String::new());
                    }
                    self.fields.push(PLACEHOLDER_DESCRIPTION.to_string());
                }
            }
        }
        Fields(self.fields)
    }
}

fn is_name_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_'
}

/// Splits one listing line into its columns.
///
/// This never fails: malformed input degrades into a best-effort [`Fields`]
/// instead, which the compiler validates.
pub fn tokenize(line: &str) -> Fields {
    let mut scanner = Scanner::new();
    for ch in line.trim().chars() {
        scanner.feed(ch);
    }
    scanner.finish()
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! assert_fields {
        ($line:expr, [$($field:expr),* $(,)?]) => {{
            let fields = tokenize($line);
            let expected: Vec<&str> = vec![$($field),*];
            assert_eq!(fields.as_slice(), expected.as_slice(), "tokenizing {:?}", $line);
        }};
    }

    #[test]
    pub fn name_and_value() {
        assert_fields!("EM_NONE 0", ["EM_NONE", "0"]);
        assert_fields!("  EM_M32\t\t1  ", ["EM_M32", "1"]);
    }

    #[test]
    pub fn name_value_and_description() {
        assert_fields!("EM_386 3 Intel 80386", ["EM_386", "3", "Intel 80386"]);
        assert_fields!("EM_SPARC\t2\tSUN SPARC", ["EM_SPARC", "2", "SUN SPARC"]);
    }

    #[test]
    pub fn description_keeps_inner_spacing_and_punctuation() {
        assert_fields!(
            "EM_PARISC 15 Hewlett-Packard  PA-RISC (HPPA)",
            ["EM_PARISC", "15", "Hewlett-Packard  PA-RISC (HPPA)"]
        );
        assert_fields!("SHT_X 9 (no comment)", ["SHT_X", "9", "(no comment)"]);
    }

    #[test]
    pub fn dash_range_with_description() {
        assert_fields!(
            "RESERVED 11-14 Reserved for future use",
            ["RESERVED", "11", "14", "Reserved for future use"]
        );
        assert_fields!("BETA 2 - 3 second", ["BETA", "2", "3", "second"]);
    }

    #[test]
    pub fn space_separated_range() {
        assert_fields!("BETA 2 3 second", ["BETA", "2", "3", "second"]);
    }

    #[test]
    pub fn range_without_description_gets_placeholder() {
        assert_fields!(
            "reserved 242-256",
            ["reserved", "242", "256", PLACEHOLDER_DESCRIPTION]
        );
        assert_fields!("reserved 242 256", ["reserved", "242", "256", PLACEHOLDER_DESCRIPTION]);
    }

    #[test]
    pub fn single_value_without_description_has_no_placeholder() {
        let fields = tokenize("SHF_WRITE 0x1");
        assert_eq!(fields.len(), 2);
        assert!(!fields
            .as_slice()
            .iter()
            .any(|f| f == PLACEHOLDER_DESCRIPTION));
    }

    #[test]
    pub fn hex_digits_are_upper_cased() {
        assert_fields!("FOO 0x1a comment", ["FOO", "0x1A", "comment"]);
        assert_fields!("SHF_MASKOS 0x0ff00000", ["SHF_MASKOS", "0x0FF00000"]);
        assert_fields!("SHT_HIUSER 0XffffFFFF", ["SHT_HIUSER", "0xFFFFFFFF"]);
    }

    #[test]
    pub fn hex_mode_ends_with_the_literal() {
        assert_fields!("SHT_HASH 0x5 Defines a hash", ["SHT_HASH", "0x5", "Defines a hash"]);
        assert_fields!("SHF_ALLOC 0x2 accessed", ["SHF_ALLOC", "0x2", "accessed"]);
    }

    #[test]
    pub fn letters_without_hex_prefix_start_the_description() {
        assert_fields!("EM_X 12abc", ["EM_X", "12", "abc"]);
        assert_fields!("EM_X 0 x marks", ["EM_X", "0", "x marks"]);
    }

    #[test]
    pub fn unnumbered_row_keeps_the_continuation() {
        assert_fields!("EM_ALIAS EM_386", ["EM_ALIAS", "EM_386"]);
        assert_fields!("EM_OTHER no number here", ["EM_OTHER", "no number here"]);
    }

    #[test]
    pub fn punctuation_before_the_name_is_skipped() {
        assert_fields!("* EM_NONE 0", ["EM_NONE", "0"]);
        assert_fields!("\"EM_M32\" 1", ["EM_M32", "1"]);
    }

    #[test]
    pub fn malformed_lines_still_produce_fields() {
        assert_fields!("EM_NONE", ["EM_NONE"]);
        assert_fields!("A 1 2 3", ["A", "1", "2", "3", PLACEHOLDER_DESCRIPTION]);
        assert_fields!("A 5-", ["A", "5", "", PLACEHOLDER_DESCRIPTION]);
    }

    #[test]
    pub fn blank_lines_are_empty() {
        assert!(tokenize("").is_empty());
        assert!(tokenize(" \t ").is_empty());
        assert!(tokenize("-- ** --").is_empty());
        assert!(!tokenize("EM_NONE").is_empty());
    }
}
