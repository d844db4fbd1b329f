use itertools::{Itertools, Position};
use serde::{Deserialize, Serialize};

use crate::{
    compiler::{Enumeration, UNKNOWN},
    row::Value,
};

static INDENT_UNIT: &str = "    ";

static GENERATED_WARNING: &str = "// This file is automatically generated, do not edit.\n";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "C++", alias = "cpp")]
    Cpp,
    #[serde(rename = "Rust", alias = "rust")]
    Rust,
}

pub struct CodeBuilder {
    pub lang: Language,
    buf: String,
    /// The identation prefix (in spaces) before each line is written.
    /// Always equals zero ("") or a multiple of 4 (e.g. "    ").
    indent: String,
}

impl CodeBuilder {
    pub fn with_capacity(lang: Language, capacity: usize) -> CodeBuilder {
        CodeBuilder {
            buf: String::with_capacity(capacity),
            indent: String::with_capacity(16),
            lang,
        }
    }

    pub fn into_string(self) -> String {
        self.buf
    }

    pub fn write_indented(&mut self, str: &str) {
        self.buf.push_str(&self.indent);
        self.buf.push_str(str);
    }

    pub fn write(&mut self, str: &str) {
        self.buf.push_str(str);
    }

    pub fn indent(&mut self) {
        self.indent.push_str(INDENT_UNIT);
    }

    pub fn outdent(&mut self) {
        self.indent.replace_range(0..INDENT_UNIT.len(), "");
    }

    /// Opens the include guard (C++ only) and the namespace.
    pub fn build_prologue(&mut self, enumeration: &Enumeration) {
        match self.lang {
            Language::Cpp => {
                let guard = header_guard(&enumeration.name);
                self.write(&format!("#ifndef {}\n#define {}\n\n", guard, guard));
                self.write(GENERATED_WARNING);
                self.write("\n#include <cstdint>\n#include <string>\n\n");
                self.write(&format!("namespace {} {{\n\n", enumeration.namespace));
            }
            Language::Rust => {
                self.write(GENERATED_WARNING);
                self.write(&format!("\npub mod {} {{\n", enumeration.namespace));
                self.indent();
            }
        }
    }

    pub fn build_epilogue(&mut self, enumeration: &Enumeration) {
        match self.lang {
            Language::Cpp => {
                self.write(&format!(
                    "\n}} // end of namespace {}\n\n",
                    enumeration.namespace
                ));
                self.write(&format!(
                    "#endif // end of {}\n",
                    header_guard(&enumeration.name)
                ));
            }
            Language::Rust => {
                self.outdent();
                self.write("}\n");
            }
        }
    }

    pub fn build_enum(&mut self, enumeration: &Enumeration) {
        match self.lang {
            Language::Cpp => {
                self.write(&format!("enum {} {{\n", enumeration.name));
                self.indent();
                for (position, entry) in enumeration.entries.iter().with_position() {
                    let mut value = entry.value.to_string();
                    if !is_last(position) {
                        value.push(',');
                    }
                    let mut line = format!("{:<40}= {:<10}", entry.name, value);
                    match &entry.description {
                        Some(description) => line.push_str(&format!(" // {}", description)),
                        None => line.truncate(line.trim_end().len()),
                    }
                    self.write_indented(&line);
                    self.write("\n");
                }
                self.outdent();
                self.write("};\n\n");
            }
            Language::Rust => {
                self.write_indented("#[allow(non_camel_case_types)]\n");
                self.write_indented("#[derive(Debug, Clone, Copy, PartialEq, Eq)]\n");
                // a zero-variant enum cannot have a representation
                if enumeration
                    .entries
                    .iter()
                    .any(|entry| matches!(entry.value, Value::Number(_)))
                {
                    self.write_indented("#[repr(u64)]\n");
                }
                self.write_indented(&format!("pub enum {} {{\n", enumeration.name));
                self.indent();
                let variants = enumeration
                    .entries
                    .iter()
                    .filter(|entry| matches!(entry.value, Value::Number(_)));
                for (position, entry) in variants.with_position() {
                    if let Some(description) = &entry.description {
                        self.write_indented(&format!("/// {}\n", description));
                    }
                    self.write_indented(&format!("{} = {}", entry.name, entry.value));
                    if !is_last(position) {
                        self.write(",");
                    }
                    self.write("\n");
                }
                self.outdent();
                self.write_indented("}\n\n");
                self.build_aliases(enumeration);
            }
        }
    }

    /// Rust enums cannot share discriminants, so unnumbered rows become
    /// associated constants naming the variant they refer to.
    fn build_aliases(&mut self, enumeration: &Enumeration) {
        let aliases = enumeration
            .entries
            .iter()
            .filter_map(|entry| match &entry.value {
                Value::Symbol(symbol) => Some((entry, symbol)),
                Value::Number(_) => None,
            })
            .collect::<Vec<_>>();
        if aliases.is_empty() {
            return;
        }

        self.write_indented("#[allow(non_upper_case_globals)]\n");
        self.write_indented(&format!("impl {} {{\n", enumeration.name));
        self.indent();
        for (entry, symbol) in aliases {
            if let Some(description) = &entry.description {
                self.write_indented(&format!("/// {}\n", description));
            }
            self.write_indented(&format!(
                "pub const {}: Self = Self::{};\n",
                entry.name, symbol
            ));
        }
        self.outdent();
        self.write_indented("}\n\n");
    }

    /// Writes the lookup function signature followed by `;` (C++ only).
    pub fn build_lookup_declaration(&mut self, enumeration: &Enumeration) {
        debug_assert_eq!(self.lang, Language::Cpp);

        self.write(&format!(
            "std::string {}(int64_t value);\n",
            enumeration.lookup_function_name()
        ));
    }

    pub fn build_lookup(&mut self, enumeration: &Enumeration, inline: bool) {
        match self.lang {
            Language::Cpp => {
                if inline {
                    self.write("inline ");
                }
                self.write(&format!(
                    "std::string {}(int64_t value)\n{{\n",
                    enumeration.lookup_function_name()
                ));
                self.indent();
                self.write_indented("switch (value) {\n");
                self.indent();
                for entry in &enumeration.entries {
                    self.write_indented(&format!("case {}:\n", entry.value));
                    self.indent();
                    self.write_indented(&format!("return \"{}\";\n", entry.name));
                    self.outdent();
                }
                self.write_indented("default:\n");
                self.indent();
                self.write_indented(&format!("return \"{}\";\n", UNKNOWN));
                self.outdent();
                self.outdent();
                self.write_indented("}\n");
                self.outdent();
                self.write("}\n");
            }
            Language::Rust => {
                self.write_indented("#[allow(non_snake_case, unreachable_patterns)]\n");
                self.write_indented(&format!(
                    "pub fn {}(value: u64) -> &'static str {{\n",
                    enumeration.lookup_function_name()
                ));
                self.indent();
                self.write_indented("match value {\n");
                self.indent();
                // resolved aliases get an arm too, shadowed by the variant they name
                for entry in &enumeration.entries {
                    match (&entry.value, entry.number) {
                        (Value::Number(literal), _) => {
                            self.write_indented(&format!("{} => \"{}\",\n", literal, entry.name))
                        }
                        (Value::Symbol(_), Some(number)) => {
                            self.write_indented(&format!("{} => \"{}\",\n", number, entry.name))
                        }
                        (Value::Symbol(_), None) => (),
                    }
                }
                self.write_indented(&format!("_ => \"{}\",\n", UNKNOWN));
                self.outdent();
                self.write_indented("}\n");
                self.outdent();
                self.write_indented("}\n");
            }
        }
    }
}

fn is_last(position: Position) -> bool {
    matches!(position, Position::Last | Position::Only)
}

pub fn header_guard(enum_name: &str) -> String {
    format!("{}_HPP", enum_name.to_uppercase())
}

/// Renders the complete output file. A `split` C++ header only declares the
/// lookup function, [`render_source`] defines it.
pub fn render(enumeration: &Enumeration, lang: Language, split: bool) -> String {
    let mut code = CodeBuilder::with_capacity(lang, 64 * enumeration.entries.len() + 512);
    code.build_prologue(enumeration);
    code.build_enum(enumeration);
    if split && lang == Language::Cpp {
        code.build_lookup_declaration(enumeration);
    } else {
        code.build_lookup(enumeration, true);
    }
    code.build_epilogue(enumeration);
    code.into_string()
}

/// Renders the C++ source file holding the lookup function of a split output.
pub fn render_source(enumeration: &Enumeration, header_name: &str) -> String {
    let mut code = CodeBuilder::with_capacity(Language::Cpp, 48 * enumeration.entries.len() + 256);
    code.write(GENERATED_WARNING);
    code.write(&format!("\n#include \"{}\"\n\n", header_name));
    code.write(&format!("namespace {} {{\n\n", enumeration.namespace));
    code.build_lookup(enumeration, false);
    code.write(&format!(
        "\n}} // end of namespace {}\n",
        enumeration.namespace
    ));
    code.into_string()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compiler::{compile, read_rows};

    fn enumeration(source: &str) -> Enumeration {
        compile(read_rows(source), "e_test", "elf").unwrap()
    }

    fn enum_body(code: &str) -> Vec<&str> {
        code.lines()
            .skip_while(|line| !line.contains("enum e_test {"))
            .skip(1)
            .take_while(|line| !line.trim_start().starts_with('}'))
            .filter(|line| !line.trim_start().starts_with("///"))
            .collect()
    }

    #[test]
    pub fn cpp_layout() {
        let code = render(
            &enumeration("ALPHA 1 first\nBETA 2-3 second\nGAMMA 0x1a\n"),
            Language::Cpp,
            false,
        );
        let expected = "#ifndef E_TEST_HPP
#define E_TEST_HPP

// This file is automatically generated, do not edit.

#include <cstdint>
#include <string>

namespace elf {

enum e_test {
    ALPHA                                   = 1,         // first
    BETA_2                                  = 2,         // second
    BETA_3                                  = 3,         // second
    GAMMA                                   = 0x1A
};

inline std::string e_test_to_string(int64_t value)
{
    switch (value) {
        case 1:
            return \"ALPHA\";
        case 2:
            return \"BETA_2\";
        case 3:
            return \"BETA_3\";
        case 0x1A:
            return \"GAMMA\";
        default:
            return \"unknown\";
    }
}

} // end of namespace elf

#endif // end of E_TEST_HPP
";
        assert_eq!(code, expected);
    }

    #[test]
    pub fn only_the_last_entry_has_no_comma() {
        let e = enumeration("A 1\nB 2 two\nreserved 3-6\nreserved 7\nC 8-9 last range\n");
        for lang in [Language::Cpp, Language::Rust] {
            let code = render(&e, lang, false);
            let body = enum_body(&code);
            assert_eq!(body.len(), e.entries.len(), "{}", code);
            let commas = body
                .iter()
                .filter(|line| line.split("//").next().unwrap().trim_end().ends_with(','))
                .count();
            assert_eq!(commas, e.entries.len() - 1, "{}", code);
            assert!(!body.last().unwrap().split("//").next().unwrap().contains(','));
        }
    }

    #[test]
    pub fn one_case_per_entry_and_one_default() {
        let e = enumeration("A 1\nB 2-4\nC 0x10 hex\n");
        let code = render(&e, Language::Cpp, false);
        assert_eq!(code.matches("case ").count(), e.entries.len());
        assert_eq!(code.matches("default:").count(), 1);
    }

    #[test]
    pub fn split_output() {
        let e = enumeration("SHT_NULL 0\nSHT_PROGBITS 1\n");
        let header = render(&e, Language::Cpp, true);
        assert!(header.contains("std::string e_test_to_string(int64_t value);\n"));
        assert!(!header.contains("switch"));

        let source = render_source(&e, "section_types.hpp");
        assert!(source.starts_with(GENERATED_WARNING));
        assert!(source.contains("#include \"section_types.hpp\"\n"));
        assert!(source.contains("\nstd::string e_test_to_string(int64_t value)\n{\n"));
        assert!(source.contains("return \"SHT_PROGBITS\";"));
        assert!(source.ends_with("} // end of namespace elf\n"));
    }

    #[test]
    pub fn rust_output_parses() {
        let e = enumeration(
            "EM_NONE 0 No machine\nEM_386 3 Intel 80386\nEM_I386 EM_386\nreserved 11-12\nSHF_MASKOS 0x0FF00000 os\n",
        );
        let code = render(&e, Language::Rust, false);
        let file = syn::parse_file(&code).expect("generated Rust must parse");
        assert_eq!(file.items.len(), 1);

        assert!(code.contains("pub mod elf {\n"));
        assert!(code.contains("    #[repr(u64)]\n    pub enum e_test {\n"));
        assert!(code.contains("        /// Intel 80386\n        EM_386 = 3,\n"));
        assert!(code.contains("    impl e_test {\n        pub const EM_I386: Self = Self::EM_386;\n    }\n"));
        assert!(!code.contains("EM_I386 =>"));
        assert!(code.contains("        SHF_MASKOS = 0x0FF00000\n"));
        assert!(code.contains("    pub fn e_test_to_string(value: u64) -> &'static str {\n"));
        assert!(code.contains("            0x0FF00000 => \"SHF_MASKOS\",\n"));
        assert!(code.contains("            _ => \"unknown\",\n"));
    }

    #[test]
    pub fn rust_lookup_has_arms_for_resolved_aliases() {
        let e = enumeration("EM_386 3 Intel\nEM_I386 EM_386\nEM_OLD EM_GONE\nEM_NONE 0\n");
        let code = render(&e, Language::Rust, false);
        assert!(code.contains("3 => \"EM_386\",\n"));
        assert!(code.contains("3 => \"EM_I386\",\n"));
        assert!(!code.contains("\"EM_OLD\""));
        assert!(code.contains("0 => \"EM_NONE\""));
        assert_eq!(code.matches(" => ").count(), 4);
        assert!(code.find("\"EM_386\"").unwrap() < code.find("\"EM_I386\"").unwrap());
    }

    #[test]
    pub fn empty_rust_enum_parses() {
        let code = render(&enumeration(""), Language::Rust, false);
        assert!(!code.contains("repr"));
        syn::parse_file(&code).expect("generated Rust must parse");
    }
}
