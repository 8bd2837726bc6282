//! Emit (name, descriptor) pairs as C++ source fragments.
//!
//! - `Table`: `{"name","descriptor"},` lines for a static key → descriptor array
//! - `Chain`: one `if (name == "...") { return <builder>; }` block per schema

use std::fmt::Write as _;

use crate::config::{ChainConfig, OutputFormat};
use crate::descriptor::Descriptor;

pub struct Codegen {
    format: OutputFormat,
    chain: ChainConfig,
    out: String,
    entries: usize,
}

impl Codegen {
    /// `origin` is recorded in the header comment (URL or path of the document).
    pub fn new(format: OutputFormat, chain: &ChainConfig, origin: &str) -> Self {
        let mut out = String::new();
        let origin = origin.replace(['\n', '\r'], " ");
        let _ = writeln!(out, "// @generated by {} from {origin}; do not edit.", env!("CARGO_PKG_NAME"));
        Self { format, chain: chain.clone(), out, entries: 0 }
    }

    pub fn emit(&mut self, name: &str, descriptor: &Descriptor) {
        let name = cpp_string_literal(name);
        let payload = cpp_string_literal(descriptor.as_str());
        match self.format {
            OutputFormat::Table => {
                let _ = writeln!(self.out, "{{{name},{payload}}},");
            }
            OutputFormat::Chain => {
                let call = self.chain.builder_call.replacen("{}", &payload, 1);
                let _ = writeln!(self.out, "if ({} == {name}) {{", self.chain.lookup_var);
                let _ = writeln!(self.out, "    return {call};");
                let _ = writeln!(self.out, "}}");
            }
        }
        self.entries += 1;
    }

    pub fn entries(&self) -> usize {
        self.entries
    }

    pub fn into_string(self) -> String {
        self.out
    }
}

/// Quote `s` as a C++ narrow string literal (UTF-8 passes through).
pub fn cpp_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut after_hex_escape = false;
    for ch in s.chars() {
        // `\x` escapes are greedy; break the literal before a following hex digit
        if after_hex_escape && ch.is_ascii_hexdigit() {
            out.push_str("\"\"");
        }
        after_hex_escape = false;
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", c as u32);
                after_hex_escape = true;
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
