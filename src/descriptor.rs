//! Schema → descriptor conversion.
//!
//! A descriptor is the canonical, whitespace-free encoding of a schema's type
//! shape:
//! - a quoted primitive token (`"INT32"`, `"STRING"`, `"JSON"`, ...)
//! - an array `[<descriptor>]`
//! - an object `{"name":<descriptor>,...}` with members sorted by name
//!
//! Conversion is total (anything unmapped becomes `"JSON"`) and pure, so equal
//! schemas always produce byte-identical descriptors.
//!
//! Member names are written as-is except for `"` and `\`, which get a
//! backslash so the object stays parseable. A generator that copies names
//! verbatim produces different bytes only for names containing those two
//! characters.

use std::collections::BTreeMap;
use std::fmt;

use crate::ir::{SchemaNode, Ty};

// ------------------------------- Tokens ----------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Int32,
    Int64,
    Double,
    String,
    Date,
    DateTime,
    Binary,
    Boolean,
    Json,
    StringMap,
}

impl Token {
    /// Quoted form as it appears in a descriptor.
    pub fn as_str(self) -> &'static str {
        match self {
            Token::Int32     => r#""INT32""#,
            Token::Int64     => r#""INT64""#,
            Token::Double    => r#""DOUBLE""#,
            Token::String    => r#""STRING""#,
            Token::Date      => r#""DATE""#,
            Token::DateTime  => r#""DATETIME""#,
            Token::Binary    => r#""BINARY""#,
            Token::Boolean   => r#""BOOLEAN""#,
            Token::Json      => r#""JSON""#,
            Token::StringMap => r#""MAP(STRING,STRING)""#,
        }
    }
}

fn integer_token(format: Option<&str>) -> Token {
    match format {
        Some("int32") => Token::Int32,
        _ => Token::Int64, // int64, absent, or anything else
    }
}

fn string_token(format: Option<&str>) -> Token {
    match format {
        Some("date") => Token::Date,
        Some("date-time") => Token::DateTime,
        Some("byte" | "binary") => Token::Binary,
        _ => Token::String,
    }
}

// ----------------------------- Descriptor --------------------------------- //

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor(String);

impl Descriptor {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<Token> for Descriptor {
    fn from(token: Token) -> Self {
        Descriptor(token.as_str().to_owned())
    }
}

impl fmt::Display for Descriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ------------------------------ MemberSet --------------------------------- //

/// Flattened object members. Later writes win; iteration is byte-order sorted.
#[derive(Debug, Clone, Default)]
pub struct MemberSet {
    entries: BTreeMap<String, Descriptor>,
}

impl MemberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, descriptor: Descriptor) {
        self.entries.insert(name.to_owned(), descriptor);
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `{"a":d1,"b":d2}`; `{}` when empty.
    pub fn into_descriptor(self) -> Descriptor {
        let mut out = String::from("{");
        for (idx, (name, descriptor)) in self.entries.into_iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            out.push('"');
            push_escaped_name(&mut out, &name);
            out.push('"');
            out.push(':');
            out.push_str(descriptor.as_str());
        }
        out.push('}');
        Descriptor(out)
    }
}

fn push_escaped_name(out: &mut String, name: &str) {
    for ch in name.chars() {
        if matches!(ch, '"' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
}

// ------------------------------- Convert ---------------------------------- //

/// Convert one schema node into its descriptor.
pub fn convert(node: &SchemaNode) -> Descriptor {
    match &node.ty {
        Ty::Integer { format } => integer_token(format.as_deref()).into(),
        Ty::Number { .. } => Token::Double.into(),
        Ty::String { format } => string_token(format.as_deref()).into(),
        Ty::Boolean => Token::Boolean.into(),
        Ty::Array { items } => {
            let item = match items {
                Some(items) => convert(items),
                None => Token::Json.into(),
            };
            Descriptor(format!("[{item}]"))
        }
        Ty::Object { additional_properties } if additional_properties.is_free_form() => {
            Token::StringMap.into()
        }
        Ty::Object { .. } => {
            let mut members = MemberSet::new();
            flatten_members(node, &mut members);
            members.into_descriptor()
        }
        Ty::Unknown => Token::Json.into(),
    }
}

/// Merge `node`'s properties, then every anyOf/allOf/oneOf branch (recursively),
/// into `members`. Same-name members are overwritten by the later write.
pub fn flatten_members(node: &SchemaNode, members: &mut MemberSet) {
    for (name, child) in &node.members.properties {
        members.insert(name, convert(child));
    }
    for branch in node.members.branches() {
        flatten_members(branch, members);
    }
}

// ------------------------------- Tests ------------------------------------ //
