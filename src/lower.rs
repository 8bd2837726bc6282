//! Lower the raw document into the typed IR.
//!
//! Local `$ref`s are inlined here so conversion only ever sees owned trees.
//! A reference back into a schema that is still being lowered is a cycle; it
//! becomes an unknown node (→ `"JSON"`) instead of recursing forever.

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::document::{RawAdditional, RawSchema};
use crate::error::LoadError;
use crate::ir::{AdditionalProperties, Members, SchemaNode, SchemaRegistry, Ty};

const REF_PREFIXES: [&str; 3] = ["#/components/schemas/", "#/definitions/", "#/$defs/"];

pub fn lower_registry(schemas: &IndexMap<String, RawSchema>) -> Result<SchemaRegistry, LoadError> {
    let mut lowering = Lowering::new(schemas);
    let mut registry = SchemaRegistry::with_capacity(schemas.len());
    for name in schemas.keys() {
        let node = lowering.lower_named(name, name)?;
        registry.insert(name.clone(), node);
    }
    if lowering.cycles > 0 {
        warn!(cycles = lowering.cycles, "reference cycles replaced with JSON placeholders");
    }
    Ok(registry)
}

struct Lowering<'a> {
    schemas: &'a IndexMap<String, RawSchema>,
    stack: Vec<&'a str>,                    // named schemas currently being lowered
    cache: HashMap<&'a str, SchemaNode>,    // acyclic results only
    cycles: usize,
}

impl<'a> Lowering<'a> {
    fn new(schemas: &'a IndexMap<String, RawSchema>) -> Self {
        Self { schemas, stack: Vec::new(), cache: HashMap::new(), cycles: 0 }
    }

    /// `origin` is the top-level schema we're in, for error messages.
    fn lower_named(&mut self, name: &str, origin: &str) -> Result<SchemaNode, LoadError> {
        let schemas = self.schemas;
        let Some((key, raw)) = schemas.get_key_value(name) else {
            return Err(LoadError::UnresolvedRef {
                schema: origin.to_owned(),
                reference: name.to_owned(),
            });
        };
        let key = key.as_str();

        if let Some(node) = self.cache.get(key) {
            return Ok(node.clone());
        }
        if self.stack.contains(&key) {
            self.cycles += 1;
            debug!(schema = origin, reference = key, "reference cycle");
            return Ok(SchemaNode::unknown());
        }

        let cycles_before = self.cycles;
        self.stack.push(key);
        let lowered = self.lower(raw, origin);
        self.stack.pop();
        let node = lowered?;

        // A node that hit a cycle depends on what was on the stack; don't reuse it.
        if self.cycles == cycles_before {
            self.cache.insert(key, node.clone());
        }
        Ok(node)
    }

    fn lower(&mut self, raw: &'a RawSchema, origin: &str) -> Result<SchemaNode, LoadError> {
        if let Some(reference) = &raw.reference {
            let target = ref_target(reference).ok_or_else(|| LoadError::UnsupportedRef {
                schema: origin.to_owned(),
                reference: reference.clone(),
            })?;
            return self.lower_named(&target, origin);
        }

        let ty = match raw.type_.as_ref().and_then(|t| t.single()) {
            Some("integer") => Ty::Integer { format: raw.format.clone() },
            Some("number") => Ty::Number { format: raw.format.clone() },
            Some("string") => Ty::String { format: raw.format.clone() },
            Some("boolean") => Ty::Boolean,
            Some("array") => Ty::Array {
                items: match &raw.items {
                    Some(items) => Some(Box::new(self.lower(items, origin)?)),
                    None => None,
                },
            },
            Some("object") => Ty::Object {
                additional_properties: match &raw.additional_properties {
                    None => AdditionalProperties::Absent,
                    Some(RawAdditional::Flag(flag)) => AdditionalProperties::Flag(*flag),
                    Some(RawAdditional::Schema(schema)) => {
                        AdditionalProperties::Schema(Box::new(self.lower(schema, origin)?))
                    }
                },
            },
            _ => Ty::Unknown,
        };

        let mut members = Members::default();
        for (name, child) in &raw.properties {
            members.properties.insert(name.clone(), self.lower(child, origin)?);
        }
        members.any_of = self.lower_all(&raw.any_of, origin)?;
        members.all_of = self.lower_all(&raw.all_of, origin)?;
        members.one_of = self.lower_all(&raw.one_of, origin)?;

        Ok(SchemaNode { ty, members })
    }

    fn lower_all(&mut self, raws: &'a [RawSchema], origin: &str) -> Result<Vec<SchemaNode>, LoadError> {
        raws.iter().map(|raw| self.lower(raw, origin)).collect()
    }
}

/// Registry name a local reference points at, with JSON-pointer escapes undone.
fn ref_target(reference: &str) -> Option<String> {
    let rest = REF_PREFIXES.iter().find_map(|prefix| reference.strip_prefix(prefix))?;
    if rest.is_empty() || rest.contains('/') {
        return None;
    }
    Some(rest.replace("~1", "/").replace("~0", "~"))
}

// ------------------------------- Tests ------------------------------------ //
