// Strongly-typed schema IR for conversion. No serde_json::Value here.

use indexmap::IndexMap;

/// Top-level named schemas, in document order.
pub type SchemaRegistry = IndexMap<String, SchemaNode>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaNode {
    pub ty: Ty,
    pub members: Members,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum Ty {
    Integer { format: Option<String> },
    Number  { format: Option<String> },
    String  { format: Option<String> },
    Boolean,
    Array   { items: Option<Box<SchemaNode>> },
    Object  { additional_properties: AdditionalProperties },
    #[default]
    Unknown,                 // no `type`, or a kind we don't map
}

/// Declared members and composition branches.
///
/// Present on every node, not only objects: a composition branch is flattened
/// by reading its properties whatever its kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Members {
    pub properties: IndexMap<String, SchemaNode>,
    pub any_of: Vec<SchemaNode>,
    pub all_of: Vec<SchemaNode>,
    pub one_of: Vec<SchemaNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum AdditionalProperties {
    #[default]
    Absent,
    Flag(bool),
    Schema(Box<SchemaNode>),
}

impl AdditionalProperties {
    /// Only a literal `true` marks a free-form map.
    pub fn is_free_form(&self) -> bool {
        matches!(self, AdditionalProperties::Flag(true))
    }
}

impl Members {
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.any_of.is_empty()
            && self.all_of.is_empty()
            && self.one_of.is_empty()
    }

    /// Composition branches in flattening order: anyOf, allOf, oneOf.
    pub fn branches(&self) -> impl Iterator<Item = &SchemaNode> {
        self.any_of.iter().chain(&self.all_of).chain(&self.one_of)
    }
}

// ————————————————————————————————————————————————————————————————————————————
// CONSTRUCTORS
// ————————————————————————————————————————————————————————————————————————————

impl SchemaNode {
    pub fn new(ty: Ty) -> Self {
        Self { ty, members: Members::default() }
    }

    /// Placeholder for anything without a direct mapping (reference cycles included).
    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn integer(format: Option<&str>) -> Self {
        Self::new(Ty::Integer { format: format.map(str::to_owned) })
    }

    pub fn number(format: Option<&str>) -> Self {
        Self::new(Ty::Number { format: format.map(str::to_owned) })
    }

    pub fn string(format: Option<&str>) -> Self {
        Self::new(Ty::String { format: format.map(str::to_owned) })
    }

    pub fn boolean() -> Self {
        Self::new(Ty::Boolean)
    }

    pub fn array(items: SchemaNode) -> Self {
        Self::new(Ty::Array { items: Some(Box::new(items)) })
    }

    pub fn object() -> Self {
        Self::new(Ty::Object { additional_properties: AdditionalProperties::Absent })
    }

    pub fn free_form_object() -> Self {
        Self::new(Ty::Object { additional_properties: AdditionalProperties::Flag(true) })
    }

    pub fn with_property(mut self, name: impl Into<String>, node: SchemaNode) -> Self {
        self.members.properties.insert(name.into(), node);
        self
    }

    pub fn with_any_of(mut self, branches: Vec<SchemaNode>) -> Self {
        self.members.any_of = branches;
        self
    }

    pub fn with_all_of(mut self, branches: Vec<SchemaNode>) -> Self {
        self.members.all_of = branches;
        self
    }

    pub fn with_one_of(mut self, branches: Vec<SchemaNode>) -> Self {
        self.members.one_of = branches;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_literal_true_is_free_form() {
        assert!(AdditionalProperties::Flag(true).is_free_form());
        assert!(!AdditionalProperties::Flag(false).is_free_form());
        assert!(!AdditionalProperties::Absent.is_free_form());
        let schema = AdditionalProperties::Schema(Box::new(SchemaNode::string(None)));
        assert!(!schema.is_free_form());
    }

    #[test]
    fn branches_follow_any_all_one_order() {
        let node = SchemaNode::unknown()
            .with_one_of(vec![SchemaNode::boolean()])
            .with_all_of(vec![SchemaNode::number(None)])
            .with_any_of(vec![SchemaNode::integer(None)]);
        let kinds: Vec<&Ty> = node.members.branches().map(|b| &b.ty).collect();
        assert_eq!(kinds.len(), 3);
        assert!(matches!(kinds[0], Ty::Integer { .. }));
        assert!(matches!(kinds[1], Ty::Number { .. }));
        assert!(matches!(kinds[2], Ty::Boolean));
    }

    #[test]
    fn empty_members() {
        assert!(Members::default().is_empty());
        assert!(!SchemaNode::object().with_property("a", SchemaNode::boolean()).members.is_empty());
    }
}
