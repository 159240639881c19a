use std::{collections::BTreeMap, fmt, str::FromStr};

use serde_json::Value;

use crate::error::{KeyPath, SchemaShapeError};

/// Reserved key that makes a mapping node open-ended.
pub const WILDCARD_KEY: &str = "*";

/// Primitive value kinds a schema leaf can demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    /// UTF-8 string.
    String,
    /// Signed or unsigned integer.
    Integer,
    /// Any number, integers included.
    Number,
    /// `true` / `false`.
    Boolean,
    /// Sequence of anything.
    List,
    /// Mapping with unchecked contents.
    Map,
    /// Anything at all, null included.
    Any,
}

impl TypeKind {
    /// Canonical tag name used in schema files and error messages.
    pub fn tag(&self) -> &'static str {
        match self {
            TypeKind::String => "str",
            TypeKind::Integer => "int",
            TypeKind::Number => "float",
            TypeKind::Boolean => "bool",
            TypeKind::List => "list",
            TypeKind::Map => "dict",
            TypeKind::Any => "any",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match self {
            TypeKind::String => value.is_string(),
            TypeKind::Integer => value.is_i64() || value.is_u64(),
            TypeKind::Number => value.is_number(),
            TypeKind::Boolean => value.is_boolean(),
            TypeKind::List => value.is_array(),
            TypeKind::Map => value.is_object(),
            TypeKind::Any => true,
        }
    }
}

/// A primitive type tag such as `int` or `str?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeTag {
    /// Required kind.
    pub kind: TypeKind,
    /// Whether null is also accepted.
    pub nullable: bool,
}

impl TypeTag {
    /// Non-nullable tag of the given kind.
    pub const fn new(kind: TypeKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    /// Whether `value` satisfies this tag.
    pub fn accepts(&self, value: &Value) -> bool {
        (self.nullable && value.is_null()) || self.kind.accepts(value)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.tag())?;
        if self.nullable && self.kind != TypeKind::Any {
            f.write_str("?")?;
        }
        Ok(())
    }
}

impl FromStr for TypeTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (name, nullable) = match s.strip_suffix('?') {
            Some(name) => (name, true),
            None => (s, false),
        };
        let kind = match name {
            "str" | "string" => TypeKind::String,
            "int" | "integer" => TypeKind::Integer,
            "float" | "number" => TypeKind::Number,
            "bool" | "boolean" => TypeKind::Boolean,
            "list" | "array" => TypeKind::List,
            "dict" | "map" => TypeKind::Map,
            "any" => TypeKind::Any,
            other => return Err(format!("unknown type tag `{other}`")),
        };
        Ok(Self {
            kind,
            nullable: nullable || kind == TypeKind::Any,
        })
    }
}

/// Runtime kind name of a record value, for error messages.
pub fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}

/// Mapping node of a schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MapNode {
    /// Named fields, all required.
    pub fields: BTreeMap<String, SchemaNode>,
    /// Schema for keys not named in `fields`; `None` means closed-world.
    pub extra: Option<Box<SchemaNode>>,
}

impl MapNode {
    /// Whether unknown keys are accepted.
    pub fn is_open(&self) -> bool {
        self.extra.is_some()
    }
}

/// Parsed schema tree.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Nested structure.
    Map(MapNode),
    /// Primitive leaf.
    Leaf(TypeTag),
}

impl SchemaNode {
    /// Parse a schema from its in-memory data form.
    ///
    /// The root must be a mapping. Every nested value must be either a
    /// mapping or a string naming a type tag.
    pub fn from_value(value: &Value) -> Result<Self, SchemaShapeError> {
        if !value.is_object() {
            return Err(SchemaShapeError::new(
                KeyPath::root(),
                format!("expected a mapping, found {}", value_kind(value)),
            ));
        }
        Self::parse(value, &KeyPath::root())
    }

    fn parse(value: &Value, path: &KeyPath) -> Result<Self, SchemaShapeError> {
        match value {
            Value::Object(map) => {
                let mut node = MapNode::default();
                for (key, child) in map {
                    let child_path = path.child(key);
                    let parsed = Self::parse(child, &child_path)?;
                    if key == WILDCARD_KEY {
                        node.extra = Some(Box::new(parsed));
                    } else {
                        node.fields.insert(key.clone(), parsed);
                    }
                }
                Ok(SchemaNode::Map(node))
            }
            Value::String(tag) => tag
                .parse::<TypeTag>()
                .map(SchemaNode::Leaf)
                .map_err(|reason| SchemaShapeError::new(path.clone(), reason)),
            other => Err(SchemaShapeError::new(
                path.clone(),
                format!(
                    "expected a mapping or a type tag, found {}",
                    value_kind(other)
                ),
            )),
        }
    }

    /// The mapping node, if this is one.
    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            SchemaNode::Map(map) => Some(map),
            SchemaNode::Leaf(_) => None,
        }
    }

    /// Look up a node by dotted path.
    pub fn get(&self, path: &KeyPath) -> Option<&SchemaNode> {
        let mut node = self;
        for segment in path.segments() {
            node = node.as_map()?.fields.get(segment)?;
        }
        Some(node)
    }

    /// Single-key schema `{key: <node at key>}`.
    ///
    /// Used by components to validate a record against their own subtree.
    pub fn subtree(&self, key: &str) -> Result<SchemaNode, SchemaShapeError> {
        let map = self.as_map().ok_or_else(|| {
            SchemaShapeError::new(KeyPath::root(), "expected a mapping at the schema root")
        })?;
        let node = map.fields.get(key).ok_or_else(|| {
            SchemaShapeError::new(KeyPath::root().child(key), "no schema subtree for this key")
        })?;
        let mut fields = BTreeMap::new();
        fields.insert(key.to_string(), node.clone());
        Ok(SchemaNode::Map(MapNode {
            fields,
            extra: None,
        }))
    }
}
