//! Identifier context
//!
//! A [`Context`] declares which identifiers an expression may reference and
//! the type tag of each. It is supplied per parse call: identifier nodes take
//! their output tag from it, and the bound evaluator validates caller data
//! against it.

use super::types::{TypeTag, TypeTagError};
use super::validator;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Mapping from identifier name to declared type tag
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context {
    entries: BTreeMap<String, Arc<TypeTag>>,
}

impl Context {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare an identifier from a descriptor string
    ///
    /// The descriptor is checked and compiled through the shared descriptor
    /// cache.
    pub fn declare(&mut self, name: impl Into<String>, descriptor: &str) -> Result<(), TypeTagError> {
        let tag = validator::compile(descriptor)?;
        self.entries.insert(name.into(), tag);
        Ok(())
    }

    /// Declare an identifier with an already-built tag
    pub fn with_tag(mut self, name: impl Into<String>, tag: TypeTag) -> Self {
        self.entries.insert(name.into(), Arc::new(tag));
        self
    }

    /// Build a context from `(name, descriptor)` pairs
    ///
    /// ```rust
    /// use precedent::engine::context::Context;
    ///
    /// let ctx = Context::from_descriptors([("score", "number"), ("name", "string")]).unwrap();
    /// assert_eq!(ctx.len(), 2);
    /// ```
    pub fn from_descriptors<'a, K: Into<String>>(
        pairs: impl IntoIterator<Item = (K, &'a str)>,
    ) -> Result<Self, TypeTagError> {
        let mut context = Self::new();
        for (name, descriptor) in pairs {
            context.declare(name, descriptor)?;
        }
        Ok(context)
    }

    /// Build a context from a JSON object
    ///
    /// String members are descriptors; object members declare nested object
    /// types field by field.
    ///
    /// ```rust
    /// use precedent::engine::context::Context;
    ///
    /// let json = serde_json::json!({ "user": { "name": "string", "age": "number" } });
    /// let ctx = Context::from_json(&json).unwrap();
    /// assert_eq!(ctx.get("user").unwrap().to_string(), "{ age: number, name: string }");
    /// ```
    pub fn from_json(json: &serde_json::Value) -> Result<Self, TypeTagError> {
        let serde_json::Value::Object(members) = json else {
            return Err(json_error(json, "context must be a JSON object"));
        };

        let mut context = Self::new();
        for (name, member) in members {
            let tag = tag_from_json(member)?;
            context.entries.insert(name.clone(), tag);
        }
        Ok(context)
    }

    /// Look up an identifier's declared tag
    pub fn get(&self, name: &str) -> Option<&TypeTag> {
        self.entries.get(name).map(|tag| tag.as_ref())
    }

    /// Whether an identifier is declared
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Iterate over declarations in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeTag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_ref()))
    }

    /// Number of declared identifiers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is declared
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn tag_from_json(member: &serde_json::Value) -> Result<Arc<TypeTag>, TypeTagError> {
    match member {
        serde_json::Value::String(descriptor) => validator::compile(descriptor),
        serde_json::Value::Object(fields) => {
            let mut object = BTreeMap::new();
            for (name, field) in fields {
                object.insert(name.clone(), tag_from_json(field)?.as_ref().clone());
            }
            Ok(Arc::new(TypeTag::Object(object)))
        }
        other => Err(json_error(other, "expected a descriptor string or an object")),
    }
}

fn json_error(json: &serde_json::Value, message: &str) -> TypeTagError {
    TypeTagError {
        descriptor: json.to_string(),
        offset: 0,
        message: message.to_string(),
    }
}
