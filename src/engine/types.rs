//! Type tags
//!
//! Every AST node carries an output [`TypeTag`]; expression slots in a pattern
//! may constrain the tag of the sub-expression they accept, which is how
//! operator overloads are selected at parse time. Tags are written as
//! descriptors:
//!
//! ```text
//! number | string | boolean | null | undefined | unknown
//! number[]                      array of numbers
//! (number | string)[]           array of a union
//! { name: string, age: number } object with fields
//! string | null                 union
//! ```
//!
//! The `Display` form of a tag is its canonical descriptor.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A type tag
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    /// Numeric value
    Number,
    /// String value
    String,
    /// `true` or `false`
    Boolean,
    /// The `null` value
    Null,
    /// The `undefined` value
    Undefined,
    /// Anything; also the tag of identifiers missing from the context
    Unknown,
    /// Homogeneous array
    Array(Box<TypeTag>),
    /// Object with named fields
    Object(BTreeMap<String, TypeTag>),
    /// Any of the member tags (flattened, deduplicated, at least two members)
    Union(Vec<TypeTag>),
}

impl TypeTag {
    /// Parse a descriptor string
    ///
    /// ```rust
    /// use precedent::engine::types::TypeTag;
    ///
    /// let tag = TypeTag::parse("string | number[]").unwrap();
    /// assert_eq!(tag.to_string(), "string | number[]");
    /// ```
    pub fn parse(descriptor: &str) -> Result<TypeTag, TypeTagError> {
        let mut reader = DescriptorReader {
            source: descriptor,
            pos: 0,
        };
        let tag = reader.union()?;
        reader.skip_ws();
        if reader.pos < descriptor.len() {
            return Err(reader.error("unexpected trailing input"));
        }
        Ok(tag)
    }

    /// Create an array tag
    pub fn array(element: TypeTag) -> TypeTag {
        TypeTag::Array(Box::new(element))
    }

    /// Create an object tag
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, TypeTag)>) -> TypeTag {
        TypeTag::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build the union of several tags
    ///
    /// Nested unions are flattened and duplicates dropped, keeping first-seen
    /// order. A single distinct member is returned as itself; an empty input
    /// yields [`TypeTag::Unknown`].
    pub fn union(members: impl IntoIterator<Item = TypeTag>) -> TypeTag {
        let mut flat: Vec<TypeTag> = Vec::new();
        for member in members {
            match member {
                TypeTag::Union(inner) => {
                    for tag in inner {
                        if !flat.contains(&tag) {
                            flat.push(tag);
                        }
                    }
                }
                tag => {
                    if !flat.contains(&tag) {
                        flat.push(tag);
                    }
                }
            }
        }

        match flat.len() {
            0 => TypeTag::Unknown,
            1 => flat.remove(0),
            _ => TypeTag::Union(flat),
        }
    }

    /// Check whether a value of this tag is acceptable where `constraint` is required
    ///
    /// `unknown` on either side is accepted. A union is accepted when every
    /// member is; a union constraint accepts any of its members. Arrays compare
    /// element tags, objects compare the constraint's fields structurally.
    pub fn satisfies(&self, constraint: &TypeTag) -> bool {
        match (self, constraint) {
            (TypeTag::Unknown, _) | (_, TypeTag::Unknown) => true,
            (TypeTag::Union(members), _) => members.iter().all(|m| m.satisfies(constraint)),
            (_, TypeTag::Union(options)) => options.iter().any(|o| self.satisfies(o)),
            (TypeTag::Array(a), TypeTag::Array(c)) => a.satisfies(c),
            (TypeTag::Object(fields), TypeTag::Object(required)) => {
                required.iter().all(|(name, want)| match fields.get(name) {
                    Some(have) => have.satisfies(want),
                    None => TypeTag::Undefined.satisfies(want),
                })
            }
            (a, c) => a == c,
        }
    }

    /// Whether this is [`TypeTag::Unknown`]
    pub fn is_unknown(&self) -> bool {
        matches!(self, TypeTag::Unknown)
    }

    fn fmt_operand(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Union(_) => write!(f, "({})", self),
            other => write!(f, "{}", other),
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Number => write!(f, "number"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Boolean => write!(f, "boolean"),
            TypeTag::Null => write!(f, "null"),
            TypeTag::Undefined => write!(f, "undefined"),
            TypeTag::Unknown => write!(f, "unknown"),
            TypeTag::Array(element) => {
                element.fmt_operand(f)?;
                write!(f, "[]")
            }
            TypeTag::Object(fields) => {
                if fields.is_empty() {
                    return write!(f, "{{}}");
                }
                write!(f, "{{ ")?;
                for (i, (name, tag)) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if is_plain_key(name) {
                        write!(f, "{}: {}", name, tag)?;
                    } else {
                        write!(f, "{:?}: {}", name, tag)?;
                    }
                }
                write!(f, " }}")
            }
            TypeTag::Union(members) => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " | ")?;
                    }
                    write!(f, "{}", member)?;
                }
                Ok(())
            }
        }
    }
}

impl std::str::FromStr for TypeTag {
    type Err = TypeTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::parse(s)
    }
}

/// A malformed type descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeTagError {
    /// The descriptor that failed to parse
    pub descriptor: String,
    /// Byte offset of the problem
    pub offset: usize,
    /// What went wrong
    pub message: String,
}

impl fmt::Display for TypeTagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid type descriptor {:?} at offset {}: {}",
            self.descriptor, self.offset, self.message
        )
    }
}

impl std::error::Error for TypeTagError {}

fn is_plain_key(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Recursive descent over a descriptor string
struct DescriptorReader<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> DescriptorReader<'a> {
    fn rest(&self) -> &'a str {
        &self.source[self.pos..]
    }

    fn skip_ws(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> TypeTagError {
        TypeTagError {
            descriptor: self.source.to_string(),
            offset: self.pos,
            message: message.into(),
        }
    }

    fn union(&mut self) -> Result<TypeTag, TypeTagError> {
        let mut members = vec![self.postfix()?];
        while self.eat("|") {
            members.push(self.postfix()?);
        }
        Ok(TypeTag::union(members))
    }

    fn postfix(&mut self) -> Result<TypeTag, TypeTagError> {
        let mut tag = self.primary()?;
        while self.eat("[") {
            if !self.eat("]") {
                return Err(self.error("expected ']'"));
            }
            tag = TypeTag::array(tag);
        }
        Ok(tag)
    }

    fn primary(&mut self) -> Result<TypeTag, TypeTagError> {
        if self.eat("(") {
            let inner = self.union()?;
            if !self.eat(")") {
                return Err(self.error("expected ')'"));
            }
            return Ok(inner);
        }
        if self.eat("{") {
            return self.object();
        }

        let word = self.word();
        match word {
            "number" => Ok(TypeTag::Number),
            "string" => Ok(TypeTag::String),
            "boolean" => Ok(TypeTag::Boolean),
            "null" => Ok(TypeTag::Null),
            "undefined" => Ok(TypeTag::Undefined),
            "unknown" => Ok(TypeTag::Unknown),
            "" => Err(self.error("expected a type")),
            other => {
                self.pos -= other.len();
                Err(self.error(format!("unknown type '{}'", other)))
            }
        }
    }

    fn object(&mut self) -> Result<TypeTag, TypeTagError> {
        let mut fields = BTreeMap::new();
        loop {
            if self.eat("}") {
                return Ok(TypeTag::Object(fields));
            }

            let key = self.key()?;
            if !self.eat(":") {
                return Err(self.error("expected ':' after field name"));
            }
            let tag = self.union()?;
            if fields.insert(key.clone(), tag).is_some() {
                return Err(self.error(format!("duplicate field '{}'", key)));
            }

            if !self.eat(",") {
                if self.eat("}") {
                    return Ok(TypeTag::Object(fields));
                }
                return Err(self.error("expected ',' or '}'"));
            }
        }
    }

    fn key(&mut self) -> Result<String, TypeTagError> {
        self.skip_ws();
        let rest = self.rest();
        if let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') {
            let body = &rest[1..];
            let Some(end) = body.find(quote) else {
                return Err(self.error("unterminated field name"));
            };
            self.pos += end + 2;
            return Ok(body[..end].to_string());
        }

        let word = self.word();
        if word.is_empty() {
            return Err(self.error("expected field name"));
        }
        Ok(word.to_string())
    }

    fn word(&mut self) -> &'a str {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .char_indices()
            .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_' || *c == '$'))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += len;
        &rest[..len]
    }
}
