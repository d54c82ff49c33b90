//! Type descriptor cache and value validation
//!
//! Descriptors are compiled once into shared [`TypeTag`]s and memoised for the
//! life of the process. The cache is append-only and shared by every thread:
//! lookups take a read lock so concurrent readers never wait on each other,
//! and only a miss takes the write lock to insert.
//!
//! Validation of runtime data against a tag goes through the [`Validator`]
//! trait so callers can plug in their own checker; [`TypeTagValidator`] is the
//! default.

use super::types::{TypeTag, TypeTagError};
use super::value::Value;
use hashbrown::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

static UNDEFINED: Value = Value::Undefined;

type DescriptorMap = HashMap<String, Arc<TypeTag>, ahash::RandomState>;

/// Process-wide cache of compiled descriptors
///
/// Every descriptor is stored under its exact source text and under the
/// canonical rendering of the tag it parsed to. Both keys point at one entry.
static TYPE_CACHE: OnceLock<RwLock<DescriptorMap>> = OnceLock::new();

fn cache() -> &'static RwLock<DescriptorMap> {
    TYPE_CACHE.get_or_init(|| RwLock::new(HashMap::with_hasher(ahash::RandomState::new())))
}

/// Get or compile a type descriptor
///
/// Descriptors that parse to the same tag share one entry, whatever their
/// spelling.
///
/// ```rust
/// use precedent::engine::validator::compile;
///
/// let a = compile("string | number").unwrap();
/// let b = compile("string|number").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
pub fn compile(descriptor: &str) -> Result<Arc<TypeTag>, TypeTagError> {
    {
        let guard = cache().read().unwrap_or_else(PoisonError::into_inner);
        if let Some(tag) = guard.get(descriptor) {
            return Ok(Arc::clone(tag));
        }
    }

    let tag = TypeTag::parse(descriptor)?;
    let canonical = tag.to_string();

    let mut guard = cache().write().unwrap_or_else(PoisonError::into_inner);
    // Another thread may have won the race; keep its entry
    let shared = Arc::clone(guard.entry(canonical).or_insert_with(|| Arc::new(tag)));
    guard
        .entry(descriptor.to_string())
        .or_insert_with(|| Arc::clone(&shared));
    Ok(shared)
}

/// Get the number of cached descriptors
pub fn cache_size() -> usize {
    cache()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

/// One way in which a value failed to match its tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Dotted path to the offending value (`score`, `user.name`, `items[2]`)
    pub path: String,
    /// The tag that was required
    pub expected: String,
    /// What was found
    pub actual: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} must be {} (was {})",
            self.path, self.expected, self.actual
        )
    }
}

/// All issues found while validating a value
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors {
    /// Individual issues, in discovery order
    pub issues: Vec<ValidationIssue>,
}

impl ValidationErrors {
    /// Whether no issues were recorded
    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    /// One-line summary of every issue
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Merge another set of issues into this one
    pub fn extend(&mut self, other: ValidationErrors) {
        self.issues.extend(other.issues);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())
    }
}

impl std::error::Error for ValidationErrors {}

/// Checks runtime values against type tags
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` because evaluators carrying them may
/// be used from multiple threads.
pub trait Validator: Send + Sync {
    /// Validate `value` against `tag`; `path` names the value in error messages
    fn validate(&self, path: &str, tag: &TypeTag, value: &Value) -> Result<(), ValidationErrors>;
}

/// Default structural validator
#[derive(Debug, Clone, Copy, Default)]
pub struct TypeTagValidator;

impl Validator for TypeTagValidator {
    fn validate(&self, path: &str, tag: &TypeTag, value: &Value) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();
        check(path, tag, value, &mut errors);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check(path: &str, tag: &TypeTag, value: &Value, errors: &mut ValidationErrors) {
    let issue = |errors: &mut ValidationErrors| {
        errors.issues.push(ValidationIssue {
            path: path.to_string(),
            expected: tag.to_string(),
            actual: value.type_name().to_string(),
        })
    };

    match (tag, value) {
        (TypeTag::Unknown, _)
        | (TypeTag::Number, Value::Number(_))
        | (TypeTag::String, Value::String(_))
        | (TypeTag::Boolean, Value::Bool(_))
        | (TypeTag::Null, Value::Null)
        | (TypeTag::Undefined, Value::Undefined) => {}
        (TypeTag::Union(members), _) => {
            let accepted = members.iter().any(|member| {
                let mut scratch = ValidationErrors::default();
                check(path, member, value, &mut scratch);
                scratch.is_empty()
            });
            if !accepted {
                issue(errors);
            }
        }
        (TypeTag::Array(element), Value::Array(items)) => {
            for (i, item) in items.iter().enumerate() {
                check(&format!("{}[{}]", path, i), element, item, errors);
            }
        }
        (TypeTag::Object(fields), Value::Object(map)) => {
            for (name, field_tag) in fields {
                let field_value = map.get(name).unwrap_or(&UNDEFINED);
                check(&format!("{}.{}", path, name), field_tag, field_value, errors);
            }
        }
        _ => issue(errors),
    }
}
