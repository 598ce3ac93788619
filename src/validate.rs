//! Field-by-field validation with aggregated failures.
use std::borrow::Cow;

use indexmap::IndexMap;
use tracing::debug;

use crate::descriptor::TypeDescriptor;
use crate::error::{CheckError, TypeValidationError};
use crate::matcher;
use crate::value::Value;

/// One `(name, descriptor, value)` triple supplied by a record.
#[derive(Debug, Clone)]
pub struct Field<'a> {
    pub name: &'a str,
    pub descriptor: &'a TypeDescriptor,
    pub value: Cow<'a, Value>,
}

impl<'a> Field<'a> {
    /// Field whose value was converted from a native Rust field.
    pub fn owned(name: &'a str, descriptor: &'a TypeDescriptor, value: impl Into<Value>) -> Self {
        Self { name, descriptor, value: Cow::Owned(value.into()) }
    }

    pub fn borrowed(name: &'a str, descriptor: &'a TypeDescriptor, value: &'a Value) -> Self {
        Self { name, descriptor, value: Cow::Borrowed(value) }
    }
}

/// Check every field, in order, and report all failures at once.
///
/// Not fail-fast: each field is matched even after earlier ones failed, so the
/// returned `TypeValidationError` holds exactly one entry per failing field.
/// A configuration error, on the other hand, aborts the pass immediately.
pub fn validate<'a, I>(fields: I, strict: bool) -> Result<(), CheckError>
where
    I: IntoIterator<Item = Field<'a>>,
{
    let mut errors: IndexMap<String, String> = IndexMap::new();
    let mut checked = 0usize;

    for field in fields {
        checked += 1;
        let outcome = matcher::check(field.descriptor, &field.value, strict)
            .map_err(|e| e.on_field(field.name))?;
        if let Some(message) = outcome {
            debug!(field = field.name, descriptor = %field.descriptor, %message, "field failed type validation");
            errors.insert(field.name.to_string(), message);
        }
    }

    debug!(checked, failed = errors.len(), "validation pass finished");

    if errors.is_empty() {
        Ok(())
    } else {
        Err(TypeValidationError::new(errors).into())
    }
}

// ------------------------------- Tests ------------------------------------ //
