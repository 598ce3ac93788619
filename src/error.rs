//! # Error Types
//!
//! Two failure kinds are kept apart on purpose:
//!
//! - [`TypeValidationError`]: the data is wrong. One or more fields hold a
//!   value that does not match its descriptor; every failing field is listed.
//! - [`ConfigurationError`]: the declaration is wrong. A descriptor the
//!   matcher does not understand was found while running in strict mode.
//!
//! [`CheckError`] is what a validation pass returns; [`ConstructionError`]
//! is what the lifecycle hook returns.

use indexmap::IndexMap;
use thiserror::Error;

/// Message carried by every aggregated validation failure.
pub const TYPE_VALIDATION_MESSAGE: &str = "Record Type Validation Error";

/// A single field's failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field_name: String,
    pub message: String,
}

/// Every field that failed in one validation pass, in declaration order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (errors = {errors:?})")]
pub struct TypeValidationError {
    message: String,
    errors: IndexMap<String, String>,
}

impl TypeValidationError {
    pub(crate) fn new(errors: IndexMap<String, String>) -> Self {
        Self { message: TYPE_VALIDATION_MESSAGE.to_string(), errors }
    }

    pub fn message(&self) -> &str { &self.message }

    /// Field name → mismatch description.
    pub fn errors(&self) -> &IndexMap<String, String> { &self.errors }

    pub fn get(&self, field_name: &str) -> Option<&str> {
        self.errors.get(field_name).map(String::as_str)
    }

    pub fn len(&self) -> usize { self.errors.len() }

    pub fn is_empty(&self) -> bool { self.errors.is_empty() }

    pub fn entries(&self) -> impl Iterator<Item = ValidationError> + '_ {
        self.errors.iter().map(|(field_name, message)| ValidationError {
            field_name: field_name.clone(),
            message: message.clone(),
        })
    }
}

/// A descriptor the matcher cannot interpret, found in strict mode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type descriptor `{descriptor}`{}", field_suffix(.field))]
pub struct ConfigurationError {
    pub descriptor: String,
    pub field: Option<String>,
}

impl ConfigurationError {
    pub(crate) fn unrecognized(descriptor: impl Into<String>) -> Self {
        Self { descriptor: descriptor.into(), field: None }
    }

    pub(crate) fn on_field(mut self, field: &str) -> Self {
        self.field = Some(field.to_string());
        self
    }
}

fn field_suffix(field: &Option<String>) -> String {
    field.as_ref().map(|f| format!(" on field `{f}`")).unwrap_or_default()
}

/// Outcome of a failed validation pass.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error(transparent)]
    Type(#[from] TypeValidationError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
}

impl CheckError {
    pub fn as_type_error(&self) -> Option<&TypeValidationError> {
        match self {
            CheckError::Type(e) => Some(e),
            CheckError::Configuration(_) => None,
        }
    }

    pub fn as_configuration_error(&self) -> Option<&ConfigurationError> {
        match self {
            CheckError::Configuration(e) => Some(e),
            CheckError::Type(_) => None,
        }
    }
}

/// Failure surfaced by a validated record's construction.
#[derive(Error, Debug)]
pub enum ConstructionError {
    #[error(transparent)]
    Check(#[from] CheckError),

    /// The record's own post-construction logic failed.
    #[error("custom initialization failed: {0:#}")]
    PostInit(anyhow::Error),
}

impl ConstructionError {
    pub fn as_type_error(&self) -> Option<&TypeValidationError> {
        match self {
            ConstructionError::Check(e) => e.as_type_error(),
            ConstructionError::PostInit(_) => None,
        }
    }

    pub fn as_configuration_error(&self) -> Option<&ConfigurationError> {
        match self {
            ConstructionError::Check(e) => e.as_configuration_error(),
            ConstructionError::PostInit(_) => None,
        }
    }
}
