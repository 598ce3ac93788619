//! Runtime type validation for record fields.
//!
//! Each field of a record declares a [`TypeDescriptor`]; [`validate`] checks
//! every field's current [`Value`] against it and reports all mismatches in a
//! single [`TypeValidationError`]. Composite descriptors (lists, dicts,
//! callables, unions) are matched recursively by [`matcher::check`].
//!
//! Records opt into construction-time validation through the [`Record`] and
//! [`Validated`] traits; dynamic records can be described by a
//! [`RecordSchema`] instead.
pub mod cli;
pub mod descriptor;
pub mod error;
pub mod hook;
pub mod jq_exec;
pub mod lower;
pub mod matcher;
pub mod path_de;
pub mod schema;
pub mod validate;
pub mod value;

pub use descriptor::{DescriptorParseError, ScalarType, TypeDescriptor};
pub use error::{
    CheckError, ConfigurationError, ConstructionError, TypeValidationError, ValidationError,
};
pub use hook::{construct, HookOptions, Record, Validated};
pub use matcher::check;
pub use schema::{RecordSchema, SchemaError};
pub use validate::{validate, Field};
pub use value::{Callable, RecordValue, Value};
