//! Declarative record schemas.
//!
//! A schema names a record type and maps each field, in declaration order, to
//! a descriptor written in the text grammar:
//!
//! ```json
//! {
//!   "name": "Person",
//!   "options": { "strict": true },
//!   "fields": { "name": "str", "age": "int", "tags": "List[str]" }
//! }
//! ```
//!
//! Schemas act as the reflection source for records that exist only as
//! dynamic values, such as lowered JSON documents.
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::descriptor::TypeDescriptor;
use crate::error::{CheckError, ConfigurationError};
use crate::hook::HookOptions;
use crate::path_de::{from_str_with_path, PathError};
use crate::validate::{validate, Field};
use crate::value::{RecordValue, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchema {
    pub name: String,
    #[serde(default)]
    pub options: HookOptions,
    pub fields: IndexMap<String, TypeDescriptor>,
}

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("cannot read schema {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid schema {origin}: {source}")]
    Parse {
        origin: String,
        source: PathError,
    },
}

static MISSING: Value = Value::None;

impl RecordSchema {
    pub fn from_json_str(src: &str) -> Result<Self, SchemaError> {
        from_str_with_path(src).map_err(|source| SchemaError::Parse {
            origin: "<inline>".to_string(),
            source,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SchemaError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| SchemaError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        from_str_with_path(&src).map_err(|source| SchemaError::Parse {
            origin: path.display().to_string(),
            source,
        })
    }

    /// Declared fields of `record`, in schema order. Absent fields bind `None`;
    /// fields the schema does not declare are not visited.
    pub fn bind<'a>(&'a self, record: &'a RecordValue) -> Vec<Field<'a>> {
        self.fields
            .iter()
            .map(|(name, descriptor)| {
                Field::borrowed(name, descriptor, record.get(name).unwrap_or(&MISSING))
            })
            .collect()
    }

    /// Validate `record` against this schema. `strict` can only tighten the
    /// schema's own option.
    pub fn check(&self, record: &RecordValue, strict: bool) -> Result<(), CheckError> {
        validate(self.bind(record), self.options.strict || strict)
    }

    /// Reject the declarations up front when strict, before any record is seen.
    pub fn check_declarations(&self, strict: bool) -> Result<(), ConfigurationError> {
        if !(self.options.strict || strict) {
            return Ok(());
        }
        for (name, descriptor) in &self.fields {
            if let Some(raw) = descriptor.find_unrecognized() {
                return Err(ConfigurationError::unrecognized(raw).on_field(name));
            }
        }
        Ok(())
    }
}
