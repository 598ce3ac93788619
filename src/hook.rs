//! Construction-time validation.
//!
//! A record type opts in by implementing [`Record`] (its field listing and,
//! optionally, custom post-construction logic) and [`Validated`] (its hook
//! options). Building a value then goes through [`Validated::validated`],
//! which runs the record's `post_init` and the validation pass in the
//! configured order.
//!
//! ```
//! use once_cell::sync::Lazy;
//! use record_typecheck::{Field, Record, TypeDescriptor, Validated};
//!
//! static NAME: Lazy<TypeDescriptor> = Lazy::new(|| "String".parse().unwrap());
//! static AGE: Lazy<TypeDescriptor> = Lazy::new(|| "Int".parse().unwrap());
//!
//! struct Person { name: String, age: i64 }
//!
//! impl Record for Person {
//!     fn fields(&self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::owned("name", &NAME, self.name.clone()),
//!             Field::owned("age", &AGE, self.age),
//!         ]
//!     }
//! }
//!
//! impl Validated for Person {}
//!
//! let p = Person { name: "Alice".into(), age: 30 }.validated().unwrap();
//! assert_eq!(p.age, 30);
//! ```
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::error::ConstructionError;
use crate::validate::{validate, Field};

/// Options fixed when a record type attaches the hook.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HookOptions {
    /// Treat unrecognized descriptors as configuration errors instead of
    /// skipping them.
    pub strict: bool,
    /// Validate before the record's `post_init` runs rather than after.
    pub before_custom_init: bool,
}

impl HookOptions {
    pub const DEFAULT: Self = Self { strict: false, before_custom_init: false };

    pub const fn new() -> Self { Self::DEFAULT }

    pub const fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub const fn before_custom_init(mut self, before: bool) -> Self {
        self.before_custom_init = before;
        self
    }
}

/// Reflection over a record: its fields in declaration order.
pub trait Record {
    fn fields(&self) -> Vec<Field<'_>>;

    /// Record-specific logic run once per construction. No-op by default.
    fn post_init(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Opt-in marker: constructing this record validates it.
pub trait Validated: Record + Sized {
    const OPTIONS: HookOptions = HookOptions::DEFAULT;

    /// Finish constructing `self`, validating its fields.
    fn validated(self) -> Result<Self, ConstructionError> {
        construct(self, Self::OPTIONS)
    }
}

/// Run `post_init` and validation on a freshly built record, in the order
/// `options` asks for. The record is returned only if both succeed.
pub fn construct<R: Record>(mut record: R, options: HookOptions) -> Result<R, ConstructionError> {
    if options.before_custom_init {
        trace!("validating before custom initialization");
        validate(record.fields(), options.strict)?;
        record.post_init().map_err(ConstructionError::PostInit)?;
    } else {
        record.post_init().map_err(ConstructionError::PostInit)?;
        trace!("validating after custom initialization");
        validate(record.fields(), options.strict)?;
    }
    Ok(record)
}

// ------------------------------- Tests ------------------------------------ //
