//! Configuration documents and edition-specific schema validation for
//! convoy stack deployments.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod document;
mod error;
mod schema;
mod validate;

pub use document::{ConfigDocument, DATABASE_EMBEDDED, DATABASE_EXTERNAL};
pub use error::Error;
pub use schema::{Edition, SchemaRule, ValueKind, rules, shape_of};
pub use validate::{ValidationResult, Violation, validate};
