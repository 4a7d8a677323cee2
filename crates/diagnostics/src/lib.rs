//! Post-mortem diagnosis of a degraded stack deployment.
//!
//! Re-probes each service once, tails the logs of the unhealthy ones and
//! attributes what it sees to a fixed catalog of known causes, each with
//! a suggested operator action.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod analyzer;
mod catalog;
mod error;
mod finding;
mod source;

pub use analyzer::{Analyzer, AnalyzerOptions, ObservedState, ServiceObservation};
pub use catalog::{SymptomPattern, classify};
pub use error::Error;
pub use finding::{DiagnosticFinding, FindingCategory};
pub use source::{ComposeLogSource, LogSource};
