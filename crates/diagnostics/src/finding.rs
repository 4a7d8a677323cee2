//! Diagnostic findings.

use std::fmt;

use serde::Serialize;

/// The known causes the analyzer can attribute a symptom to.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
pub enum FindingCategory {
    /// The service rejected its configuration at boot.
    SchemaViolation,

    /// The database refused connections or authentication.
    DatabaseUnreachable,

    /// The access/router mutual registration did not complete.
    RegistrationStall,

    /// A listen port was already taken.
    PortConflict,

    /// A peer service could not be reached.
    DependencyUnreachable,

    /// The service's logs could not be fetched; confidence is reduced.
    LogsUnavailable,

    /// The service became healthy after its wait was abandoned.
    RecoveredLate,
}

impl FindingCategory {
    /// Returns the lowercase hyphenated name of the category.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::SchemaViolation => "schema-violation",
            Self::DatabaseUnreachable => "database-unreachable",
            Self::RegistrationStall => "registration-stall",
            Self::PortConflict => "port-conflict",
            Self::DependencyUnreachable => "dependency-unreachable",
            Self::LogsUnavailable => "logs-unavailable",
            Self::RecoveredLate => "recovered-late",
        }
    }
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One attributed symptom with a concrete next step. The analyzer only
/// reports; it never attempts remediation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DiagnosticFinding {
    /// The attributed cause.
    pub category: FindingCategory,

    /// The service the finding concerns.
    pub service: String,

    /// What was observed, including the matched evidence where available.
    pub message: String,

    /// What the operator should do about it.
    pub suggested_action: String,
}
