//! Fixed, ordered catalog of log symptom patterns.
//!
//! Order matters: earlier entries are root causes of later ones, so a
//! schema violation in a log wins over the dependency timeouts it
//! triggers downstream. The first matching pattern per log wins.

use std::sync::LazyLock;

use regex::Regex;

use crate::finding::FindingCategory;

static SCHEMA_VIOLATION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(schema validation|invalid configuration|forbidden (key|field)|configuration (error|rejected))")
        .unwrap()
});

static DATABASE_UNREACHABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(could not connect to (the )?database|password authentication failed|FATAL:\s+database|connection to .*(5432|postgres)[^\n]*(refused|failed))")
        .unwrap()
});

static REGISTRATION_STALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(waiting for (the )?router|router (is )?not (yet )?registered|registration (is )?(pending|stalled|timed out)|access (service )?(is )?not (yet )?available)")
        .unwrap()
});

static PORT_CONFLICT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(address already in use|bind(ing)? (to .+ )?failed|port \d+ is (already )?in use)")
        .unwrap()
});

static DEPENDENCY_UNREACHABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(connection refused|no route to host|connection timed out|host unreachable)")
        .unwrap()
});

/// One symptom → cause mapping.
pub struct SymptomPattern {
    /// The cause this symptom is attributed to.
    pub category: FindingCategory,

    /// The log pattern that identifies the symptom.
    pub pattern: &'static LazyLock<Regex>,

    /// The suggested operator action.
    pub action: &'static str,
}

static CATALOG: &[SymptomPattern] = &[
    SymptomPattern {
        category: FindingCategory::SchemaViolation,
        pattern: &SCHEMA_VIOLATION_PATTERN,
        action: "fix the reported configuration keys and re-run `convoy check` before deploying",
    },
    SymptomPattern {
        category: FindingCategory::DatabaseUnreachable,
        pattern: &DATABASE_UNREACHABLE_PATTERN,
        action: "verify the database is running and the `shared.database` connection settings are correct",
    },
    SymptomPattern {
        category: FindingCategory::RegistrationStall,
        pattern: &REGISTRATION_STALL_PATTERN,
        action: "confirm the access service is healthy, then restart the router so registration can complete",
    },
    SymptomPattern {
        category: FindingCategory::PortConflict,
        pattern: &PORT_CONFLICT_PATTERN,
        action: "free the conflicting port or publish the service on a different one",
    },
    SymptomPattern {
        category: FindingCategory::DependencyUnreachable,
        pattern: &DEPENDENCY_UNREACHABLE_PATTERN,
        action: "check that the peer service is up and reachable on the container network",
    },
];

/// Matches a log against the catalog, returning the highest-priority
/// symptom and the line that matched it.
#[must_use]
pub fn classify(log: &str) -> Option<(&'static SymptomPattern, String)> {
    for symptom in CATALOG {
        if let Some(found) = symptom.pattern.find(log) {
            let start = log[..found.start()].rfind('\n').map_or(0, |pos| pos + 1);
            let end = log[found.start()..]
                .find('\n')
                .map_or(log.len(), |pos| found.start() + pos);

            return Some((symptom, log[start..end].trim().to_string()));
        }
    }

    None
}
