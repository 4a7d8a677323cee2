//! Pure schema validation of a configuration document against an edition.

use serde::Serialize;

use crate::document::{ConfigDocument, DATABASE_EMBEDDED, DATABASE_EXTERNAL};
use crate::schema::{Edition, SchemaRule, rules, shape_of};

/// Keys the external database path requires under `shared.database`.
static EXTERNAL_DATABASE_KEYS: &[&str] = &[
    "shared.database.driver",
    "shared.database.url",
    "shared.database.username",
    "shared.database.password",
];

/// A single blocking schema violation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Violation {
    /// The dotted key-path the violation refers to.
    pub key_path: String,

    /// Human-readable reason for the violation.
    pub reason: String,
}

/// The outcome of validating a document. A document is acceptable iff
/// `errors` is empty; warnings never block startup.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Blocking violations, in catalog order.
    pub errors: Vec<Violation>,

    /// Non-blocking advisories, in catalog order.
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Returns whether the document passed validation.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn add_error(&mut self, key_path: impl Into<String>, reason: impl Into<String>) {
        self.errors.push(Violation {
            key_path: key_path.into(),
            reason: reason.into(),
        });
    }

    fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Validates a configuration document against the rule catalog of the
/// given edition. Never mutates the document and never fails: every
/// problem surfaces as an entry in the result.
#[must_use]
pub fn validate(document: &ConfigDocument, edition: Edition) -> ValidationResult {
    let mut result = ValidationResult::default();

    apply_rules(document, edition, &mut result);
    check_values(document, &mut result);

    result
}

fn apply_rules(document: &ConfigDocument, edition: Edition, result: &mut ValidationResult) {
    let all_keys = document.key_paths();

    for rule in rules(edition) {
        match rule {
            SchemaRule::Forbidden { key } => {
                let prefix = format!("{key}.");
                let mut matching: Vec<&String> = all_keys
                    .iter()
                    .filter(|k| k.as_str() == *key || k.starts_with(&prefix))
                    .collect();
                matching.sort();

                for matched in matching {
                    result.add_error(
                        matched.clone(),
                        format!(
                            "key '{matched}' is not supported in the {edition} edition",
                        ),
                    );
                }
            }
            SchemaRule::Required { key, kind } => match document.get(key) {
                None => {
                    result.add_error(*key, format!("required key '{key}' is missing"));
                }
                Some(value) if !kind.matches(value) => {
                    result.add_error(
                        *key,
                        format!(
                            "key '{key}' must be a {}, got {}",
                            kind.name(),
                            shape_of(value)
                        ),
                    );
                }
                Some(_) => {}
            },
            SchemaRule::Recommended { key } => {
                if !document.contains(key) {
                    result.add_warning(format!(
                        "recommended key '{key}' is missing; this may affect functionality"
                    ));
                }
            }
            SchemaRule::Typed { key, kind } => {
                if let Some(value) = document.get(key) {
                    if !kind.matches(value) {
                        result.add_error(
                            *key,
                            format!(
                                "key '{key}' must be a {}, got {}",
                                kind.name(),
                                shape_of(value)
                            ),
                        );
                    }
                }
            }
        }
    }
}

fn check_values(document: &ConfigDocument, result: &mut ValidationResult) {
    if let Some(version) = document.get("configVersion") {
        if version.is_number() && version.as_u64() != Some(1) {
            result.add_warning(format!(
                "configVersion {} may not be fully supported; version 1 is recommended",
                shape_display(version)
            ));
        }
    }

    if let Some(db_type) = document.get_str("shared.database.type") {
        if db_type == DATABASE_EXTERNAL {
            for key in EXTERNAL_DATABASE_KEYS {
                if !document.contains(key) {
                    result.add_error(
                        *key,
                        format!("the external database requires '{key}' to be configured"),
                    );
                }
            }
        } else if db_type != DATABASE_EMBEDDED {
            result.add_error(
                "shared.database.type",
                format!(
                    "database type '{db_type}' is not supported; use '{DATABASE_EXTERNAL}' or '{DATABASE_EMBEDDED}'"
                ),
            );
        }
    }

    if let Some(join_key) = document.get_str("shared.security.joinKey") {
        if !is_valid_join_key(join_key) {
            result.add_error(
                "shared.security.joinKey",
                "invalid joinKey format; expected 'prefix.algorithm.value'",
            );
        }
    }
}

// Join keys have the shape prefix.algorithm.value with no empty parts.
fn is_valid_join_key(join_key: &str) -> bool {
    let parts: Vec<&str> = join_key.split('.').collect();
    parts.len() >= 3 && parts.iter().all(|part| !part.is_empty())
}

fn shape_display(value: &serde_yaml::Value) -> String {
    serde_yaml::to_string(value).map_or_else(|_| "?".to_string(), |s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    static VALID_OSS: &str = r"
configVersion: 1
shared:
  security:
    joinKey: jfk.aes128.c2VjcmV0
  node:
    id: node-1
    ip: 127.0.0.1
  database:
    type: embedded
";

    fn doc(yaml: &str) -> ConfigDocument {
        ConfigDocument::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_valid_oss_document_passes() {
        let result = validate(&doc(VALID_OSS), Edition::Oss);

        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn test_forbidden_primary_key_rejected_in_oss() {
        let yaml = format!("{VALID_OSS}server:\n  primary: true\n");
        let result = validate(&doc(&yaml), Edition::Oss);

        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].key_path, "server.primary");
        assert!(result.errors[0].reason.contains("oss"));
    }

    #[test]
    fn test_forbidden_key_matches_by_prefix() {
        let yaml = format!("{VALID_OSS}server:\n  pool:\n    maxThreads: 8\n");
        let result = validate(&doc(&yaml), Edition::Oss);

        assert!(!result.is_valid());
        assert!(
            result
                .errors
                .iter()
                .any(|v| v.key_path == "server.pool.maxThreads")
        );
    }

    #[test]
    fn test_primary_key_allowed_in_pro() {
        let yaml = format!("{VALID_OSS}server:\n  primary: true\n");
        let result = validate(&doc(&yaml), Edition::Pro);

        assert!(result.is_valid(), "unexpected errors: {:?}", result.errors);
    }

    #[test]
    fn test_missing_required_key_is_an_error() {
        let result = validate(&doc("configVersion: 1\n"), Edition::Oss);

        assert!(
            result
                .errors
                .iter()
                .any(|v| v.key_path == "shared.security.joinKey")
        );
        assert!(result.errors.iter().any(|v| v.key_path == "shared.node.id"));
    }

    #[test]
    fn test_wrong_shape_reports_expected_vs_actual() {
        let yaml = VALID_OSS.replace("configVersion: 1", "configVersion: one");
        let result = validate(&doc(&yaml), Edition::Oss);

        let violation = result
            .errors
            .iter()
            .find(|v| v.key_path == "configVersion")
            .unwrap();
        assert!(violation.reason.contains("number"));
        assert!(violation.reason.contains("string"));
    }

    #[test]
    fn test_external_database_requires_connection_keys() {
        let yaml = VALID_OSS.replace("type: embedded", "type: postgresql");
        let result = validate(&doc(&yaml), Edition::Oss);

        for key in EXTERNAL_DATABASE_KEYS {
            assert!(result.errors.iter().any(|v| v.key_path == *key));
        }
    }

    #[test]
    fn test_unknown_database_type_rejected() {
        let yaml = VALID_OSS.replace("type: embedded", "type: oracle");
        let result = validate(&doc(&yaml), Edition::Oss);

        assert!(
            result
                .errors
                .iter()
                .any(|v| v.key_path == "shared.database.type")
        );
    }

    #[test]
    fn test_malformed_join_key_rejected() {
        let yaml = VALID_OSS.replace("jfk.aes128.c2VjcmV0", "not-a-join-key");
        let result = validate(&doc(&yaml), Edition::Oss);

        assert!(
            result
                .errors
                .iter()
                .any(|v| v.key_path == "shared.security.joinKey")
        );
    }

    #[test]
    fn test_missing_recommended_key_is_a_warning_only() {
        let yaml = VALID_OSS.replace("    ip: 127.0.0.1\n", "");
        let result = validate(&doc(&yaml), Edition::Oss);

        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("shared.node.ip")));
    }

    #[test]
    fn test_validation_is_deterministic() {
        let yaml = format!("{VALID_OSS}server:\n  primary: true\n  pool:\n    size: 2\n");
        let document = doc(&yaml);

        let first = validate(&document, Edition::Oss);
        let second = validate(&document, Edition::Oss);

        assert_eq!(first, second);
    }
}
