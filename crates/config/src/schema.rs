//! Edition-specific schema rule catalogs.
//!
//! Rules are data, not code: adding a newly-forbidden key or a new edition
//! is a catalog change here, never a change to the validator logic.

use std::fmt;
use std::str::FromStr;

use serde_yaml::Value;

/// A named feature tier of the deployed stack. The edition determines
/// which configuration keys are valid.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Edition {
    /// The restricted open-source edition.
    Oss,

    /// The full-feature edition.
    Pro,
}

impl Edition {
    /// Returns the lowercase name of the edition.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Oss => "oss",
            Self::Pro => "pro",
        }
    }
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Edition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "oss" => Ok(Self::Oss),
            "pro" => Ok(Self::Pro),
            other => Err(format!("unknown edition '{other}' (expected oss or pro)")),
        }
    }
}

/// The shape a configuration value is expected to have.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ValueKind {
    /// A boolean.
    Bool,

    /// A mapping of keys to values.
    Mapping,

    /// An integer or float.
    Number,

    /// A string.
    String,
}

impl ValueKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Mapping => "mapping",
            Self::Number => "number",
            Self::String => "string",
        }
    }

    /// Returns whether the given value matches this shape.
    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Self::Bool => value.is_bool(),
            Self::Mapping => value.is_mapping(),
            Self::Number => value.is_number(),
            Self::String => value.is_string(),
        }
    }
}

/// Returns the shape name of an observed value, for error messages.
#[must_use]
pub fn shape_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Sequence(_) => "sequence",
        Value::Mapping(_) => "mapping",
        Value::Tagged(_) => "tagged",
    }
}

/// A single schema rule tagging a dotted key-path for one edition.
#[derive(Clone, Copy, Debug)]
pub enum SchemaRule {
    /// The key must not be present (matched exactly or by dotted prefix).
    Forbidden {
        /// The dotted key-path.
        key: &'static str,
    },

    /// The key must be present and match the given shape.
    Required {
        /// The dotted key-path.
        key: &'static str,

        /// The expected shape.
        kind: ValueKind,
    },

    /// The key should be present; its absence is a warning.
    Recommended {
        /// The dotted key-path.
        key: &'static str,
    },

    /// If the key is present it must match the given shape.
    Typed {
        /// The dotted key-path.
        key: &'static str,

        /// The expected shape.
        kind: ValueKind,
    },
}

static OSS_RULES: &[SchemaRule] = &[
    SchemaRule::Forbidden {
        key: "server.primary",
    },
    SchemaRule::Forbidden { key: "server.pool" },
    SchemaRule::Forbidden {
        key: "server.javaOpts",
    },
    SchemaRule::Forbidden {
        key: "server.network",
    },
    SchemaRule::Forbidden {
        key: "server.cache",
    },
    SchemaRule::Forbidden {
        key: "server.security",
    },
    SchemaRule::Forbidden {
        key: "server.access",
    },
    SchemaRule::Forbidden {
        key: "shared.database.properties",
    },
    SchemaRule::Required {
        key: "configVersion",
        kind: ValueKind::Number,
    },
    SchemaRule::Required {
        key: "shared.security.joinKey",
        kind: ValueKind::String,
    },
    SchemaRule::Required {
        key: "shared.node.id",
        kind: ValueKind::String,
    },
    SchemaRule::Required {
        key: "shared.database.type",
        kind: ValueKind::String,
    },
    SchemaRule::Typed {
        key: "shared.node.haEnabled",
        kind: ValueKind::Bool,
    },
    SchemaRule::Recommended {
        key: "shared.node.ip",
    },
    SchemaRule::Recommended {
        key: "shared.database.driver",
    },
    SchemaRule::Recommended {
        key: "shared.database.url",
    },
    SchemaRule::Recommended {
        key: "shared.database.username",
    },
    SchemaRule::Recommended {
        key: "shared.database.password",
    },
];

static PRO_RULES: &[SchemaRule] = &[
    SchemaRule::Required {
        key: "configVersion",
        kind: ValueKind::Number,
    },
    SchemaRule::Required {
        key: "shared.security.joinKey",
        kind: ValueKind::String,
    },
    SchemaRule::Required {
        key: "shared.node.id",
        kind: ValueKind::String,
    },
    SchemaRule::Required {
        key: "shared.database.type",
        kind: ValueKind::String,
    },
    SchemaRule::Typed {
        key: "shared.node.haEnabled",
        kind: ValueKind::Bool,
    },
    SchemaRule::Recommended {
        key: "shared.node.ip",
    },
];

/// Returns the rule catalog for the given edition.
#[must_use]
pub const fn rules(edition: Edition) -> &'static [SchemaRule] {
    match edition {
        Edition::Oss => OSS_RULES,
        Edition::Pro => PRO_RULES,
    }
}
