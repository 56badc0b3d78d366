use thiserror::Error;

/// A failure while matching tokens against a schema.
///
/// Every variant is terminal: `parse` returns the first one it hits.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Unknown `--name` or `-c`. Holds the flag as written, dashes included.
    #[error("Unrecognized option {0}")]
    UnrecognizedOption(String),

    /// A value-taking option was last, or was followed by something that looks like a flag.
    #[error("Missing value for option {0}")]
    MissingOptionValue(String),

    /// Number coercion or custom parser rejection.
    #[error("Invalid value for {target}: {message}")]
    InvalidValue { target: String, message: String },

    #[error("Unexpected positional argument: {0}")]
    UnexpectedPositional(String),

    #[error("Missing required value for {0}")]
    MissingRequired(String),

    #[error("Unexpected value provided for boolean option {0}")]
    BooleanValueRejected(String),

    /// `-ov` where `-o` takes a value: only the last flag of a group may take one.
    #[error("Option -{flag} takes a value and must be last in the group {group}")]
    ValueFlagNotLast { flag: char, group: String },
}

/// A mistake in the declared schema itself.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("duplicate argument key '{0}'")]
    DuplicateKey(String),

    #[error("positional argument '{0}' cannot be boolean")]
    BooleanPositional(String),

    #[error("default for '{key}' must be a {expected} value")]
    DefaultKindMismatch { key: String, expected: &'static str },

    #[error("argument key must not be empty")]
    EmptyKey,

    /// Reported by `NormalizedSchema::check_conflicts`, never by `normalize`.
    #[error("arg definition conflict: {flag} maps to both '{first}' and '{second}'")]
    ConflictingFlag {
        flag: String,
        first: String,
        second: String,
    },
}

/// Misuse of a typed accessor on `Values`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("no value for '{0}'")]
    Missing(String),

    #[error("value for '{key}' is not a {expected}")]
    WrongKind { key: String, expected: &'static str },
}
