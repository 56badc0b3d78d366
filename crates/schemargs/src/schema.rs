//! Declared argument specs and their normalized form.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::SchemaError;
use crate::value::{CustomParser, Value, ValueKind};

/// How an option's long flag is chosen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum LongFlag {
    /// Derived from the key: `outFile` becomes `--out-file`.
    #[default]
    Derived,
    /// No long form; the option is short-only.
    Disabled,
    Named(String),
}

/// One declared argument.
///
/// # Example
///
/// ```
/// use schemargs::{ArgSpec, Schema};
///
/// let schema = Schema::new()
///     .arg(ArgSpec::string("input").positional().required(true))
///     .arg(ArgSpec::number("jobs").short('j').default(4))
///     .arg(ArgSpec::boolean("dryRun").short('n'));
/// let normalized = schema.normalize().unwrap();
/// assert_eq!(normalized.options()[1].long(), Some("dry-run"));
/// ```
#[derive(Debug, Clone)]
pub struct ArgSpec {
    key: String,
    positional: bool,
    value_kind: ValueKind,
    long: LongFlag,
    short: Option<char>,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    value_name: Option<String>,
}

impl ArgSpec {
    pub fn new(key: impl Into<String>, value_kind: ValueKind) -> Self {
        Self {
            key: key.into(),
            positional: false,
            value_kind,
            long: LongFlag::Derived,
            short: None,
            required: false,
            default: None,
            description: None,
            value_name: None,
        }
    }

    pub fn string(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::String)
    }

    pub fn number(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Number)
    }

    pub fn boolean(key: impl Into<String>) -> Self {
        Self::new(key, ValueKind::Boolean)
    }

    /// An argument whose tokens go through `parse`. The error message is
    /// reported verbatim, prefixed with the argument's name.
    pub fn custom<T, E, F>(key: impl Into<String>, parse: F) -> Self
    where
        T: Any + Send + Sync + fmt::Display,
        E: fmt::Display,
        F: Fn(&str) -> Result<T, E> + Send + Sync + 'static,
    {
        Self::new(key, ValueKind::Custom(CustomParser::new(parse)))
    }

    pub fn positional(mut self) -> Self {
        self.positional = true;
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn short(mut self, short: char) -> Self {
        self.short = Some(short);
        self
    }

    pub fn long(mut self, long: impl Into<String>) -> Self {
        self.long = LongFlag::Named(long.into());
        self
    }

    pub fn no_long(mut self) -> Self {
        self.long = LongFlag::Disabled;
        self
    }

    pub fn long_flag(mut self, long: LongFlag) -> Self {
        self.long = long;
        self
    }

    pub fn value_name(mut self, value_name: impl Into<String>) -> Self {
        self.value_name = Some(value_name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

/// A set of declared arguments, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    args: Vec<ArgSpec>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, spec: ArgSpec) -> Self {
        self.args.push(spec);
        self
    }

    pub fn push(&mut self, spec: ArgSpec) {
        self.args.push(spec);
    }

    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Resolve flag names and split positionals from options.
    ///
    /// Duplicate short or long flags across options are accepted here; the
    /// parser matches the first declared one. Use
    /// [`NormalizedSchema::check_conflicts`] to reject them.
    pub fn normalize(self) -> Result<NormalizedSchema, SchemaError> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut positionals = Vec::new();
        let mut options = Vec::new();

        for spec in self.args {
            if spec.key.is_empty() {
                return Err(SchemaError::EmptyKey);
            }
            if !seen.insert(spec.key.clone()) {
                return Err(SchemaError::DuplicateKey(spec.key));
            }
            if spec.positional && spec.value_kind.is_boolean() {
                return Err(SchemaError::BooleanPositional(spec.key));
            }
            if let Some(default) = &spec.default {
                if !spec.value_kind.accepts(default) {
                    return Err(SchemaError::DefaultKindMismatch {
                        expected: spec.value_kind.name(),
                        key: spec.key,
                    });
                }
            }

            let arg = NormalizedArg::from_spec(spec);
            if arg.positional {
                positionals.push(arg);
            } else {
                options.push(arg);
            }
        }

        Ok(NormalizedSchema {
            positionals,
            options,
        })
    }
}

/// A fully resolved argument.
#[derive(Debug, Clone)]
pub struct NormalizedArg {
    key: String,
    positional: bool,
    value_kind: ValueKind,
    long: Option<String>,
    short: Option<char>,
    required: bool,
    default: Option<Value>,
    description: Option<String>,
    value_name: Option<String>,
    display_name: String,
}

impl NormalizedArg {
    fn from_spec(spec: ArgSpec) -> Self {
        let hyphenated = hyphenate(&spec.key);
        let (long, short, display_name) = if spec.positional {
            (None, None, hyphenated.to_uppercase())
        } else {
            let long = match spec.long {
                LongFlag::Derived => Some(hyphenated),
                LongFlag::Disabled => None,
                LongFlag::Named(name) => Some(name),
            };
            let display_name = match (&long, spec.short) {
                (Some(long), _) => format!("--{long}"),
                (None, Some(short)) => format!("-{short}"),
                (None, None) => spec.key.clone(),
            };
            (long, spec.short, display_name)
        };

        Self {
            key: spec.key,
            positional: spec.positional,
            value_kind: spec.value_kind,
            long,
            short,
            required: spec.required,
            default: spec.default,
            description: spec.description,
            value_name: spec.value_name,
            display_name,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    pub fn value_kind(&self) -> &ValueKind {
        &self.value_kind
    }

    /// Resolved long flag name, without the leading `--`.
    pub fn long(&self) -> Option<&str> {
        self.long.as_deref()
    }

    pub fn short(&self) -> Option<char> {
        self.short
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn value_name(&self) -> Option<&str> {
        self.value_name.as_deref()
    }

    /// `--long`, `-s` or `NAME` for positionals.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// How error messages refer to this argument: `option --out-file`,
    /// `option -o` or `positional OUT-FILE`.
    pub fn target(&self) -> String {
        if self.positional {
            format!("positional {}", self.display_name)
        } else {
            format!("option {}", self.display_name)
        }
    }

    /// Placeholder for the value in usage text; empty for booleans.
    pub fn placeholder(&self) -> &str {
        if self.value_kind.is_boolean() {
            return "";
        }
        self.value_name
            .as_deref()
            .unwrap_or_else(|| self.value_kind.placeholder())
    }
}

/// Output of [`Schema::normalize`]: positionals in declaration order plus options.
#[derive(Debug, Clone, Default)]
pub struct NormalizedSchema {
    positionals: Vec<NormalizedArg>,
    options: Vec<NormalizedArg>,
}

impl NormalizedSchema {
    pub fn positionals(&self) -> &[NormalizedArg] {
        &self.positionals
    }

    pub fn options(&self) -> &[NormalizedArg] {
        &self.options
    }

    /// All arguments, positionals first.
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedArg> {
        self.positionals.iter().chain(self.options.iter())
    }

    pub fn find_long(&self, name: &str) -> Option<&NormalizedArg> {
        self.options.iter().find(|o| o.long() == Some(name))
    }

    pub fn find_short(&self, short: char) -> Option<&NormalizedArg> {
        self.options.iter().find(|o| o.short == Some(short))
    }

    /// Reject options that share a long or short flag.
    pub fn check_conflicts(&self) -> Result<(), SchemaError> {
        let mut long_map: HashMap<&str, &str> = HashMap::new();
        let mut short_map: HashMap<char, &str> = HashMap::new();

        for opt in &self.options {
            if let Some(long) = opt.long() {
                if let Some(prev) = long_map.insert(long, opt.key()) {
                    return Err(conflict(format!("--{long}"), prev, opt.key()));
                }
            }
            if let Some(short) = opt.short {
                if let Some(prev) = short_map.insert(short, opt.key()) {
                    return Err(conflict(format!("-{short}"), prev, opt.key()));
                }
            }
        }
        Ok(())
    }
}

fn conflict(flag: String, first: &str, second: &str) -> SchemaError {
    SchemaError::ConflictingFlag {
        flag,
        first: first.to_string(),
        second: second.to_string(),
    }
}

/// `outFile` -> `out-file`. Other characters, `_` included, are kept.
///
/// A hyphen is inserted only at a lowercase/digit to uppercase boundary, so
/// acronyms stay together (`inputURL` -> `input-url`).
pub fn hyphenate(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev: Option<char> = None;
    for c in key.chars() {
        if c.is_uppercase() {
            if prev.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit()) {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphenate_splits_camel_humps() {
        assert_eq!(hyphenate("outFile"), "out-file");
        assert_eq!(hyphenate("maxRetryCount"), "max-retry-count");
        assert_eq!(hyphenate("out_file"), "out_file");
        assert_eq!(hyphenate("inputURL"), "input-url");
        assert_eq!(hyphenate("v2Mode"), "v2-mode");
        assert_eq!(hyphenate("plain"), "plain");
    }

    #[test]
    fn normalize_resolves_long_flags() {
        let schema = Schema::new()
            .arg(ArgSpec::string("outFile"))
            .arg(ArgSpec::string("level").long("log-level"))
            .arg(ArgSpec::boolean("quiet").short('q').no_long());
        let normalized = schema.normalize().unwrap();

        let longs: Vec<Option<&str>> = normalized.options().iter().map(|o| o.long()).collect();
        assert_eq!(longs, vec![Some("out-file"), Some("log-level"), None]);
        assert_eq!(normalized.options()[2].short(), Some('q'));
        assert_eq!(normalized.options()[2].display_name(), "-q");
        assert_eq!(normalized.options()[0].short(), None);
    }

    #[test]
    fn normalize_keeps_positional_order() {
        let schema = Schema::new()
            .arg(ArgSpec::string("source").positional())
            .arg(ArgSpec::boolean("force"))
            .arg(ArgSpec::string("destDir").positional());
        let normalized = schema.normalize().unwrap();

        let names: Vec<&str> = normalized
            .positionals()
            .iter()
            .map(|p| p.display_name())
            .collect();
        assert_eq!(names, vec!["SOURCE", "DEST-DIR"]);
        assert_eq!(normalized.positionals()[1].long(), None);
        assert_eq!(normalized.positionals()[1].target(), "positional DEST-DIR");
        assert_eq!(normalized.options().len(), 1);
    }

    #[test]
    fn normalize_rejects_bad_declarations() {
        let err = Schema::new()
            .arg(ArgSpec::string("name"))
            .arg(ArgSpec::number("name"))
            .normalize()
            .unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey("name".to_string()));

        let err = Schema::new()
            .arg(ArgSpec::boolean("yes").positional())
            .normalize()
            .unwrap_err();
        assert_eq!(err, SchemaError::BooleanPositional("yes".to_string()));

        let err = Schema::new()
            .arg(ArgSpec::number("jobs").default("four"))
            .normalize()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DefaultKindMismatch {
                key: "jobs".to_string(),
                expected: "number"
            }
        );
    }

    #[test]
    fn normalize_allows_duplicate_flags_but_check_conflicts_reports_them() {
        let normalized = Schema::new()
            .arg(ArgSpec::boolean("verbose").short('v'))
            .arg(ArgSpec::boolean("version").short('v'))
            .normalize()
            .unwrap();
        assert_eq!(normalized.find_short('v').map(|o| o.key()), Some("verbose"));

        let err = normalized.check_conflicts().unwrap_err();
        match err {
            SchemaError::ConflictingFlag {
                flag,
                first,
                second,
            } => {
                assert_eq!(flag, "-v");
                assert_eq!(first, "verbose");
                assert_eq!(second, "version");
            }
            other => panic!("expected ConflictingFlag, got: {other:?}"),
        }
    }

    #[test]
    fn placeholder_prefers_value_name() {
        let normalized = Schema::new()
            .arg(ArgSpec::string("output").value_name("FILE"))
            .arg(ArgSpec::number("jobs"))
            .arg(ArgSpec::custom("mode", |raw: &str| Ok::<_, String>(raw.to_string())))
            .arg(ArgSpec::boolean("force").value_name("IGNORED"))
            .normalize()
            .unwrap();
        let placeholders: Vec<&str> = normalized.options().iter().map(|o| o.placeholder()).collect();
        assert_eq!(placeholders, vec!["FILE", "NUMBER", "VALUE", ""]);
    }
}
