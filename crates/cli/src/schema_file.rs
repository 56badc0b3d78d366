use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use schemargs::{ArgSpec, LongFlag, Schema, Value};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// JSON schema file: `{ "prog": "...", "args": { "<key>": { ... } } }`.
///
/// `args` keeps file order, which is the positional order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prog: Option<String>,

    #[serde(default)]
    pub args: IndexMap<String, ArgEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgType {
    String,
    Number,
    Boolean,
    Custom,
}

/// `long` is either a flag name or `false`; `true` means derive from the key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LongEntry {
    Enabled(bool),
    Name(String),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgEntry {
    #[serde(default)]
    pub positional: bool,

    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ArgType>,

    /// Accepted values for a `custom` argument.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_json::Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long: Option<LongEntry>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

pub fn load_schema_file(path: &Path) -> Result<SchemaFile> {
    if !path.exists() {
        bail!("schema not found: {}", path.display());
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read schema: {}", path.display()))?;
    let file: SchemaFile = serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse schema JSON: {}", path.display()))?;
    tracing::debug!(path = %path.display(), args = file.args.len(), "loaded schema file");
    Ok(file)
}

impl SchemaFile {
    /// Program name for usage text: explicit override, then `prog`, then the file stem.
    pub fn prog_name(&self, explicit: Option<&str>, path: &Path) -> String {
        explicit
            .map(str::to_string)
            .or_else(|| self.prog.clone())
            .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| "prog".to_string())
    }

    pub fn to_schema(&self) -> Result<Schema> {
        let mut schema = Schema::new();
        for (key, entry) in &self.args {
            let spec = entry
                .to_spec(key)
                .with_context(|| format!("invalid argument '{key}'"))?;
            schema.push(spec);
        }
        Ok(schema)
    }
}

impl ArgEntry {
    fn resolved_kind(&self) -> Result<ArgType> {
        match (self.kind, self.choices.is_empty()) {
            (None, true) => Ok(ArgType::String),
            (None | Some(ArgType::Custom), false) => Ok(ArgType::Custom),
            (Some(ArgType::Custom), true) => bail!("type \"custom\" requires \"choices\""),
            (Some(kind), false) => bail!("\"choices\" cannot be combined with type {kind:?}"),
            (Some(kind), true) => Ok(kind),
        }
    }

    fn to_spec(&self, key: &str) -> Result<ArgSpec> {
        let kind = self.resolved_kind()?;
        let mut spec = match kind {
            ArgType::String => ArgSpec::string(key),
            ArgType::Number => ArgSpec::number(key),
            ArgType::Boolean => ArgSpec::boolean(key),
            ArgType::Custom => {
                let choices = self.choices.clone();
                ArgSpec::custom(key, move |raw: &str| one_of(&choices, raw))
            }
        };

        if self.positional {
            spec = spec.positional();
        }
        spec = spec.required(self.required);
        if let Some(short) = self.short {
            spec = spec.short(short);
        }
        spec = match &self.long {
            None | Some(LongEntry::Enabled(true)) => spec.long_flag(LongFlag::Derived),
            Some(LongEntry::Enabled(false)) => spec.no_long(),
            Some(LongEntry::Name(name)) => spec.long(name.trim_start_matches('-')),
        };
        if let Some(value_name) = &self.value_name {
            spec = spec.value_name(value_name);
        }
        if let Some(description) = &self.description {
            spec = spec.description(description);
        }
        if let Some(default) = &self.default {
            spec = spec.default(self.default_value(kind, default)?);
        }
        Ok(spec)
    }

    fn default_value(&self, kind: ArgType, json: &serde_json::Value) -> Result<Value> {
        let value = match (kind, json) {
            (ArgType::String, serde_json::Value::String(s)) => Value::from(s.as_str()),
            (ArgType::Number, serde_json::Value::Number(n)) => match n.as_f64() {
                Some(n) => Value::from(n),
                None => bail!("default {n} is not representable as a number"),
            },
            (ArgType::Boolean, serde_json::Value::Bool(b)) => Value::from(*b),
            (ArgType::Custom, serde_json::Value::String(s)) => {
                one_of(&self.choices, s).map_err(anyhow::Error::msg)?;
                Value::custom(s.clone())
            }
            (kind, other) => bail!("default {other} does not match type {kind:?}"),
        };
        Ok(value)
    }
}

fn one_of(choices: &[String], raw: &str) -> Result<String, String> {
    if choices.iter().any(|c| c == raw) {
        Ok(raw.to_string())
    } else {
        Err(format!("expected one of: {}", choices.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_json(json: &str) -> SchemaFile {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converts_entries_in_file_order() {
        let file = from_json(
            r#"{
                "prog": "cp",
                "args": {
                    "source": { "positional": true, "required": true },
                    "destDir": { "positional": true },
                    "jobs": { "type": "number", "short": "j", "default": 4 },
                    "quiet": { "type": "boolean", "short": "q", "long": false },
                    "format": { "choices": ["json", "text"], "default": "text" }
                }
            }"#,
        );
        let schema = file.to_schema().unwrap().normalize().unwrap();

        let positionals: Vec<&str> = schema.positionals().iter().map(|p| p.key()).collect();
        assert_eq!(positionals, vec!["source", "destDir"]);
        let longs: Vec<Option<&str>> = schema.options().iter().map(|o| o.long()).collect();
        assert_eq!(longs, vec![Some("jobs"), None, Some("format")]);

        let values = schemargs::parse(&schema, &["a", "--format", "json"]).unwrap();
        assert_eq!(values.custom::<String>("format").map(String::as_str), Some("json"));
        assert_eq!(values.number("jobs"), Some(4.0));

        let err = schemargs::parse(&schema, &["a", "--format=xml"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for option --format: expected one of: json, text"
        );
    }

    #[test]
    fn rejects_inconsistent_entries() {
        let file = from_json(r#"{ "args": { "jobs": { "type": "number", "default": "four" } } }"#);
        let err = file.to_schema().unwrap_err();
        assert!(format!("{err:#}").contains("does not match type Number"));

        let file = from_json(r#"{ "args": { "mode": { "type": "custom" } } }"#);
        assert!(file.to_schema().is_err());

        let file = from_json(r#"{ "args": { "mode": { "choices": ["a"], "default": "b" } } }"#);
        let err = file.to_schema().unwrap_err();
        assert!(format!("{err:#}").contains("expected one of: a"));
    }

    #[test]
    fn prog_name_precedence() {
        let path = Path::new("/tmp/tool.json");
        let file = from_json(r#"{ "prog": "from-file" }"#);
        assert_eq!(file.prog_name(Some("flag"), path), "flag");
        assert_eq!(file.prog_name(None, path), "from-file");
        assert_eq!(SchemaFile::default().prog_name(None, path), "tool");
    }
}
