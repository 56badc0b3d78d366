use anyhow::{Context, Result};
use schemargs::{NormalizedSchema, Schema};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckReport {
    pub schema: String,
    pub positionals: Vec<String>,
    pub options: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<String>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.conflict.is_none()
    }
}

/// Normalize `schema` and look for options sharing a flag.
///
/// Declaration errors (duplicate keys, bad defaults) fail outright; flag
/// conflicts are reported, since the parser tolerates them.
pub fn check_schema(name: &str, schema: Schema) -> Result<(CheckReport, NormalizedSchema)> {
    let normalized = schema
        .normalize()
        .with_context(|| format!("invalid schema: {name}"))?;

    let positionals = normalized
        .positionals()
        .iter()
        .map(|p| p.display_name().to_string())
        .collect();

    let options = normalized
        .options()
        .iter()
        .map(|o| {
            let mut names: Vec<String> = Vec::new();
            if let Some(short) = o.short() {
                names.push(format!("-{short}"));
            }
            if let Some(long) = o.long() {
                names.push(format!("--{long}"));
            }
            if names.is_empty() {
                // Neither flag form: never matchable on the command line.
                format!("{} (unreachable)", o.key())
            } else {
                names.join(", ")
            }
        })
        .collect();

    let conflict = normalized.check_conflicts().err().map(|e| e.to_string());

    let report = CheckReport {
        schema: name.to_string(),
        positionals,
        options,
        conflict,
    };
    Ok((report, normalized))
}
