//! Host-facing entry points.
//!
//! `parse` itself never prints or exits. This module pairs a normalized schema
//! with a program name and hands failures to a [`FailureHandler`].

use std::io::Write;

use crate::error::{ParseError, SchemaError};
use crate::parser::parse;
use crate::schema::{NormalizedSchema, Schema};
use crate::usage::{UsageStyle, render_usage_styled};
use crate::value::Values;

/// What to do when parsing fails. Never returns.
pub trait FailureHandler {
    fn fail(&self, error: &ParseError, usage: &str) -> !;
}

/// Print the error and usage to stderr, then exit with `code`.
#[derive(Debug, Clone, Copy)]
pub struct ExitOnFailure {
    pub code: i32,
}

impl Default for ExitOnFailure {
    fn default() -> Self {
        Self { code: 1 }
    }
}

impl FailureHandler for ExitOnFailure {
    fn fail(&self, error: &ParseError, usage: &str) -> ! {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{error}\n");
        let _ = stderr.write_all(usage.as_bytes());
        let _ = stderr.flush();
        std::process::exit(self.code)
    }
}

/// Arguments of the current process, without the program path.
pub fn process_args() -> Vec<String> {
    std::env::args_os()
        .skip(1)
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

/// A normalized schema bound to the program name shown in usage text.
#[derive(Debug, Clone)]
pub struct ArgParser {
    prog: String,
    schema: NormalizedSchema,
    style: UsageStyle,
}

impl ArgParser {
    pub fn new(prog: impl Into<String>, schema: Schema) -> Result<Self, SchemaError> {
        Ok(Self::from_normalized(prog, schema.normalize()?))
    }

    pub fn from_normalized(prog: impl Into<String>, schema: NormalizedSchema) -> Self {
        Self {
            prog: prog.into(),
            schema,
            style: UsageStyle::plain(),
        }
    }

    pub fn with_style(mut self, style: UsageStyle) -> Self {
        self.style = style;
        self
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    pub fn schema(&self) -> &NormalizedSchema {
        &self.schema
    }

    pub fn usage(&self) -> String {
        render_usage_styled(&self.prog, &self.schema, &self.style)
    }

    pub fn parse<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Values, ParseError> {
        parse(&self.schema, tokens)
    }

    /// Parse [`process_args`].
    pub fn parse_env(&self) -> Result<Values, ParseError> {
        self.parse(process_args().as_slice())
    }

    /// Parse `tokens`, exiting the process with usage text on failure.
    pub fn parse_or_exit<S: AsRef<str>>(&self, tokens: &[S]) -> Values {
        self.parse_or_else(tokens, &ExitOnFailure::default())
    }

    /// Parse `tokens`, passing any failure to `handler`.
    pub fn parse_or_else<S, H>(&self, tokens: &[S], handler: &H) -> Values
    where
        S: AsRef<str>,
        H: FailureHandler + ?Sized,
    {
        match self.parse(tokens) {
            Ok(values) => values,
            Err(err) => {
                tracing::debug!(error = %err, prog = %self.prog, "argument parsing failed");
                handler.fail(&err, &self.usage())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ArgSpec;

    struct PanicWithUsage;

    impl FailureHandler for PanicWithUsage {
        fn fail(&self, error: &ParseError, usage: &str) -> ! {
            panic!("{error}|{usage}")
        }
    }

    fn tool() -> ArgParser {
        let schema = Schema::new()
            .arg(ArgSpec::string("file").positional().required(true))
            .arg(ArgSpec::boolean("verbose").short('v'));
        ArgParser::new("tool", schema).unwrap()
    }

    #[test]
    fn parse_or_else_returns_values_on_success() {
        let values = tool().parse_or_else(&["-v", "a.txt"], &PanicWithUsage);
        assert_eq!(values.string("file"), Some("a.txt"));
        assert!(values.flag("verbose"));
    }

    #[test]
    #[should_panic(expected = "Unrecognized option --bogus|Usage: tool FILE [OPTIONS]")]
    fn parse_or_else_hands_error_and_usage_to_handler() {
        tool().parse_or_else(&["--bogus"], &PanicWithUsage);
    }

    #[test]
    fn new_surfaces_schema_errors() {
        let schema = Schema::new()
            .arg(ArgSpec::string("a"))
            .arg(ArgSpec::string("a"));
        let err = ArgParser::new("tool", schema).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateKey("a".to_string()));
    }

    #[test]
    fn usage_uses_configured_style() {
        let parser = tool().with_style(UsageStyle::ansi());
        assert!(parser.usage().starts_with("\x1b[1mUsage:\x1b[0m tool FILE [OPTIONS]"));
        assert_eq!(parser.prog(), "tool");
    }
}
