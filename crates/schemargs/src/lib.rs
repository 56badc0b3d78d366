//! Schema-driven command-line argument parsing and usage rendering.
//!
//! Declare arguments with [`ArgSpec`], normalize the [`Schema`], then
//! [`parse`] a token list into [`Values`] or render usage text with
//! [`render_usage`]. [`ArgParser`] bundles both with a program name and a
//! [`FailureHandler`] for the print-usage-and-exit path.
//!
//! ```
//! use schemargs::{ArgParser, ArgSpec, Schema};
//!
//! let schema = Schema::new()
//!     .arg(ArgSpec::string("source").positional().required(true))
//!     .arg(ArgSpec::number("jobs").short('j').default(4))
//!     .arg(ArgSpec::boolean("dryRun").short('n'));
//! let parser = ArgParser::new("sync", schema).unwrap();
//!
//! let values = parser.parse(&["-n", "src/"]).unwrap();
//! assert_eq!(values.string("source"), Some("src/"));
//! assert_eq!(values.number("jobs"), Some(4.0));
//! assert!(values.flag("dryRun"));
//!
//! assert!(parser.usage().starts_with("Usage: sync SOURCE [OPTIONS]"));
//! ```

pub mod error;
pub mod host;
pub mod parser;
pub mod schema;
pub mod usage;
pub mod value;

pub use error::{ParseError, SchemaError, ValueError};
pub use host::{ArgParser, ExitOnFailure, FailureHandler, process_args};
pub use parser::parse;
pub use schema::{ArgSpec, LongFlag, NormalizedArg, NormalizedSchema, Schema};
pub use usage::{UsageStyle, display_width, render_usage, render_usage_styled, strip_styles};
pub use value::{CustomParser, CustomValue, Value, ValueKind, Values};
