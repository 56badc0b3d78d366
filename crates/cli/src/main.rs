mod check;
mod schema_file;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use schemargs::{ArgParser, ExitOnFailure, UsageStyle};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::{EnvFilter, fmt};

use crate::check::check_schema;
use crate::schema_file::load_schema_file;

/// Exit status when tokens do not match the schema.
const PARSE_FAILURE_CODE: i32 = 2;

#[derive(Parser)]
#[command(name = "schemargs")]
#[command(version, about = "Parse arguments against a declarative schema", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse tokens against a schema and print the values as JSON
    Parse(ParseArgs),

    /// Print usage text for a schema
    Usage(UsageArgs),

    /// Validate a schema file and report flag conflicts
    Check(CheckArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ColorWhen {
    Auto,
    Always,
    Never,
}

impl ColorWhen {
    fn style(self) -> UsageStyle {
        let enabled = match self {
            Self::Auto => std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
            Self::Always => true,
            Self::Never => false,
        };
        if enabled {
            UsageStyle::ansi()
        } else {
            UsageStyle::plain()
        }
    }
}

#[derive(Parser)]
struct ParseArgs {
    /// Path to the JSON schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Program name shown in usage text (overrides the schema's "prog")
    #[arg(long, value_name = "NAME")]
    prog: Option<String>,

    /// Print single-line JSON
    #[arg(long)]
    compact: bool,

    /// Colorize usage text printed on failure
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, value_name = "WHEN")]
    color: ColorWhen,

    /// Tokens to parse, after `--`
    #[arg(last = true, value_name = "TOKENS")]
    tokens: Vec<String>,
}

#[derive(Parser)]
struct UsageArgs {
    /// Path to the JSON schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Program name shown in usage text (overrides the schema's "prog")
    #[arg(long, value_name = "NAME")]
    prog: Option<String>,

    /// Colorize output
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, value_name = "WHEN")]
    color: ColorWhen,
}

#[derive(Parser)]
struct CheckArgs {
    /// Path to the JSON schema
    #[arg(short, long, value_name = "FILE")]
    schema: PathBuf,

    /// Only output JSON (no human-readable output)
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => parse_command(args),
        Commands::Usage(args) => usage_command(args),
        Commands::Check(args) => check_command(args),
    }
}

fn load_parser(schema_path: &Path, prog: Option<&str>) -> Result<ArgParser> {
    let file = load_schema_file(schema_path)?;
    let prog = file.prog_name(prog, schema_path);
    let (report, normalized) = check_schema(&schema_path.display().to_string(), file.to_schema()?)?;
    if let Some(conflict) = &report.conflict {
        tracing::warn!("{conflict}; the first declared option wins");
    }
    Ok(ArgParser::from_normalized(prog, normalized))
}

fn parse_command(args: ParseArgs) -> Result<()> {
    tracing::debug!("executing parse command");

    let parser = load_parser(&args.schema, args.prog.as_deref())?.with_style(args.color.style());
    let values = parser.parse_or_else(
        args.tokens.as_slice(),
        &ExitOnFailure {
            code: PARSE_FAILURE_CODE,
        },
    );

    let json = if args.compact {
        serde_json::to_string(&values)?
    } else {
        serde_json::to_string_pretty(&values)?
    };
    println!("{json}");
    Ok(())
}

fn usage_command(args: UsageArgs) -> Result<()> {
    tracing::debug!("executing usage command");

    let style = match args.color {
        // Usage goes to stdout here, so detect against stdout.
        ColorWhen::Auto if !std::io::stdout().is_terminal() => UsageStyle::plain(),
        other => other.style(),
    };
    let parser = load_parser(&args.schema, args.prog.as_deref())?.with_style(style);
    print!("{}", parser.usage());
    Ok(())
}

fn check_command(args: CheckArgs) -> Result<()> {
    tracing::debug!("executing check command");

    let file = load_schema_file(&args.schema)?;
    let name = args.schema.display().to_string();
    let (report, _) = check_schema(&name, file.to_schema()?)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        eprintln!("Schema: {}", report.schema);
        eprintln!("Positionals: {}", report.positionals.len());
        for p in &report.positionals {
            eprintln!("  {p}");
        }
        eprintln!("Options: {}", report.options.len());
        for o in &report.options {
            eprintln!("  {o}");
        }
        if report.is_ok() {
            eprintln!();
            eprintln!("OK: no conflicting flags");
        }
    }

    if let Some(conflict) = &report.conflict {
        bail!("{conflict}");
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}
