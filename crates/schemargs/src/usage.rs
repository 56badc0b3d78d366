//! Usage text rendering.
//!
//! Tables are aligned by display width: SGR styling sequences (`ESC [ ... m`)
//! are emitted as-is but never counted toward a column's width.

use crate::schema::{NormalizedArg, NormalizedSchema};

const ESC: char = '\x1b';
const RESET: &str = "\x1b[0m";
const INDENT: &str = "  ";
const GUTTER: &str = "    ";

/// Styling applied to usage text. `plain()` emits no escape sequences.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UsageStyle {
    heading: Option<&'static str>,
    flag: Option<&'static str>,
    placeholder: Option<&'static str>,
}

impl UsageStyle {
    pub fn plain() -> Self {
        Self::default()
    }

    /// Bold headings, cyan flags, dim placeholders.
    pub fn ansi() -> Self {
        Self {
            heading: Some("\x1b[1m"),
            flag: Some("\x1b[36m"),
            placeholder: Some("\x1b[2m"),
        }
    }

    fn paint(code: Option<&'static str>, text: &str) -> String {
        match code {
            Some(code) if !text.is_empty() => format!("{code}{text}{RESET}"),
            _ => text.to_string(),
        }
    }

    fn heading(&self, text: &str) -> String {
        Self::paint(self.heading, text)
    }

    fn flag(&self, text: &str) -> String {
        Self::paint(self.flag, text)
    }

    fn placeholder(&self, text: &str) -> String {
        Self::paint(self.placeholder, text)
    }
}

/// Render usage text without styling.
pub fn render_usage(prefix: &str, schema: &NormalizedSchema) -> String {
    render_usage_styled(prefix, schema, &UsageStyle::plain())
}

/// Render usage text:
///
/// ```text
/// Usage: prog SOURCE [OPTIONS]
///
/// Options:
///   -j, --jobs NUMBER    Worker count [Default: 4]
///       --dry-run        Print actions only
/// ```
pub fn render_usage_styled(prefix: &str, schema: &NormalizedSchema, style: &UsageStyle) -> String {
    let mut line = style.heading("Usage:");
    let prefix = prefix.trim();
    if !prefix.is_empty() {
        line.push(' ');
        line.push_str(prefix);
    }
    for p in schema.positionals() {
        line.push(' ');
        line.push_str(p.display_name());
    }
    if !schema.options().is_empty() {
        line.push_str(" [OPTIONS]");
    }

    let mut out = line.trim_end().to_string();
    out.push('\n');

    let described: Vec<&NormalizedArg> = schema
        .positionals()
        .iter()
        .filter(|p| p.description().is_some_and(|d| !d.trim().is_empty()))
        .collect();
    if !described.is_empty() {
        out.push('\n');
        out.push_str(&style.heading("Arguments:"));
        out.push('\n');
        let rows: Vec<Vec<String>> = described
            .iter()
            .map(|p| vec![style.placeholder(p.display_name()), describe(p)])
            .collect();
        render_table(&mut out, &rows, &[Align::Left]);
    }

    if !schema.options().is_empty() {
        out.push('\n');
        out.push_str(&style.heading("Options:"));
        out.push('\n');
        let rows: Vec<Vec<String>> = schema
            .options()
            .iter()
            .map(|o| vec![short_cell(o, style), long_cell(o, style), describe(o)])
            .collect();
        render_table(&mut out, &rows, &[Align::Right, Align::Left]);
    }

    out
}

fn short_cell(opt: &NormalizedArg, style: &UsageStyle) -> String {
    match opt.short() {
        Some(c) if opt.long().is_some() => format!("{},", style.flag(&format!("-{c}"))),
        Some(c) => style.flag(&format!("-{c}")),
        None => String::new(),
    }
}

fn long_cell(opt: &NormalizedArg, style: &UsageStyle) -> String {
    let placeholder = style.placeholder(opt.placeholder());
    match opt.long() {
        Some(long) if placeholder.is_empty() => style.flag(&format!("--{long}")),
        Some(long) => format!("{} {placeholder}", style.flag(&format!("--{long}"))),
        None => placeholder,
    }
}

fn describe(arg: &NormalizedArg) -> String {
    let mut out = arg.description().unwrap_or_default().trim().to_string();
    if arg.value_kind().is_boolean() {
        return out;
    }
    if let Some(default) = arg.default_value() {
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(&format!("[Default: {default}]"));
    }
    out
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Left,
    Right,
}

/// Write `rows` as an aligned table. `aligns` covers every column but the
/// last, which is free text after the gutter.
fn render_table(out: &mut String, rows: &[Vec<String>], aligns: &[Align]) {
    let widths: Vec<usize> = (0..aligns.len())
        .map(|col| {
            rows.iter()
                .map(|row| display_width(&row[col]))
                .max()
                .unwrap_or(0)
        })
        .collect();

    for row in rows {
        let mut line = String::from(INDENT);
        let mut first = true;
        for (col, align) in aligns.iter().enumerate() {
            // Columns that are empty in every row take no space.
            if widths[col] == 0 {
                continue;
            }
            if !first {
                line.push(' ');
            }
            first = false;
            let cell = match align {
                Align::Left => pad_end(&row[col], widths[col]),
                Align::Right => pad_start(&row[col], widths[col]),
            };
            line.push_str(&cell);
        }
        if let Some(last) = row.get(aligns.len()) {
            if !last.is_empty() {
                line.push_str(GUTTER);
                line.push_str(last);
            }
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
}

/// Length of `s` in characters, not counting `ESC [ <digits/;> m` sequences.
pub fn display_width(s: &str) -> usize {
    let mut width = 0;
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if c == ESC {
            if let Some(len) = sgr_len(rest) {
                rest = &rest[len..];
                continue;
            }
        }
        width += 1;
        rest = &rest[c.len_utf8()..];
    }
    width
}

/// `s` with every styling sequence removed.
pub fn strip_styles(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(c) = rest.chars().next() {
        if c == ESC {
            if let Some(len) = sgr_len(rest) {
                rest = &rest[len..];
                continue;
            }
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    out
}

/// Byte length of the SGR sequence at the start of `s`, if there is one.
fn sgr_len(s: &str) -> Option<usize> {
    let body = s.strip_prefix("\x1b[")?;
    let params = body
        .bytes()
        .take_while(|b| b.is_ascii_digit() || *b == b';')
        .count();
    (body.as_bytes().get(params) == Some(&b'm')).then_some(2 + params + 1)
}

/// Right-pad `s` with spaces to `width` display columns.
pub fn pad_end(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(s));
    format!("{s}{}", " ".repeat(pad))
}

/// Left-pad `s` with spaces to `width` display columns.
pub fn pad_start(s: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(s));
    format!("{}{s}", " ".repeat(pad))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ArgSpec, Schema};

    fn sample() -> NormalizedSchema {
        Schema::new()
            .arg(
                ArgSpec::string("source")
                    .positional()
                    .required(true)
                    .description("File to copy"),
            )
            .arg(ArgSpec::string("destDir").positional())
            .arg(
                ArgSpec::number("jobs")
                    .short('j')
                    .default(4)
                    .description("Worker count"),
            )
            .arg(ArgSpec::boolean("dryRun").description("Print actions only"))
            .arg(ArgSpec::string("output").short('o').no_long().value_name("FILE"))
            .arg(
                ArgSpec::boolean("force")
                    .short('f')
                    .default(true)
                    .description("Overwrite"),
            )
            .normalize()
            .unwrap()
    }

    #[test]
    fn display_width_ignores_sgr_sequences() {
        assert_eq!(display_width("plain"), 5);
        assert_eq!(display_width("\x1b[1mbold\x1b[0m"), 4);
        assert_eq!(display_width("\x1b[1;31mred\x1b[m!"), 4);
        assert_eq!(display_width("héllo"), 5);
        // Not an SGR sequence: counted as-is.
        assert_eq!(display_width("\x1b[2Jx"), 5);
        assert_eq!(strip_styles("\x1b[36m--jobs\x1b[0m NUMBER"), "--jobs NUMBER");
    }

    #[test]
    fn padding_uses_display_width() {
        assert_eq!(pad_end("\x1b[1mab\x1b[0m", 4), "\x1b[1mab\x1b[0m  ");
        assert_eq!(pad_start("\x1b[1mab\x1b[0m", 4), "  \x1b[1mab\x1b[0m");
        assert_eq!(pad_end("toolong", 3), "toolong");
    }

    #[test]
    fn renders_usage_line_and_tables() {
        let text = render_usage("cp", &sample());
        let expected = "\
Usage: cp SOURCE DEST-DIR [OPTIONS]

Arguments:
  SOURCE    File to copy

Options:
  -j, --jobs NUMBER    Worker count [Default: 4]
      --dry-run        Print actions only
   -o FILE
  -f, --force          Overwrite
";
        assert_eq!(text, expected);
    }

    #[test]
    fn omits_options_suffix_without_options() {
        let schema = Schema::new()
            .arg(ArgSpec::string("name").positional())
            .normalize()
            .unwrap();
        assert_eq!(render_usage("greet", &schema), "Usage: greet NAME\n");

        let empty = Schema::new().normalize().unwrap();
        assert_eq!(render_usage("noop", &empty), "Usage: noop\n");
    }

    #[test]
    fn blank_prefix_leaves_a_single_space() {
        let schema = Schema::new()
            .arg(ArgSpec::string("source").positional())
            .normalize()
            .unwrap();
        assert_eq!(render_usage("", &schema), "Usage: SOURCE\n");
        assert_eq!(render_usage("   ", &schema), "Usage: SOURCE\n");
    }

    #[test]
    fn styled_output_aligns_like_plain_output() {
        let schema = sample();
        let plain = render_usage("cp", &schema);
        let styled = render_usage_styled("cp", &schema, &UsageStyle::ansi());
        assert!(styled.contains("\x1b[36m--jobs\x1b[0m"));
        assert_ne!(styled, plain);
        assert_eq!(strip_styles(&styled), plain);
    }

    #[test]
    fn styled_descriptions_do_not_skew_columns() {
        let schema = Schema::new()
            .arg(ArgSpec::string("\x1b[31mname\x1b[0m").long("name"))
            .arg(ArgSpec::string("longerName").value_name("\x1b[1mN\x1b[0m"))
            .normalize()
            .unwrap();
        let styled = render_usage("x", &schema);
        assert_eq!(
            strip_styles(&styled),
            "Usage: x [OPTIONS]\n\nOptions:\n  --name STRING\n  --longer-name N\n"
        );
    }
}
