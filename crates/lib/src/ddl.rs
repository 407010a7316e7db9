//! # DDL Formatting
//!
//! Helpers for turning dialect-rendered `CREATE TABLE` statements into the
//! readable, re-runnable form stored in training files:
//!
//! - [`format_ddl`] lays out the column block one definition per line and
//!   terminates the statement with a single semicolon.
//! - [`ensure_existence_guard`] makes sure the statement carries `IF NOT EXISTS`.
//! - [`CreateTable`] renders a statement from structured column metadata for
//!   dialects that do not store their own DDL text.

use std::{
    borrow::Cow,
    iter::Peekable,
    str::CharIndices,
};
use tracing::{debug, warn};

const INDENT: &str = "\n    ";

/// Iterates over the characters of a statement that are SQL code, skipping
/// quoted literals, identifiers and comments.
///
/// The newline ending a `--` comment is yielded as code.
struct CodeChars<'a> {
    chars: Peekable<CharIndices<'a>>,
    /// A literal or block comment was still open when the input ended.
    unterminated: bool,
    /// Start of a `--` comment that runs to the end of the input.
    trailing_comment: Option<usize>,
}

impl<'a> CodeChars<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            chars: sql.char_indices().peekable(),
            unterminated: false,
            trailing_comment: None,
        }
    }

    fn skip_literal(&mut self, quote: char) {
        self.unterminated = !self.chars.by_ref().any(|(_, c)| c == quote);
    }

    fn skip_line_comment(&mut self) {
        while self.chars.next_if(|&(_, c)| c != '\n').is_some() {}
    }

    fn skip_block_comment(&mut self) {
        self.chars.next();
        let mut star = false;
        for (_, c) in self.chars.by_ref() {
            if star && c == '/' {
                return;
            }
            star = c == '*';
        }
        self.unterminated = true;
    }
}

impl Iterator for CodeChars<'_> {
    type Item = (usize, char);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (i, c) = self.chars.next()?;
            let next = self.chars.peek().map(|&(_, n)| n);
            match (c, next) {
                ('\'' | '"' | '`', _) => self.skip_literal(c),
                ('-', Some('-')) => {
                    self.trailing_comment = Some(i);
                    self.skip_line_comment();
                }
                ('/', Some('*')) => self.skip_block_comment(),
                _ => {
                    self.trailing_comment = None;
                    return Some((i, c));
                }
            }
        }
    }
}

/// Where the column-definition block of a statement sits, if anywhere.
#[derive(Debug, PartialEq, Eq)]
enum ColumnBlock {
    /// The statement has no parentheses at all.
    Absent,
    /// Parentheses, quotes or block comments do not pair up.
    Unbalanced,
    /// Byte offsets of the first `(` and the `)` that closes it.
    Span { open: usize, close: usize },
}

/// Scans `statement` for the first parenthesised block of code.
fn scan_column_block(statement: &str) -> ColumnBlock {
    let mut depth: usize = 0;
    let mut open = None;
    let mut close = None;
    let mut seen_paren = false;

    let mut code = CodeChars::new(statement);
    for (i, c) in code.by_ref() {
        match c {
            '(' => {
                seen_paren = true;
                if open.is_none() {
                    open = Some(i);
                }
                depth += 1;
            }
            ')' => {
                seen_paren = true;
                if depth == 0 {
                    return ColumnBlock::Unbalanced;
                }
                depth -= 1;
                if depth == 0 && close.is_none() {
                    close = Some(i);
                }
            }
            _ => {}
        }
    }

    if code.unterminated || depth != 0 {
        return ColumnBlock::Unbalanced;
    }
    match (open, close) {
        (Some(open), Some(close)) => ColumnBlock::Span { open, close },
        _ if seen_paren => ColumnBlock::Unbalanced,
        _ => ColumnBlock::Absent,
    }
}

/// Splits a column block on the commas that sit at nesting depth zero.
///
/// Commas inside `DECIMAL(10,2)`, `CHECK (a IN (1, 2))`, quoted literals or
/// comments are left alone.
pub fn split_top_level(block: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth: usize = 0;
    let mut start = 0;

    for (i, c) in CodeChars::new(block) {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(&block[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&block[start..]);
    parts
}

/// Separates a `--` comment running to the end of `sql` from the code before it.
fn split_trailing_comment(sql: &str) -> (&str, Option<&str>) {
    let mut code = CodeChars::new(sql);
    code.by_ref().for_each(drop);
    match code.trailing_comment {
        Some(start) => (sql[..start].trim_end(), Some(&sql[start..])),
        None => (sql, None),
    }
}

/// Re-indents the code line breaks of a column definition. Line breaks inside
/// literals and block comments are kept as they are.
fn reindent(definition: &str) -> String {
    let mut out = String::with_capacity(definition.len());
    let mut last = 0;
    for (i, c) in CodeChars::new(definition) {
        if c != '\n' || i < last {
            continue;
        }
        out.push_str(definition[last..i].trim_end());
        out.push_str(INDENT);
        let rest = &definition[i + 1..];
        last = i + 1 + (rest.len() - rest.trim_start().len());
    }
    out.push_str(&definition[last..]);
    out
}

/// Lays out the column block one definition per line. A trailing `--`
/// comment stays after its definition, behind the separating comma.
fn format_columns(block: &str) -> String {
    let parts = split_top_level(block);
    let last = parts.len() - 1;
    parts
        .into_iter()
        .enumerate()
        .map(|(n, part)| {
            let (definition, comment) = split_trailing_comment(part.trim());
            let separator = if n == last { "" } else { "," };
            let mut line = reindent(definition);
            line.push_str(separator);
            if let Some(comment) = comment {
                if !line.is_empty() {
                    line.push(' ');
                }
                line.push_str(comment);
            }
            line
        })
        .collect::<Vec<_>>()
        .join(INDENT)
}

/// Formats a `CREATE TABLE` statement for readability.
///
/// The column block is split one definition per line with a four-space
/// indent, and the result always ends with exactly one semicolon. Quoted text
/// and comments are never split. Statements without parentheses, or whose
/// parentheses do not balance, are only terminated.
///
/// ```
/// use ddlrag::ddl::format_ddl;
///
/// assert_eq!(
///     format_ddl("CREATE TABLE foo (id INT, name VARCHAR(20))"),
///     "CREATE TABLE foo (\n    id INT,\n    name VARCHAR(20)\n);"
/// );
/// ```
pub fn format_ddl(ddl: &str) -> String {
    let (statement, comment) = split_trailing_comment(ddl.trim());
    let statement = statement.trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    let body = match scan_column_block(statement) {
        ColumnBlock::Absent => statement.to_string(),
        ColumnBlock::Unbalanced => {
            warn!("Unbalanced parentheses, quotes or comments in DDL, leaving it unformatted.");
            statement.to_string()
        }
        ColumnBlock::Span { open, close } => {
            let head = statement[..open].trim();
            let tail = statement[close + 1..].trim();
            let columns = format_columns(&statement[open + 1..close]);
            if tail.is_empty() {
                format!("{head} ({INDENT}{columns}\n)")
            } else {
                format!("{head} ({INDENT}{columns}\n) {tail}")
            }
        }
    };

    match comment {
        Some(comment) => format!("{body}; {comment}"),
        None => format!("{body};"),
    }
}

/// Returns the byte range of the next SQL keyword at or after `from`.
fn next_word(s: &str, from: usize) -> Option<(usize, usize)> {
    let rest = &s[from..];
    let start = from + (rest.len() - rest.trim_start().len());
    let len = s[start..]
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(s.len() - start);
    (len > 0).then_some((start, start + len))
}

/// Ensures a `CREATE TABLE` statement carries the `IF NOT EXISTS` guard.
///
/// The leading keywords are matched case-insensitively, allowing a
/// `TEMP`/`TEMPORARY`/`UNLOGGED`/`VIRTUAL` modifier between `CREATE` and
/// `TABLE`. The guard is inserted right after `TABLE` when missing.
/// Statements that do not start with `CREATE ... TABLE` are returned untouched.
pub fn ensure_existence_guard(ddl: &str) -> Cow<'_, str> {
    let word = |range: (usize, usize)| ddl[range.0..range.1].to_ascii_uppercase();

    let Some(create) = next_word(ddl, 0).filter(|&r| word(r) == "CREATE") else {
        debug!("Statement does not start with CREATE, skipping existence guard.");
        return Cow::Borrowed(ddl);
    };
    let Some(mut table) = next_word(ddl, create.1) else {
        return Cow::Borrowed(ddl);
    };
    if matches!(word(table).as_str(), "TEMP" | "TEMPORARY" | "UNLOGGED" | "VIRTUAL") {
        match next_word(ddl, table.1) {
            Some(next) => table = next,
            None => return Cow::Borrowed(ddl),
        }
    }
    if word(table) != "TABLE" {
        return Cow::Borrowed(ddl);
    }

    let guard: Vec<String> = std::iter::successors(next_word(ddl, table.1), |&(_, end)| {
        next_word(ddl, end)
    })
    .take(3)
    .map(word)
    .collect();
    if guard == ["IF", "NOT", "EXISTS"] {
        return Cow::Borrowed(ddl);
    }

    let rest = &ddl[table.1..];
    let insert_at = table.1 + (rest.len() - rest.trim_start().len());
    let mut guarded = String::with_capacity(ddl.len() + 14);
    guarded.push_str(&ddl[..insert_at]);
    if insert_at == table.1 {
        guarded.push(' ');
    }
    guarded.push_str("IF NOT EXISTS ");
    guarded.push_str(&ddl[insert_at..]);
    Cow::Owned(guarded)
}

/// Quotes an identifier unless it is a plain lowercase name.
pub fn quote_identifier(name: &str) -> Cow<'_, str> {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c == '_')
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

/// A column of a [`CreateTable`] statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub default: Option<String>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            default: None,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, expr: impl Into<String>) -> Self {
        self.default = Some(expr.into());
        self
    }

    fn render(&self) -> String {
        let mut out = format!("{} {}", quote_identifier(&self.name), self.data_type);
        if let Some(default) = &self.default {
            out.push_str(" DEFAULT ");
            out.push_str(default);
        }
        if !self.nullable {
            out.push_str(" NOT NULL");
        }
        out
    }
}

/// A structured `CREATE TABLE` statement.
///
/// Rendering decides on the existence guard from the `if_not_exists` flag
/// instead of patching text afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTable {
    pub name: String,
    pub columns: Vec<ColumnDef>,
    /// Table-level constraints, already rendered (e.g. `PRIMARY KEY (id)`).
    pub constraints: Vec<String>,
    pub if_not_exists: bool,
}

impl CreateTable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            constraints: Vec::new(),
            if_not_exists: true,
        }
    }

    pub fn column(mut self, column: ColumnDef) -> Self {
        self.columns.push(column);
        self
    }

    pub fn constraint(mut self, constraint: impl Into<String>) -> Self {
        self.constraints.push(constraint.into());
        self
    }

    /// Renders the statement on a single line, the way a dialect compiler would.
    pub fn render(&self) -> String {
        let guard = if self.if_not_exists {
            "IF NOT EXISTS "
        } else {
            ""
        };
        let definitions = self
            .columns
            .iter()
            .map(ColumnDef::render)
            .chain(self.constraints.iter().cloned())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "CREATE TABLE {guard}{} ({definitions})",
            quote_identifier(&self.name)
        )
    }
}
