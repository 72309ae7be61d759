mod scanner;

use scanner::{
    State, is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
    scan_identifier, try_start_dollar_quote,
};

use crate::error::SqlSessionError;
use crate::params::ParamBag;
use crate::types::RowValues;

/// Positional placeholder style of the backend the statement is bound for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// `SQLite`-style placeholders like `?1`.
    Sqlite,
}

impl PlaceholderStyle {
    fn marker(self) -> char {
        match self {
            PlaceholderStyle::Postgres => '$',
            PlaceholderStyle::Sqlite => '?',
        }
    }
}

/// A statement rewritten to positional placeholders plus its ordered values.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundStatement {
    /// SQL with `:name` placeholders replaced by `$N` / `?N`.
    pub sql: String,
    /// Values in placeholder order; repeated names share one position.
    pub params: Vec<RowValues>,
}

/// Rewrite `:name` placeholders to the backend's positional style and collect
/// the matching values from `bag` in placeholder order.
///
/// The scan skips single-quoted strings, double-quoted identifiers, line and
/// block comments, dollar-quoted blocks, and Postgres `::` casts. Repeated
/// names bind once; bag entries the statement never references are permitted.
///
/// # Errors
/// Returns `SqlSessionError::ParameterError` if a referenced name has no
/// binding in `bag`.
pub fn bind_named(
    sql: &str,
    bag: &ParamBag,
    style: PlaceholderStyle,
) -> Result<BoundStatement, SqlSessionError> {
    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len());
    let mut params: Vec<RowValues> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();
    let mut state = State::Normal;
    let mut copied = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b':' => {
                    if bytes.get(idx + 1) == Some(&b':') {
                        // postgres cast, not a placeholder
                        idx += 1;
                    } else if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                        let position = match seen.iter().position(|n| *n == name) {
                            Some(pos) => pos,
                            None => {
                                let value = bag.get(name).cloned().ok_or_else(|| {
                                    SqlSessionError::ParameterError(format!(
                                        "no value bound for parameter :{name}"
                                    ))
                                })?;
                                seen.push(name);
                                params.push(value);
                                seen.len() - 1
                            }
                        };
                        out.push_str(&sql[copied..idx]);
                        out.push(style.marker());
                        out.push_str(&(position + 1).to_string());
                        idx = end;
                        copied = idx;
                        continue;
                    }
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1; // skip escaped quote
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        idx += 1;
    }

    out.push_str(&sql[copied..]);
    Ok(BoundStatement { sql: out, params })
}

/// Split SQL text into individual statements at top-level `;` boundaries.
///
/// Quoted strings, comments, and dollar-quoted blocks are never split.
/// Empty fragments (trailing semicolons, comment-only tails) are dropped.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<String> {
    let bytes = sql.as_bytes();
    let mut statements = Vec::new();
    let mut state = State::Normal;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let b = bytes[idx];
        match state {
            State::Normal => match b {
                b'\'' => state = State::SingleQuoted,
                b'"' => state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => state = State::BlockComment(1),
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        state = State::DollarQuoted(tag);
                        idx = advance;
                    }
                }
                b';' => {
                    push_statement(&mut statements, &sql[start..idx]);
                    start = idx + 1;
                }
                _ => {}
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        idx += 1;
                    } else {
                        state = State::Normal;
                    }
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    state = State::BlockComment(depth + 1);
                    idx += 1;
                } else if is_block_comment_end(bytes, idx) {
                    if depth == 1 {
                        state = State::Normal;
                    } else {
                        state = State::BlockComment(depth - 1);
                    }
                    idx += 1;
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let tag_len = tag.len();
                    state = State::Normal;
                    idx += tag_len + 1;
                }
            }
        }
        idx += 1;
    }

    push_statement(&mut statements, &sql[start..]);
    statements
}

fn push_statement(statements: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bag() -> ParamBag {
        ParamBag::new()
            .set("id", RowValues::Int(5))
            .set("name", RowValues::Text("alice".into()))
    }

    #[test]
    fn binds_named_placeholders_in_order() {
        let bound = bind_named(
            "UPDATE t SET name = :name WHERE id = :id",
            &bag(),
            PlaceholderStyle::Sqlite,
        )
        .unwrap();
        assert_eq!(bound.sql, "UPDATE t SET name = ?1 WHERE id = ?2");
        assert_eq!(
            bound.params,
            vec![RowValues::Text("alice".into()), RowValues::Int(5)]
        );
    }

    #[test]
    fn repeated_names_share_one_position() {
        let bound = bind_named(
            "SELECT * FROM t WHERE a = :id OR b = :id",
            &bag(),
            PlaceholderStyle::Postgres,
        )
        .unwrap();
        assert_eq!(bound.sql, "SELECT * FROM t WHERE a = $1 OR b = $1");
        assert_eq!(bound.params, vec![RowValues::Int(5)]);
    }

    #[test]
    fn missing_binding_is_an_error() {
        let err = bind_named("SELECT :absent", &bag(), PlaceholderStyle::Sqlite).unwrap_err();
        assert!(matches!(err, SqlSessionError::ParameterError(_)));
    }

    #[test]
    fn unreferenced_bag_entries_are_permitted() {
        let bound = bind_named("SELECT 1", &bag(), PlaceholderStyle::Sqlite).unwrap();
        assert_eq!(bound.sql, "SELECT 1");
        assert!(bound.params.is_empty());
    }

    #[test]
    fn skips_literals_comments_and_casts() {
        let bound = bind_named(
            "SELECT ':id', x::int -- :id\n/* :id */ FROM t WHERE id = :id",
            &bag(),
            PlaceholderStyle::Postgres,
        )
        .unwrap();
        assert_eq!(
            bound.sql,
            "SELECT ':id', x::int -- :id\n/* :id */ FROM t WHERE id = $1"
        );
        assert_eq!(bound.params, vec![RowValues::Int(5)]);
    }

    #[test]
    fn skips_dollar_quoted_blocks() {
        let bound = bind_named(
            "$fn$ :id $fn$ WHERE id = :id",
            &bag(),
            PlaceholderStyle::Sqlite,
        )
        .unwrap();
        assert_eq!(bound.sql, "$fn$ :id $fn$ WHERE id = ?1");
    }

    #[test]
    fn splits_on_top_level_semicolons_only() {
        let stmts = split_statements(
            "SELECT 'a;b'; -- trailing; comment\nINSERT INTO t VALUES (1);;",
        );
        assert_eq!(
            stmts,
            vec![
                "SELECT 'a;b'".to_string(),
                "-- trailing; comment\nINSERT INTO t VALUES (1)".to_string(),
            ]
        );
    }
}
