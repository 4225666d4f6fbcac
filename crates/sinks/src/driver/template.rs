//! Insert templates
//!
//! The sink is configured with a single-row insert such as
//! `INSERT INTO events (id, ts) VALUES (?, ?)`. ClickHouse wants many rows per
//! request, so the template is split into its head and its `VALUES` group and
//! re-rendered with one group per buffered row at commit time.
//!
//! Placeholders are counted the way the `clickhouse` client binds them: every
//! `?` is an argument, including one inside quotes, and `??` is a literal `?`.
//! A lone `?` inside a quoted literal is rejected, since it would be bound.

use super::DriverError;

/// Positional placeholder character
pub const PLACEHOLDER: char = '?';

const VALUES_KEYWORD: &str = "VALUES";

/// A parsed single-row insert statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertTemplate {
    /// Everything up to and including the `VALUES` keyword
    head: String,
    /// The parenthesized row group, e.g. `(?, toDateTime(?))`
    group: String,
    placeholders: usize,
}

impl InsertTemplate {
    /// Parse an insert statement with exactly one `VALUES (...)` group
    pub fn parse(sql: &str) -> Result<Self, DriverError> {
        let sql = sql.trim().trim_end_matches(';').trim_end();

        let values_at = find_values_keyword(sql)
            .ok_or_else(|| DriverError::invalid_template("missing VALUES clause"))?;
        let head_end = values_at + VALUES_KEYWORD.len();
        let head = &sql[..head_end];
        if count_placeholders(head)? > 0 {
            return Err(DriverError::invalid_template(
                "placeholders are only allowed inside the VALUES group",
            ));
        }

        let rest = &sql[head_end..];
        let rest = rest.trim_start();
        if !rest.starts_with('(') {
            return Err(DriverError::invalid_template("expected '(' after VALUES"));
        }
        let close = find_group_end(rest)
            .ok_or_else(|| DriverError::invalid_template("unbalanced parentheses in VALUES group"))?;

        let group = &rest[..=close];
        let tail = rest[close + 1..].trim();
        if !tail.is_empty() {
            return Err(DriverError::invalid_template(format!(
                "expected exactly one VALUES group, found trailing '{tail}'"
            )));
        }

        let placeholders = count_placeholders(group)?;
        if placeholders == 0 {
            return Err(DriverError::invalid_template("VALUES group has no placeholders"));
        }

        Ok(Self {
            head: head.to_string(),
            group: group.to_string(),
            placeholders,
        })
    }

    /// Number of `?` placeholders per row (`??` escapes excluded)
    pub fn placeholders(&self) -> usize {
        self.placeholders
    }

    /// Render a multi-row insert with `rows` copies of the row group
    pub fn render(&self, rows: usize) -> String {
        let mut sql = String::with_capacity(self.head.len() + 1 + rows * (self.group.len() + 2));
        sql.push_str(&self.head);
        sql.push(' ');
        for i in 0..rows {
            if i > 0 {
                sql.push_str(", ");
            }
            sql.push_str(&self.group);
        }
        sql
    }
}

/// Characters of `sql` outside string literals and quoted identifiers
fn unquoted(sql: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut quote: Option<char> = None;
    let mut escaped = false;

    sql.char_indices().filter(move |&(_, c)| {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            false
        } else if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
            false
        } else {
            true
        }
    })
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn find_values_keyword(sql: &str) -> Option<usize> {
    let bytes = sql.as_bytes();
    let len = VALUES_KEYWORD.len();

    unquoted(sql).map(|(i, _)| i).find(|&i| {
        sql.get(i..i + len)
            .is_some_and(|word| word.eq_ignore_ascii_case(VALUES_KEYWORD))
            && (i == 0 || !is_word_byte(bytes[i - 1]))
            && bytes.get(i + len).is_none_or(|b| !is_word_byte(*b))
    })
}

/// Index of the `)` closing the group that opens at index 0
fn find_group_end(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    for (i, c) in unquoted(s) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

fn count_placeholders(s: &str) -> Result<usize, DriverError> {
    let mut count = 0;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut chars = s.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if c == PLACEHOLDER {
            escaped = false;
            if chars.next_if(|&(_, next)| next == PLACEHOLDER).is_some() {
                continue;
            }
            if quote.is_some() {
                return Err(DriverError::invalid_template(
                    "'?' inside a quoted literal is bound as a placeholder, write '??' for a literal '?'",
                ));
            }
            if s[i + 1..].starts_with("fields") {
                return Err(DriverError::invalid_template("'?fields' is not supported"));
            }
            count += 1;
            continue;
        }

        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
        } else if matches!(c, '\'' | '"' | '`') {
            quote = Some(c);
        }
    }

    Ok(count)
}

#[cfg(test)]
#[path = "template_test.rs"]
mod template_test;
