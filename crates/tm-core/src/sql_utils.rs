//! SQL identifier quoting and text normalization utilities
//!
//! Every statement the engine issues is assembled from plan data, so all
//! identifiers pass through [`quote_ident`] and all text literals through
//! [`quote_literal`].

/// Quote a SQL identifier to prevent injection.
///
/// Wraps the identifier in double quotes and escapes any embedded double quotes
/// by doubling them, following the SQL standard.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("metrics"), r#""metrics""#);
/// assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Escape a SQL string literal value by doubling single quotes.
///
/// This is for use inside single-quoted SQL string literals, not identifiers.
pub fn escape_sql_string(value: &str) -> String {
    value.replace('\'', "''")
}

/// Render a text value as a complete single-quoted SQL literal.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_literal;
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_sql_string(value))
}

/// Normalize a declared column type for comparison.
///
/// SQLite stores the declared type text verbatim, so `decimal(10, 2)` and
/// `DECIMAL(10,2)` must compare equal.
pub fn normalize_declared_type(declared: &str) -> String {
    declared
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Strip one layer of identifier quoting (`"x"`, `` `x` ``, `[x]`).
pub fn unquote_ident(ident: &str) -> &str {
    let bytes = ident.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'"' && last == b'"')
            || (first == b'`' && last == b'`')
            || (first == b'[' && last == b']')
        {
            return &ident[1..ident.len() - 1];
        }
    }
    ident
}

/// Bare words of a SQL statement, uppercased.
///
/// String literals, quoted identifiers and comments are skipped, so a
/// column named `"check"` or a default of `'unique'` yields no keyword.
pub fn bare_words(sql: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut chars = sql.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' | '`' => {
                while let Some(next) = chars.next() {
                    if next == c {
                        if chars.peek() == Some(&c) {
                            chars.next();
                        } else {
                            break;
                        }
                    }
                }
            }
            '[' => {
                for next in chars.by_ref() {
                    if next == ']' {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut previous = ' ';
                for next in chars.by_ref() {
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut word = c.to_ascii_uppercase().to_string();
                while let Some(&next) = chars.peek() {
                    if !(next.is_ascii_alphanumeric() || next == '_' || next == '$') {
                        break;
                    }
                    word.push(next.to_ascii_uppercase());
                    chars.next();
                }
                words.push(word);
            }
            _ => {}
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_simple() {
        assert_eq!(quote_ident("users"), r#""users""#);
    }

    #[test]
    fn test_quote_ident_with_embedded_quotes() {
        assert_eq!(quote_ident(r#"my"table"#), r#""my""table""#);
    }

    #[test]
    fn test_escape_sql_string() {
        assert_eq!(escape_sql_string("O'Brien"), "O''Brien");
        assert_eq!(escape_sql_string("plain"), "plain");
    }

    #[test]
    fn test_normalize_declared_type() {
        assert_eq!(normalize_declared_type("decimal(10, 2)"), "DECIMAL(10,2)");
        assert_eq!(normalize_declared_type(" text "), "TEXT");
    }

    #[test]
    fn test_unquote_ident() {
        assert_eq!(unquote_ident(r#""metrics""#), "metrics");
        assert_eq!(unquote_ident("`metrics`"), "metrics");
        assert_eq!(unquote_ident("[metrics]"), "metrics");
        assert_eq!(unquote_ident("metrics"), "metrics");
        assert_eq!(unquote_ident("\""), "\"");
    }

    #[test]
    fn test_bare_words_skip_quoted_text() {
        let sql = r#"CREATE TABLE "t" ("check" TEXT DEFAULT 'unique', [references] INT, -- check
            b INT /* unique */ CHECK (b > 0))"#;
        assert_eq!(
            bare_words(sql),
            vec!["CREATE", "TABLE", "TEXT", "DEFAULT", "INT", "B", "INT", "CHECK", "B"]
        );
    }

    #[test]
    fn test_bare_words_handle_doubled_quotes() {
        let sql = "CREATE TABLE t (a TEXT DEFAULT 'it''s unique', id INTEGER PRIMARY KEY AUTOINCREMENT)";
        let words = bare_words(sql);
        assert!(!words.contains(&"UNIQUE".to_string()));
        assert!(words.contains(&"AUTOINCREMENT".to_string()));
    }
}
