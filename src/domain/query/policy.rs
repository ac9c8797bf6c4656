//! Admission policy for ad-hoc statements.
//!
//! The check is lexical: it finds the leading keyword and counts statements while skipping
//! comments, quoted identifiers, string literals (including `E''` and dollar-quoted bodies).
//! It does not parse SQL; the read-only, rolled-back transaction the gateway runs in is what
//! guarantees nothing persists.

use crate::error::AppError;
use crate::infra::config::GatewayConfig;

#[derive(Debug, Clone)]
pub struct QueryPolicy {
    allowed_keywords: Vec<String>,
    max_statement_chars: usize,
}

/// Result of a successful admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Admitted<'a> {
    /// Upper-cased leading keyword.
    pub keyword: &'a str,
    /// Statement text without surrounding whitespace and without a trailing `;`.
    pub statement: &'a str,
}

#[derive(Debug, Default, PartialEq)]
struct Scan {
    keyword: Option<(usize, usize)>,
    statements: usize,
    /// A `$1`-style placeholder appears outside literals.
    parameters: bool,
    /// Byte offset just past the last significant token.
    end: usize,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_char(b: u8) -> bool {
    is_ident_start(b) || b.is_ascii_digit() || b == b'$'
}

/// Returns the index just past a quoted section that starts at `start` (the opening quote).
fn skip_quoted(b: &[u8], start: usize, quote: u8, backslash_escapes: bool) -> Result<usize, &'static str> {
    let mut i = start + 1;
    while i < b.len() {
        let c = b[i];
        if backslash_escapes && c == b'\\' {
            i += 2;
            continue;
        }
        if c == quote {
            // Doubled quote is an escaped quote.
            if b.get(i + 1) == Some(&quote) {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        i += 1;
    }
    Err(if quote == b'"' {
        "unterminated quoted identifier"
    } else {
        "unterminated string literal"
    })
}

/// If a dollar-quote tag (`$$` or `$tag$`) starts at `start`, returns the index just past it.
fn dollar_tag_end(b: &[u8], start: usize) -> Option<usize> {
    let mut j = start + 1;
    if let Some(&first) = b.get(j) {
        if first.is_ascii_digit() {
            return None;
        }
    }
    while j < b.len() && (is_ident_start(b[j]) || b[j].is_ascii_digit()) {
        j += 1;
    }
    (b.get(j) == Some(&b'$')).then_some(j + 1)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from > haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

fn scan(sql: &str) -> Result<Scan, &'static str> {
    let b = sql.as_bytes();
    let mut out = Scan::default();
    let mut keyword_pending = true;
    let mut in_statement = false;
    let mut i = 0;

    while i < b.len() {
        let c = b[i];

        // Insignificant bytes.
        if c.is_ascii_whitespace() {
            i += 1;
            continue;
        }
        // Line comments end at either newline byte, as in the server's lexer.
        if c == b'-' && b.get(i + 1) == Some(&b'-') {
            i = b[i..]
                .iter()
                .position(|&c| c == b'\n' || c == b'\r')
                .map_or(b.len(), |p| i + p + 1);
            continue;
        }
        if c == b'/' && b.get(i + 1) == Some(&b'*') {
            let mut depth = 1;
            i += 2;
            while depth > 0 {
                if i + 1 >= b.len() {
                    return Err("unterminated block comment");
                }
                if b[i] == b'/' && b[i + 1] == b'*' {
                    depth += 1;
                    i += 2;
                } else if b[i] == b'*' && b[i + 1] == b'/' {
                    depth -= 1;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            continue;
        }
        if c == b';' {
            if in_statement {
                out.statements += 1;
                in_statement = false;
            }
            i += 1;
            continue;
        }

        in_statement = true;
        let token_start = i;

        if is_ident_start(c) {
            while i < b.len() && is_ident_char(b[i]) {
                i += 1;
            }
            let word = &b[token_start..i];
            if keyword_pending {
                keyword_pending = false;
                let letters = word.iter().take_while(|c| c.is_ascii_alphabetic()).count();
                if letters == word.len() {
                    out.keyword = Some((token_start, i));
                }
            }
            // E'...' literal: backslash escapes apply.
            if word.eq_ignore_ascii_case(b"e") && b.get(i) == Some(&b'\'') {
                i = skip_quoted(b, i, b'\'', true)?;
            }
        } else if c == b'\'' || c == b'"' {
            keyword_pending = false;
            i = skip_quoted(b, i, c, false)?;
        } else if c == b'$' {
            keyword_pending = false;
            match dollar_tag_end(b, i) {
                Some(tag_end) => {
                    let tag = &b[i..tag_end];
                    let close = find(b, tag, tag_end).ok_or("unterminated dollar-quoted string")?;
                    i = close + tag.len();
                }
                None => {
                    if b.get(i + 1).is_some_and(u8::is_ascii_digit) {
                        out.parameters = true;
                    }
                    i += 1;
                }
            }
        } else {
            // An opening parenthesis may precede the keyword: `(SELECT 1) UNION ...`.
            if c != b'(' {
                keyword_pending = false;
            }
            i += 1;
        }
        out.end = i;
    }

    if in_statement {
        out.statements += 1;
    }
    Ok(out)
}

impl QueryPolicy {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            allowed_keywords: config
                .allowed_keywords
                .iter()
                .map(|k| k.to_ascii_uppercase())
                .collect(),
            max_statement_chars: config.max_statement_chars,
        }
    }

    pub fn allowed_keywords(&self) -> &[String] {
        &self.allowed_keywords
    }

    /// Validates `text` and returns the statement to execute.
    pub fn check<'a>(&'a self, text: &'a str) -> Result<Admitted<'a>, AppError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation("query must not be empty".to_string()));
        }
        if trimmed.chars().count() > self.max_statement_chars {
            return Err(AppError::Validation(format!(
                "query exceeds the maximum length of {} characters",
                self.max_statement_chars
            )));
        }

        let scanned = scan(trimmed).map_err(|msg| AppError::Syntax {
            code: "42601".to_string(),
            detail: msg.to_string(),
        })?;

        let Some((kw_start, kw_end)) = scanned.keyword else {
            return Err(AppError::policy(format!(
                "query must start with one of: {}",
                self.allowed_keywords.join(", ")
            )));
        };
        let keyword = trimmed[kw_start..kw_end].to_ascii_uppercase();
        let Some(allowed) = self.allowed_keywords.iter().find(|k| **k == keyword) else {
            return Err(AppError::policy(format!(
                "{} statements are not allowed; permitted: {}",
                keyword,
                self.allowed_keywords.join(", ")
            )));
        };

        if scanned.statements > 1 {
            return Err(AppError::policy("only a single statement may be submitted"));
        }
        if scanned.parameters {
            return Err(AppError::Validation(
                "positional parameters ($1, $2, ...) are not supported".to_string(),
            ));
        }

        Ok(Admitted {
            keyword: allowed.as_str(),
            statement: &trimmed[..scanned.end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> QueryPolicy {
        QueryPolicy::new(&GatewayConfig::default())
    }

    fn admitted(sql: &str) -> String {
        policy().check(sql).unwrap().statement.to_string()
    }

    fn kind(sql: &str) -> &'static str {
        policy().check(sql).unwrap_err().kind()
    }

    #[test]
    fn accepts_plain_select() {
        let p = policy();
        let a = p.check("SELECT 1").unwrap();
        assert_eq!(a.keyword, "SELECT");
        assert_eq!(a.statement, "SELECT 1");
    }

    #[test]
    fn strips_whitespace_and_trailing_semicolon() {
        assert_eq!(admitted("  select * from \"Employee\" ;  "), "select * from \"Employee\"");
        assert_eq!(admitted("SELECT 1;;"), "SELECT 1");
        assert_eq!(admitted("SELECT 1; -- done"), "SELECT 1");
    }

    #[test]
    fn rejects_empty_input() {
        assert_eq!(kind(""), "ValidationError");
        assert_eq!(kind("   \n\t"), "ValidationError");
    }

    #[test]
    fn rejects_overlong_input() {
        let config = GatewayConfig {
            max_statement_chars: 10,
            ..GatewayConfig::default()
        };
        let err = QueryPolicy::new(&config).check("SELECT 1234567890").unwrap_err();
        assert_eq!(err.kind(), "ValidationError");
    }

    #[test]
    fn rejects_mutating_and_administrative_statements() {
        assert_eq!(kind("DROP TABLE Employee"), "PolicyViolation");
        assert_eq!(kind("delete from \"Employee\""), "PolicyViolation");
        assert_eq!(kind("UPDATE x SET a = 1"), "PolicyViolation");
        assert_eq!(kind("INSERT INTO x VALUES (1)"), "PolicyViolation");
        assert_eq!(kind("TRUNCATE x"), "PolicyViolation");
        assert_eq!(kind("GRANT ALL ON x TO y"), "PolicyViolation");
        assert_eq!(kind("COMMIT"), "PolicyViolation");
        assert_eq!(kind("123"), "PolicyViolation");
        assert_eq!(kind("\"SELECT\" 1"), "PolicyViolation");
    }

    #[test]
    fn rejects_stacked_statements() {
        assert_eq!(kind("SELECT 1; DROP TABLE Employee"), "PolicyViolation");
        assert_eq!(kind("SELECT 1;SELECT 2"), "PolicyViolation");
    }

    #[test]
    fn semicolons_inside_literals_and_comments_are_ignored() {
        assert_eq!(admitted("SELECT ';' AS s"), "SELECT ';' AS s");
        assert_eq!(admitted("SELECT 'it''s; fine'"), "SELECT 'it''s; fine'");
        assert_eq!(admitted("SELECT E'a\\';b'"), "SELECT E'a\\';b'");
        assert_eq!(admitted("SELECT \"odd;name\" FROM t"), "SELECT \"odd;name\" FROM t");
        assert_eq!(admitted("SELECT $$a;b$$"), "SELECT $$a;b$$");
        assert_eq!(admitted("SELECT $tag$x;$$;y$tag$"), "SELECT $tag$x;$$;y$tag$");
        assert_eq!(admitted("SELECT 1 /* ; */"), "SELECT 1");
        assert_eq!(admitted("SELECT 1 -- ; DROP TABLE x"), "SELECT 1");
    }

    #[test]
    fn leading_comments_and_parentheses_are_skipped() {
        assert_eq!(policy().check("-- report\nSELECT 1").unwrap().keyword, "SELECT");
        assert_eq!(policy().check("/* a /* nested */ */ select 1").unwrap().keyword, "SELECT");
        assert_eq!(policy().check("((SELECT 1))").unwrap().keyword, "SELECT");
        assert_eq!(kind("/* hidden */ DROP TABLE x"), "PolicyViolation");
    }

    #[test]
    fn cte_is_admitted_by_keyword() {
        let p = policy();
        let a = p.check("WITH d AS (SELECT 1 AS n) SELECT n FROM d").unwrap();
        assert_eq!(a.keyword, "WITH");
    }

    #[test]
    fn positional_parameters_are_rejected() {
        assert_eq!(kind("SELECT $1"), "ValidationError");
        assert_eq!(kind("SELECT * FROM t WHERE a = $12"), "ValidationError");
        // Inside literals and identifiers they are plain text.
        assert_eq!(admitted("SELECT '$1', a$1 FROM t"), "SELECT '$1', a$1 FROM t");
    }

    #[test]
    fn carriage_return_ends_line_comments() {
        assert_eq!(kind("SELECT 1 --\r;DELETE FROM \"Department\""), "PolicyViolation");
        assert_eq!(
            kind("SELECT 1 --\r;COMMIT;DELETE FROM \"Department\";SELECT 1 --\n, 2"),
            "PolicyViolation"
        );
        assert_eq!(kind("SELECT 1 -- note\r\n; DROP TABLE x"), "PolicyViolation");
        assert_eq!(admitted("SELECT 1 -- note\r\n"), "SELECT 1");
        assert_eq!(policy().check("-- report\rSELECT 2").unwrap().keyword, "SELECT");
    }

    #[test]
    fn unterminated_sections_are_syntax_errors() {
        assert_eq!(kind("SELECT 'abc"), "SyntaxError");
        assert_eq!(kind("SELECT \"abc"), "SyntaxError");
        assert_eq!(kind("SELECT /* abc"), "SyntaxError");
        assert_eq!(kind("SELECT $$abc"), "SyntaxError");
    }

    #[test]
    fn allow_list_is_configurable() {
        let config = GatewayConfig {
            allowed_keywords: vec!["SELECT".to_string()],
            ..GatewayConfig::default()
        };
        let p = QueryPolicy::new(&config);
        assert!(p.check("SELECT 1").is_ok());
        assert_eq!(p.check("VALUES (1)").unwrap_err().kind(), "PolicyViolation");
    }
}
