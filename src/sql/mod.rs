//! SQL execution collaborator
//!
//! Model-written queries only ever reach the database through
//! [`ensure_read_only`]; anything that is not a single `SELECT` is refused
//! before execution.

use crate::error::ChatbotError;
use crate::Result;
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;

pub mod sqlite;
pub use sqlite::SqliteProductStore;

/// One result row, column name to JSON value
pub type SqlRow = serde_json::Map<String, serde_json::Value>;

#[async_trait]
pub trait SqlExecutor: Send + Sync {
    /// Run a read-only query and return at most `limit` rows
    async fn execute(&self, query: &str, limit: usize) -> Result<Vec<SqlRow>>;
}

lazy_static! {
    static ref SQL_TAG: Regex = Regex::new(r"(?s)<SQL>(.*?)</SQL>").expect("valid SQL tag pattern");
    static ref SELECT_HEAD: Regex = Regex::new(r"(?i)^select[\s*]").expect("valid select pattern");
}

/// First `<SQL>...</SQL>` block in a model response
pub fn extract_sql(response: &str) -> Result<String> {
    SQL_TAG
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|sql| !sql.is_empty())
        .ok_or_else(|| {
            ChatbotError::SqlGenerationFailure("model response has no <SQL> block".to_string())
        })
}

/// Validate a statement as a single `SELECT`, returning it without the
/// trailing semicolon.
pub fn ensure_read_only(query: &str) -> Result<&str> {
    let statement = query.trim().trim_end_matches(';').trim_end();

    if !SELECT_HEAD.is_match(statement) {
        return Err(ChatbotError::SqlRejected(format!(
            "only SELECT statements may run: {}",
            statement
        )));
    }

    if has_statement_separator(statement) {
        return Err(ChatbotError::SqlRejected(
            "multiple statements are not allowed".to_string(),
        ));
    }

    Ok(statement)
}

/// True if a `;` appears outside string literals and quoted identifiers
fn has_statement_separator(statement: &str) -> bool {
    let mut quote: Option<char> = None;

    for c in statement.chars() {
        match (quote, c) {
            (None, '\'' | '"' | '`') => quote = Some(c),
            (None, ';') => return true,
            // A doubled quote closes and reopens, which nets out the same
            (Some(open), c) if c == open => quote = None,
            _ => {}
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sql() {
        let response = "Here you go:\n<SQL>\nSELECT * FROM product WHERE price < 1000\n</SQL>\nthanks";
        assert_eq!(
            extract_sql(response).unwrap(),
            "SELECT * FROM product WHERE price < 1000"
        );
    }

    #[test]
    fn test_extract_sql_takes_first_block() {
        let response = "<SQL>SELECT 1</SQL> or <SQL>SELECT 2</SQL>";
        assert_eq!(extract_sql(response).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_extract_sql_missing() {
        assert!(matches!(
            extract_sql("SELECT * FROM product"),
            Err(ChatbotError::SqlGenerationFailure(_))
        ));
        assert!(extract_sql("<SQL>  </SQL>").is_err());
    }

    #[test]
    fn test_ensure_read_only() {
        assert_eq!(
            ensure_read_only("  select * from product; ").unwrap(),
            "select * from product"
        );
        assert!(matches!(
            ensure_read_only("DROP TABLE product"),
            Err(ChatbotError::SqlRejected(_))
        ));
        assert!(ensure_read_only("SELECT 1; DELETE FROM product").is_err());
        assert!(ensure_read_only("").is_err());
        assert!(ensure_read_only("SEL").is_err());
    }

    #[test]
    fn test_select_needs_word_boundary() {
        assert!(matches!(
            ensure_read_only("SELECTED FROM product"),
            Err(ChatbotError::SqlRejected(_))
        ));
        assert!(ensure_read_only("SELECT*FROM product").is_ok());
        assert!(ensure_read_only("select\n* from product").is_ok());
    }

    #[test]
    fn test_semicolon_inside_literal_is_allowed() {
        let query = "SELECT * FROM product WHERE title LIKE '%a;b%';";
        assert_eq!(
            ensure_read_only(query).unwrap(),
            "SELECT * FROM product WHERE title LIKE '%a;b%'"
        );
        assert!(ensure_read_only("SELECT * FROM product WHERE brand = 'O''Neil;'").is_ok());
        assert!(ensure_read_only("SELECT 'x'; DROP TABLE product").is_err());
    }
}
