//! Destination table identifiers.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};

/// Longest identifier part the server accepts.
const MAX_PART_LEN: usize = 128;

#[allow(clippy::unwrap_used)]
static IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_#@][a-zA-Z0-9_@#$]{0,127}$").unwrap());

/// A possibly qualified table name: `[database.][owner.]table`.
///
/// Accepted forms:
///
/// ```text
/// people
/// dbo.people
/// tempdb.dbo.people
/// tempdb..people          (default owner)
/// [my db].[dbo].[odd]]name]
/// ```
///
/// Bare parts must be regular identifiers; anything else has to be
/// bracket-quoted, with `]` written as `]]`. The name always displays
/// bracket-quoted, so it can be embedded in SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableName {
    database: Option<String>,
    owner: Option<String>,
    table: String,
}

impl TableName {
    /// Create an unqualified table name.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_part(&table, true)?;
        Ok(Self {
            database: None,
            owner: None,
            table,
        })
    }

    /// Parse a table identifier.
    pub fn parse(input: &str) -> Result<Self> {
        let parts = split_parts(input.trim())?;

        let (database, owner, table) = match parts.as_slice() {
            [table] => (None, None, table),
            [owner, table] => (None, Some(owner), table),
            [database, owner, table] => (Some(database), Some(owner), table),
            _ => {
                return Err(Error::InvalidIdentifier(format!(
                    "'{input}' has more than three parts"
                )));
            }
        };

        if table.text.is_empty() {
            return Err(Error::InvalidIdentifier(format!(
                "'{input}' has no table name"
            )));
        }
        if database.is_some_and(|d| d.text.is_empty()) {
            return Err(Error::InvalidIdentifier(format!(
                "'{input}' has an empty database name"
            )));
        }
        // The owner may be empty only in the `db..table` form
        if database.is_none() && owner.is_some_and(|o| o.text.is_empty()) {
            return Err(Error::InvalidIdentifier(format!(
                "'{input}' has an empty owner name"
            )));
        }

        for part in [database, owner, Some(table)].into_iter().flatten() {
            if !part.text.is_empty() {
                validate_part(&part.text, !part.quoted)?;
            }
        }

        let non_empty = |p: Option<&Part>| p.filter(|p| !p.text.is_empty()).map(|p| p.text.clone());
        Ok(Self {
            database: non_empty(database),
            owner: non_empty(owner),
            table: table.text.clone(),
        })
    }

    /// Get the database part, if given.
    #[must_use]
    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    /// Get the owner (schema) part, if given.
    #[must_use]
    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Get the table part.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }
}

impl std::str::FromStr for TableName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl std::fmt::Display for TableName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let quote = |s: &str| format!("[{}]", s.replace(']', "]]"));
        match (&self.database, &self.owner) {
            (Some(db), Some(owner)) => write!(f, "{}.{}.", quote(db), quote(owner))?,
            (Some(db), None) => write!(f, "{}..", quote(db))?,
            (None, Some(owner)) => write!(f, "{}.", quote(owner))?,
            (None, None) => {}
        }
        f.write_str(&quote(&self.table))
    }
}

struct Part {
    text: String,
    quoted: bool,
}

fn split_parts(input: &str) -> Result<Vec<Part>> {
    let invalid = |reason: &str| Error::InvalidIdentifier(format!("'{input}': {reason}"));

    let mut parts = Vec::new();
    let mut chars = input.chars().peekable();

    loop {
        let mut text = String::new();
        let quoted = chars.peek() == Some(&'[');

        if quoted {
            chars.next();
            loop {
                match chars.next() {
                    Some(']') if chars.peek() == Some(&']') => {
                        chars.next();
                        text.push(']');
                    }
                    Some(']') => break,
                    Some(c) => text.push(c),
                    None => return Err(invalid("unterminated '['")),
                }
            }
            if text.is_empty() {
                return Err(invalid("empty bracketed name"));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == '.' {
                    break;
                }
                text.push(c);
                chars.next();
            }
        }

        parts.push(Part { text, quoted });

        match chars.next() {
            None => return Ok(parts),
            Some('.') => {}
            Some(_) => return Err(invalid("expected '.' after ']'")),
        }
    }
}

/// Validate one identifier part.
fn validate_part(name: &str, bare: bool) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidIdentifier(
            "identifier cannot be empty".into(),
        ));
    }

    if bare {
        if !IDENTIFIER_RE.is_match(name) {
            return Err(Error::InvalidIdentifier(format!(
                "invalid identifier '{name}': must start with letter/underscore, \
                 contain only alphanumerics/_/@/#/$, and be 1-128 characters; \
                 quote other names with brackets"
            )));
        }
    } else if name.chars().count() > MAX_PART_LEN || name.chars().any(char::is_control) {
        return Err(Error::InvalidIdentifier(format!(
            "invalid quoted identifier '{name}'"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_forms() {
        let t = TableName::parse("people").unwrap();
        assert_eq!((t.database(), t.owner(), t.table()), (None, None, "people"));

        let t = TableName::parse("dbo.people").unwrap();
        assert_eq!((t.database(), t.owner(), t.table()), (None, Some("dbo"), "people"));

        let t = TableName::parse("tempdb.dbo.people").unwrap();
        assert_eq!(t.to_string(), "[tempdb].[dbo].[people]");

        let t = TableName::parse("tempdb..people").unwrap();
        assert_eq!(t.owner(), None);
        assert_eq!(t.to_string(), "[tempdb]..[people]");
    }

    #[test]
    fn test_parse_brackets() {
        let t = TableName::parse("[my db].[dbo].[odd]]name]").unwrap();
        assert_eq!(t.database(), Some("my db"));
        assert_eq!(t.table(), "odd]name");
        assert_eq!(t.to_string(), "[my db].[dbo].[odd]]name]");

        // Display output parses back to the same name
        assert_eq!(TableName::parse(&t.to_string()).unwrap(), t);
    }

    #[test]
    fn test_parse_rejects() {
        for bad in [
            "",
            "a.b.c.d",
            "db.dbo.",
            ".dbo.t",
            ".t",
            "[unterminated",
            "[a]b",
            "[]",
            "users; DROP TABLE users",
            "1table",
        ] {
            let err = TableName::parse(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidIdentifier(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn test_quoting_allows_unusual_names() {
        assert!(TableName::parse("[users; DROP TABLE users]").is_ok());
        assert!(TableName::parse("#temp").is_ok());
        assert!(TableName::new("ok_name").is_ok());
        assert!(TableName::new("bad name").is_err());
    }
}
