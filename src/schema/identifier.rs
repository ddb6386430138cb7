// SPDX-License-Identifier: AGPL-3.0-or-later

//! Safety predicate for tokens which appear unquoted in SQL.
//!
//! Object typenames and primitive fieldnames end up in `CREATE TABLE` statements built by
//! string concatenation. The predicate is conservative: it rejects some identifiers which
//! would be valid SQL. It is a precondition on the schema, not a sanitizer.
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::MirrorError;

static SQL_SAFE: Lazy<Regex> = Lazy::new(|| {
    // Unwrap as the pattern is static and correct.
    Regex::new("^[A-Za-z0-9_]+$").unwrap()
});

/// Returns true when the token is safe to splice into a SQL statement unquoted.
pub fn is_sql_safe(token: &str) -> bool {
    SQL_SAFE.is_match(token)
}

/// Checks a token against [`is_sql_safe`], raising `UnsafeIdentifier` on violation.
pub fn ensure_sql_safe(token: &str) -> Result<(), MirrorError> {
    if is_sql_safe(token) {
        Ok(())
    } else {
        Err(MirrorError::UnsafeIdentifier(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::is_sql_safe;

    #[rstest]
    #[case("Repo")]
    #[case("primitives_Repo")]
    #[case("snake_case_01")]
    #[case("_leading")]
    #[case("0")]
    fn accepts_safe_tokens(#[case] token: &str) {
        assert!(is_sql_safe(token));
    }

    #[rstest]
    #[case("")]
    #[case("bad name")]
    #[case("semi;colon")]
    #[case("quo\"te")]
    #[case("hyphen-ated")]
    #[case("sch\u{e9}ma")]
    #[case("drop table--")]
    fn rejects_unsafe_tokens(#[case] token: &str) {
        assert!(!is_sql_safe(token));
    }
}
