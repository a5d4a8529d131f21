//! Identifier quoting and nullable-string helpers

/// Quote a column or table name for PostgreSQL.
///
/// Dotted names are quoted per part (`t.col` becomes `"t"."col"`), embedded
/// double quotes are doubled, and `*` parts stay bare. Blank names are
/// returned unchanged.
pub fn quote_ident(name: &str) -> String {
    if name.trim().is_empty() {
        return name.to_owned();
    }
    name.split('.')
        .map(|part| {
            if part == "*" {
                part.to_owned()
            } else {
                format!("\"{}\"", part.replace('"', "\"\""))
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}

/// `None` for an empty string, so it binds as SQL `NULL`.
pub fn null_string(value: impl Into<String>) -> Option<String> {
    Some(value.into()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_plain_and_dotted_names() {
        assert_eq!(quote_ident("user"), "\"user\"");
        assert_eq!(quote_ident("u.name"), "\"u\".\"name\"");
        assert_eq!(quote_ident("u.*"), "\"u\".*");
    }

    #[test]
    fn doubles_embedded_quotes() {
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[test]
    fn blank_passes_through() {
        assert_eq!(quote_ident(""), "");
        assert_eq!(quote_ident("  "), "  ");
    }

    #[test]
    fn null_string_blank_is_none() {
        assert_eq!(null_string(""), None);
        assert_eq!(null_string("x"), Some("x".to_string()));
    }
}
