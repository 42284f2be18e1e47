//! Column name normalization.

/// Map a raw header to its canonical column identifier.
///
/// The name is lower-cased, every run of whitespace becomes a single `_`, and leading/trailing
/// underscores are stripped. Nothing else is touched, and the function is idempotent.
///
/// ```rust
/// use tabular_ingest::normalize::normalize_column_name;
///
/// assert_eq!(normalize_column_name(" My Col "), "my_col");
/// assert_eq!(normalize_column_name("__Col__"), "col");
/// ```
pub fn normalize_column_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.to_lowercase().chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(ch);
            in_whitespace = false;
        }
    }
    out.trim_matches('_').to_string()
}

#[cfg(test)]
mod tests {
    use super::normalize_column_name;

    #[test]
    fn lowercases_and_collapses_whitespace() {
        assert_eq!(normalize_column_name(" My Col "), "my_col");
        assert_eq!(normalize_column_name("Order\t\t  Date"), "order_date");
        assert_eq!(normalize_column_name("Timestamp"), "timestamp");
    }

    #[test]
    fn strips_any_leading_and_trailing_underscores() {
        assert_eq!(normalize_column_name("__Col__"), "col");
        assert_eq!(normalize_column_name("_ a _"), "a");
    }

    #[test]
    fn leaves_other_characters_alone() {
        assert_eq!(normalize_column_name("Price ($)"), "price_($)");
        assert_eq!(normalize_column_name("a-b.c"), "a-b.c");
        assert_eq!(normalize_column_name("mid__dle"), "mid__dle");
    }

    #[test]
    fn empty_and_blank_names_normalize_to_empty() {
        assert_eq!(normalize_column_name(""), "");
        assert_eq!(normalize_column_name("   "), "");
        assert_eq!(normalize_column_name("___"), "");
    }

    #[test]
    fn is_idempotent() {
        for raw in [" My Col ", "__Col__", "a _ b", "  Ünïcode Name\n", "x\u{a0}y", "ID"] {
            let once = normalize_column_name(raw);
            assert_eq!(normalize_column_name(&once), once, "input {raw:?}");
        }
    }
}
