//! Quoting rules for MCF property values.

/// Properties whose values are human-readable text and must be quoted.
pub const QUOTED_PROPERTIES: &[&str] = &[
    "name",
    "description",
    "provenance",
    "shortDisplayName",
    "searchDescription",
];

/// Properties that may hold several comma-separated values.
pub const LIST_PROPERTIES: &[&str] = &["memberOf", "searchDescription"];

pub fn is_quoted_property(key: &str) -> bool {
    QUOTED_PROPERTIES.contains(&key)
}

pub fn is_list_property(key: &str) -> bool {
    LIST_PROPERTIES.contains(&key)
}

/// Wraps a value in double quotes, dropping any quotes already around it.
pub fn ensure_quoted(value: &str) -> String {
    format!("\"{}\"", unquote(value))
}

/// Strips surrounding single or double quotes.
pub fn unquote(value: &str) -> &str {
    value.trim().trim_matches('"').trim_matches('\'')
}

/// Quotes each item and joins them with `, `.
pub fn quoted_list<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(|item| ensure_quoted(item.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Splits a list-valued cell into its items.
///
/// Accepts plain comma lists (`A, B`), quoted items that contain commas
/// (`"A, B", C`) and spreadsheet-style lists (`["A", "B"]`). Empty items are
/// dropped.
pub fn parse_str_or_list(value: &str) -> Vec<String> {
    let mut value = value.trim();
    if value.starts_with('[') && value.ends_with(']') && value.len() >= 2 {
        value = &value[1..value.len() - 1];
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match (quote, c) {
            (None, '"' | '\'') => quote = Some(c),
            (Some(q), c) if c == q => quote = None,
            (None, ',') => {
                items.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    items.push(current);

    items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_quoted() {
        assert_eq!(ensure_quoted("GDP"), "\"GDP\"");
        assert_eq!(ensure_quoted("\"GDP\""), "\"GDP\"");
        assert_eq!(ensure_quoted("'GDP'"), "\"GDP\"");
    }

    #[test]
    fn test_quoted_list() {
        assert_eq!(quoted_list(&["a", "b"]), "\"a\", \"b\"");
        assert_eq!(quoted_list(&["only"]), "\"only\"");
    }

    #[test]
    fn test_parse_plain_list() {
        assert_eq!(parse_str_or_list("A, B"), vec!["A", "B"]);
        assert_eq!(parse_str_or_list("single"), vec!["single"]);
        assert!(parse_str_or_list("  ").is_empty());
    }

    #[test]
    fn test_parse_quoted_items_keep_commas() {
        assert_eq!(parse_str_or_list("\"A, B\", C"), vec!["A, B", "C"]);
    }

    #[test]
    fn test_parse_spreadsheet_list() {
        assert_eq!(
            parse_str_or_list(r#"["GDP growth", "output"]"#),
            vec!["GDP growth", "output"]
        );
    }
}
