//! Query result shaping
//!
//! Helpers that turn aggregated SQL columns (JSON arrays, GROUP_CONCAT
//! strings) into domain values, and that prepare user terms for LIKE.

use crate::error::Result;
use serde::de::DeserializeOwned;

/// Separator passed to GROUP_CONCAT; never appears in user-entered names
pub const CONCAT_SEPARATOR: char = '\u{1f}';

/// Character used in `LIKE ... ESCAPE`
pub const LIKE_ESCAPE: char = '\\';

/// Decode a JSON array column; NULL or empty text is an empty list
pub fn parse_json_array<T: DeserializeOwned>(raw: Option<&str>) -> Result<Vec<T>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(Vec::new()),
        Some(text) => Ok(serde_json::from_str(text)?),
    }
}

/// Split a GROUP_CONCAT column built with [`CONCAT_SEPARATOR`]
pub fn split_concat(raw: Option<&str>) -> Vec<String> {
    raw.map(|text| {
        text.split(CONCAT_SEPARATOR)
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

/// Escape LIKE wildcards so a search term matches literally
pub fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if c == '%' || c == '_' || c == LIKE_ESCAPE {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::CategoryTag;

    #[test]
    fn test_parse_json_array() {
        let tags: Vec<CategoryTag> =
            parse_json_array(Some(r##"[{"id":1,"name":"Clásicos","color":"#F59E0B"}]"##)).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "Clásicos");

        let empty: Vec<CategoryTag> = parse_json_array(None).unwrap();
        assert!(empty.is_empty());

        let empty: Vec<CategoryTag> = parse_json_array(Some("[]")).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_parse_json_array_rejects_garbage() {
        let result: Result<Vec<CategoryTag>> = parse_json_array(Some("{not json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_split_concat() {
        let raw = format!("Clásicos{}Tropicales", CONCAT_SEPARATOR);
        assert_eq!(split_concat(Some(&raw)), vec!["Clásicos", "Tropicales"]);
        assert!(split_concat(None).is_empty());
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b"), "a\\_b");
        assert_eq!(escape_like("mojito"), "mojito");
    }
}
