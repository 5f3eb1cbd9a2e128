//! JSON field lookup and in-place replacement.
//!
//! Reading goes through `serde_json`. Writing does not re-serialise the
//! document: `tree-sitter-json` locates the string node at a key path, and
//! only its byte range is replaced. Indentation, key order and every sibling
//! value stay byte-for-byte identical.

use std::ops::Range;

use serde_json::Value;
use tracing::warn;
use tree_sitter::{Node, Parser};

/// Parse JSON text, returning `None` if it is not valid JSON.
pub fn parse(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// The string at `path` (object keys only), if present and a string.
pub fn string_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    path.iter().try_fold(value, |v, key| v.get(*key))?.as_str()
}

/// Byte range of the string literal at `path`, quotes included.
///
/// Returns `None` for text with syntax errors. With duplicate keys the last
/// occurrence wins, matching `serde_json`.
pub fn string_span(text: &str, path: &[&str]) -> Option<Range<usize>> {
    let mut parser = Parser::new();
    if let Err(e) = parser.set_language(&tree_sitter_json::LANGUAGE.into()) {
        warn!("failed to load JSON grammar: {e}");
        return None;
    }
    let tree = parser.parse(text, None)?;
    let root = tree.root_node();
    if root.has_error() {
        return None;
    }

    let mut cursor = root.walk();
    let document = root
        .named_children(&mut cursor)
        .find(|node| node.kind() != "comment")?;
    resolve(document, text, path)
}

fn resolve(node: Node<'_>, text: &str, path: &[&str]) -> Option<Range<usize>> {
    let Some((first, rest)) = path.split_first() else {
        return (node.kind() == "string").then(|| node.byte_range());
    };
    if node.kind() != "object" {
        return None;
    }

    let mut cursor = node.walk();
    let value = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "pair")
        .filter(|pair| {
            pair.child_by_field_name("key")
                .is_some_and(|key| key_text(key, text).as_deref() == Some(*first))
        })
        .filter_map(|pair| pair.child_by_field_name("value"))
        .last()?;
    resolve(value, text, rest)
}

/// Decoded key text, with escapes resolved.
fn key_text(key: Node<'_>, text: &str) -> Option<String> {
    serde_json::from_str(&text[key.byte_range()]).ok()
}

/// Replace the string at each of `paths` with `new`.
///
/// Paths that do not resolve to a string are skipped. Returns `None` when
/// none of them resolve.
pub fn replace_strings(text: &str, paths: &[&[&str]], new: &str) -> Option<String> {
    let mut spans: Vec<Range<usize>> = paths
        .iter()
        .filter_map(|path| string_span(text, path))
        .collect();
    if spans.is_empty() {
        return None;
    }

    spans.sort_by_key(|span| std::cmp::Reverse(span.start));
    spans.dedup();

    let literal = Value::String(new.to_string()).to_string();
    let mut out = text.to_string();
    for span in spans {
        out.replace_range(span, &literal);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PACKAGE: &str = r#"{
  "name": "demo",
  "dependencies": {
    "lodash": "^4.17.21",
    "version": "0.0.1"
  },
  "config": { "version": "9.9.9", "list": [1, "two", {"version": "3.0.0"}] },
  "version": "2.1.0",
  "private": true
}
"#;

    const LOCK: &str = r#"{
  "name": "demo",
  "version": "2.1.0",
  "lockfileVersion": 3,
  "packages": {
    "": {
      "name": "demo",
      "version": "2.1.0"
    },
    "node_modules/lodash": {
      "version": "4.17.21"
    }
  }
}
"#;

    #[test]
    fn string_at_reads_nested_keys() {
        let value = parse(LOCK).unwrap();
        assert_eq!(string_at(&value, &["version"]), Some("2.1.0"));
        assert_eq!(string_at(&value, &["packages", "", "version"]), Some("2.1.0"));
        assert_eq!(
            string_at(&value, &["packages", "node_modules/lodash", "version"]),
            Some("4.17.21")
        );
        assert_eq!(string_at(&value, &["lockfileVersion"]), None);
    }

    #[test]
    fn span_targets_top_level_key_only() {
        let span = string_span(PACKAGE, &["version"]).unwrap();
        assert_eq!(&PACKAGE[span], r#""2.1.0""#);
    }

    #[test]
    fn span_follows_empty_key() {
        let span = string_span(LOCK, &["packages", "", "version"]).unwrap();
        assert_eq!(&LOCK[span.clone()], r#""2.1.0""#);
        assert!(span.start > LOCK.find("\"packages\"").unwrap());
    }

    #[test]
    fn span_missing_or_non_string() {
        assert!(string_span(PACKAGE, &["missing"]).is_none());
        assert!(string_span(PACKAGE, &["private"]).is_none());
        assert!(string_span(LOCK, &["lockfileVersion"]).is_none());
        assert!(string_span("[]", &["version"]).is_none());
        assert!(string_span("{}", &["version"]).is_none());
    }

    #[test]
    fn span_handles_escapes() {
        let text = r#"{"desc": "say \"version\": \"1.0.0\"", "version": "1.2.3"}"#;
        let span = string_span(text, &["version"]).unwrap();
        assert_eq!(&text[span], r#""1.2.3""#);
    }

    #[test]
    fn span_duplicate_keys_last_wins() {
        let text = r#"{"version": "1.0.0", "version": "2.0.0"}"#;
        let span = string_span(text, &["version"]).unwrap();
        assert_eq!(&text[span], r#""2.0.0""#);
        assert_eq!(string_at(&parse(text).unwrap(), &["version"]), Some("2.0.0"));
    }

    #[test]
    fn replace_touches_only_the_field() {
        let out = replace_strings(PACKAGE, &[&["version"]], "2.2.0").unwrap();
        assert_eq!(out, PACKAGE.replace(r#""version": "2.1.0""#, r#""version": "2.2.0""#));
        assert!(out.contains(r#""version": "0.0.1""#));
        assert!(out.contains(r#""version": "9.9.9""#));
        assert!(out.contains(r#"{"version": "3.0.0"}"#));
    }

    #[test]
    fn replace_lockfile_root_entries() {
        let out = replace_strings(LOCK, &[&["version"], &["packages", "", "version"]], "2.2.0")
            .unwrap();
        let value = parse(&out).unwrap();
        assert_eq!(string_at(&value, &["version"]), Some("2.2.0"));
        assert_eq!(string_at(&value, &["packages", "", "version"]), Some("2.2.0"));
        assert_eq!(
            string_at(&value, &["packages", "node_modules/lodash", "version"]),
            Some("4.17.21")
        );
        assert_eq!(out.len(), LOCK.len());
    }

    #[test]
    fn span_rejects_broken_text() {
        assert!(string_span("{\"version\": \"1.0.0\",", &["version"]).is_none());
    }

    #[test]
    fn span_matches_escaped_key() {
        let text = r#"{"vers\u0069on": "1.0.0"}"#;
        let span = string_span(text, &["version"]).unwrap();
        assert_eq!(&text[span], r#""1.0.0""#);
    }

    #[test]
    fn replace_none_when_nothing_matches() {
        assert!(replace_strings(PACKAGE, &[&["nope"]], "1.0.0").is_none());
    }
}
