//! TOML field lookup and replacement.
//!
//! Built on `toml_edit`, whose document model round-trips comments, key
//! order and whitespace. Lookups walk an explicit key path from the document
//! root, so a `version` key inside a dependency table or a tool section is
//! never confused with the package's own.

use toml_edit::{DocumentMut, Item, Value};

/// Parse TOML text, returning `None` if it is not valid TOML.
pub fn parse(text: &str) -> Option<DocumentMut> {
    text.parse::<DocumentMut>().ok()
}

/// Follow `path` from `item` through tables and inline tables.
pub fn lookup<'a>(item: &'a Item, path: &[&str]) -> Option<&'a Item> {
    path.iter().try_fold(item, |item, key| item.get(*key))
}

/// Mutable counterpart of [`lookup`].
pub fn lookup_mut<'a>(item: &'a mut Item, path: &[&str]) -> Option<&'a mut Item> {
    path.iter().try_fold(item, |item, key| item.get_mut(*key))
}

/// The string at `path`, if present and a string.
pub fn string_at<'a>(doc: &'a DocumentMut, path: &[&str]) -> Option<&'a str> {
    lookup(doc.as_item(), path)?.as_str()
}

/// Replace a string value in place, keeping its surrounding decoration.
///
/// The decoration covers the whitespace before the value and anything after
/// it on the line, including a trailing comment. Returns `false` (and leaves
/// the item alone) when the item is not a string value.
pub fn replace_string(item: &mut Item, new: &str) -> bool {
    let Some(value) = item.as_value_mut() else {
        return false;
    };
    if !value.is_str() {
        return false;
    }

    let decor = value.decor().clone();
    let mut replacement = Value::from(new);
    *replacement.decor_mut() = decor;
    *value = replacement;
    true
}

/// Replace the string at `path`. Returns `false` if there is none.
pub fn replace_string_at(doc: &mut DocumentMut, path: &[&str], new: &str) -> bool {
    lookup_mut(doc.as_item_mut(), path).is_some_and(|item| replace_string(item, new))
}
