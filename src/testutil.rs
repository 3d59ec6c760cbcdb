//! Helpers for asserting on handler output.

use serde::de::IgnoredAny;

/// Compares two JSON documents, ignoring insignificant whitespace.
///
/// The documents are compared byte for byte once whitespace outside strings
/// is removed, so key order, duplicate keys and number spelling (`1e2` vs
/// `100`) all matter. Two empty inputs are equal; input that is not valid
/// JSON never is.
pub fn equal_json(a: &[u8], b: &[u8]) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }
    match (compact(a), compact(b)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// Validates `json` and strips whitespace outside strings.
fn compact(json: &[u8]) -> Option<Vec<u8>> {
    serde_json::from_slice::<IgnoredAny>(json).ok()?;

    let mut out = Vec::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;
    for &b in json {
        if in_string {
            out.push(b);
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
        } else if !matches!(b, b' ' | b'\t' | b'\n' | b'\r') {
            in_string = b == b'"';
            out.push(b);
        }
    }
    Some(out)
}
