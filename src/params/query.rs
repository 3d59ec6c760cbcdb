//! Accessors over query string parameters.

accessors!("query string", query_value);
lenient_numbers!("query string", query_value);

/// Splits the query string value of `key` on commas, or returns `default`
/// when it is absent or blank.
pub fn string_array<R: ParamSource + ?Sized>(request: &R, key: &str, default: Vec<String>) -> Vec<String> {
    match request.query_value(key) {
        Some(raw) if !raw.is_empty() => raw.split(',').map(str::to_owned).collect(),
        _ => default,
    }
}
