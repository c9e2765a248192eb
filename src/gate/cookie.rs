//! Raw `Cookie` header parsing.

/// Find the value of cookie `name` in a raw `Cookie` header.
///
/// Pairs are separated by `;`; the value is everything after the first `=`,
/// so values containing `=` are returned whole. Empty values count as absent.
pub fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(name)?.strip_prefix('='))
        .filter(|value| !value.is_empty())
}
