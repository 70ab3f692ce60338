//! Response token scanner
//!
//! The value follows a literal marker in the response body, e.g. the
//! `42` in `...>Open Tasks (42)...`. Each chunk is scanned on its own; a
//! marker or value that straddles two chunks is not found.

/// Find the first occurrence of `needle` in `haystack`
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Extract the digits following `token` in `chunk` into `value`
///
/// At most `value.len()` digits are copied, stopping at the first byte that
/// is not an ASCII digit; the rest of `value` is zeroed. Returns `false`
/// and leaves `value` untouched when the token is missing or fewer than
/// `value.len()` bytes follow it.
pub fn extract_value(chunk: &[u8], token: &[u8], value: &mut [u8]) -> bool {
    let Some(pos) = find(chunk, token) else {
        return false;
    };

    let tail = &chunk[pos + token.len()..];
    if tail.len() < value.len() {
        return false;
    }

    let digits = tail
        .iter()
        .take(value.len())
        .take_while(|b| b.is_ascii_digit())
        .count();
    value[..digits].copy_from_slice(&tail[..digits]);
    value[digits..].fill(0);
    true
}
