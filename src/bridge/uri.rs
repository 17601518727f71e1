//! Topic and procedure URI grammar.
//!
//! A URI is one or more segments of `[0-9a-z_]` joined by `.`. Empty
//! segments (the wildcard form used for pattern subscriptions) and `*` are
//! rejected, so neither publish nor call can target a pattern.
//!
//! No regex: the check is a single pass over the bytes.

/// Returns true if `uri` is a concrete (non-wildcard) URI.
pub fn is_valid_uri(uri: &str) -> bool {
    !uri.is_empty()
        && uri.split('.').all(|segment| {
            !segment.is_empty()
                && segment
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_')
        })
}
