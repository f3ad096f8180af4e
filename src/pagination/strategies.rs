//! Termination strategies
//!
//! Each paged API signals its last page differently. These helpers map a
//! response's signal to a [`Continuation`].

use super::types::Continuation;

// ============================================================================
// Page Number
// ============================================================================

/// Numeric page index: a short page (including an empty one) is the last
///
/// The listing also ends after page `u32::MAX`.
///
/// Used by APIs that take `page`/`per_page` and report nothing else.
pub fn page_number_next(page: u32, returned: usize, requested: usize) -> Continuation<u32> {
    if returned < requested {
        return Continuation::Done;
    }
    page.checked_add(1).map_or(Continuation::Done, Continuation::More)
}

// ============================================================================
// Opaque Cursor
// ============================================================================

/// Opaque server cursor: an empty cursor ends the listing
pub fn token_next(next_cursor: &str) -> Continuation<String> {
    if next_cursor.is_empty() {
        Continuation::Done
    } else {
        Continuation::More(next_cursor.to_string())
    }
}

// ============================================================================
// Continuation Token
// ============================================================================

/// Optional next token: absent or empty ends the listing
///
/// The position type is `Option<String>` so the first request can go out
/// without a token.
pub fn optional_token_next(next_token: Option<&str>) -> Continuation<Option<String>> {
    match next_token {
        Some(token) if !token.is_empty() => Continuation::More(Some(token.to_string())),
        _ => Continuation::Done,
    }
}

/// Truncation flag plus token: either one missing ends the listing
pub fn truncation_next(
    is_truncated: bool,
    next_token: Option<&str>,
) -> Continuation<Option<String>> {
    if is_truncated {
        optional_token_next(next_token)
    } else {
        Continuation::Done
    }
}
