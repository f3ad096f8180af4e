//! Pagination module
//!
//! Supports: page number, opaque cursor, continuation token with or
//! without a truncation flag.
//!
//! # Overview
//!
//! Every paged resource implements [`PageSource`]: given a position and a
//! page size it performs one request and reports a [`Page`] with the
//! position of the following page. A [`Cursor`] drives a source one page at
//! a time, enforcing an optional item budget and refusing to revisit a
//! position. [`collect_all`] walks a cursor to the end, keeping whatever was
//! gathered before a failure.

mod cursor;
mod strategies;
mod types;

pub use cursor::{collect_all, Cursor};
pub use strategies::{optional_token_next, page_number_next, token_next, truncation_next};
pub use types::{Continuation, CursorState, Listing, Page, PageSource, Step};
