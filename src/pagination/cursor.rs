//! Generic pagination cursor
//!
//! A [`Cursor`] walks any [`PageSource`] one page per `advance` call,
//! tracking an optional item budget and the positions already visited.

use super::types::{Continuation, CursorState, Listing, PageSource, Step};
use crate::error::{Error, Result};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Stateful iterator over the pages of one resource
pub struct Cursor<S: PageSource> {
    source: S,
    position: S::Position,
    page_size: usize,
    remaining: Option<usize>,
    items: Vec<S::Item>,
    state: CursorState,
    seen: HashSet<S::Position>,
    pages_fetched: usize,
}

impl<S: PageSource> Cursor<S> {
    /// Create a cursor starting at `start`
    ///
    /// `limit` is the total item budget; `None` means unbounded. A zero
    /// `page_size` is treated as one.
    pub fn new(source: S, start: S::Position, page_size: usize, limit: Option<usize>) -> Self {
        let mut seen = HashSet::new();
        seen.insert(start.clone());
        Self {
            source,
            position: start,
            page_size: page_size.max(1),
            remaining: limit,
            items: Vec::new(),
            state: CursorState::Pending,
            seen,
            pages_fetched: 0,
        }
    }

    /// Fetch the next page, replacing the current items
    pub async fn advance(&mut self) -> Result<Step> {
        if self.state.is_terminal() {
            return Ok(Step::Complete);
        }

        let size = match self.remaining {
            Some(0) => {
                self.state = CursorState::Done;
                return Ok(Step::Complete);
            }
            Some(remaining) => self.page_size.min(remaining),
            None => self.page_size,
        };

        debug!(
            "Fetching page {} at {:?} (size {size})",
            self.pages_fetched + 1,
            self.position
        );

        let page = match self.source.fetch_page(&self.position, size).await {
            Ok(page) => page,
            Err(e) => {
                self.state = CursorState::Failed;
                return Err(e);
            }
        };

        if let Continuation::More(next) = &page.next {
            if !self.seen.insert(next.clone()) {
                self.state = CursorState::Failed;
                return Err(Error::pagination(format!(
                    "server repeated position {next:?}"
                )));
            }
        }

        self.pages_fetched += 1;
        let count = page.items.len();
        self.items = page.items;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(count);
        }

        match page.next {
            Continuation::Done => self.state = CursorState::Done,
            Continuation::More(next) => {
                self.position = next;
                self.state = if self.remaining == Some(0) {
                    CursorState::Done
                } else {
                    CursorState::Active
                };
            }
        }

        Ok(Step::Fetched(count))
    }

    /// Whether no further pages will be fetched
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Items of the most recent page
    pub fn items(&self) -> &[S::Item] {
        &self.items
    }

    /// Move the most recent page's items out of the cursor
    pub fn take_items(&mut self) -> Vec<S::Item> {
        std::mem::take(&mut self.items)
    }

    /// Current state
    pub fn state(&self) -> CursorState {
        self.state
    }

    /// Position the next fetch would start from
    pub fn position(&self) -> &S::Position {
        &self.position
    }

    /// Remaining item budget
    pub fn remaining(&self) -> Option<usize> {
        self.remaining
    }

    /// Number of successful fetches so far
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// The underlying page source
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: PageSource> std::fmt::Debug for Cursor<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("position", &self.position)
            .field("page_size", &self.page_size)
            .field("remaining", &self.remaining)
            .field("state", &self.state)
            .field("pages_fetched", &self.pages_fetched)
            .finish_non_exhaustive()
    }
}

/// Advance `cursor` until it is terminal, concatenating every page
pub async fn collect_all<S: PageSource>(cursor: &mut Cursor<S>) -> Listing<S::Item> {
    let mut items = Vec::new();
    loop {
        match cursor.advance().await {
            Ok(Step::Fetched(_)) => items.extend(cursor.take_items()),
            Ok(Step::Complete) => {
                return Listing { items, error: None };
            }
            Err(error) => {
                warn!(
                    "Listing stopped after {} pages with {} items: {error}",
                    cursor.pages_fetched(),
                    items.len()
                );
                return Listing {
                    items,
                    error: Some(error),
                };
            }
        }
    }
}
