//! Pagination types and traits
//!
//! Defines the core pagination abstractions used by every paged resource.

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::fmt::Debug;
use std::hash::Hash;

/// Where the next page starts, as reported by the last fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation<P> {
    /// More pages available starting at this position
    More(P),
    /// No more pages
    Done,
}

impl<P> Continuation<P> {
    /// Check if this is a done result
    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Check if more pages follow
    pub fn is_more(&self) -> bool {
        matches!(self, Self::More(_))
    }
}

/// One fetched page
#[derive(Debug, Clone)]
pub struct Page<T, P> {
    /// Items of this page, in server order
    pub items: Vec<T>,
    /// Position of the following page
    pub next: Continuation<P>,
}

impl<T, P> Page<T, P> {
    /// Page followed by more pages at `next`
    pub fn more(items: Vec<T>, next: P) -> Self {
        Self {
            items,
            next: Continuation::More(next),
        }
    }

    /// Last page
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next: Continuation::Done,
        }
    }
}

/// Fetches one page of a resource
///
/// Implementations hold their own filters and re-send them unchanged on
/// every call; only `position` and `page_size` vary between calls.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Element type of a page
    type Item: Send;

    /// Position token (page index, opaque cursor, optional token)
    type Position: Clone + Eq + Hash + Debug + Send + Sync;

    /// Fetch the page at `position` holding at most `page_size` items
    async fn fetch_page(
        &self,
        position: &Self::Position,
        page_size: usize,
    ) -> Result<Page<Self::Item, Self::Position>>;
}

/// Lifecycle of a cursor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// Nothing fetched yet
    #[default]
    Pending,
    /// At least one page fetched and more may follow
    Active,
    /// No further pages
    Done,
    /// A fetch failed; no further pages
    Failed,
}

impl CursorState {
    /// `Done` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

/// Outcome of a successful `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// A page was fetched holding this many items
    Fetched(usize),
    /// The cursor is terminal; nothing was fetched
    Complete,
}

/// Items gathered by walking a cursor to the end
///
/// A failure part-way through keeps the earlier items next to the error.
#[derive(Debug)]
pub struct Listing<T> {
    /// Items of every fetched page, in order
    pub items: Vec<T>,
    /// First error, if the walk stopped early
    pub error: Option<Error>,
}

impl<T> Listing<T> {
    /// Whether every page was fetched
    pub fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Convert to a result, dropping partial items on error
    pub fn into_result(self) -> Result<Vec<T>> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.items),
        }
    }

    /// Transform every item
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Listing<U> {
        Listing {
            items: self.items.into_iter().map(f).collect(),
            error: self.error,
        }
    }
}
