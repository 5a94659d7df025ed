//! Cursor-based traversal: scans, pagination, counts and range deletes.

use crate::error::{ClientError, ClientResult};
use crate::range::build_range;
use serde_json::Value;
use tracing::debug;
use vaultkv_engine::{Connection, Direction, Key, ReadyState, TxMode};

/// Predicate applied to candidate records during traversal.
pub type RecordPredicate = dyn Fn(&Value) -> bool + Send + Sync;

/// One page of a paginated scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Total matching records: the index cardinality over the range, or
    /// the filter-matching count when a filter was given.
    pub total: u64,
    /// The records whose position falls inside the requested page.
    pub list: Vec<Value>,
}

/// Scans the named index, fully materializing every matching record.
///
/// See [`build_range`] for the (deliberately inverted) meaning of
/// `start` and `end`.
///
/// # Errors
///
/// Surfaces engine errors as [`ClientError::TransactionFailed`].
pub fn find(
    conn: &dyn Connection,
    store: &str,
    index: &str,
    start: Option<Key>,
    end: Option<Key>,
    direction: Direction,
    filter: Option<&RecordPredicate>,
) -> ClientResult<Vec<Value>> {
    let range = build_range(start, end);
    let tx = conn.transaction(&[store], TxMode::ReadOnly)?;
    let mut cursor = tx.open_cursor(store, Some(index), &range, direction)?;
    let mut result = Vec::new();
    while let Some(entry) = cursor.next_entry()? {
        if filter.map_or(true, |keep| keep(&entry.value)) {
            result.push(entry.value);
        }
    }
    Ok(result)
}

/// Scans one page of the named index.
///
/// `page` is 1-based. Both `page` and `page_size` must be at least 1;
/// anything else is rejected before the engine is touched.
///
/// Without a filter the index is counted first and a page past the end
/// resolves early with an empty list and the true total - the cursor
/// scan never starts, so there is exactly one resolution. With a filter
/// no pre-count is possible: every candidate is scanned, `total` counts
/// only filter-matching records, and the window applies to their
/// running matched position.
///
/// # Errors
///
/// Returns [`ClientError::InvalidArgument`] for out-of-range pagination
/// parameters, engine errors otherwise.
pub fn find_page(
    conn: &dyn Connection,
    store: &str,
    index: &str,
    start: Option<Key>,
    end: Option<Key>,
    direction: Direction,
    page: u64,
    page_size: u64,
    filter: Option<&RecordPredicate>,
) -> ClientResult<Page> {
    if page < 1 || page_size < 1 {
        return Err(ClientError::invalid_argument(
            "page and page_size must be greater than 0",
        ));
    }
    let (Some(skip), Some(until)) = (
        page_size.checked_mul(page - 1),
        page_size.checked_mul(page),
    ) else {
        return Err(ClientError::invalid_argument(
            "page times page_size exceeds the representable range",
        ));
    };
    let range = build_range(start, end);
    let tx = conn.transaction(&[store], TxMode::ReadOnly)?;

    match filter {
        None => {
            let total = tx.count(store, Some(index), &range)?;
            if total <= skip {
                debug!(store, index, page, "page is past the end, skipping scan");
                return Ok(Page {
                    total,
                    list: Vec::new(),
                });
            }
            let mut cursor = tx.open_cursor(store, Some(index), &range, direction)?;
            let mut position = 0u64;
            let mut list = Vec::new();
            while let Some(entry) = cursor.next_entry()? {
                position += 1;
                if position > skip {
                    list.push(entry.value);
                }
                if position >= until {
                    break;
                }
            }
            Ok(Page { total, list })
        }
        Some(keep) => {
            let mut cursor = tx.open_cursor(store, Some(index), &range, direction)?;
            let mut matched = 0u64;
            let mut list = Vec::new();
            while let Some(entry) = cursor.next_entry()? {
                if keep(&entry.value) {
                    matched += 1;
                    if matched > skip && matched <= until {
                        list.push(entry.value);
                    }
                }
            }
            Ok(Page {
                total: matched,
                list,
            })
        }
    }
}

/// Counts records over the named index, or the primary key space when no
/// index is given, restricted to the built range.
///
/// # Errors
///
/// Surfaces engine errors as [`ClientError::TransactionFailed`].
pub fn count(
    conn: &dyn Connection,
    store: &str,
    index: Option<&str>,
    start: Option<Key>,
    end: Option<Key>,
) -> ClientResult<u64> {
    let range = build_range(start, end);
    let tx = conn.transaction(&[store], TxMode::ReadOnly)?;
    Ok(tx.count(store, index, &range)?)
}

/// Deletes records in a range, optionally via an index and filter.
///
/// With an index or a filter the traversal is cursor-driven and each
/// matching record is deleted under the cursor; otherwise the engine's
/// range delete (or full clear for an unbounded range) runs directly.
///
/// # Errors
///
/// Surfaces engine errors as [`ClientError::TransactionFailed`].
pub fn delete_in(
    conn: &dyn Connection,
    store: &str,
    index: Option<&str>,
    start: Option<Key>,
    end: Option<Key>,
    filter: Option<&RecordPredicate>,
) -> ClientResult<ReadyState> {
    let range = build_range(start, end);
    let mut tx = conn.transaction(&[store], TxMode::ReadWrite)?;

    if index.is_none() && filter.is_none() {
        if range.is_unbounded() {
            tx.clear(store)?;
        } else {
            tx.delete_range(store, &range)?;
        }
        return Ok(ReadyState::Done);
    }

    let mut cursor = tx.open_cursor(store, index, &range, Direction::Next)?;
    while let Some(entry) = cursor.next_entry()? {
        if filter.map_or(true, |keep| keep(&entry.value)) {
            cursor.delete_current()?;
        }
    }
    Ok(ReadyState::Done)
}
