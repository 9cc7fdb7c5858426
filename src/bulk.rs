//! Paginated and chunked catalog retrieval.
//!
//! Every helper issues exactly one catalog call per page or chunk, in order,
//! and stops at the first error. There is no caching and no retry.

use crate::catalog::{CatalogError, Page};
use crate::outcome::CurationError;
use log::{debug, trace};
use rayon::prelude::*;

/// Page size used when walking paginated listings.
pub const PAGE_SIZE: usize = 50;

/// Walk a paginated listing from offset 0 until a page reports no more items.
///
/// `fetch_page` receives `(offset, limit)`; the offset advances by `page_size`
/// after each page regardless of how many items the page held.
pub fn paginate<T, F>(page_size: usize, mut fetch_page: F) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(usize, usize) -> Result<Page<T>, CatalogError>,
{
    let page_size = page_size.max(1);
    let mut items = Vec::new();
    let mut offset = 0;

    loop {
        let page = fetch_page(offset, page_size)?;
        trace!("Fetched page at offset {offset} with {} items", page.items.len());
        // An empty page ends the listing even if it claims more follow.
        let done = !page.has_more || page.items.is_empty();
        items.extend(page.items);
        if done {
            break;
        }
        offset += page_size;
    }

    debug!("Paginated {} items", items.len());
    Ok(items)
}

/// Look up `ids` in chunks of at most `chunk_size`, concatenating responses
/// in chunk order.
pub fn batch<T, F>(ids: &[String], chunk_size: usize, mut fetch_many: F) -> Result<Vec<T>, CatalogError>
where
    F: FnMut(&[String]) -> Result<Vec<T>, CatalogError>,
{
    let mut items = Vec::with_capacity(ids.len());
    for chunk in ids.chunks(chunk_size.max(1)) {
        items.extend(fetch_many(chunk)?);
    }
    Ok(items)
}

/// Call `apply` once per chunk of at most `chunk_size` ids.
pub fn for_each_chunk<F>(ids: &[String], chunk_size: usize, apply: F) -> Result<(), CatalogError>
where
    F: FnMut(&[String]) -> Result<(), CatalogError>,
{
    ids.chunks(chunk_size.max(1)).try_for_each(apply)
}

/// Bounded pool for independent per-item catalog calls.
///
/// Results always come back in input order, so callers see the same
/// sequence a sequential loop would have produced.
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    pub fn new(fan_out: usize) -> Result<Self, CurationError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(fan_out.max(1))
            .thread_name(|i| format!("curator-fetch-{i}"))
            .build()
            .map_err(|e| CurationError::WorkerPool(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn fan_out(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item on the pool, returning results in input order.
    pub fn map_ordered<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        self.pool.install(|| items.par_iter().map(|item| f(item)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("id-{i}")).collect()
    }

    #[test]
    fn test_paginate_accumulates_in_call_order() {
        let calls = RefCell::new(Vec::new());
        let items = paginate(2, |offset, limit| {
            calls.borrow_mut().push((offset, limit));
            let all = [1, 2, 3, 4, 5];
            let end = (offset + limit).min(all.len());
            Ok(Page {
                items: all[offset..end].to_vec(),
                has_more: end < all.len(),
            })
        })
        .unwrap();

        assert_eq!(items, vec![1, 2, 3, 4, 5]);
        assert_eq!(calls.into_inner(), vec![(0, 2), (2, 2), (4, 2)]);
    }

    #[test]
    fn test_paginate_stops_on_empty_page() {
        let mut calls = 0;
        let items: Vec<u8> = paginate(10, |offset, _| {
            calls += 1;
            let items = if offset == 0 { vec![1, 2] } else { Vec::new() };
            Ok(Page { items, has_more: true })
        })
        .unwrap();

        assert_eq!(items, vec![1, 2]);
        assert_eq!(calls, 2);
    }

    #[test]
    fn test_paginate_propagates_failure() {
        let result: Result<Vec<u8>, _> = paginate(10, |offset, _| {
            if offset == 0 {
                Ok(Page { items: vec![1], has_more: true })
            } else {
                Err(CatalogError::Unavailable("down".into()))
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_batch_respects_chunk_ceiling() {
        let input = ids(120);
        let mut sizes = Vec::new();
        let out = batch(&input, 50, |chunk| {
            sizes.push(chunk.len());
            Ok(chunk.to_vec())
        })
        .unwrap();

        assert_eq!(sizes, vec![50, 50, 20]);
        assert_eq!(out, input);
    }

    #[test]
    fn test_batch_on_empty_input_makes_no_calls() {
        let mut called = false;
        let out: Vec<String> = batch(&[], 50, |_| {
            called = true;
            Ok(Vec::new())
        })
        .unwrap();
        assert!(out.is_empty());
        assert!(!called);
    }

    #[test]
    fn test_for_each_chunk_stops_on_error() {
        let input = ids(250);
        let mut seen = 0;
        let result = for_each_chunk(&input, 100, |chunk| {
            seen += 1;
            if chunk.len() == 50 {
                Err(CatalogError::Unavailable("full".into()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_worker_pool_preserves_order() {
        let pool = WorkerPool::new(4).unwrap();
        let input: Vec<u32> = (0..200).collect();
        let out = pool.map_ordered(&input, |n| n * 2);
        assert_eq!(out, input.iter().map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(pool.fan_out(), 4);
    }
}
