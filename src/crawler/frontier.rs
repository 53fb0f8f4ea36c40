//! Crawl frontier
//!
//! The frontier owns the discovery queue plus the two membership sets that
//! enforce at-most-once scheduling:
//! - `pending`: queued, not yet popped
//! - `visited`: popped for processing (terminal)
//!
//! A URL moves `unseen -> pending -> visited` and never regresses. Every
//! mutation goes through `&mut self`, so only the single-threaded wave setup
//! and result integration phases of the crawl loop can touch it.

use crate::crawler::types::QueueItem;
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Discovery queue with dedup bookkeeping
#[derive(Debug)]
pub struct Frontier {
    visited: HashSet<String>,
    pending: HashSet<String>,
    queue: VecDeque<QueueItem>,
    max_depth: u32,
}

impl Frontier {
    /// Creates an empty frontier that drops items deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            visited: HashSet::new(),
            pending: HashSet::new(),
            queue: VecDeque::new(),
            max_depth,
        }
    }

    /// Enqueues a normalized URL at `depth`
    ///
    /// Returns `false` (and changes nothing) when the URL is already pending or
    /// visited, or when `depth` exceeds the depth bound.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::trace!("Dropping {} at depth {} (max {})", url, depth, self.max_depth);
            return false;
        }

        let key = url.as_str();
        if self.visited.contains(key) || self.pending.contains(key) {
            return false;
        }

        self.pending.insert(key.to_string());
        self.queue.push_back(QueueItem::new(url, depth));
        true
    }

    /// Pops the next wave of at most `limit` items
    ///
    /// Every popped item leaves `pending`. Items that are already visited,
    /// deeper than the depth bound, or rejected by `eligible` are discarded
    /// without taking a slot; the rest are marked visited before they are
    /// returned, so no URL can be dispatched twice.
    pub fn next_batch<F>(&mut self, limit: usize, mut eligible: F) -> Vec<QueueItem>
    where
        F: FnMut(&QueueItem) -> bool,
    {
        let mut batch = Vec::with_capacity(limit.min(self.queue.len()));

        while batch.len() < limit {
            let Some(item) = self.queue.pop_front() else {
                break;
            };
            let key = item.url.as_str();
            self.pending.remove(key);

            if self.visited.contains(key) {
                tracing::trace!("Discarding duplicate {}", key);
                continue;
            }
            if item.depth > self.max_depth {
                continue;
            }
            if !eligible(&item) {
                tracing::debug!("Skipping {} (filtered)", key);
                continue;
            }

            self.visited.insert(key.to_string());
            batch.push(item);
        }

        batch
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of queued items
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Number of distinct URLs ever accepted into the frontier
    pub fn discovered_count(&self) -> usize {
        self.visited.len() + self.pending.len()
    }

    pub fn is_visited(&self, url: &Url) -> bool {
        self.visited.contains(url.as_str())
    }

    pub fn is_pending(&self, url: &Url) -> bool {
        self.pending.contains(url.as_str())
    }
}
