//! Visit tracking for recursive traversal.
//!
//! One tracker is created per top-level page fetch and dropped afterwards.
//! Blocks and child pages share its id namespace, so a child page reached
//! twice through different links is fetched once.

use crate::types::NotionId;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;

/// Visit tracking capability for preventing cycles during recursive traversal.
///
/// # Laws
///
/// - **L1 (Idempotency)**: Visiting the same ID twice returns `false` on the second visit.
///   ```text
///   visit(id) == true
///   visit(id) == false
///   ```
///
/// - **L2 (Is-Visited Consistency)**: after `visit(id)`, `is_visited(id)` is true.
///
/// - **L3 (Persistence)**: Once visited, an ID remains visited.
///
/// This trait is **object-safe** and can be used as `dyn VisitTracker`.
#[async_trait]
pub trait VisitTracker: Send + Sync {
    /// Mark an ID as visited and return whether this was the first visit.
    async fn visit(&self, id: &NotionId) -> bool;

    /// Check if an ID has been visited without marking it.
    async fn is_visited(&self, id: &NotionId) -> bool;
}

/// In-memory visited set scoped to one top-level page.
#[derive(Debug, Default)]
pub struct PageVisitLedger {
    visited: Mutex<HashSet<NotionId>>,
}

impl PageVisitLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VisitTracker for PageVisitLedger {
    async fn visit(&self, id: &NotionId) -> bool {
        self.visited.lock().insert(id.clone())
    }

    async fn is_visited(&self, id: &NotionId) -> bool {
        self.visited.lock().contains(id)
    }
}
