//! Capability algebras for notion2html.
//!
//! Traits here describe **capabilities**, not implementations. Each is
//! object-safe, async via `async_trait`, and documents the laws its
//! implementations must satisfy; the laws are checked in the module tests.
//!
//! - [`VisitTracker`]: visited-set guard for the recursive tree walker

pub mod state;

pub use state::{PageVisitLedger, VisitTracker};
