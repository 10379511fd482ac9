//! State module for tracking crawl progress between runs
//!
//! # Components
//!
//! - `Cursor`: the newest quote id already saved for a feed
//! - `IdOrdering`: how quote ids are compared against cursors
//! - `CrawlState`: both cursors, persisted as a JSON file

mod crawl_state;
mod cursor;

// Re-export main types
pub use crawl_state::{CrawlState, StateError};
pub use cursor::{Cursor, IdOrdering};
