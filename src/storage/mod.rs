//! Storage module for persisting quotes
//!
//! Quotes are stored as plain text files, one per quote, in a directory per
//! feed. There is no index: the file name alone identifies the quote.

mod sink;

pub use sink::{record_file_name, RecordSink};
