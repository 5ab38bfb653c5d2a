//! Ingestion module for tallydb
//! Handles caller-entered text and caller classification ahead of the store.

pub mod access;
pub mod parser;

pub use access::{classify, Role, Roster, StaticRoster};
pub use parser::{parse_range_text, parse_value, ParseError};
