//! # A-XDR Typed Value Parsing
//!
//! A reassembled APDU is an A-XDR encoded COSEM DataNotification: a
//! long-invoke-and-priority id, a date-time, and a nested
//! structure/array tree of scalar values. This module scans the APDU
//! left-to-right into a flat, bounded list of typed values.
//!
//! Rather than reconstructing the tree, the parser keeps two small counter
//! stacks (structure field counts and array element counts) and annotates
//! every scalar with the counter values at the moment it was parsed.
//! Downstream extractors use those annotations to recognize positional
//! fields inside the capability descriptors without walking a tree.

pub mod parser;
pub mod value;

pub use parser::{DataNotification, ParserStats};
pub use value::{DlmsDateTime, TypedValue, Value};
