//! Output reporters
//!
//! The scoring result is one JSON value on stdout: an array of records in
//! batch mode, a single object in single-record mode, or an error object.

pub mod json;
