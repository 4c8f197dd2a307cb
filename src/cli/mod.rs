//! CLI operation mode handlers.
//!
//! - [`collect`]: Collect activity and write it as JSONL
//! - [`validate`]: Check that the organisation exists

pub mod collect;
mod output;
pub mod validate;
