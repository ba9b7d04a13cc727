#![forbid(unsafe_code)]

//! `coordinator` edits the `{{Coord}}` template of a wiki page through its Parsoid HTML.
//!
//! The engine lives in `coordinator-core` and is re-exported here unchanged.
//!
//! # Features
//!
//! - `fs` (default): file-backed collaborators (`coordinator::fs`) for offline editing of HTML
//!   snapshots

pub use coordinator_core::*;

#[cfg(feature = "fs")]
pub mod fs;
