//! `srcmap_core` is the inventory-and-reconciliation engine behind the
//! [srcmap](https://github.com/srcmap/srcmap) tool. It keeps bidirectional
//! cross-references between source code locations and documentation files
//! consistent: source files carry inline markers bound to opaque tokens,
//! and documentation references to a token are rewritten to the token's
//! current file and line.
//!
//! ## Processing pipeline
//!
//! ```text
//! FileSource list
//!   → Inventory aggregator (bounded-concurrency scan of every file)
//!       → Single-token scanner (assigns tokens, records locations)
//!       → Group fingerprinter (pairs boundaries, hashes block content)
//!   → Cross-file invariant checks (duplicates, single/group collisions)
//!   → Documentation rewriter (link resolution + group template rendering)
//!   → Run report (unused tokens, group drift) or drift acknowledgement
//! ```
//!
//! ## Modules
//!
//! - [`markers`] — the marker grammar: compiled byte patterns for source
//!   markers, group boundaries, and documentation references.
//! - [`source`] — the [`FileSource`]/[`FileStore`] seam separating the
//!   engine from file enumeration and version-control snapshots.
//!
//! ## Key types
//!
//! - [`Inventory`] — the run-scoped aggregate of token locations and group
//!   blocks, built once per run and read-only afterward.
//! - [`RunOptions`] / [`RunReport`] — a reconciliation run's configuration
//!   and structured outcome.
//! - [`SrcmapError`] — the error taxonomy: structural violations are fatal
//!   per file, reference violations are collected across the run.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use srcmap_core::{FileSource, MarkerSet, RunOptions, WorkingTree, reconcile};
//!
//! let sources = vec![
//! 	FileSource::working_tree("src/main.rs"),
//! 	FileSource::working_tree("readme.md"),
//! ];
//!
//! let report = reconcile(
//! 	MarkerSet::default_set(),
//! 	&WorkingTree,
//! 	&sources,
//! 	RunOptions::default(),
//! )
//! .unwrap();
//!
//! if !report.is_ok() {
//! 	eprintln!("{}", report.failure_report().unwrap_or_default());
//! }
//! ```

pub use docs::*;
pub use engine::*;
pub use error::*;
pub use fingerprint::*;
pub use inventory::*;
pub use markers::*;
pub use scanner::*;
pub use source::*;
pub use token::*;

mod docs;
mod engine;
mod error;
mod fingerprint;
mod inventory;
pub mod markers;
mod scanner;
pub mod source;
mod token;
