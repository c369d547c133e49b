use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use rayon::prelude::*;

use crate::SrcmapError;
use crate::SrcmapResult;
use crate::fingerprint::scan_groups;
use crate::markers::MarkerSet;
use crate::scanner::assign_tokens;
use crate::scanner::is_binary;
use crate::scanner::scan_singles;
use crate::source::FileSource;
use crate::source::FileStore;

/// File extensions that are never scanned: binary-adjacent formats the
/// line scanner would only waste time on.
const IGNORE_EXTENSIONS: &[&str] = &[
	".csv", ".jpeg", ".jpg", ".otf", ".png", ".ttf", ".webp", ".woff", ".woff2",
];

/// One occurrence of an assigned single marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenLocation {
	pub file: PathBuf,
	/// 1-based target line, after the comment-only offset heuristic.
	pub line: usize,
	/// Whether documentation references link to the whole file instead of a
	/// specific line.
	pub link_to_file: bool,
}

/// One group block occurrence: its boundaries and fingerprints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGroupInfo {
	pub token: String,
	pub source: FileSource,
	/// 1-based line of the start marker.
	pub start_line: usize,
	/// 1-based line of the end marker (exclusive block boundary).
	pub end_line: usize,
	/// Hex digest of the block's current content.
	pub actual_hash: String,
	/// Hash embedded in the end marker, empty when absent.
	pub expected_hash: String,
}

impl TokenGroupInfo {
	/// Whether the block's content no longer matches its acknowledged hash.
	pub fn has_drifted(&self) -> bool {
		self.actual_hash != self.expected_hash
	}
}

/// The run-scoped aggregate built by scanning every candidate file.
///
/// Constructed once per run by [`build_inventory`], mutated behind a single
/// lock while scan workers merge their per-file results, and read-only
/// afterward. Group lists come out sorted by (file path, start line) so all
/// downstream output is reproducible.
#[derive(Debug, Default)]
pub struct Inventory {
	/// Locations of every assigned single marker, keyed by token.
	pub singles: HashMap<String, Vec<TokenLocation>>,
	/// Group block occurrences, keyed by token.
	pub groups: HashMap<String, Vec<TokenGroupInfo>>,
	/// Documentation files discovered during the scan.
	pub doc_files: Vec<FileSource>,
	/// Tokens generated and persisted during this scan, as (file, token).
	pub assigned: Vec<(PathBuf, String)>,
}

impl Inventory {
	/// Cross-file invariant checks, run after aggregation completes. Every
	/// violation in the run is collected before reporting so the caller sees
	/// all offending locations at once.
	pub fn check_invariants(&self) -> SrcmapResult<()> {
		let mut duplicates = Vec::new();
		for (token, locations) in &self.singles {
			if locations.len() > 1 {
				let mut sorted = locations.clone();
				sorted.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
				let mut message = format!("duplicate token `{token}` at:");
				for location in &sorted {
					message.push_str(&format!(
						"\n   {}:{}",
						location.file.display(),
						location.line
					));
				}
				duplicates.push((token.clone(), message));
			}
		}

		if !duplicates.is_empty() {
			duplicates.sort();
			let report = duplicates
				.into_iter()
				.map(|(_, message)| message)
				.collect::<Vec<_>>()
				.join("\n");
			return Err(SrcmapError::DuplicateTokens(report));
		}

		let mut collisions: Vec<&String> = self
			.singles
			.keys()
			.filter(|token| self.groups.contains_key(*token))
			.collect();

		if !collisions.is_empty() {
			collisions.sort();
			let report = collisions
				.into_iter()
				.map(|token| format!("   `{token}`"))
				.collect::<Vec<_>>()
				.join("\n");
			return Err(SrcmapError::TokenKindCollision(report));
		}

		Ok(())
	}

	fn merge(&mut self, scan: FileScan, source: &FileSource) {
		for (token, location) in scan.singles {
			self.singles.entry(token).or_default().push(location);
		}
		for info in scan.groups {
			self.groups.entry(info.token.clone()).or_default().push(info);
		}
		for token in scan.assigned {
			self.assigned.push((source.path.clone(), token));
		}
		if scan.is_doc {
			self.doc_files.push(source.clone());
		}
	}

	fn sort_groups(&mut self) {
		for infos in self.groups.values_mut() {
			infos.sort_by(|a, b| {
				a.source
					.path
					.cmp(&b.source.path)
					.then(a.start_line.cmp(&b.start_line))
			});
		}
		self.doc_files.sort_by(|a, b| a.path.cmp(&b.path));
		self.assigned.sort();
	}
}

/// Per-file scan results, produced without holding the inventory lock.
struct FileScan {
	singles: Vec<(String, TokenLocation)>,
	groups: Vec<TokenGroupInfo>,
	assigned: Vec<String>,
	is_doc: bool,
}

/// Scan every candidate file and merge the results into one [`Inventory`].
///
/// Files fan out across rayon's pool (sized to available parallelism); the
/// first error stops dispatch of further files while in-flight scans finish.
/// Scanning is lock-free local work; the shared lock is held only for the
/// merge append. When `assign` is set, unassigned markers in working-tree
/// files are given fresh tokens and persisted before location scanning, so
/// new tokens are inventoried in the same pass.
pub fn build_inventory(
	markers: &MarkerSet,
	store: &dyn FileStore,
	sources: &[FileSource],
	assign: bool,
) -> SrcmapResult<Inventory> {
	let shared = Mutex::new(Inventory::default());

	sources.par_iter().try_for_each(|source| {
		let Some(scan) = scan_file(markers, store, source, assign)? else {
			return Ok::<(), SrcmapError>(());
		};

		let mut inventory = shared.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
		inventory.merge(scan, source);
		Ok(())
	})?;

	let mut inventory = shared
		.into_inner()
		.unwrap_or_else(std::sync::PoisonError::into_inner);
	inventory.sort_groups();
	Ok(inventory)
}

fn scan_file(
	markers: &MarkerSet,
	store: &dyn FileStore,
	source: &FileSource,
	assign: bool,
) -> SrcmapResult<Option<FileScan>> {
	if is_denied_extension(&source.path) {
		return Ok(None);
	}

	let mut bytes = store.read(source)?;

	if is_binary(&bytes) {
		tracing::debug!(path = %source.path.display(), "skipping binary file");
		return Ok(None);
	}

	// Assign tokens before location scanning so fresh tokens land in the
	// same inventory. Snapshot-sourced files are never mutated.
	let mut new_tokens = Vec::new();
	if assign && !source.from_index {
		let (rewritten, tokens) = assign_tokens(markers, &bytes);
		if !tokens.is_empty() {
			for token in &tokens {
				tracing::info!(
					token = token.as_str(),
					path = %source.path.display(),
					"assigned new token"
				);
			}
			store.write(&source.path, &rewritten)?;
			bytes = rewritten;
			new_tokens = tokens;
		}
	}

	let groups = scan_groups(markers, source, &bytes)?;
	let singles = scan_singles(markers, &source.path, &bytes);
	let is_doc = source
		.path
		.extension()
		.is_some_and(|ext| ext.eq_ignore_ascii_case("md"));

	Ok(Some(FileScan {
		singles,
		groups,
		assigned: new_tokens,
		is_doc,
	}))
}

fn is_denied_extension(path: &std::path::Path) -> bool {
	let name = path.to_string_lossy();
	IGNORE_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
}
