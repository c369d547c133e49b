use std::collections::HashMap;
use std::collections::HashSet;
use std::path::PathBuf;

use crate::SrcmapError;
use crate::SrcmapResult;
use crate::docs::StaleGroup;
use crate::docs::StaleLink;
use crate::docs::rewrite_doc;
use crate::fingerprint::acknowledge_file;
use crate::inventory::Inventory;
use crate::inventory::TokenGroupInfo;
use crate::inventory::TokenLocation;
use crate::inventory::build_inventory;
use crate::markers::MarkerSet;
use crate::source::FileSource;
use crate::source::FileStore;

/// Options controlling one reconciliation run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
	/// Report discrepancies without writing any file.
	pub check_only: bool,
	/// Accept current group drift as the new baseline by patching embedded
	/// hashes. Mutually exclusive with `check_only`.
	pub ack_groups: bool,
	/// Promote unused-token warnings to a run failure.
	pub fail_unused: bool,
}

/// A single token never touched by any documentation reference.
#[derive(Debug, Clone)]
pub struct UnusedToken {
	pub token: String,
	pub location: TokenLocation,
}

/// One block of a drifted group, for reporting.
#[derive(Debug, Clone)]
pub struct DriftMember {
	pub path: PathBuf,
	pub start_line: usize,
	pub end_line: usize,
	/// Whether this block's content hash differs from its acknowledged hash.
	pub changed: bool,
}

/// A group with at least one drifted block. Members are listed in sorted
/// order with per-member changed flags so reports can mark exactly which
/// blocks moved.
#[derive(Debug, Clone)]
pub struct DriftGroup {
	pub token: String,
	pub members: Vec<DriftMember>,
}

/// The structured outcome of a reconciliation run.
///
/// Fatal conditions (structural errors, duplicate tokens, broken references,
/// I/O failures) surface as errors from [`reconcile`]; everything the run
/// merely has to report lands here. Callers decide how to present it and
/// whether [`RunReport::is_ok`] maps to a process exit code.
#[derive(Debug, Default)]
pub struct RunReport {
	pub scanned_files: usize,
	/// Tokens generated during the scan, as (file, token).
	pub new_tokens: Vec<(PathBuf, String)>,
	pub updated_docs: usize,
	pub updated_links: usize,
	pub rendered_groups: usize,
	/// Check-mode link discrepancies.
	pub stale_links: Vec<StaleLink>,
	/// Check-mode group-reference body discrepancies.
	pub stale_groups: Vec<StaleGroup>,
	pub unused: Vec<UnusedToken>,
	/// Whether unused tokens fail the run (strict mode).
	pub fail_unused: bool,
	/// Drifted groups pending acknowledgement. Empty in ack mode.
	pub drift: Vec<DriftGroup>,
	/// Files patched with fresh hashes in ack mode.
	pub acked_files: usize,
}

impl RunReport {
	/// Whether the run succeeded.
	pub fn is_ok(&self) -> bool {
		self.stale_links.is_empty()
			&& self.stale_groups.is_empty()
			&& self.drift.is_empty()
			&& (self.unused.is_empty() || !self.fail_unused)
	}

	/// Aggregate every failing condition into one human-readable report, or
	/// `None` when the run succeeded.
	pub fn failure_report(&self) -> Option<String> {
		if self.is_ok() {
			return None;
		}

		let mut sections = Vec::new();

		if !self.stale_links.is_empty() || !self.stale_groups.is_empty() {
			let mut lines = vec!["stale documentation:".to_string()];
			for stale in &self.stale_links {
				lines.push(format!(
					"   incorrect link at {}:{} token `{}`",
					stale.path.display(),
					stale.line,
					stale.token
				));
			}
			for stale in &self.stale_groups {
				lines.push(format!(
					"   out-of-date group block at {}:{} token `{}`",
					stale.path.display(),
					stale.line,
					stale.token
				));
			}
			sections.push(lines.join("\n"));
		}

		for group in &self.drift {
			let mut lines = vec![format!(
				"group `{}` has changes (indicated with *):",
				group.token
			)];
			for member in &group.members {
				let indicator = if member.changed { "*" } else { " " };
				lines.push(format!(
					"   {}  {}:{} (lines {}-{})",
					indicator,
					member.path.display(),
					member.start_line,
					member.start_line + 1,
					member.end_line - 1,
				));
			}
			sections.push(lines.join("\n"));
		}

		if self.fail_unused && !self.unused.is_empty() {
			let mut lines = vec!["unused tokens:".to_string()];
			for unused in &self.unused {
				lines.push(format!(
					"   {} at {}:{}",
					unused.token,
					unused.location.file.display(),
					unused.location.line
				));
			}
			sections.push(lines.join("\n"));
		}

		Some(sections.join("\n"))
	}
}

/// Run the full reconciliation pipeline:
/// scan -> invariant checks -> documentation rewrite -> unused-token
/// collection -> group drift report or acknowledgement.
pub fn reconcile(
	markers: &MarkerSet,
	store: &dyn FileStore,
	sources: &[FileSource],
	options: RunOptions,
) -> SrcmapResult<RunReport> {
	let inventory = build_inventory(markers, store, sources, !options.check_only)?;
	inventory.check_invariants()?;

	let mut report = RunReport {
		scanned_files: sources.len(),
		new_tokens: inventory.assigned.clone(),
		fail_unused: options.fail_unused,
		..RunReport::default()
	};

	let mut used_tokens: HashSet<String> = HashSet::new();
	let mut missing = Vec::new();

	for doc in &inventory.doc_files {
		let bytes = store.read(doc)?;
		let outcome = rewrite_doc(markers, &inventory, doc, &bytes, options.check_only)?;

		used_tokens.extend(outcome.used_tokens);
		missing.extend(outcome.missing);
		report.stale_links.extend(outcome.stale_links);
		report.stale_groups.extend(outcome.stale_groups);
		report.updated_links += outcome.updated_links;
		report.rendered_groups += outcome.rendered_groups;

		if outcome.changed && !options.check_only && !doc.from_index {
			store.write(&doc.path, &outcome.content)?;
			report.updated_docs += 1;
		}
	}

	// Broken references abort the run, but only after every documentation
	// file contributed its findings.
	if !missing.is_empty() {
		let mut lines: Vec<String> = missing
			.iter()
			.map(|m| {
				let kind = if m.group { "group token" } else { "token" };
				format!(
					"   {kind} `{}` at {}:{} was not found",
					m.token,
					m.path.display(),
					m.line
				)
			})
			.collect();
		lines.sort();
		return Err(SrcmapError::BrokenReferences(lines.join("\n")));
	}

	report.unused = collect_unused(&inventory, &used_tokens);

	if options.ack_groups {
		report.acked_files = acknowledge_drift(markers, store, &inventory)?;
	} else {
		report.drift = collect_drift(&inventory);
	}

	Ok(report)
}

/// Single tokens never referenced from any documentation file, sorted by
/// token for stable output.
fn collect_unused(inventory: &Inventory, used_tokens: &HashSet<String>) -> Vec<UnusedToken> {
	let mut unused: Vec<UnusedToken> = inventory
		.singles
		.iter()
		.filter(|(token, _)| !used_tokens.contains(*token))
		.map(|(token, locations)| {
			UnusedToken {
				token: token.clone(),
				location: locations[0].clone(),
			}
		})
		.collect();

	unused.sort_by(|a, b| a.token.cmp(&b.token));
	unused
}

/// Build the drift report: every group with at least one block whose actual
/// hash differs from its acknowledged hash.
fn collect_drift(inventory: &Inventory) -> Vec<DriftGroup> {
	let mut drift = Vec::new();

	for (token, infos) in &inventory.groups {
		if !infos.iter().any(TokenGroupInfo::has_drifted) {
			continue;
		}

		drift.push(DriftGroup {
			token: token.clone(),
			members: infos
				.iter()
				.map(|info| {
					DriftMember {
						path: info.source.path.clone(),
						start_line: info.start_line,
						end_line: info.end_line,
						changed: info.has_drifted(),
					}
				})
				.collect(),
		});
	}

	drift.sort_by(|a, b| a.token.cmp(&b.token));
	drift
}

/// Patch every drifted group's file with the freshly computed hash. Each
/// file is streamed and rewritten once, covering all of its drifted groups.
fn acknowledge_drift(
	markers: &MarkerSet,
	store: &dyn FileStore,
	inventory: &Inventory,
) -> SrcmapResult<usize> {
	let mut by_file: HashMap<PathBuf, Vec<TokenGroupInfo>> = HashMap::new();
	for infos in inventory.groups.values() {
		for info in infos {
			if info.has_drifted() {
				by_file
					.entry(info.source.path.clone())
					.or_default()
					.push(info.clone());
			}
		}
	}

	let mut paths: Vec<PathBuf> = by_file.keys().cloned().collect();
	paths.sort();

	for path in &paths {
		let infos = &by_file[path];
		let source = infos[0].source.clone();
		let bytes = store.read(&source)?;
		let patched = acknowledge_file(markers, infos, &bytes);
		store.write(path, &patched)?;
		tracing::info!(path = %path.display(), groups = infos.len(), "acknowledged drift");
	}

	Ok(paths.len())
}
