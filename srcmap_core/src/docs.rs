use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use crate::SrcmapError;
use crate::SrcmapResult;
use crate::inventory::Inventory;
use crate::markers::MarkerSet;
use crate::source::FileSource;

/// A documentation reference to a token missing from the inventory. Fatal in
/// both modes, but collected so one run names every broken reference.
#[derive(Debug, Clone)]
pub struct MissingRef {
	pub token: String,
	pub path: PathBuf,
	/// 1-based line of the reference.
	pub line: usize,
	/// Whether the reference names a group token.
	pub group: bool,
}

/// A resolvable reference whose link text no longer matches the token's
/// location. Recorded in check mode instead of rewriting.
#[derive(Debug, Clone)]
pub struct StaleLink {
	pub token: String,
	pub path: PathBuf,
	pub line: usize,
	/// The canonical target the link should carry.
	pub target: String,
}

/// A group-reference block whose rendered body is out of date.
#[derive(Debug, Clone)]
pub struct StaleGroup {
	pub token: String,
	pub path: PathBuf,
	pub line: usize,
}

/// The result of rewriting one documentation file.
#[derive(Debug)]
pub struct DocOutcome {
	/// The buffer after both passes. Only meaningful to persist when
	/// `changed` is set.
	pub content: Vec<u8>,
	pub changed: bool,
	/// Single tokens touched by reference resolution, stale or not.
	pub used_tokens: HashSet<String>,
	pub missing: Vec<MissingRef>,
	pub stale_links: Vec<StaleLink>,
	pub stale_groups: Vec<StaleGroup>,
	pub updated_links: usize,
	pub rendered_groups: usize,
}

/// Rewrite one documentation file against the inventory.
///
/// Two passes over a byte buffer seeded from the file's current content:
/// reference resolution first, then group-template rendering. Both passes
/// are pure span substitution located by pattern matching, so unrelated
/// bytes are preserved exactly. In check mode the buffer is left untouched
/// and discrepancies are recorded instead.
pub fn rewrite_doc(
	markers: &MarkerSet,
	inventory: &Inventory,
	source: &FileSource,
	bytes: &[u8],
	check_only: bool,
) -> SrcmapResult<DocOutcome> {
	let mut outcome = DocOutcome {
		content: Vec::with_capacity(bytes.len()),
		changed: false,
		used_tokens: HashSet::new(),
		missing: Vec::new(),
		stale_links: Vec::new(),
		stale_groups: Vec::new(),
		updated_links: 0,
		rendered_groups: 0,
	};

	resolve_references(markers, inventory, source, bytes, check_only, &mut outcome);

	let buffer = std::mem::take(&mut outcome.content);
	outcome.content = render_group_references(
		markers,
		inventory,
		source,
		&buffer,
		check_only,
		&mut outcome,
	)?;

	Ok(outcome)
}

/// Pass 1: resolve single-token references line by line.
fn resolve_references(
	markers: &MarkerSet,
	inventory: &Inventory,
	source: &FileSource,
	bytes: &[u8],
	check_only: bool,
	outcome: &mut DocOutcome,
) {
	let doc_dir = source.path.parent().unwrap_or_else(|| Path::new(""));

	for (idx, line) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
		let line_num = idx + 1;
		let mut cursor = 0;

		for caps in markers.doc_ref.captures_iter(line) {
			let Some(whole) = caps.get(0) else { continue };
			let token = String::from_utf8_lossy(&caps[2]).into_owned();

			let Some(locations) = inventory.singles.get(&token) else {
				outcome.missing.push(MissingRef {
					token,
					path: source.path.clone(),
					line: line_num,
					group: false,
				});
				continue;
			};

			// A resolvable reference counts as "in use" even when its link
			// text is stale.
			outcome.used_tokens.insert(token.clone());

			let location = &locations[0];
			let rel = relative_path(doc_dir, &location.file);
			let target = if location.link_to_file {
				rel
			} else {
				format!("{rel}#L{}", location.line)
			};
			let replacement = markers.doc_reference(&token, &target);

			if whole.as_bytes() == replacement.as_slice() {
				continue;
			}

			if check_only {
				outcome.stale_links.push(StaleLink {
					token,
					path: source.path.clone(),
					line: line_num,
					target,
				});
				continue;
			}

			tracing::info!(
				token = token.as_str(),
				path = %source.path.display(),
				line = line_num,
				target = target.as_str(),
				"updated link"
			);
			outcome.content.extend_from_slice(&line[cursor..whole.start()]);
			outcome.content.extend_from_slice(&replacement);
			cursor = whole.end();
			outcome.changed = true;
			outcome.updated_links += 1;
		}

		outcome.content.extend_from_slice(&line[cursor..]);
	}
}

/// Pass 2: re-render group-reference blocks from the sorted group locations.
fn render_group_references(
	markers: &MarkerSet,
	inventory: &Inventory,
	source: &FileSource,
	bytes: &[u8],
	check_only: bool,
	outcome: &mut DocOutcome,
) -> SrcmapResult<Vec<u8>> {
	let doc_dir = source.path.parent().unwrap_or_else(|| Path::new(""));
	let mut out = Vec::with_capacity(bytes.len());
	let mut cursor = 0;

	for caps in markers.doc_group_ref.captures_iter(bytes) {
		let (Some(whole), Some(start_tag), Some(body), Some(end_tag)) =
			(caps.get(0), caps.get(1), caps.get(4), caps.get(5))
		else {
			continue;
		};

		let token = String::from_utf8_lossy(&caps[2]).into_owned();
		let line_num = line_of_offset(bytes, whole.start());

		let Some(infos) = inventory.groups.get(&token) else {
			outcome.missing.push(MissingRef {
				token,
				path: source.path.clone(),
				line: line_num,
				group: true,
			});
			continue;
		};

		let template = String::from_utf8_lossy(&caps[3]).into_owned();
		let mut rendered_body = String::from("\n");
		for info in infos {
			let rel = relative_path(doc_dir, &info.source.path);
			let file_line = format!("{}:{}", info.source.path.display(), info.start_line);
			let range_href = format!("{rel}#L{}-L{}", info.start_line + 1, info.end_line - 1);
			let link = format!("[{file_line}]({range_href})");

			let context = minijinja::context! {
				file => info.source.path.display().to_string(),
				line => info.start_line,
				file_line => file_line,
				range_href => range_href,
				link => link,
			};
			rendered_body.push_str(&render_template(&template, context, &token, source)?);
		}

		if body.as_bytes() == rendered_body.as_bytes() {
			continue;
		}

		if check_only {
			outcome.stale_groups.push(StaleGroup {
				token,
				path: source.path.clone(),
				line: line_num,
			});
			continue;
		}

		out.extend_from_slice(&bytes[cursor..whole.start()]);
		out.extend_from_slice(start_tag.as_bytes());
		out.extend_from_slice(rendered_body.as_bytes());
		out.extend_from_slice(end_tag.as_bytes());
		cursor = whole.end();
		outcome.changed = true;
		outcome.rendered_groups += 1;
	}

	out.extend_from_slice(&bytes[cursor..]);
	Ok(out)
}

/// Render a group-reference template for one location through minijinja.
fn render_template(
	template: &str,
	context: minijinja::Value,
	token: &str,
	source: &FileSource,
) -> SrcmapResult<String> {
	let mut env = minijinja::Environment::new();
	env.set_keep_trailing_newline(true);
	env.add_template("__group__", template)
		.map_err(|e| {
			SrcmapError::TemplateRender {
				token: token.to_string(),
				path: source.path.clone(),
				reason: e.to_string(),
			}
		})?;

	let compiled = env.get_template("__group__").map_err(|e| {
		SrcmapError::TemplateRender {
			token: token.to_string(),
			path: source.path.clone(),
			reason: e.to_string(),
		}
	})?;

	compiled.render(context).map_err(|e| {
		SrcmapError::TemplateRender {
			token: token.to_string(),
			path: source.path.clone(),
			reason: e.to_string(),
		}
	})
}

/// 1-based line number of a byte offset.
fn line_of_offset(bytes: &[u8], offset: usize) -> usize {
	bytes[..offset].iter().filter(|&&b| b == b'\n').count() + 1
}

/// Relative path from a documentation file's directory to a target, with
/// forward slashes for link targets.
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
	let from: Vec<_> = from_dir.components().collect();
	let target: Vec<_> = to.components().collect();

	let mut common = 0;
	while common < from.len() && common < target.len() && from[common] == target[common] {
		common += 1;
	}

	let mut parts: Vec<String> = from[common..].iter().map(|_| "..".to_string()).collect();
	parts.extend(
		target[common..]
			.iter()
			.map(|c| c.as_os_str().to_string_lossy().into_owned()),
	);

	if parts.is_empty() {
		".".to_string()
	} else {
		parts.join("/")
	}
}
