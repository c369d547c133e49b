use once_cell::sync::Lazy;
use regex::bytes::Regex;

/// The marker tag compiled into [`MarkerSet::default`].
pub const DEFAULT_TAG: &str = "srcmap";

/// Compiled marker patterns for one tag name.
///
/// Source files carry `[srcmap]` style markers and documentation files carry
/// `<!--srcmap:TOKEN-->](target)` style references. Every pattern operates on
/// raw bytes so scanned files are never assumed to be UTF-8. Single-marker
/// patterns are anchored to one physical line; group boundaries and
/// documentation constructs are matched across the whole file.
#[derive(Debug)]
pub struct MarkerSet {
	tag: String,
	/// `[tag]` or `[tag-group]` requesting token generation.
	pub unassigned: Regex,
	/// `[tag:TOKEN]` with the surrounding line text captured as before/after.
	pub single: Regex,
	/// `[tag-group:TOKEN]` opening a group block.
	pub group_start: Regex,
	/// `[end-tag-group:TOKEN]` with an optional 40-hex expected hash.
	pub group_end: Regex,
	/// `<!--tag:TOKEN-->](target)` inside documentation.
	pub doc_ref: Regex,
	/// `<!--tag-group:TOKEN:TEMPLATE-->` ... `<!--end-tag-group-->`.
	pub doc_group_ref: Regex,
}

static DEFAULT_SET: Lazy<MarkerSet> = Lazy::new(|| MarkerSet::new(DEFAULT_TAG));

impl MarkerSet {
	/// Compile the marker patterns for a custom tag name.
	pub fn new(tag: &str) -> Self {
		let t = regex::escape(tag);

		Self {
			tag: tag.to_string(),
			unassigned: compile(&format!(r"\[({t}(?:-group)?)\]")),
			single: compile(&format!(r"^(.*)\[{t}:([A-Za-z0-9]+)\](.*)$")),
			group_start: compile(&format!(r"\[{t}-group:([A-Za-z0-9]+)\]")),
			group_end: compile(&format!(
				r"\[end-{t}-group:([A-Za-z0-9]+)(?::([a-f0-9]{{40}}))?\]"
			)),
			doc_ref: compile(&format!(r"(<!--{t}:([A-Za-z0-9]+)-->)\]\((.*?)\)")),
			doc_group_ref: compile(&format!(
				r"(?s)(<!--{t}-group:([A-Za-z0-9]+):(.+?)-->)(.*?)(<!--end-{t}-group-->)"
			)),
		}
	}

	/// The default marker set, compiled once.
	pub fn default_set() -> &'static Self {
		&DEFAULT_SET
	}

	/// The tag name these patterns were compiled for.
	pub fn tag(&self) -> &str {
		&self.tag
	}

	/// The canonical assigned form for a marker variant captured by
	/// [`MarkerSet::unassigned`], e.g. `srcmap-group` + token ->
	/// `[srcmap-group:TOKEN]`.
	pub fn assigned(&self, variant: &[u8], token: &str) -> Vec<u8> {
		let mut out = Vec::with_capacity(variant.len() + token.len() + 3);
		out.push(b'[');
		out.extend_from_slice(variant);
		out.push(b':');
		out.extend_from_slice(token.as_bytes());
		out.push(b']');
		out
	}

	/// The canonical group end marker carrying an acknowledged hash.
	pub fn group_end_with_hash(&self, token: &str, hash: &str) -> Vec<u8> {
		format!("[end-{}-group:{token}:{hash}]", self.tag).into_bytes()
	}

	/// The canonical documentation reference for a token and link target.
	pub fn doc_reference(&self, token: &str, target: &str) -> Vec<u8> {
		format!("<!--{}:{token}-->]({target})", self.tag).into_bytes()
	}
}

impl Default for MarkerSet {
	fn default() -> Self {
		Self::new(DEFAULT_TAG)
	}
}

fn compile(pattern: &str) -> Regex {
	// The patterns only vary in the escaped tag name, so compilation cannot
	// fail for any tag accepted by the CLI.
	Regex::new(pattern).unwrap_or_else(|e| panic!("invalid marker pattern `{pattern}`: {e}"))
}
