use std::path::Path;

use crate::inventory::TokenLocation;
use crate::markers::MarkerSet;
use crate::token::generate_token;

/// Lines longer than this mark a file as binary and exclude it from
/// scanning. Generous enough for any hand-written source line.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// Check whether content looks binary: any line exceeding [`MAX_LINE_LEN`].
/// Binary files are skipped without error.
pub fn is_binary(bytes: &[u8]) -> bool {
	bytes.split(|&b| b == b'\n').any(|line| line.len() > MAX_LINE_LEN)
}

/// Replace every unassigned marker (`[srcmap]` / `[srcmap-group]`) with its
/// assigned form carrying a freshly generated token. Returns the rewritten
/// content and the tokens that were handed out, in order of appearance.
pub fn assign_tokens(markers: &MarkerSet, bytes: &[u8]) -> (Vec<u8>, Vec<String>) {
	let mut assigned = Vec::new();
	let rewritten = markers
		.unassigned
		.replace_all(bytes, |caps: &regex::bytes::Captures<'_>| {
			let token = generate_token();
			let replacement = markers.assigned(&caps[1], &token);
			assigned.push(token);
			replacement
		})
		.into_owned();

	(rewritten, assigned)
}

/// Scan content for assigned single markers, producing one
/// (token, [`TokenLocation`]) pair per occurrence.
///
/// Two heuristics shape the recorded location:
///
/// - A line holding nothing but the marker inside a line-comment wrapper
///   (`// [srcmap:..]`, `# [srcmap:..]`, `<!-- [srcmap:..] -->`) annotates
///   the *next* line.
/// - A marker preceded only by blank lines and/or a shebang, and followed by
///   a blank line or end of file, links to the whole file instead of a line.
///   The lookahead that revokes the flag inspects a single line per marker.
pub fn scan_singles(
	markers: &MarkerSet,
	path: &Path,
	bytes: &[u8],
) -> Vec<(String, TokenLocation)> {
	let lines: Vec<&[u8]> = bytes.split(|&b| b == b'\n').collect();
	let mut locations = Vec::new();
	let mut link_to_file = true;

	for (idx, line) in lines.iter().enumerate() {
		let caps = markers.single.captures(line);
		let mut at_eof = false;

		// A marker that still qualifies for a whole-file link keeps it only
		// when the following line is blank or missing.
		if link_to_file && caps.is_some() {
			match lines.get(idx + 1) {
				Some(next) => {
					if !next.trim_ascii().is_empty() {
						link_to_file = false;
					}
				}
				None => at_eof = true,
			}
		}

		if let Some(caps) = &caps {
			let before = caps[1].trim_ascii();
			let token = String::from_utf8_lossy(&caps[2]).into_owned();
			let after = caps[3].trim_ascii();

			// Comment-only lines annotate the line below them.
			let mut line_num = idx + 1;
			if (after.is_empty() && (before == b"//" || before == b"#"))
				|| (before == b"<!--" && after == b"-->")
			{
				line_num += 1;
			}

			locations.push((
				token,
				TokenLocation {
					file: path.to_path_buf(),
					line: line_num,
					link_to_file,
				},
			));
		}

		if at_eof {
			break;
		}

		if caps.is_none()
			&& link_to_file
			&& !(line.starts_with(b"#!") || line.trim_ascii().is_empty())
		{
			link_to_file = false;
		}
	}

	locations
}
