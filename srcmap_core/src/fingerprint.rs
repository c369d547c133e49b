use sha1::Digest;
use sha1::Sha1;

use crate::SrcmapError;
use crate::SrcmapResult;
use crate::inventory::TokenGroupInfo;
use crate::markers::MarkerSet;
use crate::source::FileSource;

/// State machine for the sequential group scan: at most one group may be
/// open at any point in a file.
enum GroupState {
	Idle,
	InBlock {
		token: String,
		hasher: Sha1,
		start_line: usize,
	},
}

/// Scan content for group blocks, fingerprinting each block's interior.
///
/// Lines are fed to the hash with their terminators included. Neither the
/// start-marker line nor the end-marker line contributes to its own block's
/// hash. Structural violations (an end without a start, a start while a
/// group is open, an unclosed group at end of file) are fatal.
pub fn scan_groups(
	markers: &MarkerSet,
	source: &FileSource,
	bytes: &[u8],
) -> SrcmapResult<Vec<TokenGroupInfo>> {
	let mut groups = Vec::new();
	let mut state = GroupState::Idle;

	for (idx, line) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
		let line_num = idx + 1;

		if let Some(caps) = markers.group_end.captures(line) {
			let token = String::from_utf8_lossy(&caps[1]).into_owned();
			let expected_hash = caps
				.get(2)
				.map(|m| String::from_utf8_lossy(m.as_bytes()).into_owned())
				.unwrap_or_default();

			match std::mem::replace(&mut state, GroupState::Idle) {
				GroupState::Idle => {
					return Err(SrcmapError::GroupEndWithoutStart {
						token,
						path: source.path.clone(),
						line: line_num,
					});
				}
				GroupState::InBlock {
					hasher, start_line, ..
				} => {
					groups.push(TokenGroupInfo {
						token,
						source: source.clone(),
						start_line,
						end_line: line_num,
						actual_hash: hex_digest(hasher),
						expected_hash,
					});
				}
			}
		}

		if let GroupState::InBlock { hasher, .. } = &mut state {
			hasher.update(line);
		}

		if let Some(caps) = markers.group_start.captures(line) {
			let token = String::from_utf8_lossy(&caps[1]).into_owned();
			if matches!(state, GroupState::InBlock { .. }) {
				return Err(SrcmapError::OverlappingGroup {
					token,
					path: source.path.clone(),
					line: line_num,
				});
			}

			state = GroupState::InBlock {
				token,
				hasher: Sha1::new(),
				start_line: line_num,
			};
		}
	}

	if let GroupState::InBlock { token, .. } = state {
		return Err(SrcmapError::UnclosedGroup {
			token,
			path: source.path.clone(),
			tag: markers.tag().to_string(),
		});
	}

	Ok(groups)
}

/// Patch acknowledged hashes into content, replacing only the end-marker
/// portion of the listed groups' closing lines. Every other byte streams
/// through untouched, so acknowledging never reformats a file.
pub fn acknowledge_file(
	markers: &MarkerSet,
	groups: &[TokenGroupInfo],
	bytes: &[u8],
) -> Vec<u8> {
	let mut out = Vec::with_capacity(bytes.len());

	for (idx, line) in bytes.split_inclusive(|&b| b == b'\n').enumerate() {
		let line_num = idx + 1;
		let patch = groups.iter().find(|info| info.end_line == line_num);

		match patch {
			Some(info) => {
				let replacement = markers.group_end_with_hash(&info.token, &info.actual_hash);
				let patched = markers
					.group_end
					.replace(line, regex::bytes::NoExpand(&replacement));
				out.extend_from_slice(&patched);
			}
			None => out.extend_from_slice(line),
		}
	}

	out
}

fn hex_digest(hasher: Sha1) -> String {
	hasher
		.finalize()
		.iter()
		.map(|byte| format!("{byte:02x}"))
		.collect()
}
