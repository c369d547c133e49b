use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum SrcmapError {
	#[error(transparent)]
	#[diagnostic(code(srcmap::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to read `{path}`: {source}")]
	#[diagnostic(code(srcmap::file_read))]
	FileRead {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("failed to write `{path}`: {source}")]
	#[diagnostic(code(srcmap::file_write))]
	FileWrite {
		path: PathBuf,
		source: std::io::Error,
	},

	#[error("group end marker for unknown group `{token}` at {path}:{line}")]
	#[diagnostic(
		code(srcmap::group_end_without_start),
		help("every group end marker needs a matching start marker earlier in the same file")
	)]
	GroupEndWithoutStart {
		token: String,
		path: PathBuf,
		line: usize,
	},

	#[error("overlapping group `{token}` at {path}:{line}")]
	#[diagnostic(
		code(srcmap::overlapping_group),
		help("close the open group before starting another; groups cannot nest")
	)]
	OverlappingGroup {
		token: String,
		path: PathBuf,
		line: usize,
	},

	#[error("unclosed group `{token}` in {path}")]
	#[diagnostic(
		code(srcmap::unclosed_group),
		help("add an `[end-{tag}-group:{token}]` marker before the end of the file")
	)]
	UnclosedGroup {
		token: String,
		path: PathBuf,
		tag: String,
	},

	#[error("duplicate tokens found:\n{0}")]
	#[diagnostic(
		code(srcmap::duplicate_token),
		help("each single token may appear at exactly one source location; remove the extra markers")
	)]
	DuplicateTokens(String),

	#[error("tokens claimed as both single and group:\n{0}")]
	#[diagnostic(
		code(srcmap::token_kind_collision),
		help("a token identifies either one line or one group block, never both")
	)]
	TokenKindCollision(String),

	#[error("broken documentation references:\n{0}")]
	#[diagnostic(
		code(srcmap::broken_reference),
		help("the referenced tokens no longer exist in any scanned source file")
	)]
	BrokenReferences(String),

	#[error("template for group `{token}` in {path} failed to render: {reason}")]
	#[diagnostic(code(srcmap::template_render))]
	TemplateRender {
		token: String,
		path: PathBuf,
		reason: String,
	},

	#[error("stale documentation links:\n{0}")]
	#[diagnostic(
		code(srcmap::stale_links),
		help("run `srcmap update` to rewrite the out-of-date links")
	)]
	StaleDocs(String),

	#[error("groups have drifted from their acknowledged content:\n{0}")]
	#[diagnostic(
		code(srcmap::group_drift),
		help("edit the groups as needed, then re-run `srcmap ack` to accept the new fingerprints")
	)]
	DriftPending(String),

	#[error("unused tokens:\n{0}")]
	#[diagnostic(
		code(srcmap::unused_tokens),
		help("remove the markers or reference them from a documentation file")
	)]
	UnusedTokens(String),
}

pub type SrcmapResult<T> = Result<T, SrcmapError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
