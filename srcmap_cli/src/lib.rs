use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep source code and documentation cross-references in sync.",
	long_about = "srcmap maintains bidirectional links between source code and documentation.\n\n\
	              Source files carry inline `[srcmap]` markers that are assigned opaque tokens; \
	              documentation links referencing a token are rewritten to the marker's current \
	              file and line, so links survive refactors.\n\nQuick start:\n  srcmap update  \
	              Assign tokens and rewrite documentation links\n  srcmap check   Verify \
	              everything is consistent, without writing\n  srcmap ack     Accept group \
	              content changes as the new baseline"
)]
#[allow(clippy::struct_excessive_bools)]
pub struct SrcmapCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Enumerate files with `git ls-files` instead of reading paths from
	/// stdin.
	#[arg(long, global = true, default_value_t = false, conflicts_with_all = ["stdin0", "git_index"])]
	pub git: bool,

	/// Check the git index instead of the working tree. Staged file contents
	/// are read from the index, so the check matches what a commit would
	/// contain. Only valid with `check`.
	#[arg(long, global = true, default_value_t = false)]
	pub git_index: bool,

	/// Read NUL-delimited paths from stdin (as produced by `find -print0`).
	#[arg(long, global = true, default_value_t = false)]
	pub stdin0: bool,

	/// Fail the run when tokens exist that no documentation file references
	/// ("no unused tokens allowed"). By default they only produce warnings.
	#[arg(long, global = true, default_value_t = false)]
	pub no_unused: bool,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
	/// Assign tokens to new markers and rewrite documentation links.
	///
	/// Scans every enumerated file for markers, generates tokens for
	/// unassigned ones, and rewrites documentation references so each link
	/// points at its token's current file and line. Group reference blocks
	/// are re-rendered from their templates. This is the default when no
	/// subcommand is given.
	Update,
	/// Verify that all cross-references are consistent, without writing.
	///
	/// Exits non-zero when documentation links are out of date, group
	/// reference blocks need re-rendering, group content has drifted from
	/// its acknowledged fingerprint, or, with `--no-unused`, tokens exist
	/// that no documentation file references.
	///
	/// Ideal for CI pipelines and pre-commit hooks; combine with
	/// `--git-index` to check exactly what a commit would contain.
	Check,
	/// Accept current group content as the new baseline.
	///
	/// Recomputes each group's content fingerprint and embeds it in the
	/// group's end markers, replacing any previously acknowledged hash.
	/// Also performs a full update pass.
	Ack,
}
