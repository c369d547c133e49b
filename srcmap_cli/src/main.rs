use std::collections::HashSet;
use std::io::IsTerminal;
use std::io::Read;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use srcmap_cli::Commands;
use srcmap_cli::SrcmapCli;
use srcmap_core::AnyError;
use srcmap_core::AnyResult;
use srcmap_core::FileSource;
use srcmap_core::FileStore;
use srcmap_core::MarkerSet;
use srcmap_core::RunOptions;
use srcmap_core::RunReport;
use srcmap_core::SrcmapError;
use srcmap_core::SrcmapResult;
use srcmap_core::WorkingTree;
use srcmap_core::reconcile;

/// Files larger than this are never scanned.
const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SrcmapCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color
		&& std::env::var_os("NO_COLOR").is_none()
		&& supports_color::on(supports_color::Stream::Stderr).is_some();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let filter = if args.verbose { "srcmap_core=debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
		)
		.with_writer(std::io::stderr)
		.try_init()
		.ok();

	let command = args.command.unwrap_or(Commands::Update);

	if args.git_index && command != Commands::Check {
		eprintln!(
			"{} --git-index checks a snapshot and cannot write; use it with `srcmap check`",
			colored!("error:", red)
		);
		process::exit(2);
	}

	match run(&args, command) {
		Ok(report) => {
			print_report(&args, command, &report);
			if !report.is_ok() {
				process::exit(1);
			}
		}
		Err(e) => {
			// Render engine errors through miette for help text and codes.
			match e.downcast::<SrcmapError>() {
				Ok(srcmap_err) => {
					let report = miette::Report::new(*srcmap_err);
					eprintln!("{report:?}");
				}
				Err(e) => {
					eprintln!("{} {e}", colored!("error:", red));
				}
			}
			process::exit(1);
		}
	}
}

fn run(args: &SrcmapCli, command: Commands) -> AnyResult<RunReport> {
	let options = RunOptions {
		check_only: command == Commands::Check,
		ack_groups: command == Commands::Ack,
		fail_unused: args.no_unused,
	};

	let report = if args.git_index {
		let (sources, store) = git_index_sources()?;
		reconcile(MarkerSet::default_set(), &store, &sources, options)?
	} else {
		let sources = if args.git {
			git_sources()?
		} else {
			stdin_sources(args.stdin0)?
		};
		reconcile(MarkerSet::default_set(), &WorkingTree, &sources, options)?
	};

	Ok(report)
}

fn print_report(args: &SrcmapCli, command: Commands, report: &RunReport) {
	for (path, token) in &report.new_tokens {
		println!(
			"assigned token {} in {}",
			colored!(token, green),
			path.display()
		);
	}

	if args.verbose {
		println!("scanned {} file(s)", report.scanned_files);
		println!(
			"updated {} link(s) and {} group block(s) in {} file(s)",
			report.updated_links, report.rendered_groups, report.updated_docs
		);
	}

	// Unused tokens that do not fail the run are still worth a warning.
	if !report.fail_unused {
		for unused in &report.unused {
			eprintln!(
				"{} token {} at {}:{} is not referenced by any documentation file",
				colored!("warning:", yellow),
				unused.token,
				unused.location.file.display(),
				unused.location.line
			);
		}
	}

	if let Some(failure) = report.failure_report() {
		eprintln!("{failure}");
		if report.drift.is_empty() {
			eprintln!("run `srcmap update` to fix.");
		} else {
			eprintln!("edit groups as needed, then re-run `srcmap ack`.");
		}
		return;
	}

	match command {
		Commands::Check => println!("check passed: all cross-references are consistent."),
		Commands::Ack => {
			if report.acked_files > 0 {
				println!("acknowledged group changes in {} file(s).", report.acked_files);
			} else {
				println!("no group changes to acknowledge.");
			}
		}
		Commands::Update => {
			if report.updated_docs > 0 {
				println!("updated {} documentation file(s).", report.updated_docs);
			} else {
				println!("all cross-references are up to date.");
			}
		}
	}
}

/// Read candidate paths from stdin, one per line (or NUL-delimited with
/// `--stdin0`). A leading `./` is stripped so paths match git's spelling.
fn stdin_sources(nul_delimited: bool) -> AnyResult<Vec<FileSource>> {
	if std::io::stdin().is_terminal() {
		eprintln!(
			"{} reading file paths from stdin; pipe a file list, e.g. `git ls-files | srcmap update`",
			colored!("warning:", yellow)
		);
	}

	let mut input = Vec::new();
	std::io::stdin().read_to_end(&mut input)?;

	let delimiter = if nul_delimited { b'\0' } else { b'\n' };
	let paths = input
		.split(|&b| b == delimiter)
		.map(|raw| String::from_utf8_lossy(raw).trim().to_string())
		.filter(|path| !path.is_empty())
		.map(|path| path.strip_prefix("./").unwrap_or(&path).to_string());

	Ok(filter_regular_files(paths))
}

/// Enumerate tracked and untracked-but-not-ignored files, minus files with
/// unstaged deletions.
fn git_sources() -> AnyResult<Vec<FileSource>> {
	let listed = run_git(&["ls-files", "--cached", "--others", "--exclude-standard", "-z"])?;
	let deleted = run_git(&["diff-files", "--name-only", "--diff-filter=D", "-z"])?;

	let deleted: HashSet<String> = split_nul(&deleted).collect();
	let paths = split_nul(&listed).filter(|path| !deleted.contains(path));

	Ok(filter_regular_files(paths))
}

/// Enumerate the git index: every mode-100 (regular file) stage entry. Files
/// differing from HEAD (staged or not) are marked so their bytes come from
/// the index instead of the working tree; an unstaged edit must never leak
/// into a check of what a commit would contain.
fn git_index_sources() -> AnyResult<(Vec<FileSource>, GitIndexStore)> {
	let changed_output = run_git(&["diff-index", "--name-only", "-z", "HEAD"])?;
	let changed: HashSet<String> = split_nul(&changed_output).collect();

	let listed = run_git(&["ls-files", "--stage", "-z"])?;
	let mut sources = Vec::new();

	// Each entry reads `<mode> <object> <stage>\t<path>`.
	for entry in split_nul(&listed) {
		let Some((meta, path)) = entry.split_once('\t') else {
			continue;
		};
		if !meta.starts_with("100") {
			continue;
		}

		let from_index = changed.contains(path);
		if !from_index && !is_small_regular_file(Path::new(path)) {
			continue;
		}

		sources.push(FileSource {
			path: PathBuf::from(path),
			from_index,
		});
	}

	Ok((sources, GitIndexStore))
}

fn run_git(git_args: &[&str]) -> AnyResult<Vec<u8>> {
	let output = process::Command::new("git").args(git_args).output()?;
	if !output.status.success() {
		let stderr = String::from_utf8_lossy(&output.stderr);
		return Err(AnyError::from(format!(
			"git {} failed: {}",
			git_args.join(" "),
			stderr.trim()
		)));
	}

	Ok(output.stdout)
}

fn split_nul(bytes: &[u8]) -> impl Iterator<Item = String> + '_ {
	bytes
		.split(|&b| b == b'\0')
		.map(|raw| String::from_utf8_lossy(raw).into_owned())
		.filter(|path| !path.is_empty())
}

/// Keep only regular files below the size ceiling. Paths that fail to stat
/// (racing deletions, dangling symlinks) are dropped silently.
fn filter_regular_files(paths: impl IntoIterator<Item = String>) -> Vec<FileSource> {
	paths
		.into_iter()
		.filter(|path| is_small_regular_file(Path::new(path)))
		.map(FileSource::working_tree)
		.collect()
}

fn is_small_regular_file(path: &Path) -> bool {
	std::fs::metadata(path).is_ok_and(|meta| meta.is_file() && meta.len() < MAX_FILE_SIZE)
}

/// [`FileStore`] for `--git-index`: files differing from HEAD are read from
/// the index via `git show`, everything else from the working tree. The
/// index is a snapshot, so writes are rejected.
struct GitIndexStore;

impl FileStore for GitIndexStore {
	fn read(&self, source: &FileSource) -> SrcmapResult<Vec<u8>> {
		if !source.from_index {
			return WorkingTree.read(source);
		}

		let spec = format!(":{}", source.path.display());
		let output = process::Command::new("git")
			.args(["show", &spec])
			.output()
			.map_err(|e| {
				SrcmapError::FileRead {
					path: source.path.clone(),
					source: e,
				}
			})?;

		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(SrcmapError::FileRead {
				path: source.path.clone(),
				source: std::io::Error::other(stderr.trim().to_string()),
			});
		}

		Ok(output.stdout)
	}

	fn write(&self, path: &Path, _bytes: &[u8]) -> SrcmapResult<()> {
		Err(SrcmapError::FileWrite {
			path: path.to_path_buf(),
			source: std::io::Error::other("the git index is read-only"),
		})
	}
}
