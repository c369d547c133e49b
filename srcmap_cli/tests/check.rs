mod common;

use srcmap_core::AnyEmptyResult;

#[test]
fn check_passes_when_consistent() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("main.rs"),
		"fn main() {}\n// [srcmap:Tok1]\nfn helper() {}\n",
	)?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"[<!--srcmap:Tok1-->](main.rs#L3)\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("main.rs\nreadme.md\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("check passed"));

	Ok(())
}

#[test]
fn check_fails_on_stale_link_without_writing() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("main.rs"),
		"fn main() {}\n// [srcmap:Tok1]\nfn helper() {}\n",
	)?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"[<!--srcmap:Tok1-->](main.rs#L99)\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("main.rs\nreadme.md\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("stale documentation"))
		.stderr(predicates::str::contains("run `srcmap update` to fix."));

	// Check mode never rewrites.
	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("readme.md"))?,
		"[<!--srcmap:Tok1-->](main.rs#L99)\n"
	);

	Ok(())
}

#[test]
fn check_never_assigns_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.rs"), "fn a() {}\n// [srcmap]\nfn b() {}\n")?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("a.rs\n")
		.assert()
		.success();

	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("a.rs"))?,
		"fn a() {}\n// [srcmap]\nfn b() {}\n"
	);

	Ok(())
}

#[test]
fn check_fails_on_unknown_reference() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"[<!--srcmap:Ghost1-->](x)\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("readme.md\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Ghost1"))
		.stderr(predicates::str::contains("readme.md:1"));

	Ok(())
}

#[test]
fn check_warns_about_unused_tokens_by_default() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("a.rs"),
		"fn a() {}\n// [srcmap:Lonely1]\nfn b() {}\n",
	)?;
	std::fs::write(tmp.path().join("readme.md"), "# no references\n")?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("a.rs\nreadme.md\n")
		.assert()
		.success()
		.stderr(predicates::str::contains("Lonely1"))
		.stderr(predicates::str::contains("not referenced"));

	Ok(())
}

#[test]
fn no_unused_promotes_unused_tokens_to_failure() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("a.rs"),
		"fn a() {}\n// [srcmap:Lonely1]\nfn b() {}\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.arg("--no-unused")
		.write_stdin("a.rs\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("unused tokens"))
		.stderr(predicates::str::contains("Lonely1"));

	Ok(())
}

fn git(dir: &std::path::Path, args: &[&str]) {
	let status = std::process::Command::new("git")
		.args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
		.args(args)
		.current_dir(dir)
		.status()
		.expect("git should run");
	assert!(status.success(), "git {args:?} failed");
}

#[test]
fn git_index_reads_index_content_not_working_tree() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("main.rs"),
		"fn main() {}\n// [srcmap:Tok1]\nfn helper() {}\n",
	)?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"[<!--srcmap:Tok1-->](main.rs#L3)\n",
	)?;
	git(tmp.path(), &["init", "-q"]);
	git(tmp.path(), &["add", "-A"]);
	git(tmp.path(), &["commit", "-q", "-m", "init"]);

	// An unstaged edit moves the marker to line 4. A commit would not
	// contain that edit, so the snapshot check must still pass.
	std::fs::write(
		tmp.path().join("main.rs"),
		"// note\nfn main() {}\n// [srcmap:Tok1]\nfn helper() {}\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.arg("--git-index")
		.assert()
		.success()
		.stdout(predicates::str::contains("check passed"));

	Ok(())
}

#[test]
fn git_index_requires_check() {
	let mut cmd = common::srcmap_cmd();
	cmd.arg("update")
		.arg("--git-index")
		.write_stdin("")
		.assert()
		.code(2)
		.stderr(predicates::str::contains("--git-index"));
}
