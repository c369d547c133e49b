mod common;

use srcmap_core::AnyEmptyResult;

#[test]
fn update_assigns_tokens_and_rewrites_links() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::create_dir(tmp.path().join("src"))?;
	std::fs::write(
		tmp.path().join("src/lib.rs"),
		"fn a() {}\n// [srcmap]\nfn b() {}\n",
	)?;
	std::fs::write(tmp.path().join("readme.md"), "# stub\n")?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.write_stdin("src/lib.rs\nreadme.md\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("assigned token"));

	// The marker now carries a token.
	let rewritten = std::fs::read_to_string(tmp.path().join("src/lib.rs"))?;
	let start = rewritten.find("[srcmap:").expect("marker should be assigned") + "[srcmap:".len();
	let end = rewritten[start..].find(']').expect("marker should close") + start;
	let token = &rewritten[start..end];
	assert!(!token.is_empty());

	// Reference the token from the readme and update again.
	std::fs::write(
		tmp.path().join("readme.md"),
		format!("see [<!--srcmap:{token}-->](x)\n"),
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.write_stdin("src/lib.rs\nreadme.md\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("updated 1 documentation file"));

	// The comment-only marker annotates the line below it.
	let readme = std::fs::read_to_string(tmp.path().join("readme.md"))?;
	similar_asserts::assert_eq!(readme, format!("see [<!--srcmap:{token}-->](src/lib.rs#L3)\n"));

	Ok(())
}

#[test]
fn update_is_idempotent() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("main.rs"),
		"fn main() {}\n// [srcmap:Stable1]\nfn helper() {}\n",
	)?;
	std::fs::write(
		tmp.path().join("readme.md"),
		"[<!--srcmap:Stable1-->](main.rs#L3)\n",
	)?;
	let before_src = std::fs::read_to_string(tmp.path().join("main.rs"))?;
	let before_doc = std::fs::read_to_string(tmp.path().join("readme.md"))?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.write_stdin("main.rs\nreadme.md\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("up to date"));

	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("main.rs"))?,
		before_src
	);
	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("readme.md"))?,
		before_doc
	);

	Ok(())
}

#[test]
fn update_accepts_nul_delimited_paths() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.rs"), "fn a() {}\n// [srcmap]\nfn b() {}\n")?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.arg("--stdin0")
		.write_stdin("./a.rs\0")
		.assert()
		.success()
		.stdout(predicates::str::contains("assigned token"));

	Ok(())
}

#[test]
fn update_warns_about_unreferenced_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("a.rs"),
		"fn a() {}\n// [srcmap:Lonely1]\nfn b() {}\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.write_stdin("a.rs\n")
		.assert()
		.success()
		.stderr(predicates::str::contains("Lonely1"))
		.stderr(predicates::str::contains("not referenced"));

	Ok(())
}

#[test]
fn no_unused_applies_to_update_runs() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(
		tmp.path().join("a.rs"),
		"fn a() {}\n// [srcmap:Lonely1]\nfn b() {}\n",
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.arg("--no-unused")
		.write_stdin("a.rs\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("unused tokens"));

	Ok(())
}

#[test]
fn update_fails_on_duplicate_tokens() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("a.rs"), "// [srcmap:Twice1]\nfn a() {}\n")?;
	std::fs::write(tmp.path().join("b.rs"), "// [srcmap:Twice1]\nfn b() {}\n")?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("update")
		.write_stdin("a.rs\nb.rs\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("Twice1"));

	Ok(())
}
