mod common;

use srcmap_core::AnyEmptyResult;

const GROUPED_SOURCE: &str =
	"fn top() {}\n// [srcmap-group:Grp1]\nlet a = 1;\n// [end-srcmap-group:Grp1]\n";

#[test]
fn check_reports_drift_then_ack_accepts_it() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("lib.rs"), GROUPED_SOURCE)?;

	// A group without an acknowledged hash is drift.
	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("lib.rs\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("group `Grp1` has changes"))
		.stderr(predicates::str::contains("re-run `srcmap ack`"));

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("ack")
		.write_stdin("lib.rs\n")
		.assert()
		.success()
		.stdout(predicates::str::contains(
			"acknowledged group changes in 1 file(s)",
		));

	// The end marker now embeds a 40-hex fingerprint; the rest of the file
	// is untouched.
	let acked = std::fs::read_to_string(tmp.path().join("lib.rs"))?;
	let hash_start = acked
		.find("[end-srcmap-group:Grp1:")
		.expect("end marker should carry a hash")
		+ "[end-srcmap-group:Grp1:".len();
	let hash = &acked[hash_start..hash_start + 40];
	assert!(hash.bytes().all(|b| b.is_ascii_hexdigit()));
	assert!(acked.starts_with("fn top() {}\n// [srcmap-group:Grp1]\nlet a = 1;\n"));

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("lib.rs\n")
		.assert()
		.success();

	Ok(())
}

#[test]
fn ack_after_acknowledging_is_a_no_op() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("lib.rs"), GROUPED_SOURCE)?;

	// The first run embeds the missing hash; the second has nothing to do.
	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("ack")
		.write_stdin("lib.rs\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("acknowledged group changes"));
	let acked = std::fs::read_to_string(tmp.path().join("lib.rs"))?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("ack")
		.write_stdin("lib.rs\n")
		.assert()
		.success()
		.stdout(predicates::str::contains("no group changes to acknowledge"));

	similar_asserts::assert_eq!(
		std::fs::read_to_string(tmp.path().join("lib.rs"))?,
		acked
	);

	Ok(())
}

#[test]
fn editing_an_acknowledged_group_reports_drift() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	std::fs::write(tmp.path().join("lib.rs"), GROUPED_SOURCE)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("ack")
		.write_stdin("lib.rs\n")
		.assert()
		.success();

	// Change a line inside the group.
	let acked = std::fs::read_to_string(tmp.path().join("lib.rs"))?;
	std::fs::write(
		tmp.path().join("lib.rs"),
		acked.replace("let a = 1;", "let a = 2;"),
	)?;

	let mut cmd = common::srcmap_cmd();
	cmd.current_dir(tmp.path())
		.arg("check")
		.write_stdin("lib.rs\n")
		.assert()
		.code(1)
		.stderr(predicates::str::contains("group `Grp1` has changes"));

	Ok(())
}
