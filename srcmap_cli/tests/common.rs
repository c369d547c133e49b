use assert_cmd::Command;

pub fn srcmap_cmd() -> Command {
	let mut cmd = Command::cargo_bin("srcmap").expect("srcmap binary should build");
	cmd.env("NO_COLOR", "1");
	cmd
}
