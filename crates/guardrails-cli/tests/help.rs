use assert_cmd::Command;

/// Helper to get a Command for the azure-guardrails binary.
#[allow(deprecated)]
fn guardrails_cmd() -> Command {
    Command::cargo_bin("azure-guardrails").unwrap()
}

#[test]
fn help_works() {
    guardrails_cmd().arg("--help").assert().success();
}

#[test]
fn scan_requires_inputs() {
    guardrails_cmd().arg("scan").assert().failure();
}
