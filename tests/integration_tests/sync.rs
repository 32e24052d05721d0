//! End-to-end runs of `versync <UPDATE_MANIFESTS> <VERSION>` against mock tools.

use rstest::rstest;

use crate::common::{MANIFEST_DIRS, TestProject, describe};

const NPM_ARGS: &str = "version 2.0.0 --no-git-tag-version --allow-same-version";
const BUMP_ARGS: &str = "bump --new-version 2.0.0 --allow-dirty";

#[test]
fn test_updates_manifests_in_order_then_bumps() {
    let project = TestProject::new();
    let output = project.versync().args(["1", "2.0.0"]).output().unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    assert_eq!(
        project.calls(),
        vec![
            project.call("npm", "src/api", NPM_ARGS),
            project.call("npm", "src/viewer", NPM_ARGS),
            project.call("npm", "src/packaged-viewer", NPM_ARGS),
            project.call("bump-my-version", ".", BUMP_ARGS),
        ]
    );
    for dir in MANIFEST_DIRS {
        assert_eq!(project.manifest_version(dir), "{\"version\":\"2.0.0\"}\n");
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("Synchronized version 2.0.0 (3 manifests + full bump)"),
        "{stdout}"
    );
}

#[rstest]
#[case("0")]
#[case("true")]
#[case("yes")]
fn test_other_flag_values_only_bump(#[case] flag: &str) {
    let project = TestProject::new();
    let output = project.versync().args([flag, "2.0.0"]).output().unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    assert_eq!(
        project.calls(),
        vec![project.call("bump-my-version", ".", BUMP_ARGS)]
    );
    // Manifests untouched
    for dir in MANIFEST_DIRS {
        assert_eq!(project.manifest_version(dir), "{\"version\":\"1.0.0\"}\n");
    }
}

#[test]
fn test_child_output_goes_to_stderr() {
    let project = TestProject::new();
    let output = project.versync().args(["1", "2.0.0"]).output().unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    // The npm mock echoes `v<version>` on its stdout
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.lines().any(|l| l == "v2.0.0"), "{stdout}");
    assert_eq!(stderr.lines().filter(|l| *l == "v2.0.0").count(), 3, "{stderr}");
}

#[rstest]
#[case("api", 1)]
#[case("viewer", 2)]
#[case("packaged-viewer", 3)]
fn test_manifest_failure_stops_everything_after_it(
    #[case] failing: &str,
    #[case] calls_made: usize,
) {
    let project = TestProject::new();
    let output = project
        .versync()
        .args(["1", "2.0.0"])
        .env("MOCK_NPM_FAIL_IN", failing)
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(3), "{}", describe(&output));

    let calls = project.calls();
    assert_eq!(calls.len(), calls_made, "{calls:#?}");
    assert!(calls.iter().all(|c| c.starts_with("npm ")), "{calls:#?}");
    assert!(calls.last().unwrap().contains(failing));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Manifest update failed in"), "{stderr}");
    assert!(stderr.contains(&format!("src/{failing}")), "{stderr}");
    // Child stderr is passed through untouched
    assert!(
        stderr.contains(&format!("npm ERR! mock failure in {failing}")),
        "{stderr}"
    );
}

#[test]
fn test_earlier_manifests_are_not_rolled_back() {
    let project = TestProject::new();
    let output = project
        .versync()
        .args(["1", "2.0.0"])
        .env("MOCK_NPM_FAIL_IN", "viewer")
        .output()
        .unwrap();
    assert!(!output.status.success());

    assert_eq!(
        project.manifest_version("src/api"),
        "{\"version\":\"2.0.0\"}\n"
    );
    assert_eq!(
        project.manifest_version("src/packaged-viewer"),
        "{\"version\":\"1.0.0\"}\n"
    );
}

#[test]
fn test_full_bump_failure_propagates_exit_code() {
    let project = TestProject::new();
    let output = project
        .versync()
        .args(["0", "2.0.0"])
        .env("MOCK_BUMP_EXIT", "4")
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(4), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Full-project version bump failed"), "{stderr}");
    assert!(stderr.contains("exit status: 4"), "{stderr}");
}

#[test]
fn test_missing_flag_is_invalid_argument() {
    let project = TestProject::new();
    let output = project.versync().output().unwrap();

    assert_eq!(output.status.code(), Some(2), "{}", describe(&output));
    assert!(project.calls().is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid argument"), "{stderr}");
    assert!(stderr.contains("UPDATE_MANIFESTS"), "{stderr}");
}

#[rstest]
#[case(&["1"])]
#[case(&["1", ""])]
fn test_missing_or_empty_version_is_invalid_argument(#[case] args: &[&str]) {
    let project = TestProject::new();
    let output = project.versync().args(args).output().unwrap();

    assert_eq!(output.status.code(), Some(2), "{}", describe(&output));
    assert!(project.calls().is_empty());
}

#[test]
fn test_rerun_with_same_version_is_idempotent() {
    let project = TestProject::new();
    for _ in 0..2 {
        let output = project.versync().args(["1", "2.0.0"]).output().unwrap();
        assert!(output.status.success(), "{}", describe(&output));
    }

    assert_eq!(project.calls().len(), 8);
    for dir in MANIFEST_DIRS {
        assert_eq!(project.manifest_version(dir), "{\"version\":\"2.0.0\"}\n");
    }
}

#[test]
fn test_version_passed_verbatim() {
    let project = TestProject::new();
    let output = project
        .versync()
        .args(["0", "2.0.0-rc.1+build.7"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", describe(&output));

    assert_eq!(
        project.calls(),
        vec![project.call(
            "bump-my-version",
            ".",
            "bump --new-version 2.0.0-rc.1+build.7 --allow-dirty"
        )]
    );
}

#[test]
fn test_unknown_tool_exits_127() {
    let project = TestProject::new();
    project.write_project_config("bump-command = \"versync-no-such-tool {{ version }}\"\n");

    let output = project.versync().args(["0", "2.0.0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(127), "{}", describe(&output));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Failed to execute versync-no-such-tool"),
        "{stderr}"
    );
}

#[test]
fn test_children_read_versync_stdin() {
    use std::io::Write;
    use std::process::Stdio;

    let project = TestProject::new();
    project.write_project_config(
        r#"bump-command = "sh -c 'read answer; test \"$answer\" = hello' {{ version }}""#,
    );

    let mut child = project
        .versync()
        .args(["0", "2.0.0"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(b"hello\n").unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success(), "{}", describe(&output));
}
