//! Integration tests for codex-stage

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    const TARGETS: &str = r#"{
  "codexVersion": "0.46.0",
  "targets": {
    "linux-x64": { "triple": "x86_64-unknown-linux-musl", "packageSuffix": "linux-x64" },
    "win32-x64": { "triple": "x86_64-pc-windows-msvc", "packageSuffix": "win32-x64" }
  }
}"#;

    /// Command isolated from any user config file
    fn codex_stage(root: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("codex-stage");
        cmd.env("CODEX_STAGE_CONFIG", root.join("config.toml"))
            .env_remove("RUST_LOG")
            .arg("--root")
            .arg(root);
        cmd
    }

    fn app_root() -> TempDir {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("scripts")).unwrap();
        std::fs::write(temp.path().join("scripts/codex-targets.json"), TARGETS).unwrap();
        temp
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("codex-stage")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("stage"))
            .stdout(predicate::str::contains("dev"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("codex-stage")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("codex-stage"));
    }

    #[test]
    fn stage_help_lists_selection_flags() {
        cargo_bin_cmd!("codex-stage")
            .args(["stage", "--help"])
            .assert()
            .success()
            .stdout(predicate::str::contains("--all"))
            .stdout(predicate::str::contains("--platform"))
            .stdout(predicate::str::contains("--keep-going"));
    }

    #[test]
    fn unknown_stage_flag_is_tagged_and_exits_one() {
        let root = app_root();
        codex_stage(root.path())
            .args(["stage", "--bogus"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[stage]"))
            .stderr(predicate::str::contains("--bogus"));
    }

    #[test]
    fn unknown_dev_flag_is_tagged_and_exits_one() {
        let root = app_root();
        codex_stage(root.path())
            .args(["dev", "--bogus"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[dev]"));
    }

    #[test]
    fn missing_subcommand_exits_one() {
        let root = app_root();
        codex_stage(root.path())
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[stage]"));
    }

    #[test]
    fn stage_without_selection_fails() {
        let root = app_root();
        codex_stage(root.path())
            .arg("stage")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[stage]"))
            .stderr(predicate::str::contains(
                "Specify --all, --host, or both --platform=<platform> and --arch=<arch>.",
            ));
    }

    #[test]
    fn stage_with_conflicting_modes_fails() {
        let root = app_root();
        codex_stage(root.path())
            .args(["stage", "--all", "--host"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Specify --all"));
    }

    #[test]
    fn stage_unsupported_target_fails() {
        let root = app_root();
        codex_stage(root.path())
            .args(["stage", "--platform=linux", "--arch=ppc"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unsupported target: linux-ppc"));
        assert!(!root.path().join("resources").exists());
    }

    #[test]
    fn host_placeholder_ignores_the_other_value() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("scripts")).unwrap();
        std::fs::write(
            root.path().join("scripts/codex-targets.json"),
            r#"{ "codexVersion": "0.46.0", "targets": {} }"#,
        )
        .unwrap();

        // Resolves to the running machine, which the empty table does not list
        codex_stage(root.path())
            .args(["stage", "--platform=host", "--arch=ppc"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Unsupported target").or(
                predicate::str::contains("Unsupported host architecture"),
            ))
            .stderr(predicate::str::contains("ppc").not());
    }

    #[test]
    fn stage_invalid_version_fails() {
        let root = app_root();
        codex_stage(root.path())
            .args(["stage", "--platform=linux", "--arch=x64", "--version=latest"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Invalid version 'latest'"));
    }

    #[test]
    fn stage_missing_targets_file_fails() {
        let root = TempDir::new().unwrap();
        codex_stage(root.path())
            .args(["stage", "--all"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("Targets file not found"));
    }

    #[test]
    fn invalid_config_file_fails() {
        let root = app_root();
        std::fs::write(root.path().join("config.toml"), "[stage\nroot = ").unwrap();
        codex_stage(root.path())
            .args(["stage", "--all"])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("config.toml"));
    }

    #[cfg(all(
        any(target_os = "linux", target_os = "macos"),
        any(target_arch = "x86_64", target_arch = "aarch64")
    ))]
    #[test]
    fn dev_without_staged_cli_fails() {
        let root = TempDir::new().unwrap();
        codex_stage(root.path())
            .arg("dev")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("[dev]"))
            .stderr(predicate::str::contains("CLI not found at"))
            .stderr(predicate::str::contains("Run: codex-stage stage --host"));
    }
}
