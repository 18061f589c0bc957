//! Test fixtures: targets and package tarballs built with the system `tar`

use crate::config::TargetConfig;
use std::path::Path;
use std::process::Command;

pub(crate) fn linux_target() -> TargetConfig {
    TargetConfig {
        key: "linux-x64".to_string(),
        triple: "x86_64-unknown-linux-musl".to_string(),
        package_suffix: "linux-x64".to_string(),
    }
}

pub(crate) fn windows_target() -> TargetConfig {
    TargetConfig {
        key: "win32-x64".to_string(),
        triple: "x86_64-pc-windows-msvc".to_string(),
        package_suffix: "win32-x64".to_string(),
    }
}

/// Contents of a fake package. An empty file list omits that directory.
#[derive(Debug, Clone)]
pub(crate) struct PackageLayout {
    pub triple: String,
    pub codex_files: Vec<String>,
    pub ripgrep_files: Vec<String>,
}

impl PackageLayout {
    pub(crate) fn complete(target: &TargetConfig) -> Self {
        let (codex, rg) = if target.is_windows() {
            ("codex.exe", "rg.exe")
        } else {
            ("codex", "rg")
        };
        Self {
            triple: target.triple.clone(),
            codex_files: vec![codex.to_string()],
            ripgrep_files: vec![rg.to_string()],
        }
    }
}

fn write_files(dir: &Path, names: &[String]) {
    if names.is_empty() {
        return;
    }
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), format!("{name} binary\n")).unwrap();
    }
    // Nested content must never be copied
    std::fs::create_dir_all(dir.join("nested")).unwrap();
    std::fs::write(dir.join("nested").join("ignored"), b"ignored").unwrap();
}

/// Build a gzip tarball with an npm-style `package/` root
pub(crate) fn build_tarball(layout: &PackageLayout) -> Vec<u8> {
    let temp = tempfile::TempDir::new().unwrap();
    let root = temp.path().join("src");
    let package = root.join("package");
    let vendor = package.join("vendor").join(&layout.triple);

    std::fs::create_dir_all(&package).unwrap();
    std::fs::write(package.join("package.json"), br#"{"name":"@openai/codex"}"#).unwrap();
    write_files(&vendor.join("codex"), &layout.codex_files);
    write_files(&vendor.join("path"), &layout.ripgrep_files);

    let archive = temp.path().join("package.tgz");
    let status = Command::new("tar")
        .arg("-czf")
        .arg(&archive)
        .arg("-C")
        .arg(&root)
        .arg("package")
        .status()
        .unwrap();
    assert!(status.success(), "tar failed to build fixture");

    std::fs::read(archive).unwrap()
}
