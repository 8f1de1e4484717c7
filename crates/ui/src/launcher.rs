use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

/// Opens `url` in the platform browser without blocking the UI.
pub(crate) fn open_url(url: &str) -> anyhow::Result<Child> {
    anyhow::ensure!(
        url.starts_with("https://") || url.starts_with("http://"),
        "refusing to open non-web url {url:?}"
    );

    let mut cmd = opener_command(url)?;
    // Child must not inherit raw-mode stdin.
    cmd.stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    cmd.spawn().map_err(Into::into)
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> anyhow::Result<Command> {
    let mut cmd = Command::new("open");
    cmd.arg(url);
    Ok(cmd)
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> anyhow::Result<Command> {
    let mut cmd = Command::new("cmd");
    cmd.args(["/C", "start", ""]).arg(url);
    Ok(cmd)
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> anyhow::Result<Command> {
    let opener = find_on_path("xdg-open")
        .ok_or_else(|| anyhow::anyhow!("`xdg-open` not found on PATH"))?;
    let mut cmd = Command::new(opener);
    cmd.arg(url);
    Ok(cmd)
}

#[cfg_attr(any(target_os = "macos", target_os = "windows"), allow(dead_code))]
fn find_on_path(name: &str) -> Option<PathBuf> {
    let paths = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&paths) {
        if dir.as_os_str().is_empty() {
            continue;
        }
        let candidate = dir.join(name);
        if is_probably_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

#[cfg_attr(any(target_os = "macos", target_os = "windows"), allow(dead_code))]
fn is_probably_executable(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt as _;
        std::fs::metadata(path).is_ok_and(|meta| meta.permissions().mode() & 0o111 != 0)
    }

    #[cfg(not(unix))]
    {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn rejects_non_web_urls() {
        assert!(open_url("file:///etc/passwd").is_err());
        assert!(open_url("javascript:alert(1)").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn executable_bit_is_required() {
        use std::os::unix::fs::PermissionsExt as _;

        let base =
            std::env::temp_dir().join(format!("aikesif-launcher-test-{}", std::process::id()));
        let _ = fs::remove_dir_all(&base);
        fs::create_dir_all(&base).unwrap();
        let bin = base.join("xdg-open");
        fs::write(&bin, b"#!/bin/sh\nexit 0\n").unwrap();

        let mut perms = fs::metadata(&bin).unwrap().permissions();
        perms.set_mode(0o644);
        fs::set_permissions(&bin, perms.clone()).unwrap();
        assert!(!is_probably_executable(&bin));

        perms.set_mode(0o755);
        fs::set_permissions(&bin, perms).unwrap();
        assert!(is_probably_executable(&bin));
        assert!(!is_probably_executable(&base));

        let _ = fs::remove_dir_all(&base);
    }
}
