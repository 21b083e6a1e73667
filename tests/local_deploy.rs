//! End-to-end deploys against `localhost`, which runs commands through the
//! local shell instead of ssh. Skipped when git is not installed.
#![cfg(unix)]

use sitedeploy::deploy::{self, DeployContext, SourceAction};
use sitedeploy::executor::LocalShell;
use sitedeploy::host::HostSpec;
use sitedeploy::output::exit_code_for_error;
use sitedeploy::project::ProjectConfig;
use sitedeploy::ssh::SshClient;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::Command;
use tempfile::{tempdir, TempDir};

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=sitedeploy", "-c", "user.email=sitedeploy@localhost"])
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn commit(dir: &Path, file: &str, content: &str) -> String {
    fs::write(dir.join(file), content).unwrap();
    git(dir, &["add", file]);
    git(dir, &["commit", "-q", "-m", file]);
    git(dir, &["rev-parse", "HEAD"])
}

/// Stand-in package manager: appends its arguments to `pm.log` and exits
/// with `code` when asked to run `fail_on`.
fn fake_package_manager(root: &Path, fail_on: Option<(&str, i32)>) -> String {
    let path = root.join("fake-pm");
    let log = root.join("pm.log");
    let mut script = format!("#!/bin/sh\necho \"$@\" >> {}\n", log.display());
    if let Some((arg, code)) = fail_on {
        script.push_str(&format!("[ \"$1\" = \"{}\" ] && exit {}\nexit 0\n", arg, code));
    }
    fs::write(&path, script).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path.display().to_string()
}

struct Fixture {
    root: TempDir,
    project: ProjectConfig,
    repo_url: String,
}

impl Fixture {
    fn new(fail_on: Option<(&str, i32)>) -> Self {
        let root = tempdir().unwrap();
        let source = root.path().join("source");
        fs::create_dir(&source).unwrap();
        git(&source, &["init", "-q"]);

        let project = ProjectConfig {
            sites_root: root.path().join("sites").display().to_string(),
            package_manager: fake_package_manager(root.path(), fail_on),
            ..ProjectConfig::default()
        };
        let repo_url = source.display().to_string();

        Self {
            root,
            project,
            repo_url,
        }
    }

    fn source(&self) -> std::path::PathBuf {
        self.root.path().join("source")
    }

    fn site(&self) -> std::path::PathBuf {
        self.root.path().join("sites").join("localhost")
    }

    fn pm_log(&self) -> Vec<String> {
        fs::read_to_string(self.root.path().join("pm.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn deploy(&self) -> sitedeploy::Result<sitedeploy::deploy::DeployReport> {
        let local = LocalShell::in_dir(self.source());
        let ctx = DeployContext {
            project: &self.project,
            repo_url: &self.repo_url,
            local: &local,
        };
        let remote = SshClient::for_host(&HostSpec::parse("localhost")?, None)?;
        deploy::deploy(&ctx, &remote, "localhost")
    }
}

#[test]
fn first_deploy_clones_and_later_deploys_fetch() {
    if !git_available() {
        return;
    }
    let fixture = Fixture::new(None);
    let first = commit(&fixture.source(), "index.html", "one");

    let report = fixture.deploy().unwrap();
    assert_eq!(report.source, SourceAction::Cloned);
    assert_eq!(report.commit, first);
    assert_eq!(git(&fixture.site(), &["rev-parse", "HEAD"]), first);
    assert_eq!(fixture.pm_log(), vec!["update", "run build"]);

    let second = commit(&fixture.source(), "index.html", "two");
    let report = fixture.deploy().unwrap();
    assert_eq!(report.source, SourceAction::Fetched);
    assert_eq!(report.commit, second);
    assert_eq!(git(&fixture.site(), &["rev-parse", "HEAD"]), second);
    assert_eq!(
        fs::read_to_string(fixture.site().join("index.html")).unwrap(),
        "two"
    );
    assert_eq!(fixture.pm_log().len(), 4);
}

#[test]
fn local_edits_on_the_server_are_discarded() {
    if !git_available() {
        return;
    }
    let fixture = Fixture::new(None);
    commit(&fixture.source(), "index.html", "one");
    fixture.deploy().unwrap();

    fs::write(fixture.site().join("index.html"), "hotfix").unwrap();
    fixture.deploy().unwrap();

    assert_eq!(
        fs::read_to_string(fixture.site().join("index.html")).unwrap(),
        "one"
    );
}

#[test]
fn failing_build_reports_its_exit_code() {
    if !git_available() {
        return;
    }
    let fixture = Fixture::new(Some(("run", 3)));
    let head = commit(&fixture.source(), "index.html", "one");

    let err = fixture.deploy().unwrap_err();
    assert_eq!(err.code.as_str(), "remote.command_failed");
    assert_eq!(err.details["step"], "build");
    assert_eq!(exit_code_for_error(&err), 3);

    // Source sync is not rolled back.
    assert_eq!(git(&fixture.site(), &["rev-parse", "HEAD"]), head);
}

#[test]
fn outside_a_repository_head_cannot_be_resolved() {
    if !git_available() {
        return;
    }
    let dir = tempdir().unwrap();
    let err = deploy::resolve_head(&LocalShell::in_dir(dir.path())).unwrap_err();
    assert_eq!(err.code.as_str(), "git.command_failed");
}
