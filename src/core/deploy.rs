use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::time::Instant;

use crate::error::{
    Error, GitCommandFailedDetails, RemoteCommandFailedDetails, Result, SshConnectFailedDetails,
    TargetDetails,
};
use crate::executor::CommandRunner;
use crate::git;
use crate::host::HostSpec;
use crate::npm::{self, DependencyAction};
use crate::project::ProjectConfig;
use crate::ssh::CommandOutput;
use crate::utils::command::{pick_error_text, tail_lines};

// Output kept in error details; npm can be chatty.
const OUTPUT_TAIL_LINES: usize = 200;
// Output kept per step in the report.
const STEP_OUTPUT_LINES: usize = 20;

/// Placeholder shown in plans when the local HEAD has not been resolved.
pub const HEAD_PLACEHOLDER: &str = "<HEAD>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sync,
    DependencyUpdate,
    Build,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    CheckSource,
    Fetch,
    Clone,
    ResolveHead,
    Reset,
    Dependencies,
    Build,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::CheckSource => "check_source",
            Step::Fetch => "fetch",
            Step::Clone => "clone",
            Step::ResolveHead => "resolve_head",
            Step::Reset => "reset",
            Step::Dependencies => "dependencies",
            Step::Build => "build",
        }
    }

    pub fn phase(&self) -> Phase {
        match self {
            Step::Dependencies => Phase::DependencyUpdate,
            Step::Build => Phase::Build,
            _ => Phase::Sync,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Remote,
    Local,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceAction {
    Cloned,
    Fetched,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepResult {
    pub step: Step,
    pub phase: Phase,
    pub location: Location,
    pub command: String,
    pub exit_code: i32,
    pub duration_ms: u64,
    /// Last lines of stdout.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub output: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployReport {
    pub host: String,
    pub target: String,
    pub site_dir: String,
    pub repo_url: String,
    pub commit: String,
    pub source: SourceAction,
    pub dependency_action: DependencyAction,
    pub steps: Vec<StepResult>,
    pub started_at: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedStep {
    pub step: Step,
    pub phase: Phase,
    pub location: Location,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<&'static str>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeployPlan {
    pub host: String,
    pub site_dir: String,
    pub repo_url: String,
    pub commit: String,
    pub steps: Vec<PlannedStep>,
}

/// Everything a deploy needs besides the remote target itself.
pub struct DeployContext<'a> {
    pub project: &'a ProjectConfig,
    pub repo_url: &'a str,
    /// Runs `git log` in the local working copy.
    pub local: &'a dyn CommandRunner,
}

struct Run<'a> {
    remote: &'a dyn CommandRunner,
    host: &'a str,
    site_dir: String,
    steps: Vec<StepResult>,
}

impl<'a> Run<'a> {
    fn record(
        &mut self,
        step: Step,
        location: Location,
        command: &str,
        output: &CommandOutput,
        started: Instant,
    ) {
        let tail = tail_lines(&output.stdout, STEP_OUTPUT_LINES);
        for line in tail.lines() {
            log_status!("deploy", "[{}]   {}", self.host, line);
        }

        self.steps.push(StepResult {
            step,
            phase: step.phase(),
            location,
            command: command.to_string(),
            exit_code: output.exit_code,
            duration_ms: started.elapsed().as_millis() as u64,
            output: tail,
        });
    }

    fn execute(&mut self, step: Step, command: &str) -> Result<CommandOutput> {
        log_status!("deploy", "[{}] {}", self.host, command);
        let started = Instant::now();
        let output = self.remote.execute(command);
        self.record(step, Location::Remote, command, &output, started);

        if !output.success && self.remote.is_connection_failure(&output) {
            return Err(Error::ssh_connect_failed(SshConnectFailedDetails {
                host: self.remote.describe(),
                command: command.to_string(),
                exit_code: output.exit_code,
                stderr: output.stderr.trim().to_string(),
            }));
        }
        Ok(output)
    }

    /// Execute a remote command that must exit zero.
    fn require(&mut self, step: Step, command: &str) -> Result<CommandOutput> {
        let output = self.execute(step, command)?;
        if output.success {
            return Ok(output);
        }
        Err(self.command_failed(step, command, &output))
    }

    fn command_failed(&self, step: Step, command: &str, output: &CommandOutput) -> Error {
        Error::remote_command_failed(RemoteCommandFailedDetails {
            step: step.as_str().to_string(),
            command: command.to_string(),
            exit_code: output.exit_code,
            stdout: tail_lines(&output.stdout, OUTPUT_TAIL_LINES),
            stderr: tail_lines(&output.stderr, OUTPUT_TAIL_LINES),
            target: TargetDetails {
                host: Some(self.remote.describe()),
                site_dir: Some(self.site_dir.clone()),
            },
        })
    }

    /// `test -d` exits 1 when the directory is missing; that is a branch, not a failure.
    fn checkout_exists(&mut self) -> Result<bool> {
        let command = git::checkout_exists_command(&self.site_dir);
        let output = self.execute(Step::CheckSource, &command)?;
        match output.exit_code {
            0 => Ok(true),
            1 => Ok(false),
            _ => Err(self.command_failed(Step::CheckSource, &command, &output)),
        }
    }

    fn resolve_head(&mut self, local: &dyn CommandRunner) -> Result<String> {
        let started = Instant::now();
        let output = local.execute(git::HEAD_COMMAND);
        self.record(Step::ResolveHead, Location::Local, git::HEAD_COMMAND, &output, started);
        head_from_output(local, &output)
    }
}

fn head_from_output(local: &dyn CommandRunner, output: &CommandOutput) -> Result<String> {
    if !output.success {
        return Err(Error::git_command_failed(
            "Could not read the local HEAD commit",
            GitCommandFailedDetails {
                command: git::HEAD_COMMAND.to_string(),
                exit_code: output.exit_code,
                output: pick_error_text(&output.stdout, &output.stderr),
            },
        )
        .with_hint(format!("Run from inside the repository ({})", local.describe())));
    }

    git::parse_head(&output.stdout)
}

/// Full hash of the local HEAD commit.
pub fn resolve_head(local: &dyn CommandRunner) -> Result<String> {
    let output = local.execute(git::HEAD_COMMAND);
    head_from_output(local, &output)
}

fn no_hosts() -> Error {
    Error::validation_missing_argument(vec!["hosts".to_string()])
        .with_hint("Usage: sitedeploy deploy <host> [hosts...]")
        .with_hint("Or list default hosts under \"hosts\" in sitedeploy.json")
}

/// Hosts named by the caller, or the project's default `hosts` when none are.
pub fn target_hosts(project: &ProjectConfig, requested: &[String]) -> Result<Vec<HostSpec>> {
    let inputs = if requested.is_empty() {
        &project.hosts[..]
    } else {
        requested
    };

    let hosts = inputs
        .iter()
        .map(|h| HostSpec::parse(h))
        .collect::<Result<Vec<_>>>()?;
    if hosts.is_empty() {
        return Err(no_hosts());
    }
    Ok(hosts)
}

fn require_host(host: &str) -> Result<&str> {
    let host = host.trim();
    if host.is_empty() {
        return Err(Error::validation_invalid_argument("host", "Host is empty", None));
    }
    Ok(host)
}

/// Sync the remote site directory to local HEAD, update dependencies and build.
///
/// Commands run strictly in order and the first failure aborts the rest.
/// Nothing is rolled back: a failed dependency update leaves the source
/// synced.
pub fn deploy(ctx: &DeployContext, remote: &dyn CommandRunner, host: &str) -> Result<DeployReport> {
    let host = require_host(host)?;
    let started_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
    let started = Instant::now();

    let mut run = Run {
        remote,
        host,
        site_dir: ctx.project.site_dir(host),
        steps: Vec::new(),
    };

    // Sync
    let source = if run.checkout_exists()? {
        run.require(Step::Fetch, &git::fetch_command(&run.site_dir))?;
        SourceAction::Fetched
    } else {
        run.require(Step::Clone, &git::clone_command(ctx.repo_url, &run.site_dir))?;
        SourceAction::Cloned
    };
    let commit = run.resolve_head(ctx.local)?;
    run.require(Step::Reset, &git::reset_command(&run.site_dir, &commit))?;

    // DependencyUpdate
    let project = ctx.project;
    run.require(
        Step::Dependencies,
        &npm::dependency_command(&project.package_manager, project.dependency_action, &run.site_dir),
    )?;

    // Build
    run.require(
        Step::Build,
        &npm::build_command(&project.package_manager, &project.build_script, &run.site_dir),
    )?;

    log_status!("deploy", "[{}] Deployed {} to {}", host, commit, run.site_dir);

    Ok(DeployReport {
        host: host.to_string(),
        target: remote.describe(),
        site_dir: run.site_dir,
        repo_url: ctx.repo_url.to_string(),
        commit,
        source,
        dependency_action: project.dependency_action,
        steps: run.steps,
        started_at,
        duration_ms: started.elapsed().as_millis() as u64,
    })
}

/// Deploy to each host in turn. The first failing host stops the run.
pub fn deploy_all<F>(ctx: &DeployContext, hosts: &[HostSpec], mut connect: F) -> Result<Vec<DeployReport>>
where
    F: FnMut(&HostSpec) -> Result<Box<dyn CommandRunner>>,
{
    if hosts.is_empty() {
        return Err(no_hosts());
    }

    let mut reports = Vec::with_capacity(hosts.len());
    for (index, spec) in hosts.iter().enumerate() {
        let outcome = connect(spec).and_then(|remote| deploy(ctx, remote.as_ref(), spec.site_name()));

        match outcome {
            Ok(report) => reports.push(report),
            Err(mut err) => {
                if !reports.is_empty() {
                    let done: Vec<&str> = reports.iter().map(|r| r.host.as_str()).collect();
                    err = err.with_hint(format!("Already deployed: {}", done.join(", ")));
                }
                let skipped: Vec<String> = hosts[index + 1..].iter().map(|h| h.to_string()).collect();
                if !skipped.is_empty() {
                    err = err.with_hint(format!("Not attempted: {}", skipped.join(", ")));
                }
                return Err(err);
            }
        }
    }

    Ok(reports)
}

/// Commands `deploy` would run for `host`, without running any of them.
pub fn plan(project: &ProjectConfig, repo_url: &str, host: &str, commit: Option<&str>) -> Result<DeployPlan> {
    let host = require_host(host)?;
    let site_dir = project.site_dir(host);
    let commit = commit.unwrap_or(HEAD_PLACEHOLDER).to_string();

    let planned = |step: Step, location: Location, command: String, condition: Option<&'static str>| {
        PlannedStep {
            step,
            phase: step.phase(),
            location,
            command,
            condition,
        }
    };

    let steps = vec![
        planned(Step::CheckSource, Location::Remote, git::checkout_exists_command(&site_dir), None),
        planned(
            Step::Fetch,
            Location::Remote,
            git::fetch_command(&site_dir),
            Some("checkout exists"),
        ),
        planned(
            Step::Clone,
            Location::Remote,
            git::clone_command(repo_url, &site_dir),
            Some("checkout missing"),
        ),
        planned(Step::ResolveHead, Location::Local, git::HEAD_COMMAND.to_string(), None),
        planned(Step::Reset, Location::Remote, git::reset_command(&site_dir, &commit), None),
        planned(
            Step::Dependencies,
            Location::Remote,
            npm::dependency_command(&project.package_manager, project.dependency_action, &site_dir),
            None,
        ),
        planned(
            Step::Build,
            Location::Remote,
            npm::build_command(&project.package_manager, &project.build_script, &site_dir),
            None,
        ),
    ];

    Ok(DeployPlan {
        host: host.to_string(),
        site_dir,
        repo_url: repo_url.to_string(),
        commit,
        steps,
    })
}

/// Plans for every host against the local HEAD. Only the local `git log` runs.
pub fn plan_all(ctx: &DeployContext, hosts: &[HostSpec]) -> Result<Vec<DeployPlan>> {
    if hosts.is_empty() {
        return Err(no_hosts());
    }

    let head = resolve_head(ctx.local)?;
    hosts
        .iter()
        .map(|spec| plan(ctx.project, ctx.repo_url, spec.site_name(), Some(&head)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_map_to_phases() {
        assert_eq!(Step::Clone.phase(), Phase::Sync);
        assert_eq!(Step::ResolveHead.phase(), Phase::Sync);
        assert_eq!(Step::Dependencies.phase(), Phase::DependencyUpdate);
        assert_eq!(Step::Build.phase(), Phase::Build);
    }

    #[test]
    fn plan_lists_both_sync_branches() {
        let project = ProjectConfig::default();
        let plan = plan(&project, "git@github.com:alamastor/interpreter.git", "example.com", None).unwrap();

        let commands: Vec<&str> = plan.steps.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(
            commands,
            vec![
                "test -d ~/sites/example.com/.git",
                "cd ~/sites/example.com && git fetch",
                "git clone git@github.com:alamastor/interpreter.git ~/sites/example.com",
                "git log -n 1 --format=%H",
                "cd ~/sites/example.com && git reset --hard '<HEAD>'",
                "cd ~/sites/example.com && npm update",
                "cd ~/sites/example.com && npm run build",
            ]
        );
        assert_eq!(plan.steps[3].location, Location::Local);
        assert_eq!(plan.commit, HEAD_PLACEHOLDER);
    }

    #[test]
    fn target_hosts_fall_back_to_project_hosts() {
        let project = ProjectConfig {
            hosts: vec!["a.example.com".to_string(), "deploy@b.example.com:2222".to_string()],
            ..ProjectConfig::default()
        };

        let hosts = target_hosts(&project, &[]).unwrap();
        let names: Vec<&str> = hosts.iter().map(|h| h.site_name()).collect();
        assert_eq!(names, vec!["a.example.com", "b.example.com"]);

        let explicit = target_hosts(&project, &["c.example.com".to_string()]).unwrap();
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit[0].host, "c.example.com");
    }

    #[test]
    fn target_hosts_without_any_host_is_usage_error() {
        let err = target_hosts(&ProjectConfig::default(), &[]).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.missing_argument");
        assert!(err.hints.iter().any(|h| h.message.contains("sitedeploy.json")));
    }

    #[test]
    fn target_hosts_rejects_bad_config_host() {
        let project = ProjectConfig {
            hosts: vec!["-Jevil.example".to_string()],
            ..ProjectConfig::default()
        };
        assert!(target_hosts(&project, &[]).is_err());
    }

    #[test]
    fn plan_rejects_empty_host() {
        let err = plan(&ProjectConfig::default(), "url", "  ", None).unwrap_err();
        assert_eq!(err.code.as_str(), "validation.invalid_argument");
    }
}
