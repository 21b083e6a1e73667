use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use sitedeploy::deploy::{self, DeployContext, DeployPlan, DeployReport};
use sitedeploy::executor::{CommandRunner, LocalShell};
use sitedeploy::host::HostSpec;
use sitedeploy::project;
use sitedeploy::server;
use sitedeploy::ssh::SshClient;

use super::CmdResult;

#[derive(Args)]
pub struct DeployArgs {
    /// Hosts as [user@]host[:port] (defaults to "hosts" in sitedeploy.json)
    pub hosts: Vec<String>,

    /// Local working copy whose HEAD is deployed
    #[arg(long, default_value = ".")]
    pub repo_dir: PathBuf,

    /// Print the commands that would run without executing them
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Serialize)]
pub struct DeployOutput {
    pub command: String,
    pub repo_dir: String,
    pub dry_run: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<DeployReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plans: Vec<DeployPlan>,
}

fn connect(spec: &HostSpec) -> sitedeploy::Result<Box<dyn CommandRunner>> {
    let profile = server::find_for_host(spec.site_name());
    let client = SshClient::for_host(spec, profile.as_ref())?;
    Ok(Box::new(client))
}

pub fn run(args: DeployArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<DeployOutput> {
    let project = project::load(&args.repo_dir)?;
    let hosts = deploy::target_hosts(&project, &args.hosts)?;

    let repo_url = project.resolve_repo_url(&args.repo_dir)?;
    let local = LocalShell::in_dir(&args.repo_dir);

    let mut output = DeployOutput {
        command: "deploy.run".to_string(),
        repo_dir: args.repo_dir.display().to_string(),
        dry_run: args.dry_run,
        results: Vec::new(),
        plans: Vec::new(),
    };

    let ctx = DeployContext {
        project: &project,
        repo_url: &repo_url,
        local: &local,
    };

    if args.dry_run {
        output.plans = deploy::plan_all(&ctx, &hosts)?;
        return Ok((output, 0));
    }

    output.results = deploy::deploy_all(&ctx, &hosts, connect)?;

    Ok((output, 0))
}
