use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;

use sitedeploy::paths;
use sitedeploy::project::{self, ProjectConfig};

use super::CmdResult;

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Show the project configuration with defaults applied
    Show {
        /// Local working copy holding sitedeploy.json
        #[arg(long, default_value = ".")]
        repo_dir: PathBuf,
    },
}

#[derive(Serialize)]
pub struct ConfigOutput {
    command: String,
    path: String,
    exists: bool,
    config: ProjectConfig,
    /// Resolved clone URL, null when neither repoUrl nor origin is set.
    repo_url: Option<String>,
    servers_dir: Option<String>,
}

pub fn run(args: ConfigArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ConfigOutput> {
    match args.command {
        ConfigCommand::Show { repo_dir } => {
            let path = paths::project_config(&repo_dir);
            let config = project::load(&repo_dir)?;
            let repo_url = config.resolve_repo_url(&repo_dir).ok();

            Ok((
                ConfigOutput {
                    command: "config.show".to_string(),
                    path: path.display().to_string(),
                    exists: path.exists(),
                    config,
                    repo_url,
                    servers_dir: paths::servers().ok().map(|p| p.display().to_string()),
                },
                0,
            ))
        }
    }
}
