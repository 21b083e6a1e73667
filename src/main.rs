use clap::{Parser, Subcommand};

use commands::GlobalArgs;
use sitedeploy::output;

mod commands;
mod tty;

use commands::{config, deploy, server};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser)]
#[command(name = "sitedeploy")]
#[command(version = VERSION)]
#[command(about = "Pin a remote site checkout to local HEAD, then update dependencies and build")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy the local HEAD commit to one or more hosts
    Deploy(deploy::DeployArgs),
    /// Manage saved SSH server profiles
    Server(server::ServerArgs),
    /// Show the effective project configuration
    Config(config::ConfigArgs),
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    let global = GlobalArgs {};

    let (json_result, exit_code) = commands::run_json(cli.command, &global);
    let exit_code = output::print_json_result(json_result, exit_code);

    std::process::ExitCode::from(exit_code_to_u8(exit_code))
}

fn exit_code_to_u8(code: i32) -> u8 {
    if code <= 0 {
        0
    } else if code >= 255 {
        255
    } else {
        code as u8
    }
}
