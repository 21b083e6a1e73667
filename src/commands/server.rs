use clap::{Args, Subcommand};
use serde::Serialize;

use sitedeploy::server::{self, Server};

use super::CmdResult;

#[derive(Default, Serialize)]
pub struct ServerOutput {
    command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    server_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<Server>,
    #[serde(skip_serializing_if = "Option::is_none")]
    servers: Option<Vec<Server>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deleted: Option<Vec<String>>,
}

#[derive(Args)]
pub struct ServerArgs {
    #[command(subcommand)]
    command: ServerCommand,
}

#[derive(Subcommand)]
enum ServerCommand {
    /// Save connection settings for a host
    Create {
        /// Server ID (use the host name to apply it automatically on deploy)
        id: String,
        /// SSH host
        #[arg(long)]
        host: String,
        /// SSH username
        #[arg(long)]
        user: Option<String>,
        /// SSH port (default: 22)
        #[arg(long, default_value_t = 22)]
        port: u16,
        /// Private key passed to ssh -i
        #[arg(long)]
        identity_file: Option<String>,
    },
    /// Display server configuration
    Show {
        /// Server ID
        server_id: String,
    },
    /// List saved servers
    List,
    /// Delete a server profile
    Delete {
        /// Server ID
        server_id: String,
    },
}

pub fn run(args: ServerArgs, _global: &crate::commands::GlobalArgs) -> CmdResult<ServerOutput> {
    match args.command {
        ServerCommand::Create {
            id,
            host,
            user,
            port,
            identity_file,
        } => {
            let server = server::create(Server {
                id,
                host,
                user,
                port,
                identity_file,
            })?;
            Ok((
                ServerOutput {
                    command: "server.create".to_string(),
                    server_id: Some(server.id.clone()),
                    server: Some(server),
                    ..Default::default()
                },
                0,
            ))
        }
        ServerCommand::Show { server_id } => {
            let server = server::load(&server_id)?;
            Ok((
                ServerOutput {
                    command: "server.show".to_string(),
                    server_id: Some(server_id),
                    server: Some(server),
                    ..Default::default()
                },
                0,
            ))
        }
        ServerCommand::List => Ok((
            ServerOutput {
                command: "server.list".to_string(),
                servers: Some(server::list()?),
                ..Default::default()
            },
            0,
        )),
        ServerCommand::Delete { server_id } => {
            server::delete(&server_id)?;
            Ok((
                ServerOutput {
                    command: "server.delete".to_string(),
                    server_id: Some(server_id.clone()),
                    deleted: Some(vec![server_id]),
                    ..Default::default()
                },
                0,
            ))
        }
    }
}
