pub type CmdResult<T> = sitedeploy::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod config;
pub mod deploy;
pub mod server;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        sitedeploy::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (sitedeploy::Result<serde_json::Value>, i32) {
    crate::tty::status("sitedeploy is working...");

    match command {
        crate::Commands::Deploy(args) => dispatch!(args, global, deploy),
        crate::Commands::Server(args) => dispatch!(args, global, server),
        crate::Commands::Config(args) => dispatch!(args, global, config),
    }
}
