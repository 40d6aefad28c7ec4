// Server command - start HTTP lookup server
use anyhow::Result;
use clap::Args;
use crossref_index::constants;

use super::utils::{BuildArgs, GlobalArgs};

#[derive(Args)]
#[command(
    about = "Start the HTTP lookup server",
    long_about = "Serve DOI lookups over HTTP. On startup the index is opened, or built
first when it does not exist yet (existing indexes are never rebuilt
automatically; use 'build --force' for that).

Endpoints:
  GET /id?doi=<doi>                      record as pretty JSON (404 if unknown)
  GET /random?shards=&per_shard=&seed=   random DOIs for test traffic
  GET /status                            index and lookup statistics",
    help_template = crate::clap_help!(
        examples: "  # Serve the dump in $DUMP_PATH on port 9098\n  \
                   {bin} serve\n\n  \
                   # Custom directory, host and port\n  \
                   {bin} serve -C /data/crossref --host 0.0.0.0 --port 3000"
    )
)]
pub struct ServerCommand {
    /// HTTP server port
    #[arg(long, default_value_t = constants::DEFAULT_SERVER_PORT, help_heading = "Server Options")]
    pub port: u16,

    /// HTTP server host
    #[arg(long, default_value = "127.0.0.1", help_heading = "Server Options")]
    pub host: String,

    #[command(flatten)]
    pub build: BuildArgs,
}

pub fn run(cmd: ServerCommand, globals: &GlobalArgs) -> Result<()> {
    #[cfg(not(feature = "server"))]
    {
        let _ = (cmd, globals);
        anyhow::bail!("Server feature is not enabled. Rebuild with --features server");
    }

    #[cfg(feature = "server")]
    {
        run_server(cmd, globals)
    }
}

#[cfg(feature = "server")]
fn run_server(cmd: ServerCommand, globals: &GlobalArgs) -> Result<()> {
    use super::progress::ProgressBar;
    use super::utils;
    use anyhow::Context;
    use crossref_index::server::{StartupConfig, start_server};
    use tokio::runtime::Runtime;

    let rt = Runtime::new().context("Failed to create tokio runtime")?;

    let startup_config = StartupConfig {
        options: utils::options(globals, Some(&cmd.build)),
        host: cmd.host,
        port: cmd.port,
    };

    let progress = ProgressBar::new(globals.quiet);
    let callback: crossref_index::server::ProgressCallback = Box::new(progress.callback());

    rt.block_on(start_server(startup_config, Some(callback)))
}
