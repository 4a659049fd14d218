//! Pacer CLI entry point.

use anyhow::Result;
use clap::Parser;

use pacer::cli::{commands, handle_error, Cli, CliContext, Commands};
use pacer::infrastructure::config::ConfigLoader;
use pacer::infrastructure::logging::LoggerImpl;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json_mode = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json_mode);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _logger = LoggerImpl::init(&config.logging)?;

    match cli.command {
        Commands::Init(args) => commands::init::execute(args, &config, cli.json).await,
        command => {
            let ctx = CliContext::open(config).await?;
            let result = dispatch(command, &ctx, cli.json).await;
            ctx.pool.close().await;
            result
        }
    }
}

async fn dispatch(command: Commands, ctx: &CliContext, json: bool) -> Result<()> {
    match command {
        Commands::Init(args) => commands::init::execute(args, &ctx.config, json).await,
        Commands::State(args) => commands::state::execute(args, ctx, json).await,
        Commands::Session(args) => commands::session::execute(args, ctx, json).await,
        Commands::Answer(args) => commands::answer::execute(args, ctx, json).await,
        Commands::Override(args) => commands::overrides::execute(args, ctx, json).await,
        Commands::Progression(args) => commands::progression::execute(args, ctx, json).await,
        Commands::Recommend(args) => commands::recommend::execute(args, ctx, json).await,
        Commands::Question(args) => commands::question::execute(args, ctx, json).await,
        Commands::Profile(args) => commands::profile::execute(args, ctx, json).await,
    }
}
