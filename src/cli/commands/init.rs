//! Implementation of the `pacer init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config.yaml with the defaults
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub config_path: PathBuf,
    pub config_written: bool,
    pub database_path: String,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![self.message.clone()];
        if self.config_written {
            lines.push(format!("Wrote default configuration to {}", self.config_path.display()));
        } else {
            lines.push(format!("Kept existing configuration at {}", self.config_path.display()));
        }
        lines.push(format!("Database ready at {}", self.database_path));
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, config: &Config, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };

    let pacer_dir = target_path.join(".pacer");
    fs::create_dir_all(&pacer_dir)
        .await
        .with_context(|| format!("Failed to create {}", pacer_dir.display()))?;

    let config_path = pacer_dir.join("config.yaml");
    let config_written = write_default_config(&config_path, args.force).await?;

    let database_path = resolve_database_path(&target_path, &config.database.path);
    let pool = initialize_database(&format!("sqlite:{database_path}"), 1)
        .await
        .context("Failed to initialize database")?;
    pool.close().await;

    let out = InitOutput {
        success: true,
        message: format!("Initialized pacer in {}", target_path.display()),
        config_path,
        config_written,
        database_path,
    };
    output(&out, json_mode);
    Ok(())
}

async fn write_default_config(path: &Path, force: bool) -> Result<bool> {
    if path.exists() && !force {
        return Ok(false);
    }

    let yaml = serde_yaml::to_string(&Config::default()).context("Failed to render default configuration")?;
    fs::write(path, yaml)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

fn resolve_database_path(target: &Path, configured: &str) -> String {
    let configured = configured
        .strip_prefix("sqlite://")
        .or_else(|| configured.strip_prefix("sqlite:"))
        .unwrap_or(configured);
    let path = Path::new(configured);
    if path.is_absolute() {
        configured.to_string()
    } else {
        target.join(path).to_string_lossy().into_owned()
    }
}
