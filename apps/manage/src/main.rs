pub mod handlers;
pub mod models;

use crate::handlers::{check, listing};
use crate::models::args::{Cli, Commands};

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{Write, stdout};
use trellis::{ModuleRegistry, load_settings, setup};
use trellis_logger::Logger;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = load_settings(cli.settings.as_deref())
        .with_context(|| match &cli.settings {
            Some(path) => format!("Failed to load settings from {}", path.display()),
            None => "Failed to load settings".to_owned(),
        })?;
    let _logger = Logger::from_settings(env!("CARGO_PKG_NAME"), &settings.logging)?.init()?;

    let apps = setup(&settings, ModuleRegistry::new())?;

    let mut out = stdout().lock();
    match cli.command {
        Commands::Check {} => check::run_check(&apps, &mut out)?,
        Commands::Apps {} => listing::list_apps(&apps, &mut out)?,
        Commands::Models { all, app } => listing::list_models(&apps, all, app.as_deref(), &mut out)?,
        Commands::Model { reference } => listing::describe_model(&apps, &reference, &mut out)?,
    }
    out.flush()?;

    Ok(())
}
