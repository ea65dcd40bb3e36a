//! `bikedb` command-line entry point.
//!
//! # Responsibility
//! - Parse arguments, resolve the catalog layout and start logging.
//! - Dispatch to one catalog operation per invocation.

mod args;
mod commands;

use args::{Cli, Commands};
use bikedb_core::{init_logging, install_panic_hook};
use clap::Parser;
use log::{error, info};
use miette::{miette, Result};

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let config = cli.global.resolve()?;

    let logging = init_logging(&config.log_level, &config.log_dir.to_string_lossy())
        .map_err(|err| miette!("{err}"))?;
    install_panic_hook();

    let command = cli.command.name();
    info!("event=cli_command module=cli status=start command={command}");
    let result = match cli.command {
        Commands::Init => commands::init(&config),
        Commands::Templates => commands::templates(&config),
        Commands::SetupInput => commands::setup_input(&config),
        Commands::Import(args) => commands::import(&config, &args),
        Commands::ImportAll => commands::import_all(&config),
        Commands::Show(args) => commands::show(&config, &args),
        Commands::Fingerprint(args) => commands::fingerprint(&args),
    };

    match &result {
        Ok(()) => info!("event=cli_command module=cli status=ok command={command}"),
        Err(_) => error!("event=cli_command module=cli status=error command={command}"),
    }
    logging.flush();
    result
}
