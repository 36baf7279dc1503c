mod cli;
mod commands;
mod config;
mod logging;

use anyhow::Result;
use clap::Parser;
use config::Config;

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let configured = Config::load().ok().and_then(|c| c.log_level);
    logging::init_logging(&logging::level_for(cli.verbose, configured.as_deref()));

    match cli.command {
        Commands::Discover {
            snapshot,
            names,
            roles,
            json,
        } => {
            commands::discover::handle(&snapshot, names.as_deref(), &roles, json)?;
        }

        Commands::Candidates { snapshot } => {
            commands::candidates::handle(&snapshot)?;
        }

        Commands::Names { command } => match command {
            NamesCommand::Dump { output } => {
                commands::names::dump(output.as_deref())?;
            }

            NamesCommand::Merge {
                files,
                prepend,
                output,
            } => {
                commands::names::merge(&files, prepend, output.as_deref())?;
            }
        },

        Commands::Probe {
            snapshot,
            role,
            names,
        } => {
            commands::probe::handle(&snapshot, &role, names.as_deref())?;
        }

        Commands::State {
            snapshot,
            limit,
            names,
        } => {
            commands::state::handle(&snapshot, limit, names.as_deref())?;
        }

        Commands::Configure {
            show,
            threshold,
            attempts,
            log_level,
        } => {
            commands::configure::handle(show, threshold, attempts, log_level)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_discover_roles() {
        let cli = Cli::try_parse_from([
            "rolemap",
            "-v",
            "discover",
            "client.json",
            "--roles",
            "LocalPlayer,ActiveWorld",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Discover { roles, json, .. } => {
                assert_eq!(roles, vec!["LocalPlayer", "ActiveWorld"]);
                assert!(json);
            }
            _ => panic!("expected discover"),
        }
    }
}
