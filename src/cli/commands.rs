//! Command dispatch: build an engine from a document and drive it with intents

use std::io;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::{ExpandOutcome, LoadResolution, TreeEngine};
use crate::cli::args::{Cli, Commands, ConfigCommands, ShowArgs};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output::{self, TreeRowsConvert};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::TreeDocument;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Show(args)) => {
            let settings = load_settings(cli)?;
            cmd_show(&settings, args)
        }
        Some(Commands::Config { command }) => cmd_config(cli, command),
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
        None => Err(CliError::Usage(
            "no command given, see `treestate --help`".to_string(),
        )),
    }
}

fn load_settings(cli: &Cli) -> CliResult<Settings> {
    Ok(Settings::load(cli.config.as_deref())?)
}

/// Build an engine for `args` and apply every intent, serving lazy loads
/// from the document itself.
#[instrument(level = "debug", skip(settings))]
pub fn build_engine(settings: &Settings, args: &ShowArgs) -> CliResult<TreeEngine> {
    let document = TreeDocument::load(&args.document)?;
    let mut engine = TreeEngine::with_settings(document.nodes.clone(), settings)?;

    for id in &args.expand {
        if let ExpandOutcome::LoadRequested(request) = engine.expand(id)? {
            match engine.load_with(&request, &document) {
                Ok(LoadResolution::Loaded { children, .. }) => {
                    debug!("loaded {} children for {}", children, id)
                }
                Ok(LoadResolution::Discarded) => {}
                Err(e) => output::warning(&e),
            }
        }
    }
    if args.expand_all {
        engine.expand_all();
    }
    for id in &args.reveal {
        engine.expand_to_node(id)?;
    }
    for id in &args.check {
        engine.set_checked(id, true)?;
    }
    for id in &args.select {
        engine.select(id)?;
    }
    if let Some(term) = &args.search {
        engine.search(term);
    }
    Ok(engine)
}

#[instrument(level = "debug", skip(settings))]
fn cmd_show(settings: &Settings, args: &ShowArgs) -> CliResult<()> {
    let engine = build_engine(settings, args)?;
    let rows = engine.visible_rows();

    if args.plain {
        for tree in rows.to_term_trees() {
            output::info(&tree);
        }
        return Ok(());
    }

    output::rows(&rows);
    println!();
    output::id_list("selected", &engine.selected_ids());
    output::id_list("checked", &engine.checked_ids());
    output::id_list("indeterminate", &engine.indeterminate_ids());
    Ok(())
}

fn cmd_config(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::header("# effective settings");
            output::info(&settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Template => {
            output::info(&Settings::template());
            Ok(())
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => {
                output::info(&path.display());
                Ok(())
            }
            None => Err(CliError::Usage(
                "cannot determine config directory".to_string(),
            )),
        },
    }
}
