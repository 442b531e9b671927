// medit - headless multi-object editing of conditions and parameter actions

mod commands;
mod exit_codes;
mod schema;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use multiedit_core::SourceId;
use multiedit_document::DocumentError;
use multiedit_engine::{Condition, EngineError, ParameterAction};
use tracing_subscriber::EnvFilter;

use exit_codes::{document_exit_code, engine_exit_code, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "medit")]
#[command(about = "Edit conditions and parameter actions across many objects at once")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// More log output on stderr (-v info, -vv debug, -vvv trace). MEDIT_LOG overrides.
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DocArgs {
    /// Document file (JSON)
    #[arg(long, short = 'd', env = "MEDIT_DOC")]
    doc: PathBuf,

    /// Engine config (TOML): tier lists and transaction label prefix
    #[arg(long, short = 'c', env = "MEDIT_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct TargetArgs {
    /// Record schema to consolidate
    #[arg(long, short = 'k', value_enum)]
    kind: Kind,

    /// Object ids to select, comma separated (default: the document's selection)
    #[arg(long, short = 's', value_delimiter = ',')]
    select: Vec<SourceId>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    /// Transition conditions
    Conditions,
    /// Behaviour parameter actions
    Actions,
}

#[derive(Subcommand)]
enum Commands {
    /// List the records every selected object shares
    #[command(after_help = "\
Examples:
  medit show -d scene.json -k conditions
  medit show -d scene.json -k actions --select 4,5 --json")]
    Show {
        #[command(flatten)]
        doc: DocArgs,
        #[command(flatten)]
        target: TargetArgs,

        /// Machine-readable output
        #[arg(long)]
        json: bool,
    },

    /// Set one field on every record behind an entry
    #[command(after_help = "\
Examples:
  medit set -d scene.json -k conditions -e 1 -f threshold --value 0.8
  medit set -d scene.json -k actions -e 2 -f name --value Speed")]
    Set {
        #[command(flatten)]
        doc: DocArgs,
        #[command(flatten)]
        target: TargetArgs,

        /// Entry number from `medit show`
        #[arg(long, short = 'e')]
        entry: usize,

        #[arg(long, short = 'f')]
        field: String,

        #[arg(long, allow_hyphen_values = true)]
        value: String,
    },

    /// Append a default record to every selected object
    Add {
        #[command(flatten)]
        doc: DocArgs,
        #[command(flatten)]
        target: TargetArgs,
    },

    /// Delete every record behind an entry
    Remove {
        #[command(flatten)]
        doc: DocArgs,
        #[command(flatten)]
        target: TargetArgs,

        /// Entry number from `medit show`
        #[arg(long, short = 'e')]
        entry: usize,
    },

    /// Copy shared records from some objects and append them to others
    #[command(after_help = "\
Examples:
  medit copy -d scene.json -k conditions --from 1,2 --to 3
  medit copy -d scene.json -k actions --from 4 --to 5,6 -e 1")]
    Copy {
        #[command(flatten)]
        doc: DocArgs,

        #[arg(long, short = 'k', value_enum)]
        kind: Kind,

        #[arg(long, value_delimiter = ',', required = true)]
        from: Vec<SourceId>,

        #[arg(long, value_delimiter = ',', required = true)]
        to: Vec<SourceId>,

        /// Copy only this entry (default: all shared entries)
        #[arg(long, short = 'e')]
        entry: Option<usize>,
    },

    /// Revert the last edit made with medit
    Undo {
        /// Document file (JSON)
        #[arg(long, short = 'd', env = "MEDIT_DOC")]
        doc: PathBuf,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("MEDIT_COMMIT"), ")",
        "\nengine:  multiedit-engine ", env!("CARGO_PKG_VERSION"),
        "\ntarget:  ", env!("MEDIT_TARGET"),
    )
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env("MEDIT_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // Also installs the bridge that forwards `log` records from the library crates.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Show { doc, target, json } => {
            let config = commands::load_config(doc.config.as_deref())?;
            match target.kind {
                Kind::Conditions => {
                    commands::cmd_show::<Condition>(&doc.doc, &config, &target.select, json)
                }
                Kind::Actions => {
                    commands::cmd_show::<ParameterAction>(&doc.doc, &config, &target.select, json)
                }
            }
        }
        Commands::Set {
            doc,
            target,
            entry,
            field,
            value,
        } => {
            let config = commands::load_config(doc.config.as_deref())?;
            match target.kind {
                Kind::Conditions => commands::cmd_set::<Condition>(
                    &doc.doc,
                    &config,
                    &target.select,
                    entry,
                    &field,
                    &value,
                ),
                Kind::Actions => commands::cmd_set::<ParameterAction>(
                    &doc.doc,
                    &config,
                    &target.select,
                    entry,
                    &field,
                    &value,
                ),
            }
        }
        Commands::Add { doc, target } => {
            let config = commands::load_config(doc.config.as_deref())?;
            match target.kind {
                Kind::Conditions => commands::cmd_add::<Condition>(&doc.doc, &config, &target.select),
                Kind::Actions => commands::cmd_add::<ParameterAction>(&doc.doc, &config, &target.select),
            }
        }
        Commands::Remove { doc, target, entry } => {
            let config = commands::load_config(doc.config.as_deref())?;
            match target.kind {
                Kind::Conditions => {
                    commands::cmd_remove::<Condition>(&doc.doc, &config, &target.select, entry)
                }
                Kind::Actions => {
                    commands::cmd_remove::<ParameterAction>(&doc.doc, &config, &target.select, entry)
                }
            }
        }
        Commands::Copy {
            doc,
            kind,
            from,
            to,
            entry,
        } => {
            let config = commands::load_config(doc.config.as_deref())?;
            match kind {
                Kind::Conditions => commands::cmd_copy::<Condition>(&doc.doc, &config, &from, &to, entry),
                Kind::Actions => commands::cmd_copy::<ParameterAction>(&doc.doc, &config, &from, &to, entry),
            }
        }
        Commands::Undo { doc } => commands::cmd_undo(&doc),
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let hint = match &err {
            EngineError::StaleReference { .. } => {
                Some("the document changed since it was read; run the command again".to_string())
            }
            EngineError::InvalidReference { .. } => {
                Some("the name must match a parameter defined in the document".to_string())
            }
            EngineError::EmptyRegistry { .. } => {
                Some("add a parameter to the document first".to_string())
            }
            _ => None,
        };
        Self { code: engine_exit_code(&err), message: err.to_string(), hint }
    }
}

impl From<DocumentError> for CliError {
    fn from(err: DocumentError) -> Self {
        Self { code: document_exit_code(&err), message: err.to_string(), hint: None }
    }
}
