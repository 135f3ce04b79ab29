//! CLI tool for renaming tracks in MuseScore archives.

mod commands;
mod exit_codes;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use mscz_rename::{FieldKind, OpenOptions, SaveOptions};

use exit_codes::ExitCode;

/// Rename tracks inside MuseScore .mscz files
#[derive(Parser)]
#[command(name = "mscz-rename")]
#[command(author, version, about = "Rename tracks inside MuseScore .mscz files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Only print errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Write the result here instead of over the input file
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Do not back up the destination before replacing it
    #[arg(long, global = true)]
    no_backup: bool,

    /// Directory for backups (default: next to the destination)
    #[arg(long, global = true, value_name = "DIR")]
    backup_dir: Option<PathBuf>,

    /// Apply renames to linked part excerpts as well
    #[arg(long, global = true)]
    sync_excerpts: bool,

    /// Open scores that have no track names
    #[arg(long, global = true)]
    allow_empty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List tracks and their names (alias: l)
    #[command(alias = "l")]
    List {
        /// Score file to read
        archive: PathBuf,
    },

    /// Rename one field of one track (alias: r)
    #[command(alias = "r")]
    Rename {
        /// Score file to edit
        archive: PathBuf,

        /// Track index as shown by `list`
        #[arg(short = 't', long)]
        track: usize,

        /// Field to rename: mixer, midi or part
        #[arg(long, value_parser = parse_field)]
        field: FieldKind,

        /// New name
        #[arg(short = 'n', long)]
        name: String,

        /// Number the name if another track already uses it
        #[arg(long)]
        resolve: bool,
    },

    /// Suffix repeated names with 2, 3, ... keeping the first as is
    Dedupe {
        /// Score file to edit
        archive: PathBuf,

        /// Field to process: mixer, midi or part
        #[arg(long, value_parser = parse_field)]
        field: FieldKind,
    },

    /// Number every repeated name from 1
    Number {
        /// Score file to edit
        archive: PathBuf,

        /// Field to process: mixer, midi or part
        #[arg(long, value_parser = parse_field)]
        field: FieldKind,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

fn parse_field(value: &str) -> Result<FieldKind, String> {
    value.parse().map_err(|e: mscz_rename::Error| e.to_string())
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = if e.use_stderr() {
                ExitCode::BadArgs
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            std::process::exit(code.code());
        }
    };

    let level = if cli.quiet { "error" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let open = OpenOptions::new().allow_empty(cli.allow_empty);
    let mut save = SaveOptions::new()
        .backup(!cli.no_backup)
        .sync_excerpts(cli.sync_excerpts);
    if let Some(dir) = &cli.backup_dir {
        save = save.backup_dir(dir);
    }

    let exit_code = match cli.command {
        Commands::List { archive } => commands::list(&archive, open, cli.format),

        Commands::Rename {
            archive,
            track,
            field,
            name,
            resolve,
        } => commands::rename(
            &commands::EditConfig {
                archive: &archive,
                output: cli.output.as_deref(),
                open,
                save: &save,
                format: cli.format,
                quiet: cli.quiet,
            },
            track,
            field,
            &name,
            resolve,
        ),

        Commands::Dedupe { archive, field } => commands::dedupe(
            &commands::EditConfig {
                archive: &archive,
                output: cli.output.as_deref(),
                open,
                save: &save,
                format: cli.format,
                quiet: cli.quiet,
            },
            field,
        ),

        Commands::Number { archive, field } => commands::number(
            &commands::EditConfig {
                archive: &archive,
                output: cli.output.as_deref(),
                open,
                save: &save,
                format: cli.format,
                quiet: cli.quiet,
            },
            field,
        ),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
