use std::path::PathBuf;

use clap::{Parser, Subcommand};

use keitai_cli::commands::{config_ops, dict_ops};
use keitai_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "dictool", about = "keitai dictionary build tool")]
struct Cli {
    /// Write JSONL trace output into this directory
    #[arg(long, global = true)]
    trace_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compile MeCab sources (*.csv, matrix.def, char.def, unk.def)
    Build {
        /// Source directory
        src_dir: String,
        /// Output directory, or bundle file with --bundle
        output: String,
        /// Write a single bundle file instead of twelve .dat files
        #[arg(long)]
        bundle: bool,
    },
    /// Show dictionary statistics and character classes
    Info {
        /// Dictionary directory or bundle file
        dict: String,
    },
    /// Look up a surface form (exact match)
    Lookup {
        /// Dictionary directory or bundle file
        dict: String,
        /// Surface form
        surface: String,
    },
    /// Common-prefix search (all dictionary words that are prefixes of the text)
    Prefix {
        /// Dictionary directory or bundle file
        dict: String,
        /// Query text
        text: String,
    },
    /// Look up the connection cost between two context ids
    ConnCost {
        /// Dictionary directory or bundle file
        dict: String,
        /// Right id of the preceding word
        right: i16,
        /// Left id of the following word
        left: i16,
    },
    /// Show the character class of each character
    CharClass {
        /// Dictionary directory or bundle file
        dict: String,
        /// Characters to classify
        text: String,
    },
    /// Export default settings as TOML
    SettingsExport,
    /// Validate a custom settings TOML file
    SettingsValidate {
        /// Path to the TOML file
        file: String,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace_dir.as_deref());

    match cli.command {
        Command::Build {
            src_dir,
            output,
            bundle,
        } => dict_ops::build(&src_dir, &output, bundle),
        Command::Info { dict } => dict_ops::info(&dict),
        Command::Lookup { dict, surface } => dict_ops::lookup(&dict, &surface),
        Command::Prefix { dict, text } => dict_ops::prefix(&dict, &text),
        Command::ConnCost { dict, right, left } => dict_ops::conn_cost(&dict, right, left),
        Command::CharClass { dict, text } => dict_ops::char_class(&dict, &text),
        Command::SettingsExport => config_ops::settings_export(),
        Command::SettingsValidate { file } => config_ops::settings_validate(&file),
    }
}
