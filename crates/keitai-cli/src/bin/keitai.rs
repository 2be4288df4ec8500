use std::path::PathBuf;

use clap::Parser;

use keitai_cli::commands::tokenize_ops;
use keitai_cli::format::OutputFormat;
use keitai_cli::trace_init::init_tracing;

#[derive(Parser)]
#[command(name = "keitai", about = "Japanese morphological analyzer")]
struct Cli {
    /// Dictionary directory or bundle file
    #[arg(long, default_value = "dict")]
    dict: String,
    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
    /// Settings TOML overriding the built-in defaults
    #[arg(long)]
    settings: Option<String>,
    /// Dump the searched lattice instead of tokens
    #[arg(long)]
    lattice: bool,
    /// Write JSONL trace output into this directory
    #[arg(long)]
    trace_dir: Option<PathBuf>,
    /// Text to analyze (reads stdin line by line when omitted)
    text: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.trace_dir.as_deref());
    let tokenizer = tokenize_ops::tokenizer(&cli.dict, cli.settings.as_deref());

    if cli.lattice {
        let Some(text) = cli.text.as_deref() else {
            eprintln!("Error: --lattice needs TEXT");
            std::process::exit(1);
        };
        tokenize_ops::lattice_cmd(&tokenizer, text);
        return;
    }
    tokenize_ops::tokenize_cmd(&tokenizer, cli.text.as_deref(), cli.format);
}
