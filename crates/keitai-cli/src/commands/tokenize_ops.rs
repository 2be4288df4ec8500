use std::fs;
use std::io::{self, BufRead, Write};

use keitai_core::settings::parse_settings_toml;
use keitai_core::{Tokenizer, TokenizerBuilder};

use crate::format::{render, OutputFormat};

/// Open the dictionary, applying a settings TOML file when given.
pub fn tokenizer(dict_path: &str, settings_file: Option<&str>) -> Tokenizer {
    let mut builder = TokenizerBuilder::new().dic_path(dict_path);
    if let Some(file) = settings_file {
        let content = die!(fs::read_to_string(file), "Error reading {file}: {}");
        let settings = die!(parse_settings_toml(&content), "Error in {file}: {}");
        builder = builder.settings(settings);
    }
    die!(builder.build(), "Error opening dictionary {dict_path}: {}")
}

/// Tokenize `text`, or every line of stdin when `text` is `None`.
pub fn tokenize_cmd(tokenizer: &Tokenizer, text: Option<&str>, format: OutputFormat) {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match text {
        Some(text) => die!(
            write_line(&mut out, tokenizer, text, format),
            "Error writing output: {}"
        ),
        None => {
            for line in io::stdin().lock().lines() {
                let line = die!(line, "Error reading stdin: {}");
                die!(
                    write_line(&mut out, tokenizer, &line, format),
                    "Error writing output: {}"
                );
            }
        }
    }
}

fn write_line(
    out: &mut impl Write,
    tokenizer: &Tokenizer,
    text: &str,
    format: OutputFormat,
) -> io::Result<()> {
    let tokens = tokenizer.tokenize(text);
    let rendered = render(&tokens, format).map_err(io::Error::other)?;
    writeln!(out, "{rendered}")
}

/// Print every lattice node of `text` with its best cost, then the chosen path.
pub fn lattice_cmd(tokenizer: &Tokenizer, text: &str) {
    let lattice = tokenizer.lattice(text);
    for (idx, node) in lattice.nodes().iter().enumerate() {
        let cost = if node.is_reachable() {
            node.shortest_cost.to_string()
        } else {
            "-".to_string()
        };
        println!(
            "{idx:>4} {:?} pos={} len={} l={} r={} word={} best={cost} prev={}  {}",
            node.node_type,
            node.start_pos,
            node.length,
            node.left_id,
            node.right_id,
            node.cost,
            node.prev.map_or("-".to_string(), |p| p.to_string()),
            node.surface_form
        );
    }
}
