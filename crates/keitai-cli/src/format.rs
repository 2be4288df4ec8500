//! Rendering tokens for the terminal.

use clap::ValueEnum;
use keitai_core::Token;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns: position, surface, POS, base form, reading
    Table,
    /// `surface<TAB>features` lines followed by `EOS`
    Mecab,
    /// One JSON array per input line
    Json,
}

pub fn render(tokens: &[Token], format: OutputFormat) -> Result<String, serde_json::Error> {
    Ok(match format {
        OutputFormat::Table => render_table(tokens),
        OutputFormat::Mecab => render_mecab(tokens),
        OutputFormat::Json => serde_json::to_string(tokens)?,
    })
}

pub fn render_mecab(tokens: &[Token]) -> String {
    let mut out = String::new();
    for t in tokens {
        out.push_str(&t.surface_form);
        out.push('\t');
        out.push_str(&t.feature_line());
        out.push('\n');
    }
    out.push_str("EOS");
    out
}

pub fn render_table(tokens: &[Token]) -> String {
    let rows: Vec<[String; 6]> = tokens
        .iter()
        .map(|t| {
            [
                t.word_position.to_string(),
                t.surface_form.clone(),
                pos_column(t),
                t.basic_form.clone(),
                t.reading.clone().unwrap_or_default(),
                t.word_type.as_str().to_string(),
            ]
        })
        .collect();

    let mut widths = [0usize; 6];
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.width());
        }
    }

    let mut lines = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut line = String::new();
        for (i, (cell, w)) in row.iter().zip(widths).enumerate() {
            if i > 0 {
                line.push_str("  ");
            }
            line.push_str(cell);
            if i + 1 < row.len() {
                line.push_str(&" ".repeat(w - cell.width()));
            }
        }
        lines.push(line);
    }
    lines.join("\n")
}

/// `pos-detail1-detail2`, omitting `*` and empty fields.
fn pos_column(t: &Token) -> String {
    [&t.pos, &t.pos_detail_1, &t.pos_detail_2, &t.pos_detail_3]
        .into_iter()
        .filter(|s| !s.is_empty() && s.as_str() != "*")
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("-")
}
