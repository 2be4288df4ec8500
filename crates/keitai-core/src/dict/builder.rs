//! Compile MeCab/IPADIC text sources into [`Dictionaries`].
//!
//! Sources are read as UTF-8:
//!
//! - word CSV files, one entry per line: `surface,left_id,right_id,cost,features...`
//! - `matrix.def`: the connection cost matrix
//! - `char.def`: character classes and code point mappings
//! - `unk.def`: unknown-word entries in the CSV layout, with a class name as surface
//!
//! Malformed CSV lines are skipped and counted rather than failing the build.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, debug_span, info, warn};

use super::{
    CharacterDefinition, ConnectionCosts, DictError, Dictionaries, RecordDictionary,
    TokenInfoDictionary, UnknownDictionary, WordParam,
};
use crate::trie::DoubleArrayBuilder;

pub const MATRIX_DEF: &str = "matrix.def";
pub const CHAR_DEF: &str = "char.def";
pub const UNK_DEF: &str = "unk.def";

#[derive(Debug, Clone)]
struct SourceEntry {
    surface: String,
    param: WordParam,
    features: String,
}

/// Collects dictionary sources, then compiles them with [`DictionaryBuilder::build`].
#[derive(Default)]
pub struct DictionaryBuilder {
    words: Vec<SourceEntry>,
    unknown: Vec<SourceEntry>,
    connection: Option<ConnectionCosts>,
    char_def: Option<CharacterDefinition>,
    skipped: usize,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `*.csv`, `matrix.def`, `char.def` and `unk.def` from `dir`.
    ///
    /// CSV files are added in file-name order.
    pub fn from_dir(dir: &Path) -> Result<Self, DictError> {
        let _span = debug_span!("from_dir", dir = %dir.display()).entered();
        let mut builder = Self::new();

        let mut csvs: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "csv"))
            .collect();
        csvs.sort();
        for path in &csvs {
            let text = fs::read_to_string(path)?;
            let added = builder.add_words(&text);
            debug!(file = %path.display(), added);
        }

        builder.set_matrix_def(&read_source(dir, MATRIX_DEF)?)?;
        builder.set_char_def(&read_source(dir, CHAR_DEF)?)?;
        builder.add_unknown(&read_source(dir, UNK_DEF)?);
        Ok(builder)
    }

    /// Add known-word CSV lines. Returns the number of lines accepted.
    pub fn add_words(&mut self, csv: &str) -> usize {
        let (entries, skipped) = parse_csv(csv);
        self.skipped += skipped;
        let n = entries.len();
        self.words.extend(entries);
        n
    }

    /// Add `unk.def` lines. Returns the number of lines accepted.
    pub fn add_unknown(&mut self, csv: &str) -> usize {
        let (entries, skipped) = parse_csv(csv);
        self.skipped += skipped;
        let n = entries.len();
        self.unknown.extend(entries);
        n
    }

    pub fn set_matrix_def(&mut self, text: &str) -> Result<&mut Self, DictError> {
        self.connection = Some(ConnectionCosts::from_text(text)?);
        Ok(self)
    }

    pub fn set_char_def(&mut self, text: &str) -> Result<&mut Self, DictError> {
        self.char_def = Some(CharacterDefinition::from_text(text)?);
        Ok(self)
    }

    /// Number of malformed CSV lines dropped so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped
    }

    pub fn build(self) -> Result<Dictionaries, DictError> {
        let _span = debug_span!("build_dictionaries").entered();
        let connection = self
            .connection
            .ok_or_else(|| DictError::MissingBuffer(MATRIX_DEF.to_string()))?;
        let char_def = self
            .char_def
            .ok_or_else(|| DictError::MissingBuffer(CHAR_DEF.to_string()))?;
        if self.skipped > 0 {
            warn!(skipped = self.skipped, "skipped malformed dictionary lines");
        }

        // One trie id per distinct surface, in order of first appearance.
        let mut trie_ids: HashMap<&str, u32> = HashMap::new();
        for e in &self.words {
            let next = trie_ids.len() as u32;
            trie_ids.entry(e.surface.as_str()).or_insert(next);
        }
        let trie = DoubleArrayBuilder::new().build(trie_ids.iter().map(|(k, v)| (*k, *v)))?;

        let mut token_info = TokenInfoDictionary::new();
        for e in &self.words {
            let id = token_info.put(e.param, &e.surface, &e.features)?;
            token_info.add_mapping(trie_ids[e.surface.as_str()], id);
        }

        let mut unknown = UnknownDictionary::new(char_def);
        for e in &self.unknown {
            let class_id = unknown
                .char_def()
                .lookup_by_name(&e.surface)
                .map(|c| c.id)
                .ok_or_else(|| {
                    DictError::InvalidCharDef(format!(
                        "{UNK_DEF} refers to undefined class '{}'",
                        e.surface
                    ))
                })?;
            let id = unknown.put(e.param, &e.surface, &e.features)?;
            unknown.add_mapping(class_id, id);
        }

        info!(
            words = self.words.len(),
            surfaces = trie_ids.len(),
            trie_size = trie.size(),
            unknown = self.unknown.len(),
            "dictionary built"
        );
        Ok(Dictionaries::new(trie, token_info, unknown, connection))
    }
}

fn read_source(dir: &Path, name: &str) -> Result<String, DictError> {
    let path = dir.join(name);
    if !path.is_file() {
        return Err(DictError::MissingBuffer(path.display().to_string()));
    }
    Ok(fs::read_to_string(path)?)
}

/// Parse CSV entries, returning the accepted entries and the skipped line count.
fn parse_csv(text: &str) -> (Vec<SourceEntry>, usize) {
    let mut entries = Vec::new();
    let mut skipped = 0;
    for (lineno, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_entry(line) {
            Some(e) => entries.push(e),
            None => {
                debug!(line = lineno + 1, content = line, "skipping malformed entry");
                skipped += 1;
            }
        }
    }
    (entries, skipped)
}

fn parse_entry(line: &str) -> Option<SourceEntry> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() < 4 || fields[0].is_empty() || fields[0].contains('\0') {
        return None;
    }
    Some(SourceEntry {
        surface: fields[0].to_string(),
        param: WordParam {
            left_id: fields[1].trim().parse().ok()?,
            right_id: fields[2].trim().parse().ok()?,
            cost: fields[3].trim().parse().ok()?,
        },
        features: fields[4..].join(","),
    })
}
