//! The tokenizer façade: sentence splitting, analysis and token formatting.

mod token;

pub use token::{Token, WordType};

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug_span, warn};

use crate::analyzer::{
    build_lattice, search, ConnectionCostFunction, Lattice, LatticeOptions, NodeType,
};
use crate::dict::{DictError, Dictionaries, RecordDictionary};
use crate::settings::{settings, Settings, TokenizerSettings};
use crate::unicode::decode_utf16_lossy;

/// Configures and creates a [`Tokenizer`].
#[derive(Default)]
pub struct TokenizerBuilder {
    dic_path: Option<PathBuf>,
    dictionaries: Option<Arc<Dictionaries>>,
    settings: Option<Settings>,
}

impl TokenizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the dictionary from a directory of `.dat` files or a bundle file.
    pub fn dic_path(mut self, path: impl AsRef<Path>) -> Self {
        self.dic_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Use already loaded dictionaries. Takes precedence over `dic_path`.
    pub fn dictionaries(mut self, dict: Arc<Dictionaries>) -> Self {
        self.dictionaries = Some(dict);
        self
    }

    /// Override the global settings for this tokenizer.
    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn build(self) -> Result<Tokenizer, DictError> {
        let dict = match (self.dictionaries, self.dic_path) {
            (Some(dict), _) => dict,
            (None, Some(path)) => Arc::new(Dictionaries::open_path(&path)?),
            (None, None) => return Err(DictError::MissingBuffer("dictionary path".to_string())),
        };
        Ok(Tokenizer {
            dict,
            settings: self.settings.unwrap_or_else(|| settings().clone()),
        })
    }
}

/// Splits text into morphemes.
///
/// Dictionaries are shared read-only; each call builds its own lattice, so
/// one tokenizer can serve many threads.
#[derive(Clone)]
pub struct Tokenizer {
    dict: Arc<Dictionaries>,
    settings: Settings,
}

impl Tokenizer {
    pub fn dictionaries(&self) -> &Arc<Dictionaries> {
        &self.dict
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Tokenize `text`. Positions are 1-based character offsets into `text`.
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let _span = debug_span!("tokenize", bytes = text.len()).entered();
        let mut tokens = Vec::new();
        let mut offset = 0;
        for sentence in split_sentences(text, &self.settings.tokenizer) {
            self.tokenize_sentence(sentence, offset, &mut tokens);
            offset += sentence.chars().count();
        }
        tokens
    }

    /// Tokenize UTF-16 text. Unpaired surrogates become U+FFFD, so positions
    /// still advance by one per code point.
    pub fn tokenize_utf16(&self, text: &[u16]) -> Vec<Token> {
        let (decoded, replaced) = decode_utf16_lossy(text);
        if replaced {
            warn!("unpaired surrogate in UTF-16 input replaced with U+FFFD");
        }
        self.tokenize(&decoded)
    }

    /// Build and search the lattice of a single sentence, for inspection.
    pub fn lattice(&self, text: &str) -> Lattice {
        let mut lattice = build_lattice(&self.dict, text, self.lattice_options());
        search(
            &mut lattice,
            &ConnectionCostFunction::new(self.dict.connection()),
        );
        lattice
    }

    fn lattice_options(&self) -> LatticeOptions {
        LatticeOptions {
            cap_group_at_max_length: self.settings.unknown.cap_group_at_max_length,
        }
    }

    fn tokenize_sentence(&self, sentence: &str, offset: usize, tokens: &mut Vec<Token>) {
        let mut lattice = build_lattice(&self.dict, sentence, self.lattice_options());
        let path = search(
            &mut lattice,
            &ConnectionCostFunction::new(self.dict.connection()),
        );

        for idx in path {
            let node = lattice.node(idx);
            let Some(id) = node.name else { continue };
            let position = offset + node.start_pos;
            let token = match node.node_type {
                NodeType::Known => {
                    Token::known(id, position, self.dict.token_info().features(id))
                }
                NodeType::Unknown => Token::unknown(
                    id,
                    position,
                    self.dict.unknown().features(id),
                    &node.surface_form,
                ),
                NodeType::Bos | NodeType::Eos => continue,
            };
            tokens.push(token);
        }
    }
}

/// Split `text` after every delimiter character. The delimiter stays with
/// the sentence it ends; a trailing piece without a delimiter is kept.
pub fn split_sentences<'a>(text: &'a str, settings: &TokenizerSettings) -> Vec<&'a str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if settings.is_delimiter(c) {
            let end = i + c.len_utf8();
            sentences.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::parse_settings_toml;
    use crate::testutil::{test_dictionaries, test_tokenizer};

    fn default_tokenizer_settings() -> TokenizerSettings {
        parse_settings_toml(crate::settings::DEFAULT_SETTINGS_TOML)
            .unwrap()
            .tokenizer
    }

    fn surfaces(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.surface_form.as_str()).collect()
    }

    fn positions(tokens: &[Token]) -> Vec<usize> {
        tokens.iter().map(|t| t.word_position).collect()
    }

    #[test]
    fn test_split_sentences() {
        let s = default_tokenizer_settings();
        assert_eq!(
            split_sentences("あ、あ。あ、あ。", &s),
            vec!["あ、", "あ。", "あ、", "あ。"]
        );
        assert_eq!(split_sentences("今日は。晴れ", &s), vec!["今日は。", "晴れ"]);
        assert_eq!(split_sentences("。。", &s), vec!["。", "。"]);
        assert!(split_sentences("", &s).is_empty());
    }

    #[test]
    fn test_tokenize_sumomo() {
        let tokens = test_tokenizer().tokenize("すもももももももものうち");
        assert_eq!(
            surfaces(&tokens),
            vec!["すもも", "も", "もも", "も", "もも", "の", "うち"]
        );
        assert_eq!(positions(&tokens), vec![1, 4, 5, 7, 8, 10, 11]);
        assert!(tokens.iter().all(|t| t.word_type == WordType::Known));
        assert_eq!(tokens[1].pos, "助詞");
        assert_eq!(tokens[1].pos_detail_1, "係助詞");
        assert_eq!(tokens[6].reading.as_deref(), Some("ウチ"));
    }

    #[test]
    fn test_tokenize_unknown_katakana() {
        let tokens = test_tokenizer().tokenize("となりのトトロ");
        assert_eq!(surfaces(&tokens), vec!["となり", "の", "トトロ"]);
        assert_eq!(positions(&tokens), vec![1, 4, 5]);
        let totoro = &tokens[2];
        assert_eq!(totoro.word_type, WordType::Unknown);
        assert_eq!(totoro.pos, "名詞");
        assert_eq!(totoro.pos_detail_1, "一般");
        assert_eq!(totoro.reading, None);
    }

    #[test]
    fn test_tokenize_empty() {
        assert!(test_tokenizer().tokenize("").is_empty());
    }

    #[test]
    fn test_tokenize_surrogate_pair() {
        let tokens = test_tokenizer().tokenize("𠮷野屋");
        assert_eq!(surfaces(&tokens), vec!["𠮷", "野", "屋"]);
        assert_eq!(positions(&tokens), vec![1, 2, 3]);
        assert_eq!(tokens[0].word_type, WordType::Unknown);
    }

    #[test]
    fn test_tokenize_sentences() {
        let tokens = test_tokenizer().tokenize("あ、あ。あ、あ。");
        assert_eq!(tokens.len(), 8);
        assert_eq!(positions(&tokens), (1..=8).collect::<Vec<_>>());
        assert_eq!(tokens[1].pos_detail_1, "読点");
        assert_eq!(tokens[3].pos_detail_1, "句点");
    }

    #[test]
    fn test_tokenize_is_idempotent() {
        let t = test_tokenizer();
        let text = "すもももももももものうち、となりのトトロ。";
        assert_eq!(t.tokenize(text), t.tokenize(text));
    }

    #[test]
    fn test_surfaces_cover_input() {
        let t = test_tokenizer();
        for text in ["すもももももももものうち", "ABC123漢字", "𠮷野屋、ぬ。 x"] {
            let joined: String = t.tokenize(text).iter().map(|t| t.surface_form.as_str()).collect();
            assert_eq!(joined, text);
        }
    }

    #[test]
    fn test_tokenize_utf16() {
        let t = test_tokenizer();
        let units: Vec<u16> = "𠮷野屋".encode_utf16().collect();
        assert_eq!(t.tokenize_utf16(&units), t.tokenize("𠮷野屋"));

        // lone high surrogate before 野
        let tokens = t.tokenize_utf16(&[0xD842, 0x91CE]);
        assert_eq!(surfaces(&tokens), vec!["\u{FFFD}", "野"]);
        assert_eq!(positions(&tokens), vec![1, 2]);
    }

    #[test]
    fn test_custom_delimiters() {
        let settings = parse_settings_toml(
            r#"
[tokenizer]
sentence_delimiters = []

[unknown]
cap_group_at_max_length = false
"#,
        )
        .unwrap();
        let t = TokenizerBuilder::new()
            .dictionaries(test_dictionaries())
            .settings(settings)
            .build()
            .unwrap();
        let tokens = t.tokenize("あ、あ。");
        assert_eq!(surfaces(&tokens), vec!["あ", "、", "あ", "。"]);
        assert_eq!(positions(&tokens), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_lattice_inspection() {
        let lattice = test_tokenizer().lattice("もも");
        let eos = lattice.node(lattice.eos().unwrap());
        assert_eq!(eos.start_pos, 3);
        assert!(eos.is_reachable());
    }

    #[test]
    fn test_builder_without_dictionary() {
        assert!(matches!(
            TokenizerBuilder::new().build(),
            Err(DictError::MissingBuffer(_))
        ));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Tokenizer>();
    }
}
