//! Shared fixtures: a small IPADIC-style dictionary compiled from `testdata/`.

use std::sync::{Arc, OnceLock};

use crate::dict::{Dictionaries, DictionaryBuilder};
use crate::{Tokenizer, TokenizerBuilder};

pub(crate) const LEX_CSV: &str = include_str!("../testdata/lex.csv");
pub(crate) const MATRIX_DEF: &str = include_str!("../testdata/matrix.def");
pub(crate) const CHAR_DEF: &str = include_str!("../testdata/char.def");
pub(crate) const UNK_DEF: &str = include_str!("../testdata/unk.def");

pub(crate) fn test_builder() -> DictionaryBuilder {
    let mut b = DictionaryBuilder::new();
    b.add_words(LEX_CSV);
    b.add_unknown(UNK_DEF);
    b.set_matrix_def(MATRIX_DEF).unwrap();
    b.set_char_def(CHAR_DEF).unwrap();
    b
}

pub(crate) fn build_test_dictionaries() -> Dictionaries {
    test_builder().build().unwrap()
}

/// Compiled once and shared across tests.
pub(crate) fn test_dictionaries() -> Arc<Dictionaries> {
    static DICT: OnceLock<Arc<Dictionaries>> = OnceLock::new();
    DICT.get_or_init(|| Arc::new(build_test_dictionaries()))
        .clone()
}

pub(crate) fn test_tokenizer() -> Tokenizer {
    TokenizerBuilder::new()
        .dictionaries(test_dictionaries())
        .build()
        .unwrap()
}
