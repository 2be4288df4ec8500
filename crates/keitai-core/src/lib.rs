//! Japanese morphological analysis over IPADIC-style dictionaries.
//!
//! ```no_run
//! use keitai_core::TokenizerBuilder;
//!
//! let tokenizer = TokenizerBuilder::new().dic_path("dict").build()?;
//! for token in tokenizer.tokenize("すもももももももものうち") {
//!     println!("{}\t{}", token.surface_form, token.feature_line());
//! }
//! # Ok::<(), keitai_core::DictError>(())
//! ```

pub mod analyzer;
pub mod dict;
pub mod settings;
#[cfg(test)]
pub(crate) mod testutil;
pub mod tokenizer;
pub mod trie;
pub mod unicode;

pub use dict::{DictError, Dictionaries};
pub use tokenizer::{Token, Tokenizer, TokenizerBuilder, WordType};
