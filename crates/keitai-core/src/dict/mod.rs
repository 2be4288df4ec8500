//! Dictionary storage.
//!
//! A compiled dictionary is four cooperating parts:
//!
//! - a [`DoubleArray`] trie mapping surface forms to trie ids,
//! - the [`TokenInfoDictionary`] (word records keyed by trie id),
//! - the [`UnknownDictionary`] (word records keyed by character class, plus
//!   the [`CharacterDefinition`] tables),
//! - the [`ConnectionCosts`] bigram matrix.
//!
//! [`Dictionaries`] bundles them; `loader` reads and writes the on-disk
//! buffers and `builder` compiles MeCab text sources.

mod buffer;
pub mod builder;
mod char_def;
mod connection;
mod connection_io;
mod loader;
mod record;
#[cfg(test)]
mod tests;
mod token_info;
mod unknown;

pub use builder::DictionaryBuilder;
pub use char_def::{CharClass, CharacterDefinition, DEFAULT_CLASS};
pub use connection::ConnectionCosts;
pub use loader::BufferFile;
pub use record::{RecordDictionary, RecordStore, TargetMap, WordParam, RECORD_SIZE};
pub use token_info::TokenInfoDictionary;
pub use unknown::UnknownDictionary;

use std::io;

use crate::trie::{DoubleArray, TrieError};

/// Unified error type for dictionary construction and binary I/O.
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid header (too short)")]
    InvalidHeader,

    #[error("invalid magic bytes (expected KTDX)")]
    InvalidMagic,

    #[error("unsupported version: {0}")]
    UnsupportedVersion(u8),

    #[error("{what}: expected {expected} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("checksum mismatch (stored {stored:08x}, computed {computed:08x})")]
    Checksum { stored: u32, computed: u32 },

    #[error("missing dictionary buffer: {0}")]
    MissingBuffer(String),

    #[error("invalid character definition: {0}")]
    InvalidCharDef(String),

    #[error("trie error: {0}")]
    Trie(#[from] TrieError),

    #[error("parse error: {0}")]
    Parse(String),
}

/// A fully loaded, read-only dictionary set.
#[derive(Debug)]
pub struct Dictionaries {
    trie: DoubleArray,
    token_info: TokenInfoDictionary,
    unknown: UnknownDictionary,
    connection: ConnectionCosts,
}

impl Dictionaries {
    pub fn new(
        trie: DoubleArray,
        token_info: TokenInfoDictionary,
        unknown: UnknownDictionary,
        connection: ConnectionCosts,
    ) -> Self {
        Self {
            trie,
            token_info,
            unknown,
            connection,
        }
    }

    pub fn trie(&self) -> &DoubleArray {
        &self.trie
    }

    pub fn token_info(&self) -> &TokenInfoDictionary {
        &self.token_info
    }

    pub fn unknown(&self) -> &UnknownDictionary {
        &self.unknown
    }

    pub fn connection(&self) -> &ConnectionCosts {
        &self.connection
    }
}
