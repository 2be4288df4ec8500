//! Byte-wise double-array trie.
//!
//! Keys are UTF-8 strings stored with a NUL terminator. For an edge from
//! `parent` via byte `code`, the child is `BASE[parent] + code` and is valid
//! only when `CHECK[child] == parent`. A terminal child (reached through the
//! NUL byte) stores its value as `BASE = -value - 1`.
//!
//! ```
//! use keitai_core::trie::DoubleArrayBuilder;
//!
//! let trie = DoubleArrayBuilder::new().build([("すもも", 0), ("もも", 1), ("も", 2)])?;
//! assert_eq!(trie.lookup("もも"), Some(1));
//! let hits: Vec<_> = trie.common_prefix_search("ももの").iter().map(|m| m.key).collect();
//! assert_eq!(hits, vec!["も", "もも"]);
//! # Ok::<(), keitai_core::trie::TrieError>(())
//! ```

mod builder;

pub use builder::DoubleArrayBuilder;

use crate::unicode::utf16_to_utf8;

/// Node id of the root.
pub const ROOT_ID: usize = 0;
/// Byte that terminates every key.
pub const TERM_CODE: u8 = 0;

/// Errors raised while decoding BASE/CHECK buffers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrieError {
    #[error("{name} buffer length {len} is not a multiple of 4")]
    Misaligned { name: &'static str, len: usize },

    #[error("BASE and CHECK lengths differ ({base} vs {check})")]
    LengthMismatch { base: usize, check: usize },

    #[error("trie has no root node")]
    Empty,

    #[error("key {0:?} contains a NUL byte")]
    NulInKey(String),

    #[error("value {0} exceeds i32::MAX")]
    ValueOutOfRange(u32),
}

/// A key of the trie that is a prefix of a query, with its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'a> {
    /// The matched prefix of the query.
    pub key: &'a str,
    /// The value stored for `key`.
    pub value: u32,
}

/// An immutable double-array trie.
#[derive(Debug, Clone)]
pub struct DoubleArray {
    base: Vec<i32>,
    check: Vec<i32>,
}

impl DoubleArray {
    pub(crate) fn from_parts(base: Vec<i32>, check: Vec<i32>) -> Self {
        Self { base, check }
    }

    /// Decode BASE and CHECK from little-endian `i32` buffers.
    pub fn from_buffers(base: &[u8], check: &[u8]) -> Result<Self, TrieError> {
        let base = decode_i32s("BASE", base)?;
        let check = decode_i32s("CHECK", check)?;
        if base.len() != check.len() {
            return Err(TrieError::LengthMismatch {
                base: base.len(),
                check: check.len(),
            });
        }
        if base.is_empty() {
            return Err(TrieError::Empty);
        }
        Ok(Self { base, check })
    }

    /// BASE as a little-endian `i32` buffer.
    pub fn base_buffer(&self) -> Vec<u8> {
        encode_i32s(&self.base)
    }

    /// CHECK as a little-endian `i32` buffer.
    pub fn check_buffer(&self) -> Vec<u8> {
        encode_i32s(&self.check)
    }

    /// Number of node slots.
    pub fn size(&self) -> usize {
        self.base.len()
    }

    /// BASE value of a slot. Slots past the end read as unallocated
    /// (`-index + 1`, the previous-free-slot link of an unused node).
    pub fn base(&self, index: usize) -> i32 {
        self.base
            .get(index)
            .copied()
            .unwrap_or_else(|| 1i32.saturating_sub(slot_i32(index)))
    }

    /// CHECK value of a slot. Slots past the end read as unallocated
    /// (`-index - 1`, the next-free-slot link of an unused node).
    pub fn check(&self, index: usize) -> i32 {
        self.check
            .get(index)
            .copied()
            .unwrap_or_else(|| -slot_i32(index).saturating_add(1))
    }

    /// Follow the edge labelled `code` out of `parent`.
    pub fn traverse(&self, parent: usize, code: u8) -> Option<usize> {
        let child = self.base(parent).checked_add(i32::from(code))?;
        let child = usize::try_from(child).ok()?;
        (i64::from(self.check(child)) == parent as i64).then_some(child)
    }

    /// Exact-match lookup.
    pub fn lookup(&self, key: &str) -> Option<u32> {
        self.lookup_bytes(key.as_bytes())
    }

    /// Exact-match lookup of UTF-16 text. Unpaired surrogates never match.
    pub fn lookup_utf16(&self, key: &[u16]) -> Option<u32> {
        self.lookup_bytes(&utf16_to_utf8(key)?)
    }

    /// Exact-match lookup of a raw byte key.
    pub fn lookup_bytes(&self, key: &[u8]) -> Option<u32> {
        let mut node = ROOT_ID;
        for &code in key.iter().chain(std::iter::once(&TERM_CODE)) {
            node = self.traverse(node, code)?;
        }
        leaf_value(self.base(node))
    }

    /// All keys that are prefixes of `query`, shortest first.
    pub fn common_prefix_search<'a>(&self, query: &'a str) -> Vec<PrefixMatch<'a>> {
        self.prefix_ends(query.as_bytes())
            .into_iter()
            .filter_map(|(len, value)| {
                Some(PrefixMatch {
                    key: query.get(..len)?,
                    value,
                })
            })
            .collect()
    }

    /// Common-prefix search over UTF-16 text, returning `(utf16_len, value)`
    /// pairs. Unpaired surrogates yield no match at all.
    pub fn common_prefix_search_utf16(&self, query: &[u16]) -> Vec<(usize, u32)> {
        let Some(bytes) = utf16_to_utf8(query) else {
            return Vec::new();
        };
        self.prefix_ends(&bytes)
            .into_iter()
            .filter_map(|(len, value)| {
                let prefix = std::str::from_utf8(&bytes[..len]).ok()?;
                Some((prefix.encode_utf16().count(), value))
            })
            .collect()
    }

    /// Byte lengths and values of every key that is a prefix of `bytes`.
    fn prefix_ends(&self, bytes: &[u8]) -> Vec<(usize, u32)> {
        let mut result = Vec::new();
        let mut node = ROOT_ID;
        for (i, &code) in bytes.iter().enumerate() {
            let Some(child) = self.traverse(node, code) else {
                break;
            };
            node = child;
            // Peek through the terminator to see whether bytes[..=i] is a key.
            if let Some(value) = self
                .traverse(node, TERM_CODE)
                .and_then(|leaf| leaf_value(self.base(leaf)))
            {
                result.push((i + 1, value));
            }
        }
        result
    }
}

fn leaf_value(base: i32) -> Option<u32> {
    if base <= 0 {
        u32::try_from(-(i64::from(base)) - 1).ok()
    } else {
        None
    }
}

fn slot_i32(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

fn decode_i32s(name: &'static str, data: &[u8]) -> Result<Vec<i32>, TrieError> {
    if data.len() % 4 != 0 {
        return Err(TrieError::Misaligned {
            name,
            len: data.len(),
        });
    }
    Ok(data
        .chunks_exact(4)
        .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

fn encode_i32s(values: &[i32]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(values.len() * 4);
    for v in values {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    buf
}
