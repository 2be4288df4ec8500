//! Reading and writing compiled dictionaries.
//!
//! A dictionary is twelve buffers. They are stored either as separate files
//! in one directory (`base.dat`, `check.dat`, ...) or packed into a single
//! bundle file:
//!
//! ```text
//! magic "KTDX" | version u8 | reserved [u8; 3] | section count u32
//! | section lengths u32 × count | payload | crc32(payload) u32
//! ```
//!
//! Sections appear in [`BufferFile::ALL`] order. All integers are little-endian.

use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use tracing::{debug, debug_span, info};

use super::buffer::{ByteReader, ByteWriter};
use super::{
    CharacterDefinition, ConnectionCosts, DictError, Dictionaries, RecordDictionary,
    TokenInfoDictionary, UnknownDictionary,
};
use crate::trie::DoubleArray;

const MAGIC: &[u8; 4] = b"KTDX";
const VERSION: u8 = 1;
/// magic(4) + version(1) + reserved(3) + section count(4)
const FIXED_HEADER_SIZE: usize = 4 + 1 + 3 + 4;
const CHECKSUM_SIZE: usize = 4;

/// The buffers that make up a compiled dictionary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferFile {
    Base,
    Check,
    TokenInfo,
    TokenInfoFeatures,
    TokenInfoMap,
    ConnectionCosts,
    Unknown,
    UnknownFeatures,
    UnknownMap,
    CharCategory,
    CharCompat,
    CharInvoke,
}

impl BufferFile {
    pub const ALL: [BufferFile; 12] = [
        BufferFile::Base,
        BufferFile::Check,
        BufferFile::TokenInfo,
        BufferFile::TokenInfoFeatures,
        BufferFile::TokenInfoMap,
        BufferFile::ConnectionCosts,
        BufferFile::Unknown,
        BufferFile::UnknownFeatures,
        BufferFile::UnknownMap,
        BufferFile::CharCategory,
        BufferFile::CharCompat,
        BufferFile::CharInvoke,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            BufferFile::Base => "base.dat",
            BufferFile::Check => "check.dat",
            BufferFile::TokenInfo => "tid.dat",
            BufferFile::TokenInfoFeatures => "tid_pos.dat",
            BufferFile::TokenInfoMap => "tid_map.dat",
            BufferFile::ConnectionCosts => "cc.dat",
            BufferFile::Unknown => "unk.dat",
            BufferFile::UnknownFeatures => "unk_pos.dat",
            BufferFile::UnknownMap => "unk_map.dat",
            BufferFile::CharCategory => "unk_char.dat",
            BufferFile::CharCompat => "unk_compat.dat",
            BufferFile::CharInvoke => "unk_invoke.dat",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl Dictionaries {
    /// Decode the twelve buffers, given in [`BufferFile::ALL`] order.
    pub fn from_buffers<B: AsRef<[u8]>>(buffers: &[B; 12]) -> Result<Self, DictError> {
        let buf = |f: BufferFile| buffers[f.index()].as_ref();
        let connection = ConnectionCosts::from_bytes(buf(BufferFile::ConnectionCosts))?;
        Self::decode(buf, connection)
    }

    fn decode<'a>(
        buf: impl Fn(BufferFile) -> &'a [u8],
        connection: ConnectionCosts,
    ) -> Result<Self, DictError> {
        let trie = DoubleArray::from_buffers(buf(BufferFile::Base), buf(BufferFile::Check))?;
        let token_info = TokenInfoDictionary::from_buffers(
            buf(BufferFile::TokenInfo),
            buf(BufferFile::TokenInfoFeatures),
            buf(BufferFile::TokenInfoMap),
        )?;
        let char_def = CharacterDefinition::from_buffers(
            buf(BufferFile::CharCategory),
            buf(BufferFile::CharCompat),
            buf(BufferFile::CharInvoke),
        )?;
        let unknown = UnknownDictionary::from_buffers(
            buf(BufferFile::Unknown),
            buf(BufferFile::UnknownFeatures),
            buf(BufferFile::UnknownMap),
            char_def,
        )?;
        info!(
            trie_size = trie.size(),
            words = token_info.store().len(),
            unknown_words = unknown.store().len(),
            "dictionary loaded"
        );
        Ok(Self::new(trie, token_info, unknown, connection))
    }

    /// Encode the twelve buffers in [`BufferFile::ALL`] order.
    pub fn to_buffers(&self) -> [Vec<u8>; 12] {
        let ti = self.token_info().store();
        let unk = self.unknown().store();
        let char_def = self.unknown().char_def();
        BufferFile::ALL.map(|f| match f {
            BufferFile::Base => self.trie().base_buffer(),
            BufferFile::Check => self.trie().check_buffer(),
            BufferFile::TokenInfo => ti.records_buffer().to_vec(),
            BufferFile::TokenInfoFeatures => ti.features_buffer().to_vec(),
            BufferFile::TokenInfoMap => self.token_info().targets().to_bytes(),
            BufferFile::ConnectionCosts => self.connection().to_bytes(),
            BufferFile::Unknown => unk.records_buffer().to_vec(),
            BufferFile::UnknownFeatures => unk.features_buffer().to_vec(),
            BufferFile::UnknownMap => self.unknown().targets().to_bytes(),
            BufferFile::CharCategory => char_def.category_buffer().to_vec(),
            BufferFile::CharCompat => char_def.compat_buffer(),
            BufferFile::CharInvoke => char_def.invoke_buffer(),
        })
    }

    /// Load a dictionary directory holding the twelve `.dat` files.
    ///
    /// `cc.dat` stays memory-mapped; the other buffers are decoded into
    /// owned tables.
    pub fn open_dir(dir: &Path) -> Result<Self, DictError> {
        let _span = debug_span!("open_dir", dir = %dir.display()).entered();
        let mut maps: Vec<Option<Mmap>> = Vec::with_capacity(BufferFile::ALL.len());
        for f in BufferFile::ALL {
            let path = dir.join(f.file_name());
            if !path.is_file() {
                return Err(DictError::MissingBuffer(path.display().to_string()));
            }
            let map = map_file(&path)?;
            debug!(file = f.file_name(), bytes = map.len());
            maps.push(Some(map));
        }
        // The matrix takes ownership of its map; the slot is never decoded.
        let cc = BufferFile::ConnectionCosts;
        let cc_map = maps[cc.index()]
            .take()
            .ok_or_else(|| DictError::MissingBuffer(cc.file_name().to_string()))?;
        let connection = ConnectionCosts::from_mmap(cc_map)?;
        Self::decode(|f| maps[f.index()].as_deref().unwrap_or(&[]), connection)
    }

    /// Write the twelve `.dat` files into `dir`, creating it if needed.
    pub fn save_dir(&self, dir: &Path) -> Result<(), DictError> {
        fs::create_dir_all(dir)?;
        for (f, data) in BufferFile::ALL.iter().zip(self.to_buffers()) {
            fs::write(dir.join(f.file_name()), data)?;
        }
        Ok(())
    }

    /// Pack all buffers into a single bundle.
    pub fn to_bytes(&self) -> Result<Vec<u8>, DictError> {
        let buffers = self.to_buffers();
        let mut w = ByteWriter::new();
        w.put_bytes(MAGIC);
        w.put_u8(VERSION);
        w.put_bytes(&[0; 3]);
        w.put_u32(buffers.len() as u32);
        for b in &buffers {
            let len = u32::try_from(b.len())
                .map_err(|_| DictError::Parse("section exceeds u32::MAX".to_string()))?;
            w.put_u32(len);
        }
        let payload_start = w.position();
        let mut hasher = crc32fast::Hasher::new();
        for b in &buffers {
            w.put_bytes(b);
            hasher.update(b);
        }
        w.put_u32(hasher.finalize());
        debug!(bytes = w.position(), payload = w.position() - payload_start - CHECKSUM_SIZE);
        Ok(w.into_inner())
    }

    /// Unpack a bundle produced by [`Dictionaries::to_bytes`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let sections = split_bundle(data)?;
        let buffers: [&[u8]; 12] = std::array::from_fn(|i| sections[i]);
        Self::from_buffers(&buffers)
    }

    /// Load a bundle file using memory-mapped I/O.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let _span = debug_span!("open_bundle", path = %path.display()).entered();
        let mmap = map_file(path)?;
        Self::from_bytes(&mmap)
    }

    /// Load either a bundle file or a dictionary directory.
    pub fn open_path(path: &Path) -> Result<Self, DictError> {
        if path.is_dir() {
            Self::open_dir(path)
        } else {
            Self::open(path)
        }
    }

    /// Save as a bundle file.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes()?)?)
    }
}

fn map_file(path: &Path) -> Result<Mmap, DictError> {
    let file = File::open(path)?;
    // SAFETY: The file is opened read-only and the mapping is immutable.
    // Decoded tables are copied out before the map is dropped, except for
    // `cc.dat`, which the matrix keeps alive for its own lifetime.
    Ok(unsafe { Mmap::map(&file)? })
}

/// Validate a bundle header and checksum, returning the section slices.
fn split_bundle(data: &[u8]) -> Result<Vec<&[u8]>, DictError> {
    if data.len() < FIXED_HEADER_SIZE {
        return Err(DictError::InvalidHeader);
    }
    if &data[..4] != MAGIC {
        return Err(DictError::InvalidMagic);
    }
    if data[4] != VERSION {
        return Err(DictError::UnsupportedVersion(data[4]));
    }
    let r = ByteReader::new(data);
    let count = r.u32(8).ok_or(DictError::InvalidHeader)? as usize;
    if count != BufferFile::ALL.len() {
        return Err(DictError::Parse(format!(
            "expected {} sections, got {count}",
            BufferFile::ALL.len()
        )));
    }

    let lengths: Vec<usize> = (0..count)
        .map(|i| r.u32(FIXED_HEADER_SIZE + i * 4).map(|n| n as usize))
        .collect::<Option<_>>()
        .ok_or(DictError::InvalidHeader)?;
    let payload_start = FIXED_HEADER_SIZE + count * 4;
    let payload_len: usize = lengths.iter().sum();
    let expected = payload_start + payload_len + CHECKSUM_SIZE;
    if data.len() != expected {
        return Err(DictError::Truncated {
            what: "dictionary bundle",
            expected,
            actual: data.len(),
        });
    }

    let payload = &data[payload_start..payload_start + payload_len];
    let stored = r
        .u32(payload_start + payload_len)
        .ok_or(DictError::InvalidHeader)?;
    let computed = crc32fast::hash(payload);
    if stored != computed {
        return Err(DictError::Checksum { stored, computed });
    }

    let mut sections = Vec::with_capacity(count);
    let mut offset = 0;
    for len in lengths {
        sections.push(&payload[offset..offset + len]);
        offset += len;
    }
    Ok(sections)
}
