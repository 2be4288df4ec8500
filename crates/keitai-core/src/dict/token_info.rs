use super::record::{RecordDictionary, RecordStore, TargetMap, WordParam};
use super::DictError;

/// Known-word records, keyed by trie id.
#[derive(Debug, Clone, Default)]
pub struct TokenInfoDictionary {
    store: RecordStore,
    targets: TargetMap,
}

impl TokenInfoDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode from the `tid.dat`, `tid_pos.dat` and `tid_map.dat` buffers.
    pub fn from_buffers(records: &[u8], features: &[u8], targets: &[u8]) -> Result<Self, DictError> {
        Ok(Self {
            store: RecordStore::from_buffers(records.to_vec(), features.to_vec()),
            targets: TargetMap::from_bytes(targets)?,
        })
    }

    /// Append a word and return its token-info id. The caller maps it to a
    /// trie id with [`RecordDictionary::add_mapping`].
    pub fn put(&mut self, param: WordParam, surface: &str, features: &str) -> Result<u32, DictError> {
        self.store.put(param, surface, features)
    }
}

impl RecordDictionary for TokenInfoDictionary {
    type Key = u32;

    fn store(&self) -> &RecordStore {
        &self.store
    }

    fn targets(&self) -> &TargetMap {
        &self.targets
    }

    fn targets_mut(&mut self) -> &mut TargetMap {
        &mut self.targets
    }

    fn map_key(trie_id: u32) -> u32 {
        trie_id
    }
}
