use super::char_def::{CharClass, CharacterDefinition};
use super::record::{RecordDictionary, RecordStore, TargetMap, WordParam};
use super::DictError;

/// Unknown-word records, keyed by character class id.
#[derive(Debug, Clone)]
pub struct UnknownDictionary {
    store: RecordStore,
    targets: TargetMap,
    char_def: CharacterDefinition,
}

impl UnknownDictionary {
    pub fn new(char_def: CharacterDefinition) -> Self {
        Self {
            store: RecordStore::new(),
            targets: TargetMap::new(),
            char_def,
        }
    }

    /// Decode from the `unk*.dat` buffers.
    pub fn from_buffers(
        records: &[u8],
        features: &[u8],
        targets: &[u8],
        char_def: CharacterDefinition,
    ) -> Result<Self, DictError> {
        Ok(Self {
            store: RecordStore::from_buffers(records.to_vec(), features.to_vec()),
            targets: TargetMap::from_bytes(targets)?,
            char_def,
        })
    }

    pub fn put(&mut self, param: WordParam, class_name: &str, features: &str) -> Result<u32, DictError> {
        self.store.put(param, class_name, features)
    }

    pub fn char_def(&self) -> &CharacterDefinition {
        &self.char_def
    }

    /// Class of `c`, shorthand for `char_def().lookup(c)`.
    pub fn lookup(&self, c: char) -> &CharClass {
        self.char_def.lookup(c)
    }
}

impl RecordDictionary for UnknownDictionary {
    type Key = u8;

    fn store(&self) -> &RecordStore {
        &self.store
    }

    fn targets(&self) -> &TargetMap {
        &self.targets
    }

    fn targets_mut(&mut self) -> &mut TargetMap {
        &mut self.targets
    }

    fn map_key(class_id: u8) -> u32 {
        u32::from(class_id)
    }
}
