use std::collections::BTreeMap;

use super::buffer::{ByteReader, ByteWriter};
use super::DictError;

/// Size of one word record: left id, right id, cost (i16 each) and the
/// feature offset (i32).
pub const RECORD_SIZE: usize = 2 + 2 + 2 + 4;

const LEFT_ID_OFFSET: usize = 0;
const RIGHT_ID_OFFSET: usize = 2;
const COST_OFFSET: usize = 4;
const FEATURE_OFFSET: usize = 6;

/// Connection ids and cost of one dictionary word.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordParam {
    pub left_id: i16,
    pub right_id: i16,
    pub cost: i16,
}

/// Fixed-size word records plus their feature strings.
///
/// A record is addressed by its byte offset (the token-info id). The feature
/// string it points at is `surface,feature1,feature2,...`.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<u8>,
    features: Vec<u8>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_buffers(records: Vec<u8>, features: Vec<u8>) -> Self {
        Self { records, features }
    }

    /// Append a record and return its token-info id.
    pub fn put(
        &mut self,
        param: WordParam,
        surface: &str,
        features: &str,
    ) -> Result<u32, DictError> {
        let id = u32::try_from(self.records.len())
            .map_err(|_| DictError::Parse("record buffer exceeds u32::MAX".to_string()))?;
        let feature_offset = i32::try_from(self.features.len())
            .map_err(|_| DictError::Parse("feature buffer exceeds i32::MAX".to_string()))?;

        let mut w = ByteWriter::new();
        w.put_i16(param.left_id);
        w.put_i16(param.right_id);
        w.put_i16(param.cost);
        w.put_i32(feature_offset);
        self.records.extend_from_slice(&w.into_inner());

        let mut w = ByteWriter::new();
        if features.is_empty() {
            w.put_cstr(surface);
        } else {
            w.put_cstr(&format!("{surface},{features}"));
        }
        self.features.extend_from_slice(&w.into_inner());
        Ok(id)
    }

    /// Record fields for `id`; out-of-range ids read as zero.
    pub fn word_param(&self, id: u32) -> WordParam {
        let r = ByteReader::new(&self.records);
        let base = id as usize;
        WordParam {
            left_id: r.i16(base + LEFT_ID_OFFSET).unwrap_or(0),
            right_id: r.i16(base + RIGHT_ID_OFFSET).unwrap_or(0),
            cost: r.i16(base + COST_OFFSET).unwrap_or(0),
        }
    }

    /// Feature string of `id`; out-of-range ids read as empty.
    pub fn features(&self, id: u32) -> &str {
        let offset = ByteReader::new(&self.records)
            .i32(id as usize + FEATURE_OFFSET)
            .and_then(|o| usize::try_from(o).ok());
        offset
            .and_then(|o| ByteReader::new(&self.features).cstr(o))
            .map(|(s, _)| s)
            .unwrap_or("")
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len() / RECORD_SIZE
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Token-info ids of every record, in storage order.
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.len()).map(|i| (i * RECORD_SIZE) as u32)
    }

    pub fn records_buffer(&self) -> &[u8] {
        &self.records
    }

    pub fn features_buffer(&self) -> &[u8] {
        &self.features
    }
}

/// Key → token-info ids mapping.
///
/// Serialized as `i32 count` followed by `count` entries of
/// `i32 key, i32 value_count, i32 values[value_count]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetMap {
    map: BTreeMap<u32, Vec<u32>>,
}

impl TargetMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: u32, token_info_id: u32) {
        self.map.entry(key).or_default().push(token_info_id);
    }

    /// Token-info ids for `key`, in insertion order. Unknown keys map to an empty slice.
    pub fn get(&self, key: u32) -> &[u32] {
        self.map.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &[u32])> {
        self.map.iter().map(|(k, v)| (*k, v.as_slice()))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_i32(self.map.len() as i32);
        for (key, values) in &self.map {
            w.put_i32(*key as i32);
            w.put_i32(values.len() as i32);
            for v in values {
                w.put_i32(*v as i32);
            }
        }
        w.into_inner()
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let r = ByteReader::new(data);
        let mut pos = 0usize;
        let next = |pos: &mut usize| -> Result<u32, DictError> {
            let v = r.i32(*pos).ok_or(DictError::Truncated {
                what: "target map",
                expected: *pos + 4,
                actual: r.len(),
            })?;
            *pos += 4;
            u32::try_from(v)
                .map_err(|_| DictError::Parse(format!("negative value {v} in target map")))
        };

        let mut map = BTreeMap::new();
        let count = next(&mut pos)?;
        for _ in 0..count {
            let key = next(&mut pos)?;
            let n = next(&mut pos)?;
            let values = (0..n)
                .map(|_| next(&mut pos))
                .collect::<Result<Vec<u32>, _>>()?;
            map.insert(key, values);
        }
        Ok(Self { map })
    }
}

/// Shared behaviour of the token-info and unknown-word dictionaries.
///
/// Both keep word records in a [`RecordStore`] and map a key to the records
/// that belong to it. They differ only in what the key is: a trie id for
/// known words, a character class id for unknown words.
pub trait RecordDictionary {
    type Key: Copy;

    fn store(&self) -> &RecordStore;
    fn targets(&self) -> &TargetMap;
    fn targets_mut(&mut self) -> &mut TargetMap;
    fn map_key(key: Self::Key) -> u32;

    fn token_info_ids(&self, key: Self::Key) -> &[u32] {
        self.targets().get(Self::map_key(key))
    }

    fn add_mapping(&mut self, key: Self::Key, token_info_id: u32) {
        self.targets_mut().add(Self::map_key(key), token_info_id);
    }

    fn word_param(&self, token_info_id: u32) -> WordParam {
        self.store().word_param(token_info_id)
    }

    fn features(&self, token_info_id: u32) -> &str {
        self.store().features(token_info_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(left_id: i16, right_id: i16, cost: i16) -> WordParam {
        WordParam {
            left_id,
            right_id,
            cost,
        }
    }

    #[test]
    fn test_put_and_read() {
        let mut store = RecordStore::new();
        let a = store.put(param(1, 2, 3000), "すもも", "名詞,一般").unwrap();
        let b = store.put(param(4, 5, -100), "も", "助詞,係助詞").unwrap();
        assert_eq!(a, 0);
        assert_eq!(b, RECORD_SIZE as u32);
        assert_eq!(store.len(), 2);
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![a, b]);

        assert_eq!(store.word_param(b), param(4, 5, -100));
        assert_eq!(store.features(a), "すもも,名詞,一般");
        assert_eq!(store.features(b), "も,助詞,係助詞");
    }

    #[test]
    fn test_out_of_range_defaults() {
        let mut store = RecordStore::new();
        store.put(param(1, 1, 1), "x", "").unwrap();
        assert_eq!(store.word_param(1000), WordParam::default());
        assert_eq!(store.features(1000), "");
        assert_eq!(store.features(0), "x");
    }

    #[test]
    fn test_target_map_bytes() {
        let mut map = TargetMap::new();
        map.add(3, 20);
        map.add(0, 10);
        map.add(3, 30);
        assert_eq!(map.get(3), &[20, 30]);
        assert!(map.get(1).is_empty());

        let bytes = map.to_bytes();
        // count, [0, 1, 10], [3, 2, 20, 30]
        assert_eq!(bytes.len(), 4 * (1 + 3 + 4));
        assert_eq!(TargetMap::from_bytes(&bytes).unwrap(), map);
    }

    #[test]
    fn test_target_map_truncated() {
        let mut map = TargetMap::new();
        map.add(1, 2);
        let bytes = map.to_bytes();
        let err = TargetMap::from_bytes(&bytes[..bytes.len() - 2]).unwrap_err();
        assert!(matches!(err, DictError::Truncated { .. }));
        assert!(TargetMap::from_bytes(&[]).is_err());
    }
}
