use std::ops::Range;

use tracing::{debug, debug_span};

use super::{DoubleArray, TrieError, ROOT_ID, TERM_CODE};

const DEFAULT_INITIAL_SIZE: usize = 1024;

/// Builds a [`DoubleArray`] from `(key, value)` pairs.
///
/// Keys are sorted by their UTF-8 bytes before construction. When the same
/// key appears more than once, the first value wins. Keys must not contain
/// NUL and values must fit in `0..=i32::MAX`.
pub struct DoubleArrayBuilder {
    initial_size: usize,
}

impl Default for DoubleArrayBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A run of sorted keys sharing the same byte at the current depth.
struct ChildGroup {
    code: u8,
    keys: Range<usize>,
}

impl DoubleArrayBuilder {
    pub fn new() -> Self {
        Self::with_initial_size(DEFAULT_INITIAL_SIZE)
    }

    /// Start with `initial_size` preallocated slots (the arrays still grow on demand).
    pub fn with_initial_size(initial_size: usize) -> Self {
        Self {
            initial_size: initial_size.max(2),
        }
    }

    pub fn build<K: AsRef<str>>(
        &self,
        entries: impl IntoIterator<Item = (K, u32)>,
    ) -> Result<DoubleArray, TrieError> {
        let mut keys: Vec<(Vec<u8>, i32)> = entries
            .into_iter()
            .map(|(k, v)| {
                let key = k.as_ref();
                if key.as_bytes().contains(&TERM_CODE) {
                    return Err(TrieError::NulInKey(key.to_string()));
                }
                let value = i32::try_from(v).map_err(|_| TrieError::ValueOutOfRange(v))?;
                let mut bytes = key.as_bytes().to_vec();
                bytes.push(TERM_CODE);
                Ok((bytes, value))
            })
            .collect::<Result<_, _>>()?;
        // Stable sort keeps the first value of duplicated keys in front.
        keys.sort_by(|a, b| a.0.cmp(&b.0));
        keys.dedup_by(|later, earlier| later.0 == earlier.0);

        let _span = debug_span!("build_double_array", keys = keys.len()).entered();
        let mut slots = FreeList::new(self.initial_size);
        if !keys.is_empty() {
            place(&keys, &mut slots, ROOT_ID, 0, 0..keys.len());
        }
        let trie = slots.finish();
        debug!(size = trie.size());
        Ok(trie)
    }
}

/// Place the children of `parent` (the keys in `range`, which share their
/// first `depth` bytes), then recurse into each non-terminal child.
fn place(
    keys: &[(Vec<u8>, i32)],
    slots: &mut FreeList,
    parent: usize,
    depth: usize,
    range: Range<usize>,
) {
    let children = group_children(keys, depth, range);
    let base = slots.find_base(&children);
    slots.set_base(parent, slot_value(base));

    for child in &children {
        let id = base + child.code as usize;
        slots.allocate(id);
        slots.set_check(id, slot_value(parent));
        if child.code == TERM_CODE {
            let value = keys[child.keys.start].1;
            slots.set_base(id, -value - 1);
        }
    }

    for child in children {
        if child.code != TERM_CODE {
            place(keys, slots, base + child.code as usize, depth + 1, child.keys);
        }
    }
}

fn group_children(keys: &[(Vec<u8>, i32)], depth: usize, range: Range<usize>) -> Vec<ChildGroup> {
    let mut groups: Vec<ChildGroup> = Vec::new();
    for i in range {
        // Keys are NUL-terminated and deduplicated, so every key in a shared
        // prefix range is longer than `depth`.
        let code = keys[i].0[depth];
        match groups.last_mut() {
            Some(last) if last.code == code => last.keys.end = i + 1,
            _ => groups.push(ChildGroup {
                code,
                keys: i..i + 1,
            }),
        }
    }
    groups
}

fn slot_value(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

/// BASE/CHECK arrays under construction.
///
/// Unused slots form a doubly linked list threaded through the arrays:
/// `BASE[i] = -prev` and `CHECK[i] = -next`. Slots past the end of the
/// vectors behave as if they were initialized the same way, so the list
/// continues implicitly into unallocated space.
struct FreeList {
    base: Vec<i32>,
    check: Vec<i32>,
    first_unused: usize,
}

impl FreeList {
    fn new(initial_size: usize) -> Self {
        let mut list = Self {
            base: vec![0; 1],
            check: vec![0; 1],
            first_unused: 1,
        };
        list.base[ROOT_ID] = 1;
        list.check[ROOT_ID] = 0;
        list.grow(initial_size);
        list
    }

    fn grow(&mut self, min_len: usize) {
        let old_len = self.base.len();
        if min_len <= old_len {
            return;
        }
        let new_len = min_len.max(old_len * 2);
        self.base.extend((old_len..new_len).map(|i| 1 - slot_value(i)));
        self.check.extend((old_len..new_len).map(|i| -slot_value(i) - 1));
    }

    fn base(&self, index: usize) -> i32 {
        self.base
            .get(index)
            .copied()
            .unwrap_or_else(|| 1 - slot_value(index))
    }

    fn check(&self, index: usize) -> i32 {
        self.check
            .get(index)
            .copied()
            .unwrap_or_else(|| -slot_value(index) - 1)
    }

    fn set_base(&mut self, index: usize, value: i32) {
        self.grow(index + 1);
        self.base[index] = value;
    }

    fn set_check(&mut self, index: usize, value: i32) {
        self.grow(index + 1);
        self.check[index] = value;
    }

    fn is_unused(&self, index: usize) -> bool {
        index != ROOT_ID && self.check(index) < 0
    }

    fn next_unused(&self, index: usize) -> usize {
        (-self.check(index)) as usize
    }

    /// Smallest offset, scanning the free list, at which every child lands on
    /// an unused slot.
    fn find_base(&self, children: &[ChildGroup]) -> usize {
        let first_code = children[0].code as usize;
        let mut curr = self.first_unused;
        loop {
            if let Some(base) = curr.checked_sub(first_code) {
                if children
                    .iter()
                    .all(|c| self.is_unused(base + c.code as usize))
                {
                    return base;
                }
            }
            curr = self.next_unused(curr);
        }
    }

    /// Unlink `index` from the free list.
    fn allocate(&mut self, index: usize) {
        let prev = (-self.base(index)) as usize;
        let next = (-self.check(index)) as usize;
        if index == self.first_unused {
            self.first_unused = next;
        } else {
            self.set_check(prev, -slot_value(next));
        }
        self.set_base(next, -slot_value(prev));
    }

    /// Drop trailing unused slots.
    fn finish(mut self) -> DoubleArray {
        let last_used = self.check.iter().rposition(|&c| c >= 0).unwrap_or(ROOT_ID);
        self.base.truncate(last_used + 1);
        self.check.truncate(last_used + 1);
        DoubleArray::from_parts(self.base, self.check)
    }
}
