use std::fs::{self, File};
use std::path::Path;

use memmap2::Mmap;
use tracing::debug;

use super::connection::{ConnectionCosts, CostStorage, HEADER_SIZE};
use super::DictError;

impl ConnectionCosts {
    /// Build from the text of a MeCab `matrix.def`.
    ///
    /// Line 1 is `forward_size backward_size`, then `forward_id backward_id cost`
    /// per line. Pairs that never appear cost 0.
    pub fn from_text(text: &str) -> Result<Self, DictError> {
        let mut lines = text.lines();

        let header = lines
            .next()
            .ok_or_else(|| DictError::Parse("empty matrix.def".to_string()))?;
        let parts: Vec<&str> = header.split_whitespace().collect();
        if parts.len() != 2 {
            return Err(DictError::Parse(format!(
                "expected 2 values in matrix.def header, got {}",
                parts.len()
            )));
        }
        let forward: u16 = parse_dimension(parts[0], "forward_size")?;
        let backward: u16 = parse_dimension(parts[1], "backward_size")?;

        let mut costs = vec![0i16; forward as usize * backward as usize];
        for (lineno, line) in lines.enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() != 3 {
                return Err(DictError::Parse(format!(
                    "matrix.def line {}: expected 3 fields, got {}",
                    lineno + 2,
                    fields.len()
                )));
            }
            let forward_id: usize = fields[0]
                .parse()
                .map_err(|e| DictError::Parse(format!("forward_id: {e}")))?;
            let backward_id: usize = fields[1]
                .parse()
                .map_err(|e| DictError::Parse(format!("backward_id: {e}")))?;
            let cost: i16 = fields[2]
                .parse()
                .map_err(|e| DictError::Parse(format!("cost: {e}")))?;
            if forward_id >= forward as usize || backward_id >= backward as usize {
                return Err(DictError::Parse(format!(
                    "index out of bounds: ({forward_id}, {backward_id})"
                )));
            }
            costs[forward_id * backward as usize + backward_id] = cost;
        }

        debug!(forward, backward, "parsed connection matrix");
        Ok(Self::new(forward, backward, costs))
    }

    /// Validate a `cc.dat` buffer and return its dimensions.
    pub(super) fn validate_header(data: &[u8]) -> Result<(u16, u16), DictError> {
        if data.len() < HEADER_SIZE {
            return Err(DictError::InvalidHeader);
        }
        let forward = i16::from_le_bytes([data[0], data[1]]);
        let backward = i16::from_le_bytes([data[2], data[3]]);
        let (Ok(forward), Ok(backward)) = (u16::try_from(forward), u16::try_from(backward)) else {
            return Err(DictError::Parse(format!(
                "negative matrix dimension ({forward}, {backward})"
            )));
        };
        let expected = HEADER_SIZE + forward as usize * backward as usize * 2;
        if data.len() != expected {
            return Err(DictError::Truncated {
                what: "connection costs",
                expected,
                actual: data.len(),
            });
        }
        Ok((forward, backward))
    }

    /// Load `cc.dat` using memory-mapped I/O.
    pub fn open(path: &Path) -> Result<Self, DictError> {
        let file = File::open(path)?;
        // SAFETY: The file is opened read-only and the mapping is immutable.
        // We hold the Mmap for the lifetime of this struct, so the data remains
        // valid. The file should not be modified while a tokenizer uses it.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_mmap(mmap)
    }

    /// Keep an already mapped `cc.dat` as backing storage.
    pub(super) fn from_mmap(mmap: Mmap) -> Result<Self, DictError> {
        let (forward_dimension, backward_dimension) = Self::validate_header(&mmap)?;
        Ok(Self {
            forward_dimension,
            backward_dimension,
            storage: CostStorage::Mapped(mmap),
        })
    }

    /// Parse a `cc.dat` buffer into an owned matrix.
    pub fn from_bytes(data: &[u8]) -> Result<Self, DictError> {
        let (forward, backward) = Self::validate_header(data)?;
        let costs: Vec<i16> = data[HEADER_SIZE..]
            .chunks_exact(2)
            .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
            .collect();
        Ok(Self::new(forward, backward, costs))
    }

    /// Serialize to the `cc.dat` layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let n = self.forward_dimension as usize * self.backward_dimension as usize;
        let mut buf = Vec::with_capacity(HEADER_SIZE + n * 2);
        buf.extend_from_slice(&(self.forward_dimension as i16).to_le_bytes());
        buf.extend_from_slice(&(self.backward_dimension as i16).to_le_bytes());
        match &self.storage {
            CostStorage::Owned(costs) => {
                for &cost in costs {
                    buf.extend_from_slice(&cost.to_le_bytes());
                }
            }
            CostStorage::Mapped(mmap) => buf.extend_from_slice(&mmap[HEADER_SIZE..]),
        }
        buf
    }

    /// Save `cc.dat` to file.
    pub fn save(&self, path: &Path) -> Result<(), DictError> {
        Ok(fs::write(path, self.to_bytes())?)
    }
}

fn parse_dimension(s: &str, name: &str) -> Result<u16, DictError> {
    let v: u16 = s
        .parse()
        .map_err(|e| DictError::Parse(format!("invalid {name}: {e}")))?;
    if v > i16::MAX as u16 {
        return Err(DictError::Parse(format!("{name} {v} exceeds {}", i16::MAX)));
    }
    Ok(v)
}
