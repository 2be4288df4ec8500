use memmap2::Mmap;

/// `cc.dat` header: forward dimension (i16) + backward dimension (i16).
pub(super) const HEADER_SIZE: usize = 2 + 2;

/// Backing storage for cost data: either owned or memory-mapped.
pub(super) enum CostStorage {
    Owned(Vec<i16>),
    Mapped(Mmap),
}

/// Bigram connection cost matrix.
///
/// Entry `(forward_id, backward_id)` is the cost of a word whose right id is
/// `forward_id` followed by a word whose left id is `backward_id`.
pub struct ConnectionCosts {
    pub(super) forward_dimension: u16,
    pub(super) backward_dimension: u16,
    pub(super) storage: CostStorage,
}

impl ConnectionCosts {
    /// Create an owned matrix. `costs` is laid out row-major by forward id
    /// and padded with zeros (or cut) to `forward × backward` entries.
    pub fn new(forward_dimension: u16, backward_dimension: u16, mut costs: Vec<i16>) -> Self {
        costs.resize(forward_dimension as usize * backward_dimension as usize, 0);
        Self {
            forward_dimension,
            backward_dimension,
            storage: CostStorage::Owned(costs),
        }
    }

    /// Look up the transition cost. Out-of-range ids return 0.
    pub fn cost(&self, forward_id: u16, backward_id: u16) -> i16 {
        if forward_id >= self.forward_dimension || backward_id >= self.backward_dimension {
            return 0;
        }
        let idx = forward_id as usize * self.backward_dimension as usize + backward_id as usize;
        match &self.storage {
            CostStorage::Owned(costs) => costs.get(idx).copied().unwrap_or(0),
            CostStorage::Mapped(mmap) => {
                let byte_offset = HEADER_SIZE + idx * 2;
                mmap.get(byte_offset..byte_offset + 2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]))
                    .unwrap_or(0)
            }
        }
    }

    /// Cost between signed context ids as stored in word records.
    pub fn cost_between(&self, right_id: i16, left_id: i16) -> i16 {
        match (u16::try_from(right_id), u16::try_from(left_id)) {
            (Ok(f), Ok(b)) => self.cost(f, b),
            _ => 0,
        }
    }

    pub fn forward_dimension(&self) -> u16 {
        self.forward_dimension
    }

    pub fn backward_dimension(&self) -> u16 {
        self.backward_dimension
    }

    /// Whether costs are read straight from a memory-mapped `cc.dat`.
    pub fn is_mapped(&self) -> bool {
        matches!(self.storage, CostStorage::Mapped(_))
    }
}

impl std::fmt::Debug for ConnectionCosts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionCosts")
            .field("forward_dimension", &self.forward_dimension)
            .field("backward_dimension", &self.backward_dimension)
            .field("mapped", &self.is_mapped())
            .finish()
    }
}
