use tracing::{debug, debug_span};

use super::UNREACHABLE;
use crate::dict::{Dictionaries, RecordDictionary, WordParam};

/// What a lattice node stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    Known,
    Unknown,
    Bos,
    Eos,
}

/// A candidate word in the lattice.
#[derive(Debug, Clone)]
pub struct LatticeNode {
    /// Token-info id (known words) or unknown-dictionary id. `None` for BOS/EOS.
    pub name: Option<u32>,
    /// Word cost
    pub cost: i16,
    /// Start position (1-based character index). BOS is at 0.
    pub start_pos: usize,
    /// Length in characters (0 for BOS/EOS)
    pub length: usize,
    pub node_type: NodeType,
    /// Left context id
    pub left_id: i16,
    /// Right context id
    pub right_id: i16,
    /// Best predecessor, filled in by the Viterbi search
    pub prev: Option<usize>,
    /// Minimum cost from BOS, [`UNREACHABLE`] until reached
    pub shortest_cost: i64,
    pub surface_form: String,
}

impl LatticeNode {
    pub fn new(
        node_type: NodeType,
        name: u32,
        param: WordParam,
        start_pos: usize,
        surface_form: &str,
    ) -> Self {
        Self {
            name: Some(name),
            cost: param.cost,
            start_pos,
            length: surface_form.chars().count(),
            node_type,
            left_id: param.left_id,
            right_id: param.right_id,
            prev: None,
            shortest_cost: UNREACHABLE,
            surface_form: surface_form.to_string(),
        }
    }

    fn boundary(node_type: NodeType, start_pos: usize) -> Self {
        Self {
            name: None,
            cost: 0,
            start_pos,
            length: 0,
            node_type,
            left_id: 0,
            right_id: 0,
            prev: None,
            shortest_cost: if node_type == NodeType::Bos {
                0
            } else {
                UNREACHABLE
            },
            surface_form: String::new(),
        }
    }

    /// Position of the last character covered (1-based). BOS and EOS end
    /// where they start.
    pub fn end_pos(&self) -> usize {
        (self.start_pos + self.length).saturating_sub(1).max(self.start_pos)
    }

    pub fn is_reachable(&self) -> bool {
        self.shortest_cost != UNREACHABLE
    }
}

/// All candidate words of one sentence, indexed by end position.
#[derive(Debug, Clone)]
pub struct Lattice {
    nodes: Vec<LatticeNode>,
    /// nodes_end_at[i] = indices of nodes whose last character is at position i
    nodes_end_at: Vec<Vec<usize>>,
    /// Largest end position seen so far
    max_end: usize,
    eos: Option<usize>,
}

/// Index of the BOS node.
pub const BOS_INDEX: usize = 0;

impl Default for Lattice {
    fn default() -> Self {
        Self::new()
    }
}

impl Lattice {
    /// An empty lattice holding only BOS.
    pub fn new() -> Self {
        Self {
            nodes: vec![LatticeNode::boundary(NodeType::Bos, 0)],
            nodes_end_at: vec![vec![BOS_INDEX]],
            max_end: 0,
            eos: None,
        }
    }

    /// Add a word node and return its index.
    pub fn append(&mut self, node: LatticeNode) -> usize {
        let end = node.end_pos();
        let idx = self.nodes.len();
        if self.nodes_end_at.len() <= end {
            self.nodes_end_at.resize(end + 1, Vec::new());
        }
        self.nodes_end_at[end].push(idx);
        self.max_end = self.max_end.max(end);
        self.nodes.push(node);
        idx
    }

    /// Close the lattice with an EOS node one past the last end position.
    /// Calling it again returns the existing EOS.
    pub fn append_eos(&mut self) -> usize {
        if let Some(eos) = self.eos {
            return eos;
        }
        let eos_pos = self.max_end + 1;
        let idx = self.append(LatticeNode::boundary(NodeType::Eos, eos_pos));
        self.eos = Some(idx);
        idx
    }

    pub fn nodes(&self) -> &[LatticeNode] {
        &self.nodes
    }

    pub fn node(&self, idx: usize) -> &LatticeNode {
        &self.nodes[idx]
    }

    pub(crate) fn node_mut(&mut self, idx: usize) -> &mut LatticeNode {
        &mut self.nodes[idx]
    }

    /// Indices of nodes ending at `pos`.
    pub fn nodes_end_at(&self, pos: usize) -> &[usize] {
        self.nodes_end_at.get(pos).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of end-position slots (EOS position + 1 once closed).
    pub fn positions(&self) -> usize {
        self.nodes_end_at.len()
    }

    pub fn eos(&self) -> Option<usize> {
        self.eos
    }

    /// Position of the EOS node (or where it would go).
    pub fn eos_pos(&self) -> usize {
        match self.eos {
            Some(idx) => self.nodes[idx].start_pos,
            None => self.max_end + 1,
        }
    }
}

/// Options for lattice construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatticeOptions {
    /// Stop unknown-word grouping at the class `max_length` (when positive).
    pub cap_group_at_max_length: bool,
}

/// Build the lattice of every known and unknown word candidate in `text`.
///
/// At each character position a single trie walk finds all dictionary words
/// starting there. Unknown-word candidates are added when no known word
/// starts at the position, or when the character's class is always-invoke.
pub fn build_lattice(dict: &Dictionaries, text: &str, options: LatticeOptions) -> Lattice {
    let chars: Vec<char> = text.chars().collect();
    let _span = debug_span!("build_lattice", char_count = chars.len()).entered();
    // Byte offset of each char so suffixes can be sliced without allocating.
    let byte_offsets: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    let token_info = dict.token_info();
    let unknown = dict.unknown();
    let mut lattice = Lattice::new();
    let mut known_count = 0usize;
    let mut unknown_count = 0usize;

    for pos in 0..chars.len() {
        let tail = &text[byte_offsets[pos]..];
        let mut has_known = false;

        for m in dict.trie().common_prefix_search(tail) {
            for &id in token_info.token_info_ids(m.value) {
                let param = token_info.word_param(id);
                lattice.append(LatticeNode::new(NodeType::Known, id, param, pos + 1, m.key));
                has_known = true;
                known_count += 1;
            }
        }

        let head_class = unknown.lookup(chars[pos]);
        if has_known && !head_class.is_always_invoke {
            continue;
        }

        let mut len = 1;
        if head_class.is_grouping {
            let cap = match usize::try_from(head_class.max_length) {
                Ok(max) if options.cap_group_at_max_length && max > 0 => max,
                _ => usize::MAX,
            };
            while pos + len < chars.len()
                && len < cap
                && unknown.lookup(chars[pos + len]).id == head_class.id
            {
                len += 1;
            }
        }
        let end_byte = byte_offsets.get(pos + len).copied().unwrap_or(text.len());
        let key = &text[byte_offsets[pos]..end_byte];

        for &id in unknown.token_info_ids(head_class.id) {
            let param = unknown.word_param(id);
            lattice.append(LatticeNode::new(NodeType::Unknown, id, param, pos + 1, key));
            unknown_count += 1;
        }
    }

    lattice.append_eos();
    debug!(known_count, unknown_count, eos_pos = lattice.eos_pos());
    lattice
}
