use tracing::{debug, debug_span, warn};

use super::cost::CostFunction;
use super::lattice::{Lattice, NodeType};

/// `shortest_cost` of a node no path from BOS reaches.
pub const UNREACHABLE: i64 = i64::MAX;

/// Run the forward pass, then extract the best BOS→EOS path.
///
/// Returns the indices of the nodes between BOS and EOS, in text order.
/// The result is empty when the input is empty or EOS cannot be reached.
pub fn search(lattice: &mut Lattice, cost_fn: &dyn CostFunction) -> Vec<usize> {
    let _span = debug_span!("viterbi", positions = lattice.positions()).entered();
    lattice.append_eos();
    forward(lattice, cost_fn);
    let path = backward(lattice);
    debug!(
        path_len = path.len(),
        cost = lattice.eos().map(|e| lattice.node(e).shortest_cost)
    );
    path
}

/// Fill `shortest_cost` and `prev` of every node, position by position.
///
/// For each node the predecessors are the nodes ending right before it
/// starts. Unreachable predecessors are skipped; on equal cost the first
/// predecessor wins.
pub fn forward(lattice: &mut Lattice, cost_fn: &dyn CostFunction) {
    for pos in 1..lattice.positions() {
        for i in 0..lattice.nodes_end_at(pos).len() {
            let idx = lattice.nodes_end_at(pos)[i];
            let node = lattice.node(idx);
            let word = cost_fn.word_cost(node);

            let mut best: Option<(i64, usize)> = None;
            for &prev_idx in lattice.nodes_end_at(node.start_pos.wrapping_sub(1)) {
                let prev = lattice.node(prev_idx);
                if !prev.is_reachable() {
                    continue;
                }
                let total = prev
                    .shortest_cost
                    .saturating_add(cost_fn.transition_cost(prev, node))
                    .saturating_add(word);
                if best.map_or(true, |(cost, _)| total < cost) {
                    best = Some((total, prev_idx));
                }
            }

            let node = lattice.node_mut(idx);
            match best {
                Some((cost, prev_idx)) => {
                    node.shortest_cost = cost;
                    node.prev = Some(prev_idx);
                }
                None => {
                    node.shortest_cost = UNREACHABLE;
                    node.prev = None;
                }
            }
        }
    }
}

/// Follow `prev` links from EOS back to BOS.
pub fn backward(lattice: &Lattice) -> Vec<usize> {
    let Some(eos) = lattice.eos() else {
        return Vec::new();
    };
    let mut path = Vec::new();
    let mut cur = lattice.node(eos).prev;
    loop {
        let Some(idx) = cur else {
            warn!(eos_pos = lattice.eos_pos(), "EOS is unreachable");
            return Vec::new();
        };
        let node = lattice.node(idx);
        if node.node_type == NodeType::Bos {
            break;
        }
        path.push(idx);
        cur = node.prev;
    }
    path.reverse();
    path
}
