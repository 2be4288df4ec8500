use crate::dict::ConnectionCosts;

use super::lattice::LatticeNode;

/// Trait for scoring lattice paths during Viterbi search.
pub trait CostFunction: Send + Sync {
    fn word_cost(&self, node: &LatticeNode) -> i64;
    fn transition_cost(&self, prev: &LatticeNode, next: &LatticeNode) -> i64;
}

/// Word costs from the dictionary plus bigram costs from the connection matrix.
pub struct ConnectionCostFunction<'a> {
    conn: &'a ConnectionCosts,
}

impl<'a> ConnectionCostFunction<'a> {
    pub fn new(conn: &'a ConnectionCosts) -> Self {
        Self { conn }
    }
}

impl CostFunction for ConnectionCostFunction<'_> {
    fn word_cost(&self, node: &LatticeNode) -> i64 {
        i64::from(node.cost)
    }

    fn transition_cost(&self, prev: &LatticeNode, next: &LatticeNode) -> i64 {
        i64::from(self.conn.cost_between(prev.right_id, next.left_id))
    }
}
