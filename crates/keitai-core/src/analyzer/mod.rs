//! Morphological analysis via lattice construction and Viterbi search.
//!
//! [`build_lattice`] expands every candidate segmentation of a sentence;
//! [`search`] picks the path with the lowest word + connection cost.

mod cost;
mod lattice;
#[cfg(test)]
mod tests;
mod viterbi;

pub use cost::{ConnectionCostFunction, CostFunction};
pub use lattice::{build_lattice, Lattice, LatticeNode, LatticeOptions, NodeType, BOS_INDEX};
pub use viterbi::{backward, forward, search, UNREACHABLE};
